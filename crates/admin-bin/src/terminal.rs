//! Terminal implementations of the controller seams.

use crate::output::{self, OutputFormat};
use carrier_admin_core::{ConfirmationGate, Notice, Notifier};
use std::io::{self, BufRead, Write};

/// Prints notices to stderr.
pub struct TerminalNotifier {
    format: OutputFormat,
}

impl TerminalNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        output::print_notice(&notice, self.format);
    }
}

/// Asks on stderr and reads a `y`/`yes` answer from stdin.
pub struct StdinConfirmation;

impl ConfirmationGate for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        io::stderr().flush().ok();

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }

        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Accepts every prompt (`--yes`).
pub struct AssumeYes;

impl ConfirmationGate for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
