//! Output formatting for the CLI.

use carrier_admin_core::{ListState, ListViewController, Notice};
use carrier_store::Carrier;
use clap::ValueEnum;
use serde_json::json;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a single carrier.
pub fn print_carrier(carrier: &Carrier, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_heading(&carrier.name);
            print_row("ID", carrier.id.as_str());
            print_row("Name", &carrier.name);
        }
        OutputFormat::Json => print_json(&json!(carrier)),
    }
}

/// Print carriers as a table (text) or array (json).
pub fn print_carriers(carriers: &[Carrier], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            if carriers.is_empty() {
                println!("No carriers found.");
                return;
            }
            print_table(carriers.iter().enumerate());
        }
        OutputFormat::Json => print_json(&json!(carriers)),
    }
}

/// Print what a list controller currently shows.
///
/// Text output numbers the rows (for `d <row>` in browse) and adds the
/// "Page X of Y" footer only when there is more than one page.
pub fn print_list(list: &ListViewController, format: OutputFormat) {
    let state = list.state();
    if let OutputFormat::Json = format {
        let body = match &state {
            ListState::Loaded { items, total_pages } => json!({
                "page": list.current_page(),
                "total_pages": total_pages,
                "items": items,
            }),
            ListState::Empty => json!({
                "page": list.current_page(),
                "total_pages": 0,
                "items": [],
            }),
            ListState::Loading { .. } => json!({ "status": "loading" }),
            ListState::Error { message } => json!({ "status": "error", "message": message }),
        };
        print_json(&body);
        return;
    }

    match state {
        ListState::Loaded { items, .. } => {
            print_table(items.iter().enumerate());
            if let Some(label) = list.page_label() {
                println!();
                println!("{label}");
            }
        }
        ListState::Empty => println!("No carriers found."),
        ListState::Loading { .. } => println!("Loading..."),
        ListState::Error { message } => eprintln!("{message}"),
    }
}

/// Print a transient notice to stderr.
pub fn print_notice(notice: &Notice, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("{notice}"),
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(notice) {
                eprintln!("{line}");
            }
        }
    }
}

fn print_table<'a>(rows: impl Iterator<Item = (usize, &'a Carrier)>) {
    println!("{:>4}  {:<36} {}", "#", "ID", "Name");
    print_divider();
    for (index, carrier) in rows {
        println!("{:>4}  {:<36} {}", index + 1, carrier.id.as_str(), carrier.name);
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{}", value),
    }
}

/// Print a table row.
fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
fn print_divider() {
    println!("{}", "-".repeat(60));
}

/// Print a heading.
fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}
