//! UI-side seams: notices, confirmation and navigation targets.

use carrier_store::{Carrier, CarrierId};
use serde::Serialize;
use std::fmt;

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient notification emitted on every mutation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Success => write!(f, "✅ {}", self.message),
            NoticeKind::Error => write!(f, "❌ {}", self.message),
        }
    }
}

/// Receives notices for display (toast, status line, stderr).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Explicit user confirmation for destructive actions.
pub trait ConfirmationGate: Send + Sync {
    /// Returns true only when the user accepted `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Screens a controller can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Create,
    /// Edit form for `id`. `carrier` is the row the list already shows,
    /// handed over so the form can skip its own fetch.
    Edit {
        id: CarrierId,
        carrier: Option<Carrier>,
    },
}
