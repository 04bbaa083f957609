//! Controllers for the carrier back office.
//!
//! ```text
//! ListViewController ─┐
//!                     ├─► CarrierQueries ─► CarrierStore (one call per op)
//! FormController ─────┘        │
//!                              └─► CarrierCache (read / invalidate)
//! ```
//!
//! Controllers never touch the cache directly: reads and writes go through
//! [`CarrierQueries`], which invalidates before a mutation returns. Success
//! notices are therefore only ever emitted after the cache is consistent.

mod error;
pub mod form;
pub mod list_view;
mod notify;
mod queries;
#[cfg(test)]
mod testing;

pub use error::{AdminError, AdminResult};
pub use form::{is_missing_name, FormController, FormMode, FormState};
pub use list_view::{ListState, ListViewController};
pub use notify::{ConfirmationGate, Notice, NoticeKind, Notifier, Route};
pub use queries::{CarrierCache, CarrierQueries};
