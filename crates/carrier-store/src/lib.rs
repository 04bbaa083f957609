//! Record store client for the `carriers` table.
//!
//! # Architecture
//!
//! ```text
//! controllers → CarrierStore (trait) → SupabaseCarrierStore → Supabase REST API
//!                                    ↘ InMemoryCarrierStore (tests, offline demo)
//! ```
//!
//! Every store operation performs exactly one remote call. Nothing here
//! caches; that is the job of the `query-cache` crate.

mod error;
mod memory;
mod model;
pub mod pagination;
mod store;
mod supabase;

pub use error::{CarrierError, CarrierResult};
pub use memory::InMemoryCarrierStore;
pub use model::{Carrier, CarrierFields, CarrierId, Page};
pub use pagination::{PageRange, DEFAULT_PAGE_SIZE};
pub use store::CarrierStore;
pub use supabase::{SupabaseCarrierStore, CARRIERS_TABLE};
