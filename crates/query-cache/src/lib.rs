//! Query cache with an explicit invalidation contract.
//!
//! Read results are memoized per [`QueryKey`]. A mutation invalidates the
//! whole list side of its collection (every cached page and the unpaged
//! listing) plus the single-record entry it touched. Invalidated entries
//! stay readable as "last shown" data but are never served as fresh.
//!
//! Fetches are bracketed by a [`FetchTicket`]: if an invalidation lands
//! while a fetch is in flight, the late result is stored as stale, so a
//! read that started before a mutation can never mask it afterwards.

mod cache;
mod key;

pub use cache::{CachedEntry, FetchTicket, QueryCache};
pub use key::{KeyScope, QueryKey};
