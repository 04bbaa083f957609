//! The store seam every controller talks to.

use crate::error::CarrierResult;
use crate::model::{Carrier, CarrierFields, CarrierId, Page};
use async_trait::async_trait;

/// CRUD access to the `carriers` collection.
///
/// Implementations issue exactly one remote call per operation and keep no
/// local cache.
#[async_trait]
pub trait CarrierStore: Send + Sync {
    /// Rows `[(page-1)*page_size, page*page_size - 1]` ordered by name,
    /// plus the exact total row count. A page past the end yields no items.
    async fn fetch_page(&self, page: u32, page_size: u32) -> CarrierResult<Page>;

    /// Every row ordered by name.
    async fn fetch_all(&self) -> CarrierResult<Vec<Carrier>>;

    /// A single row, `NotFound` when absent.
    async fn fetch_by_id(&self, id: &CarrierId) -> CarrierResult<Carrier>;

    /// Insert one row and return it with the assigned id.
    async fn create(&self, fields: &CarrierFields) -> CarrierResult<Carrier>;

    /// Replace the writable fields of a row, `NotFound` when no row matched.
    async fn update(&self, id: &CarrierId, fields: &CarrierFields) -> CarrierResult<Carrier>;

    /// Delete a row. Deleting an absent id succeeds; the returned flag says
    /// whether a row was actually removed.
    async fn delete(&self, id: &CarrierId) -> CarrierResult<bool>;
}
