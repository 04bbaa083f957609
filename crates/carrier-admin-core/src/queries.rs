//! Query client: the store paired with its cache.
//!
//! Reads are memoized per query key. Writes go straight to the store and,
//! once the store confirms them, invalidate every listing of the
//! `carriers` collection plus the touched record, all before returning.

use carrier_store::{Carrier, CarrierFields, CarrierId, CarrierResult, CarrierStore, Page, CARRIERS_TABLE};
use query_cache::{CachedEntry, QueryCache, QueryKey};
use std::sync::Arc;
use tracing::{debug, info};

/// Typed caches for the three query shapes of the carriers collection.
#[derive(Debug, Default)]
pub struct CarrierCache {
    pages: QueryCache<Page>,
    listing: QueryCache<Vec<Carrier>>,
    records: QueryCache<Carrier>,
}

impl CarrierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_key(page: u32, page_size: u32) -> QueryKey {
        QueryKey::page(CARRIERS_TABLE, page, page_size)
    }

    pub fn record_key(id: &CarrierId) -> QueryKey {
        QueryKey::record(CARRIERS_TABLE, id.as_str())
    }

    /// Last stored page, stale or not.
    pub fn read_page(&self, page: u32, page_size: u32) -> Option<CachedEntry<Page>> {
        self.pages.read(&Self::page_key(page, page_size))
    }

    /// Last stored record, stale or not.
    pub fn read_record(&self, id: &CarrierId) -> Option<CachedEntry<Carrier>> {
        self.records.read(&Self::record_key(id))
    }

    /// Stale every cached page and the unpaged listing.
    pub fn invalidate_listings(&self) {
        self.pages.invalidate_collection(CARRIERS_TABLE);
        self.listing.invalidate_collection(CARRIERS_TABLE);
    }

    /// Stale the single-record entry for `id`.
    pub fn invalidate_record(&self, id: &CarrierId) {
        self.records.invalidate(&Self::record_key(id));
    }
}

/// Cached reads and invalidating writes over a [`CarrierStore`].
pub struct CarrierQueries {
    store: Arc<dyn CarrierStore>,
    cache: Arc<CarrierCache>,
}

impl CarrierQueries {
    pub fn new(store: Arc<dyn CarrierStore>, cache: Arc<CarrierCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<CarrierCache> {
        &self.cache
    }

    pub async fn page(&self, page: u32, page_size: u32) -> CarrierResult<Page> {
        self.cache
            .pages
            .get_or_fetch(CarrierCache::page_key(page, page_size), || {
                self.store.fetch_page(page, page_size)
            })
            .await
    }

    pub async fn all(&self) -> CarrierResult<Vec<Carrier>> {
        self.cache
            .listing
            .get_or_fetch(QueryKey::all(CARRIERS_TABLE), || self.store.fetch_all())
            .await
    }

    pub async fn record(&self, id: &CarrierId) -> CarrierResult<Carrier> {
        self.cache
            .records
            .get_or_fetch(CarrierCache::record_key(id), || self.store.fetch_by_id(id))
            .await
    }

    pub async fn create(&self, fields: &CarrierFields) -> CarrierResult<Carrier> {
        let created = self.store.create(fields).await?;
        self.after_write(&created.id);
        info!(id = %created.id, "Carrier created");
        Ok(created)
    }

    pub async fn update(&self, id: &CarrierId, fields: &CarrierFields) -> CarrierResult<Carrier> {
        let updated = self.store.update(id, fields).await?;
        self.after_write(id);
        info!(%id, "Carrier updated");
        Ok(updated)
    }

    /// Returns whether a row was removed; an absent id still invalidates.
    pub async fn delete(&self, id: &CarrierId) -> CarrierResult<bool> {
        let removed = self.store.delete(id).await?;
        self.after_write(id);
        info!(%id, removed, "Carrier deleted");
        Ok(removed)
    }

    fn after_write(&self, id: &CarrierId) {
        self.cache.invalidate_listings();
        self.cache.invalidate_record(id);
        debug!(%id, "Carrier caches invalidated");
    }
}

impl std::fmt::Debug for CarrierQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierQueries")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
