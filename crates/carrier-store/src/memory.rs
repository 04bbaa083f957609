//! In-process [`CarrierStore`] with the same observable semantics as the
//! remote table: case-insensitive name ordering, store-assigned ids,
//! a not-empty check constraint and an optional unique-name constraint.

use crate::error::{CarrierError, CarrierResult};
use crate::model::{Carrier, CarrierFields, CarrierId, Page};
use crate::pagination;
use crate::store::CarrierStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Memory-backed carrier table.
#[derive(Debug, Default)]
pub struct InMemoryCarrierStore {
    rows: Mutex<Vec<Carrier>>,
    unique_names: bool,
    calls: AtomicUsize,
    fail_next: Mutex<Option<(u16, String)>>,
}

impl InMemoryCarrierStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts and updates that would duplicate a name.
    pub fn with_unique_names(mut self) -> Self {
        self.unique_names = true;
        self
    }

    /// Insert rows directly, bypassing the call counter.
    pub fn seed<I, S>(&self, names: I) -> Vec<Carrier>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = self.rows.lock();
        names
            .into_iter()
            .map(|name| {
                let carrier = Carrier {
                    id: new_id(),
                    name: name.into(),
                };
                rows.push(carrier.clone());
                carrier
            })
            .collect()
    }

    /// Number of store operations served so far (one per "remote call").
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next operation fail with a store error.
    pub fn fail_next(&self, status: u16, message: impl Into<String>) {
        *self.fail_next.lock() = Some((status, message.into()));
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count the call and fire any armed failure.
    fn begin_call(&self) -> CarrierResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().take() {
            Some((status, message)) => Err(CarrierError::Store { status, message }),
            None => Ok(()),
        }
    }

    fn sorted(rows: &[Carrier]) -> Vec<Carrier> {
        let mut sorted = rows.to_vec();
        // Stable sort: equal names keep insertion order.
        sorted.sort_by_cached_key(|c| c.name.to_lowercase());
        sorted
    }

    fn check_constraints(
        &self,
        rows: &[Carrier],
        fields: &CarrierFields,
        except: Option<&CarrierId>,
    ) -> CarrierResult<()> {
        if fields.name.trim().is_empty() {
            return Err(CarrierError::Validation(
                "new row for relation \"carriers\" violates check constraint \"carriers_name_not_empty\""
                    .to_string(),
            ));
        }
        if self.unique_names
            && rows
                .iter()
                .any(|c| Some(&c.id) != except && c.name == fields.name)
        {
            return Err(CarrierError::Validation(format!(
                "duplicate key value violates unique constraint \"carriers_name_key\": {}",
                fields.name
            )));
        }
        Ok(())
    }
}

fn new_id() -> CarrierId {
    CarrierId::new(uuid::Uuid::new_v4().to_string())
}

#[async_trait]
impl CarrierStore for InMemoryCarrierStore {
    async fn fetch_page(&self, page: u32, page_size: u32) -> CarrierResult<Page> {
        self.begin_call()?;
        let range = pagination::range_for(page, page_size);
        let rows = Self::sorted(&self.rows.lock());

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(range.from).unwrap_or(usize::MAX))
            .take(usize::try_from(range.row_count()).unwrap_or(usize::MAX))
            .collect();

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn fetch_all(&self) -> CarrierResult<Vec<Carrier>> {
        self.begin_call()?;
        Ok(Self::sorted(&self.rows.lock()))
    }

    async fn fetch_by_id(&self, id: &CarrierId) -> CarrierResult<Carrier> {
        self.begin_call()?;
        self.rows
            .lock()
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| CarrierError::NotFound { id: id.to_string() })
    }

    async fn create(&self, fields: &CarrierFields) -> CarrierResult<Carrier> {
        self.begin_call()?;
        let mut rows = self.rows.lock();
        self.check_constraints(&rows, fields, None)?;

        let carrier = Carrier {
            id: new_id(),
            name: fields.name.clone(),
        };
        rows.push(carrier.clone());
        debug!(id = %carrier.id, "In-memory carrier created");
        Ok(carrier)
    }

    async fn update(&self, id: &CarrierId, fields: &CarrierFields) -> CarrierResult<Carrier> {
        self.begin_call()?;
        let mut rows = self.rows.lock();
        self.check_constraints(&rows, fields, Some(id))?;

        let row = rows
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| CarrierError::NotFound { id: id.to_string() })?;
        row.name = fields.name.clone();
        Ok(row.clone())
    }

    async fn delete(&self, id: &CarrierId) -> CarrierResult<bool> {
        self.begin_call()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|c| &c.id != id);
        Ok(rows.len() != before)
    }
}
