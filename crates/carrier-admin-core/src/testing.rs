//! Recording fakes shared by controller tests.

use crate::notify::{ConfirmationGate, Notice, Notifier};
use async_trait::async_trait;
use carrier_store::{
    Carrier, CarrierFields, CarrierId, CarrierResult, CarrierStore, InMemoryCarrierStore, Page,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Answers every prompt with a fixed reply and counts the prompts.
pub struct ScriptedGate {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedGate {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConfirmationGate for ScriptedGate {
    fn confirm(&self, _prompt: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Store wrapper whose page reads can be held until released, to script
/// the order in which responses arrive.
pub struct GatedStore {
    inner: Arc<InMemoryCarrierStore>,
    gates: Mutex<HashMap<u32, Arc<Semaphore>>>,
}

impl GatedStore {
    pub fn new(inner: Arc<InMemoryCarrierStore>) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold every read of `page` until [`release_page`](Self::release_page).
    pub fn gate_page(&self, page: u32) {
        self.gates.lock().insert(page, Arc::new(Semaphore::new(0)));
    }

    /// Let one held read of `page` through.
    pub fn release_page(&self, page: u32) {
        if let Some(gate) = self.gates.lock().get(&page) {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl CarrierStore for GatedStore {
    async fn fetch_page(&self, page: u32, page_size: u32) -> CarrierResult<Page> {
        let gate = self.gates.lock().get(&page).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.inner.fetch_page(page, page_size).await
    }

    async fn fetch_all(&self) -> CarrierResult<Vec<Carrier>> {
        self.inner.fetch_all().await
    }

    async fn fetch_by_id(&self, id: &CarrierId) -> CarrierResult<Carrier> {
        self.inner.fetch_by_id(id).await
    }

    async fn create(&self, fields: &CarrierFields) -> CarrierResult<Carrier> {
        self.inner.create(fields).await
    }

    async fn update(&self, id: &CarrierId, fields: &CarrierFields) -> CarrierResult<Carrier> {
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: &CarrierId) -> CarrierResult<bool> {
        self.inner.delete(id).await
    }
}
