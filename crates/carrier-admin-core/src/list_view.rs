//! Paginated list screen controller.
//!
//! ## State Diagram
//!
//! ```text
//!            ┌──────────────── FetchStarted ────────────────┐
//!            ▼                                               │
//!       ┌─────────┐  RowsReceived  ┌────────┐               │
//!  ───► │ Loading │ ─────────────► │ Loaded │ ──────────────┤
//!       └────┬────┘                └────────┘               │
//!            │ NoRows              ┌────────┐               │
//!            ├───────────────────► │ Empty  │ ──────────────┤
//!            │ FetchFailed         ┌────────┐               │
//!            └───────────────────► │ Failed │ ──────────────┘
//!                                  └────────┘
//! ```
//!
//! Every fetch carries a sequence number; a response is committed only if
//! no newer fetch was issued in the meantime, so a slow answer for an old
//! page can never overwrite the page the user moved to.

use crate::error::{AdminError, AdminResult};
use crate::notify::{ConfirmationGate, Notice, Notifier, Route};
use crate::queries::CarrierQueries;
use carrier_store::pagination;
use carrier_store::{Carrier, Page};
use parking_lot::Mutex;
use rust_fsm::*;
use std::sync::Arc;
use tracing::{debug, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub list_machine(Loading)

    Loading => {
        FetchStarted => Loading,
        RowsReceived => Loaded,
        NoRows => Empty,
        FetchFailed => Failed
    },
    Loaded => {
        FetchStarted => Loading
    },
    Empty => {
        FetchStarted => Loading
    },
    Failed => {
        FetchStarted => Loading
    }
}

pub use list_machine::Input as ListMachineInput;
pub use list_machine::State as ListMachineState;
pub use list_machine::StateMachine as ListMachine;

/// What the list screen should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    /// A fetch is pending. `previous` is the last page shown, kept visible
    /// until the new one arrives.
    Loading { previous: Option<Page> },
    Loaded {
        items: Vec<Carrier>,
        total_pages: u32,
    },
    Empty,
    Error { message: String },
}

struct ListInner {
    fsm: ListMachine,
    /// Page the user is on (or moving to).
    current_page: u32,
    /// Sequence number of the newest fetch issued.
    latest_fetch: u64,
    /// Page of the fetch still pending, if any.
    in_flight: Option<u32>,
    /// Last committed page.
    page: Option<Page>,
    /// Page count from the last successful fetch; survives fetch errors.
    total_pages: Option<u32>,
    error: Option<String>,
}

impl ListInner {
    fn transition(&mut self, input: &ListMachineInput) -> AdminResult<()> {
        let old_state = self.fsm.state().clone();
        self.fsm.consume(input).map_err(|_| {
            AdminError::InvalidStateTransition(format!(
                "Cannot apply {:?} in list state {:?}",
                input,
                self.fsm.state()
            ))
        })?;

        if &old_state != self.fsm.state() {
            debug!(
                old_state = ?old_state,
                new_state = ?self.fsm.state(),
                page = self.current_page,
                "List state transition"
            );
        }
        Ok(())
    }

    fn known_total_pages(&self) -> Option<u32> {
        self.total_pages
    }
}

/// Drives the carrier list screen.
pub struct ListViewController {
    queries: Arc<CarrierQueries>,
    notifier: Arc<dyn Notifier>,
    confirmation: Arc<dyn ConfirmationGate>,
    page_size: u32,
    inner: Mutex<ListInner>,
}

impl ListViewController {
    pub fn new(
        queries: Arc<CarrierQueries>,
        notifier: Arc<dyn Notifier>,
        confirmation: Arc<dyn ConfirmationGate>,
        page_size: u32,
    ) -> Self {
        Self {
            queries,
            notifier,
            confirmation,
            page_size: page_size.max(1),
            inner: Mutex::new(ListInner {
                fsm: ListMachine::new(),
                current_page: 1,
                latest_fetch: 0,
                in_flight: None,
                page: None,
                total_pages: None,
                error: None,
            }),
        }
    }

    /// Current render state.
    pub fn state(&self) -> ListState {
        let inner = self.inner.lock();
        match inner.fsm.state() {
            ListMachineState::Loading => ListState::Loading {
                previous: inner.page.clone(),
            },
            ListMachineState::Loaded => match &inner.page {
                Some(page) => ListState::Loaded {
                    items: page.items.clone(),
                    total_pages: page.total_pages(),
                },
                None => ListState::Loading { previous: None },
            },
            ListMachineState::Empty => ListState::Empty,
            ListMachineState::Failed => ListState::Error {
                message: inner.error.clone().unwrap_or_default(),
            },
        }
    }

    pub fn current_page(&self) -> u32 {
        self.inner.lock().current_page
    }

    /// Total pages from the last committed fetch (0 before the first one).
    pub fn total_pages(&self) -> u32 {
        self.inner.lock().known_total_pages().unwrap_or(0)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page controls are only worth rendering with more than one page.
    pub fn show_pagination(&self) -> bool {
        self.total_pages() > 1
    }

    /// "Page X of Y" footer, when pagination is shown.
    pub fn page_label(&self) -> Option<String> {
        self.show_pagination()
            .then(|| format!("Page {} of {}", self.current_page(), self.total_pages()))
    }

    /// Initial load of the current page.
    pub async fn mount(&self) -> AdminResult<()> {
        let page = self.current_page();
        self.load(page, false).await
    }

    /// Navigate to `page`.
    ///
    /// Pages outside `[1, total_pages]` are not requested (returns false).
    /// Navigating to the page already loading is a no-op.
    pub async fn go_to(&self, page: u32) -> AdminResult<bool> {
        let total = self.inner.lock().known_total_pages();
        let in_range = match total {
            Some(total) => page >= 1 && page <= total.max(1),
            None => page >= 1,
        };
        if !in_range {
            debug!(page, ?total, "Ignoring navigation outside page range");
            return Ok(false);
        }

        self.load(page, false).await?;
        Ok(true)
    }

    pub async fn next_page(&self) -> AdminResult<bool> {
        let page = self.current_page().saturating_add(1);
        self.go_to(page).await
    }

    pub async fn previous_page(&self) -> AdminResult<bool> {
        let page = self.current_page().saturating_sub(1);
        self.go_to(page).await
    }

    /// Repeat the request for the current page, e.g. after an error.
    pub async fn retry(&self) -> AdminResult<()> {
        let page = self.current_page();
        self.load(page, true).await
    }

    /// Delete `carrier` after explicit confirmation, then reload the
    /// current page.
    ///
    /// Returns false when the user declined (nothing changes). Store
    /// failures are surfaced as an error notice and returned.
    pub async fn delete(&self, carrier: &Carrier) -> AdminResult<bool> {
        let prompt = format!(
            "Delete carrier \"{}\"? This action cannot be undone.",
            carrier.name
        );
        if !self.confirmation.confirm(&prompt) {
            debug!(id = %carrier.id, "Delete declined");
            return Ok(false);
        }

        match self.queries.delete(&carrier.id).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Carrier deleted"));
            }
            Err(e) => {
                warn!(id = %carrier.id, error = %e, "Delete failed");
                self.notifier.notify(Notice::error(format!("Error: {e}")));
                return Err(e.into());
            }
        }

        self.retry().await?;
        Ok(true)
    }

    /// Route for the "add carrier" action.
    pub fn create_route(&self) -> Route {
        Route::Create
    }

    /// Route for the "edit" action, handing the shown row to the form.
    pub fn edit_route(&self, carrier: &Carrier) -> Route {
        Route::Edit {
            id: carrier.id.clone(),
            carrier: Some(carrier.clone()),
        }
    }

    /// Fetch `page` and commit the result if it is still the newest request.
    ///
    /// When the page turned out to be past the end of a non-empty collection
    /// (e.g. its last row was just deleted), moves to the last page instead.
    async fn load(&self, page: u32, force: bool) -> AdminResult<()> {
        let mut target = page.max(1);

        loop {
            let fetch_id = {
                let mut inner = self.inner.lock();
                if !force && inner.in_flight == Some(target) {
                    debug!(page = target, "Page already loading");
                    return Ok(());
                }
                inner.latest_fetch += 1;
                inner.current_page = target;
                inner.in_flight = Some(target);
                inner.transition(&ListMachineInput::FetchStarted)?;
                inner.latest_fetch
            };

            let result = self.queries.page(target, self.page_size).await;

            let step_back = {
                let mut inner = self.inner.lock();
                if inner.latest_fetch != fetch_id {
                    debug!(page = target, "Discarding superseded page response");
                    return Ok(());
                }
                inner.in_flight = None;

                if let Ok(page) = &result {
                    inner.total_pages = Some(page.total_pages());
                }

                match result {
                    Ok(page) if page.is_empty_collection() => {
                        inner.page = Some(page);
                        inner.error = None;
                        inner.transition(&ListMachineInput::NoRows)?;
                        None
                    }
                    Ok(page) if page.items.is_empty() => {
                        Some(pagination::clamp_page(target, page.total_pages()))
                    }
                    Ok(page) => {
                        inner.page = Some(page);
                        inner.error = None;
                        inner.transition(&ListMachineInput::RowsReceived)?;
                        None
                    }
                    Err(e) => {
                        warn!(page = target, error = %e, "Failed to load carriers");
                        inner.page = None;
                        inner.error = Some(format!("Error loading carriers: {e}"));
                        inner.transition(&ListMachineInput::FetchFailed)?;
                        None
                    }
                }
            };

            match step_back {
                Some(last) if last != target => {
                    debug!(from = target, to = last, "Page past the end; moving to last page");
                    target = last;
                }
                Some(_) => {
                    // Clamping cannot move; show the collection as empty.
                    self.inner.lock().transition(&ListMachineInput::NoRows)?;
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }
}
