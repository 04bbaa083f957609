//! Create/edit form controller.
//!
//! ## State Diagram
//!
//! ```text
//!  ┌───────┐ LoadRequested ┌───────────────┐ RecordLoaded ┌─────────┐
//!  │ Blank │ ────────────► │ LoadingRecord │ ───────────► │ Editing │◄─┐
//!  └───┬───┘               └───────┬───────┘              └────┬────┘  │
//!      │ Prefilled / FieldChanged  │ LoadFailed   SubmitStarted │       │ SubmitFailed
//!      └──────────► Editing        ▼                           ▼       │
//!                              ┌────────┐               ┌────────────┐ │
//!                              │ Failed │               │ Submitting │─┘
//!                              └────────┘               └─────┬──────┘
//!                                                SubmitSucceeded│
//!                                                             ▼
//!                                                      ┌───────────┐
//!                                                      │ Submitted │
//!                                                      └───────────┘
//! ```

use crate::error::{AdminError, AdminResult};
use crate::notify::{Notice, Notifier, Route};
use crate::queries::CarrierQueries;
use carrier_store::{Carrier, CarrierError, CarrierFields, CarrierId};
use parking_lot::Mutex;
use rust_fsm::*;
use std::sync::Arc;
use tracing::{debug, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub form_machine(Blank)

    Blank => {
        LoadRequested => LoadingRecord,
        Prefilled => Editing,
        FieldChanged => Editing,
        ValidationFailed => Editing,
        SubmitStarted => Submitting
    },
    LoadingRecord => {
        RecordLoaded => Editing,
        LoadFailed => Failed
    },
    Editing => {
        FieldChanged => Editing,
        ValidationFailed => Editing,
        SubmitStarted => Submitting
    },
    Submitting => {
        SubmitSucceeded => Submitted,
        SubmitFailed => Editing
    }
}

pub use form_machine::Input as FormMachineInput;
pub use form_machine::State as FormMachineState;
pub use form_machine::StateMachine as FormMachine;

/// Whether the form creates a new carrier or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(CarrierId),
}

/// What the form screen should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Blank,
    LoadingRecord,
    Editing {
        fields: CarrierFields,
        error: Option<String>,
    },
    Submitting,
    Submitted,
    Error { message: String },
}

struct FormInner {
    fsm: FormMachine,
    fields: CarrierFields,
    error: Option<String>,
    /// Where the screen should go next, once the form is done.
    next_route: Option<Route>,
}

impl FormInner {
    fn transition(&mut self, input: &FormMachineInput) -> AdminResult<()> {
        let old_state = self.fsm.state().clone();
        self.fsm.consume(input).map_err(|_| {
            AdminError::InvalidStateTransition(format!(
                "Cannot apply {:?} in form state {:?}",
                input,
                self.fsm.state()
            ))
        })?;

        if &old_state != self.fsm.state() {
            debug!(
                old_state = ?old_state,
                new_state = ?self.fsm.state(),
                "Form state transition"
            );
        }
        Ok(())
    }
}

/// Drives the carrier create/edit form.
pub struct FormController {
    queries: Arc<CarrierQueries>,
    notifier: Arc<dyn Notifier>,
    mode: FormMode,
    inner: Mutex<FormInner>,
}

impl FormController {
    pub fn new(queries: Arc<CarrierQueries>, notifier: Arc<dyn Notifier>, mode: FormMode) -> Self {
        Self {
            queries,
            notifier,
            mode,
            inner: Mutex::new(FormInner {
                fsm: FormMachine::new(),
                fields: CarrierFields::new(""),
                error: None,
                next_route: None,
            }),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn state(&self) -> FormState {
        let inner = self.inner.lock();
        match inner.fsm.state() {
            FormMachineState::Blank => FormState::Blank,
            FormMachineState::LoadingRecord => FormState::LoadingRecord,
            FormMachineState::Editing => FormState::Editing {
                fields: inner.fields.clone(),
                error: inner.error.clone(),
            },
            FormMachineState::Submitting => FormState::Submitting,
            FormMachineState::Submitted => FormState::Submitted,
            FormMachineState::Failed => FormState::Error {
                message: inner.error.clone().unwrap_or_default(),
            },
        }
    }

    /// Current field values.
    pub fn fields(&self) -> CarrierFields {
        self.inner.lock().fields.clone()
    }

    /// Route the screen should follow, once the form has finished or failed.
    pub fn next_route(&self) -> Option<Route> {
        self.inner.lock().next_route.clone()
    }

    /// Resolve the initial values, once.
    ///
    /// Create mode stays blank. Edit mode uses `provided` (the row handed
    /// over by the list) when its id matches, otherwise fetches the record.
    /// A failed fetch notifies and routes back to the list.
    pub async fn initialize(&self, provided: Option<Carrier>) -> AdminResult<()> {
        let id = match &self.mode {
            FormMode::Create => return Ok(()),
            FormMode::Edit(id) => id.clone(),
        };

        if let Some(carrier) = provided.filter(|c| c.id == id) {
            let mut inner = self.inner.lock();
            inner.transition(&FormMachineInput::Prefilled)?;
            inner.fields = CarrierFields::from(&carrier);
            return Ok(());
        }

        self.inner
            .lock()
            .transition(&FormMachineInput::LoadRequested)?;

        match self.queries.record(&id).await {
            Ok(carrier) => {
                let mut inner = self.inner.lock();
                inner.transition(&FormMachineInput::RecordLoaded)?;
                inner.fields = CarrierFields::from(&carrier);
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "Failed to load carrier for editing");
                let message = format!("Error loading carrier: {e}");
                {
                    let mut inner = self.inner.lock();
                    inner.transition(&FormMachineInput::LoadFailed)?;
                    inner.error = Some(message.clone());
                    inner.next_route = Some(Route::List);
                }
                self.notifier.notify(Notice::error(message));
                Err(e.into())
            }
        }
    }

    /// Update the name field.
    pub fn set_name(&self, name: impl Into<String>) -> AdminResult<()> {
        let mut inner = self.inner.lock();
        inner.transition(&FormMachineInput::FieldChanged)?;
        inner.fields.name = name.into();
        inner.error = None;
        Ok(())
    }

    /// Validate and persist the form.
    ///
    /// An empty name fails locally without touching the store. A store
    /// failure returns the form to editing with the entered values intact.
    pub async fn submit(&self) -> AdminResult<Carrier> {
        let fields = {
            let mut inner = self.inner.lock();
            if let Err(e) = inner.fields.validate() {
                inner.transition(&FormMachineInput::ValidationFailed)?;
                inner.error = Some(e.to_string());
                drop(inner);
                self.notifier.notify(Notice::error("Carrier name is required"));
                return Err(e.into());
            }
            inner.transition(&FormMachineInput::SubmitStarted)?;
            inner.error = None;
            inner.fields.clone()
        };

        let result = match &self.mode {
            FormMode::Create => self.queries.create(&fields).await,
            FormMode::Edit(id) => self.queries.update(id, &fields).await,
        };

        match result {
            Ok(carrier) => {
                {
                    let mut inner = self.inner.lock();
                    inner.transition(&FormMachineInput::SubmitSucceeded)?;
                    inner.next_route = Some(Route::List);
                }
                self.notifier.notify(Notice::success(self.success_message()));
                Ok(carrier)
            }
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "Failed to save carrier");
                {
                    let mut inner = self.inner.lock();
                    inner.transition(&FormMachineInput::SubmitFailed)?;
                    inner.error = Some(e.to_string());
                }
                self.notifier.notify(Notice::error(format!("Error: {e}")));
                Err(e.into())
            }
        }
    }

    /// Abandon the form.
    pub fn cancel(&self) -> Route {
        self.inner.lock().next_route = Some(Route::List);
        Route::List
    }

    fn success_message(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Carrier created successfully!",
            FormMode::Edit(_) => "Carrier updated successfully!",
        }
    }
}

impl FormMode {
    /// Form mode a route opens, if it is a form route.
    pub fn for_route(route: &Route) -> Option<Self> {
        match route {
            Route::Create => Some(FormMode::Create),
            Route::Edit { id, .. } => Some(FormMode::Edit(id.clone())),
            Route::List => None,
        }
    }
}

/// True when `err` is the local "name is required" rejection.
pub fn is_missing_name(err: &AdminError) -> bool {
    matches!(
        err.as_carrier_error(),
        Some(CarrierError::EmptyField { field: "name" })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeKind;
    use crate::queries::CarrierCache;
    use crate::testing::RecordingNotifier;
    use carrier_store::InMemoryCarrierStore;

    struct Fixture {
        store: Arc<InMemoryCarrierStore>,
        queries: Arc<CarrierQueries>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new(names: &[&str]) -> (Self, Vec<Carrier>) {
            let store = Arc::new(InMemoryCarrierStore::new());
            let seeded = store.seed(names.iter().copied());
            let queries = Arc::new(CarrierQueries::new(
                store.clone(),
                Arc::new(CarrierCache::new()),
            ));
            let fixture = Self {
                store,
                queries,
                notifier: Arc::new(RecordingNotifier::default()),
            };
            (fixture, seeded)
        }

        fn form(&self, mode: FormMode) -> FormController {
            FormController::new(self.queries.clone(), self.notifier.clone(), mode)
        }
    }

    #[tokio::test]
    async fn create_form_starts_blank() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);
        form.initialize(None).await.unwrap();

        assert_eq!(form.state(), FormState::Blank);
        assert_eq!(form.fields().name, "");
        assert_eq!(f.store.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_store_call() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);

        let err = form.submit().await.unwrap_err();

        assert!(is_missing_name(&err));
        assert_eq!(f.store.call_count(), 0);
        match form.state() {
            FormState::Editing { error, .. } => assert!(error.is_some()),
            other => panic!("expected Editing, got {other:?}"),
        }
        assert_eq!(
            f.notifier.last(),
            Some(Notice::error("Carrier name is required"))
        );
    }

    #[tokio::test]
    async fn whitespace_name_is_rejected() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);
        form.set_name("   ").unwrap();

        assert!(is_missing_name(&form.submit().await.unwrap_err()));
        assert_eq!(f.store.call_count(), 0);
    }

    #[tokio::test]
    async fn create_appears_on_the_cached_first_page() {
        let (f, _) = Fixture::new(&["B", "D"]);
        f.queries.page(1, 12).await.unwrap();

        let form = f.form(FormMode::Create);
        form.set_name("A").unwrap();
        let created = form.submit().await.unwrap();

        assert_eq!(created.name, "A");
        assert_eq!(form.state(), FormState::Submitted);
        assert_eq!(form.next_route(), Some(Route::List));
        assert_eq!(
            f.notifier.last(),
            Some(Notice::success("Carrier created successfully!"))
        );

        assert!(f.queries.cache().read_page(1, 12).unwrap().stale);
        let names: Vec<_> = f
            .queries
            .page(1, 12)
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "D"]);
    }

    #[tokio::test]
    async fn edit_uses_provided_row_without_fetching() {
        let (f, seeded) = Fixture::new(&["Acme"]);
        let acme = seeded[0].clone();
        let form = f.form(FormMode::Edit(acme.id.clone()));

        form.initialize(Some(acme)).await.unwrap();

        assert_eq!(f.store.call_count(), 0);
        assert_eq!(form.fields().name, "Acme");
    }

    #[tokio::test]
    async fn edit_fetches_when_nothing_was_provided() {
        let (f, seeded) = Fixture::new(&["Acme"]);
        let form = f.form(FormMode::Edit(seeded[0].id.clone()));

        form.initialize(None).await.unwrap();

        assert_eq!(f.store.call_count(), 1);
        assert_eq!(
            form.state(),
            FormState::Editing {
                fields: CarrierFields::new("Acme"),
                error: None
            }
        );
    }

    #[tokio::test]
    async fn edit_ignores_provided_row_for_another_id() {
        let (f, seeded) = Fixture::new(&["Acme", "Globex"]);
        let form = f.form(FormMode::Edit(seeded[0].id.clone()));

        form.initialize(Some(seeded[1].clone())).await.unwrap();

        assert_eq!(f.store.call_count(), 1);
        assert_eq!(form.fields().name, "Acme");
    }

    #[tokio::test]
    async fn missing_record_routes_back_to_list() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Edit(CarrierId::new("404")));

        assert!(form.initialize(None).await.is_err());

        assert!(matches!(form.state(), FormState::Error { .. }));
        assert_eq!(form.next_route(), Some(Route::List));
        assert_eq!(f.notifier.last().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn update_refreshes_page_and_record() {
        let (f, seeded) = Fixture::new(&["Acme"]);
        let id = seeded[0].id.clone();
        f.queries.page(1, 12).await.unwrap();
        f.queries.record(&id).await.unwrap();

        let form = f.form(FormMode::Edit(id.clone()));
        form.initialize(None).await.unwrap();
        form.set_name("Acme Express").unwrap();
        form.submit().await.unwrap();

        assert_eq!(
            f.notifier.last(),
            Some(Notice::success("Carrier updated successfully!"))
        );
        assert_eq!(f.queries.record(&id).await.unwrap().name, "Acme Express");
        assert_eq!(
            f.queries.page(1, 12).await.unwrap().items[0].name,
            "Acme Express"
        );
    }

    #[tokio::test]
    async fn failed_submit_keeps_entered_values() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);
        form.set_name("Acme").unwrap();

        f.store.fail_next(500, "insert failed");
        assert!(form.submit().await.is_err());

        match form.state() {
            FormState::Editing { fields, error } => {
                assert_eq!(fields.name, "Acme");
                assert!(error.unwrap().contains("insert failed"));
            }
            other => panic!("expected Editing, got {other:?}"),
        }
        assert_eq!(f.notifier.last().unwrap().kind, NoticeKind::Error);

        // The retry goes through.
        assert_eq!(form.submit().await.unwrap().name, "Acme");
    }

    #[tokio::test]
    async fn unique_violation_is_reported_as_validation() {
        let store = Arc::new(InMemoryCarrierStore::new().with_unique_names());
        store.seed(["Acme"]);
        let queries = Arc::new(CarrierQueries::new(store, Arc::new(CarrierCache::new())));
        let notifier = Arc::new(RecordingNotifier::default());
        let form = FormController::new(queries, notifier, FormMode::Create);
        form.set_name("Acme").unwrap();

        let err = form.submit().await.unwrap_err();
        assert!(matches!(
            err.as_carrier_error(),
            Some(CarrierError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn submitted_form_rejects_another_submit() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);
        form.set_name("Acme").unwrap();
        form.submit().await.unwrap();

        let err = form.submit().await.unwrap_err();
        assert!(matches!(err, AdminError::InvalidStateTransition(_)));
        assert_eq!(f.store.len(), 1);
    }

    #[test]
    fn machine_rejects_submit_while_submitting() {
        let mut machine = FormMachine::new();
        machine.consume(&FormMachineInput::SubmitStarted).unwrap();
        assert!(machine.consume(&FormMachineInput::SubmitStarted).is_err());
    }

    #[test]
    fn cancel_routes_to_list() {
        let (f, _) = Fixture::new(&[]);
        let form = f.form(FormMode::Create);
        assert_eq!(form.cancel(), Route::List);
        assert_eq!(form.next_route(), Some(Route::List));
    }

    #[test]
    fn routes_map_to_form_modes() {
        let id = CarrierId::new("7");
        let edit = Route::Edit {
            id: id.clone(),
            carrier: None,
        };
        assert_eq!(FormMode::for_route(&edit), Some(FormMode::Edit(id)));
        assert_eq!(FormMode::for_route(&Route::Create), Some(FormMode::Create));
        assert_eq!(FormMode::for_route(&Route::List), None);
    }
}
