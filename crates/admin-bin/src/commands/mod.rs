//! CLI command implementations.

mod browse;
mod carriers;

pub use browse::browse;
pub use carriers::{all, create, delete, edit, list, show};

use crate::output::OutputFormat;
use crate::terminal::{AssumeYes, StdinConfirmation, TerminalNotifier};
use admin_config_and_utils::Config;
use anyhow::Result;
use carrier_admin_core::{
    AdminError, CarrierCache, CarrierQueries, ConfirmationGate, FormController, FormMode,
    ListViewController, Notifier, Route,
};
use carrier_store::{Carrier, CarrierStore, InMemoryCarrierStore, SupabaseCarrierStore};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Shared wiring for every command: one store, one cache, one notifier.
pub struct Context {
    queries: Arc<CarrierQueries>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    format: OutputFormat,
}

impl Context {
    /// Wire the store selected by the global flags.
    pub fn build(config: &Config, memory: bool, seed: usize, format: OutputFormat) -> Result<Self> {
        let store: Arc<dyn CarrierStore> = if memory {
            let store = InMemoryCarrierStore::new();
            store.seed((1..=seed).map(|n| format!("Sample Carrier {n:03}")));
            debug!(rows = seed, "Using in-process store");
            Arc::new(store)
        } else {
            if config.supabase_publishable_key.is_empty() {
                anyhow::bail!(
                    "Supabase publishable key is not configured. Set CARRIER_ADMIN_SUPABASE_KEY or use --memory"
                );
            }
            Arc::new(SupabaseCarrierStore::new(
                config.supabase_url.as_str(),
                config.supabase_publishable_key.as_str(),
                config.bearer_token(),
            )?)
        };

        Ok(Self {
            queries: Arc::new(CarrierQueries::new(store, Arc::new(CarrierCache::new()))),
            notifier: Arc::new(TerminalNotifier::new(format)),
            page_size: config.page_size,
            format,
        })
    }

    fn list_view(&self, confirmation: Arc<dyn ConfirmationGate>) -> ListViewController {
        ListViewController::new(
            self.queries.clone(),
            self.notifier.clone(),
            confirmation,
            self.page_size,
        )
    }

    fn confirmation(assume_yes: bool) -> Arc<dyn ConfirmationGate> {
        if assume_yes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(StdinConfirmation)
        }
    }

    /// Open the form a route points at, fill in `name` and submit it.
    ///
    /// Returns `None` for routes that are not forms.
    async fn submit_form(&self, route: &Route, name: &str) -> Result<Option<Carrier>, AdminError> {
        let Some(mode) = FormMode::for_route(route) else {
            return Ok(None);
        };
        let provided = match route {
            Route::Edit { carrier, .. } => carrier.clone(),
            Route::Create | Route::List => None,
        };

        let form = FormController::new(self.queries.clone(), self.notifier.clone(), mode);
        form.initialize(provided).await?;
        form.set_name(name)?;
        let carrier = form.submit().await?;
        Ok(Some(carrier))
    }
}

/// A failure the user has already seen as a notice.
#[derive(Debug)]
pub struct AlreadyReported;

impl fmt::Display for AlreadyReported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command failed")
    }
}

impl std::error::Error for AlreadyReported {}

/// Controllers notify store failures themselves; only surface the rest.
fn unreported(err: AdminError) -> anyhow::Error {
    if err.as_carrier_error().is_some() {
        debug!(error = %err, "Command failed after notice");
        AlreadyReported.into()
    } else {
        err.into()
    }
}
