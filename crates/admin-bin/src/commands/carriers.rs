//! One-shot carrier commands.

use super::{unreported, Context};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use carrier_admin_core::{ListState, Route};
use carrier_store::CarrierId;
use tracing::info;

/// Show one page of carriers.
pub async fn list(ctx: &Context, page: u32) -> Result<()> {
    let list = ctx.list_view(Context::confirmation(false));
    if !list.go_to(page).await? {
        anyhow::bail!("Page must be at least 1");
    }

    if let ListState::Error { message } = list.state() {
        anyhow::bail!(message);
    }

    if let Some(note) = clamped_note(page, list.current_page(), list.total_pages()) {
        eprintln!("{note}");
    }
    output::print_list(&list, ctx.format);
    if list.show_pagination() && matches!(ctx.format, OutputFormat::Text) {
        println!("Use --page N to see other pages.");
    }
    Ok(())
}

/// Show every carrier without pagination.
pub async fn all(ctx: &Context) -> Result<()> {
    let carriers = ctx.queries.all().await?;
    output::print_carriers(&carriers, ctx.format);
    Ok(())
}

/// Show one carrier.
pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let carrier = ctx.queries.record(&CarrierId::new(id)).await?;
    output::print_carrier(&carrier, ctx.format);
    Ok(())
}

/// Create a carrier.
pub async fn create(ctx: &Context, name: &str) -> Result<()> {
    if let Some(carrier) = ctx
        .submit_form(&Route::Create, name)
        .await
        .map_err(unreported)?
    {
        output::print_carrier(&carrier, ctx.format);
    }
    Ok(())
}

/// Rename a carrier.
pub async fn edit(ctx: &Context, id: &str, name: &str) -> Result<()> {
    let route = Route::Edit {
        id: CarrierId::new(id),
        carrier: None,
    };
    if let Some(carrier) = ctx.submit_form(&route, name).await.map_err(unreported)? {
        output::print_carrier(&carrier, ctx.format);
    }
    Ok(())
}

/// Delete a carrier, asking first unless `assume_yes`.
pub async fn delete(ctx: &Context, id: &str, assume_yes: bool) -> Result<()> {
    let carrier = ctx.queries.record(&CarrierId::new(id)).await?;

    let list = ctx.list_view(Context::confirmation(assume_yes));
    let deleted = list.delete(&carrier).await.map_err(unreported)?;
    if !deleted {
        info!(id, "Delete cancelled by user");
        eprintln!("Cancelled.");
    }
    Ok(())
}

/// Note for a requested page past the end that the listing moved back from.
fn clamped_note(requested: u32, shown: u32, total_pages: u32) -> Option<String> {
    (requested != shown && total_pages > 0).then(|| {
        format!("Page {requested} does not exist; showing page {shown} of {total_pages}.")
    })
}
