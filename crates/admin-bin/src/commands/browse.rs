//! Interactive paging over one list controller.
//!
//! Pages already visited are served from the cache; any create, edit or
//! delete invalidates them so the next view is refetched.

use super::Context;
use crate::output;
use anyhow::Result;
use carrier_admin_core::{ListState, ListViewController};
use carrier_store::Carrier;
use std::io::{self, BufRead, Write};
use tracing::debug;

const HELP: &str = "\
Commands:
  n              next page
  p              previous page
  <number>       go to page
  r              reload current page
  a <name>       add a carrier
  e <row> <name> rename the carrier on row <row>
  d <row>        delete the carrier on row <row>
  h              show this help
  q              quit";

/// Page through carriers until `q` or end of input.
pub async fn browse(ctx: &Context) -> Result<()> {
    let list = ctx.list_view(Context::confirmation(false));
    list.mount().await?;
    output::print_list(&list, ctx.format);
    eprintln!("{HELP}");

    loop {
        eprint!("> ");
        io::stderr().flush().ok();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => continue,
            "q" | "quit" => break,
            "h" | "help" | "?" => {
                eprintln!("{HELP}");
                continue;
            }
            "n" => {
                if !list.next_page().await? {
                    eprintln!("Already on the last page.");
                    continue;
                }
            }
            "p" => {
                if !list.previous_page().await? {
                    eprintln!("Already on the first page.");
                    continue;
                }
            }
            "r" => list.retry().await?,
            "a" => {
                let route = list.create_route();
                if ctx.submit_form(&route, rest).await.is_ok() {
                    list.retry().await?;
                }
            }
            "e" => {
                let (row_arg, name) = rest.split_once(' ').unwrap_or((rest, ""));
                let Some(carrier) = row(&list, row_arg) else {
                    eprintln!("No row {row_arg} on this page.");
                    continue;
                };
                let route = list.edit_route(&carrier);
                if ctx.submit_form(&route, name.trim()).await.is_ok() {
                    list.retry().await?;
                }
            }
            "d" => {
                let Some(carrier) = row(&list, rest) else {
                    eprintln!("No row {rest} on this page.");
                    continue;
                };
                if let Err(e) = list.delete(&carrier).await {
                    debug!(error = %e, "Delete failed in browse");
                }
            }
            other => match other.parse::<u32>() {
                Ok(page) => {
                    if !list.go_to(page).await? {
                        eprintln!("Page {page} is out of range.");
                        continue;
                    }
                }
                Err(_) => {
                    eprintln!("Unknown command: {other} (h for help)");
                    continue;
                }
            },
        }

        output::print_list(&list, ctx.format);
    }

    Ok(())
}

/// Carrier shown on 1-based `row` of the current page.
fn row(list: &ListViewController, row: &str) -> Option<Carrier> {
    let index = row.parse::<usize>().ok()?.checked_sub(1)?;
    match list.state() {
        ListState::Loaded { items, .. } => items.into_iter().nth(index),
        _ => None,
    }
}
