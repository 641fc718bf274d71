//! Link command handlers
//!
//! Each command fetches the links once, then works on the fresh snapshot.

use anyhow::{anyhow, bail, Result};

use savvylinks_core::{LinkAction, LinkRecord, LinksEngine, RefreshOutcome};

use crate::output::Output;

/// Fetch links into the engine's cache
async fn fetch(engine: &LinksEngine) -> Result<()> {
    engine.load_token();
    match engine.refresh_now().await {
        RefreshOutcome::Updated(_) | RefreshOutcome::Coalesced => Ok(()),
        RefreshOutcome::Cleared => bail!(
            "No API token configured. Set it with:\n  \
             savvylinks config set token <your-token>\n\
             or export SAVVYLINKS_TOKEN"
        ),
        RefreshOutcome::Failed(e) => Err(anyhow!(e).context("Failed to fetch links")),
    }
}

/// Resolve a link by id from the freshly fetched snapshot
fn resolve(engine: &LinksEngine, id: &str) -> Result<LinkRecord> {
    engine
        .find(id)
        .ok_or_else(|| anyhow!("Link not found: {}", id))
}

/// List links, optionally filtered by a search
pub async fn list(engine: &LinksEngine, search: Option<String>, output: &Output) -> Result<()> {
    fetch(engine).await?;
    let items = engine.query(search.as_deref().unwrap_or(""));
    output.print_results(&items);
    Ok(())
}

/// Show the actions available for a link
pub async fn show(engine: &LinksEngine, id: String, output: &Output) -> Result<()> {
    fetch(engine).await?;
    let record = resolve(engine, &id)?;
    output.print_menu(&engine.context_menu(&record));
    Ok(())
}

/// Run an action on a link
pub async fn run_action(engine: &LinksEngine, id: String, action: LinkAction) -> Result<()> {
    fetch(engine).await?;
    let record = resolve(engine, &id)?;

    if !engine.dispatch(action, &record).await {
        bail!("{} failed for {}", action.title(), record.display_label());
    }
    Ok(())
}
