//! Run a hat try-on session against the in-memory stage
//!
//! Users join one after another on a virtual clock, each picks a hat, and
//! the attachment auto-sync resyncs every worn hat after the join burst.

use super::catalog::{self, CatalogArgs};
use crate::{system_config, util};
use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream::Stdout};
use scheduler::{JoinScheduler, ManualTimer};
use session::{HatCommand, HatSession, MemoryStage, Selection, UserId};
use std::sync::Arc;
use std::time::Duration;

/// Options for a try-on run
pub struct TryOnArgs {
    /// Where the catalog comes from
    pub catalog: CatalogArgs,
    /// Number of users joining
    pub users: usize,
    /// Milliseconds between consecutive joins
    pub spacing_ms: u64,
    /// Override of the configured auto-sync setting
    pub auto_sync: Option<bool>,
}

pub async fn run(args: TryOnArgs) -> Result<()> {
    let config = system_config::load()?;
    let (path, hats, _) = catalog::load_catalog(&args.catalog, &config)?;

    let wearable: Vec<String> = hats
        .ids()
        .filter(|id| HatCommand::parse(id).is_none())
        .map(str::to_string)
        .collect();
    if wearable.is_empty() {
        anyhow::bail!("Catalog {} has no hats to wear", path.display());
    }

    let timer = Arc::new(ManualTimer::new());
    let scheduler =
        JoinScheduler::from_config(&config.sync, timer.clone()).context("Invalid sync interval")?;
    let stage = Arc::new(MemoryStage::new());
    let auto_sync = args.auto_sync.unwrap_or(config.sync.auto_sync_attachments);
    let mut session = HatSession::new(hats, Arc::clone(&stage), scheduler.clone(), auto_sync);

    let state = if auto_sync { "on" } else { "off" };
    println!(
        "{} {} users, {} hats, auto-sync {}",
        "Try-on".if_supports_color(Stdout, |t| t.bold()),
        args.users,
        wearable.len(),
        state.if_supports_color(Stdout, |t| t.yellow())
    );

    let mut at = 0;
    for (idx, hat_id) in wearable.iter().cycle().take(args.users).enumerate() {
        at = (idx as u64)
            .checked_mul(args.spacing_ms)
            .context("Join spacing is too large for this many users")?;
        timer.advance_to(Duration::from_millis(at));

        let user = UserId::new();
        session.user_joined(user);
        let actor = match session.select(user, hat_id)? {
            Selection::Wore(actor) => actor,
            other => anyhow::bail!("Selecting {} did not put on a hat: {:?}", hat_id, other),
        };
        println!(
            "  {}  user {} joins, wears {} {}",
            util::format_offset(at),
            idx + 1,
            hat_id.if_supports_color(Stdout, |t| t.cyan()),
            format!("(actor {})", actor).if_supports_color(Stdout, |t| t.dimmed())
        );
    }

    timer.advance_to(Duration::from_millis(at) + scheduler.min_interval());

    let (detached, attached) = stage.resync_counts();
    let stats = scheduler.stats();
    println!();
    println!(
        "{} wearers, {} batches, {} detaches, {} attaches",
        session.wearers(),
        stats.batches_run,
        detached,
        attached
    );
    Ok(())
}
