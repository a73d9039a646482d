//! Simulate join bursts against the scheduler
//!
//! By default the scheduler runs on a virtual clock, so the output is
//! immediate and exact. `--realtime` drives it with the tokio timer instead.

use crate::{system_config, util};
use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream::Stdout};
use scheduler::{JoinScheduler, ManualTimer, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use sync_core::Handle;

/// Options for a simulation run
pub struct SimulateArgs {
    /// Override of the configured interval
    pub interval_ms: Option<i64>,
    /// Join offsets in milliseconds from the start
    pub joins: Vec<u64>,
    /// Number of probe actions to register
    pub actions: usize,
    /// Indices of probe actions that fail
    pub fail: Vec<usize>,
    /// Use wall-clock time
    pub realtime: bool,
}

pub async fn run(args: SimulateArgs) -> Result<()> {
    let config = system_config::load()?;
    let mut sync = config.sync.clone();
    if let Some(ms) = args.interval_ms {
        sync.min_interval_ms = ms;
    }

    let joins = util::sorted_offsets(&args.joins);
    if joins.is_empty() {
        anyhow::bail!("No join times given (use --joins 0,1000,4000)");
    }

    if args.realtime {
        run_realtime(&sync, &joins, &args).await
    } else {
        run_virtual(&sync, &joins, &args)
    }
}

/// Register probe actions, some of which fail on purpose
fn register_probes(scheduler: &JoinScheduler, count: usize, fail: &[usize]) -> Vec<Handle> {
    (0..count)
        .map(|idx| {
            let fails = fail.contains(&idx);
            scheduler.register_fn(move || {
                if fails {
                    anyhow::bail!("probe {} failed on purpose", idx);
                }
                Ok(())
            })
        })
        .collect()
}

fn run_virtual(sync: &sync_core::SyncConfig, joins: &[u64], args: &SimulateArgs) -> Result<()> {
    let timer = Arc::new(ManualTimer::new());
    let scheduler =
        JoinScheduler::from_config(sync, timer.clone()).context("Invalid sync interval")?;
    register_probes(&scheduler, args.actions, &args.fail);

    let interval = scheduler.min_interval().as_millis() as u64;
    println!(
        "{} {} joins, min interval {}, {} actions",
        "Simulating".if_supports_color(Stdout, |t| t.bold()),
        joins.len(),
        util::format_ms(scheduler.min_interval()),
        args.actions
    );

    let mut due: Option<u64> = None;
    for &at in joins {
        fire_until(&timer, &scheduler, &mut due, at);

        if scheduler.signal_join() {
            let batch_at = at
                .checked_add(interval)
                .with_context(|| format!("Join at {}ms is too late to schedule a batch", at))?;
            due = Some(batch_at);
            println!(
                "  {}  join  {} (batch due at {}ms)",
                util::format_offset(at),
                "armed".if_supports_color(Stdout, |t| t.yellow()),
                batch_at
            );
        } else {
            println!(
                "  {}  join  {}",
                util::format_offset(at),
                "coalesced".if_supports_color(Stdout, |t| t.dimmed())
            );
        }
    }

    if let Some(last) = due {
        fire_until(&timer, &scheduler, &mut due, last);
    }

    print_summary(&scheduler);
    Ok(())
}

/// Advance the virtual clock to `at`, reporting a batch that falls due
fn fire_until(timer: &ManualTimer, scheduler: &JoinScheduler, due: &mut Option<u64>, at: u64) {
    if let Some(batch_at) = *due {
        if batch_at <= at {
            timer.advance_to(Duration::from_millis(batch_at));
            *due = None;

            if let Some(report) = scheduler.last_report() {
                println!(
                    "  {}  {}  ran {} actions, {} failed",
                    util::format_offset(batch_at),
                    format!("batch {}", report.batch).if_supports_color(Stdout, |t| t.green()),
                    report.ran,
                    report.failed
                );
            }
        }
    }
    timer.advance_to(Duration::from_millis(at));
}

async fn run_realtime(
    sync: &sync_core::SyncConfig,
    joins: &[u64],
    args: &SimulateArgs,
) -> Result<()> {
    let timer = TokioTimer::current()?;
    let scheduler =
        JoinScheduler::from_config(sync, Arc::new(timer)).context("Invalid sync interval")?;
    register_probes(&scheduler, args.actions, &args.fail);

    println!(
        "{} {} joins in real time, min interval {}",
        "Simulating".if_supports_color(Stdout, |t| t.bold()),
        joins.len(),
        util::format_ms(scheduler.min_interval())
    );

    let start = tokio::time::Instant::now();
    for &at in joins {
        let deadline = start
            .checked_add(Duration::from_millis(at))
            .with_context(|| format!("Join offset {}ms is out of range", at))?;
        tokio::time::sleep_until(deadline).await;
        let armed = scheduler.signal_join();
        println!(
            "  {}  join  {}",
            util::format_offset(start.elapsed().as_millis() as u64),
            if armed { "armed" } else { "coalesced" }
        );
    }

    // Let the last armed batch fire
    tokio::time::sleep(scheduler.min_interval() + Duration::from_millis(50)).await;

    print_summary(&scheduler);
    Ok(())
}

fn print_summary(scheduler: &JoinScheduler) {
    let stats = scheduler.stats();
    println!();
    println!(
        "{} joins, {} coalesced, {} batches, {} action failures",
        stats.joins_signaled,
        stats.joins_coalesced,
        stats.batches_run,
        stats.action_failures
    );
}
