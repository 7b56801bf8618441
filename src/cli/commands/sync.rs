//! `sync`: translate every unresolved phrase once and reconcile the locale files.

use anyhow::{Context, Result};

use super::{FeedResult, feed, load};
use crate::cli::args::SyncCommand;
use crate::cli::exit_status::ExitStatus;
use crate::cli::report::{
    Severity, print_flush, print_reconcile, print_scan_failures, print_unresolved,
};
use crate::core::{BuildContext, BuildMode};

pub async fn sync(cmd: SyncCommand) -> Result<ExitStatus> {
    let verbose = cmd.common.verbose;
    let (config, root) = load(&cmd.common)?;
    let ctx = BuildContext::new(config, &root, BuildMode::Development, verbose)?;
    let coordinator = ctx
        .coordinator
        .as_ref()
        .context("sync has no translation coordinator")?;

    let scan = ctx.sources.scan();
    let mut result = FeedResult::default();
    feed(&ctx, &scan.files, &mut result)?;
    print_scan_failures(&result.failures, verbose);

    let report = coordinator.flush().await?;
    print_flush(&report);

    // Nothing translated means nothing was reconciled yet; still prune and backfill.
    let reconcile = match report.reconcile.clone() {
        Some(reconcile) => reconcile,
        None => coordinator.reconcile(&[])?,
    };
    print_reconcile(&reconcile);

    feed(&ctx, &report.affected_files, &mut result)?;
    let unresolved = result.unresolved();
    if !unresolved.is_empty() {
        print_unresolved(&unresolved, Severity::Warning);
    }

    let clean = unresolved.is_empty()
        && result.failures.is_empty()
        && report.failures.is_empty()
        && !report.timed_out;
    Ok(if clean {
        ExitStatus::Success
    } else {
        ExitStatus::Failure
    })
}
