//! `build`: rewrite every marker call in the source set.
//!
//! Production builds resolve against the locale files as they are and fail on
//! any phrase without a translation. Development builds request translations
//! for those phrases, flush once and rewrite the affected files again.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use super::{FeedResult, feed, load};
use crate::cli::args::BuildCommand;
use crate::cli::exit_status::ExitStatus;
use crate::cli::report::{
    Severity, print_flush, print_rewrite_summary, print_scan_failures, print_unresolved,
};
use crate::core::{BuildContext, BuildMode};

pub async fn build(cmd: BuildCommand) -> Result<ExitStatus> {
    let verbose = cmd.common.verbose;
    let (config, root) = load(&cmd.common)?;
    let mode = if cmd.production {
        BuildMode::Production
    } else {
        BuildMode::Development
    };
    let ctx = BuildContext::new(config, &root, mode, verbose)?;
    let scan = ctx.sources.scan();
    tracing::debug!(
        files = scan.files.len(),
        skipped = scan.skipped_count,
        ?mode,
        "starting build"
    );

    let mut result = FeedResult::default();
    feed(&ctx, &scan.files, &mut result)?;

    let status = match mode {
        BuildMode::Production => production(&result),
        BuildMode::Development => development(&ctx, &mut result, verbose).await?,
    };
    if status == ExitStatus::Error {
        return Ok(status);
    }

    finish(&result, cmd.out_dir.as_deref())?;
    Ok(status)
}

fn production(result: &FeedResult) -> ExitStatus {
    if !result.failures.is_empty() {
        print_scan_failures(&result.failures, true);
        return ExitStatus::Error;
    }

    let unresolved = result.unresolved();
    if unresolved.is_empty() {
        return ExitStatus::Success;
    }
    print_unresolved(&unresolved, Severity::Error);
    eprintln!(
        "{} {} {} without a translation, build aborted",
        "error:".bold().red(),
        unresolved.len(),
        if unresolved.len() == 1 {
            "phrase"
        } else {
            "phrases"
        }
    );
    ExitStatus::Error
}

async fn development(
    ctx: &BuildContext,
    result: &mut FeedResult,
    verbose: bool,
) -> Result<ExitStatus> {
    print_scan_failures(&result.failures, verbose);
    let coordinator = ctx
        .coordinator
        .as_ref()
        .context("development build has no translation coordinator")?;

    if coordinator.pending_len() > 0 {
        match coordinator.flush().await {
            Ok(report) => {
                print_flush(&report);
                feed(ctx, &report.affected_files, result)?;
            }
            Err(err) if !err.is_fatal() => tracing::warn!("{}", err),
            Err(err) => return Err(err.into()),
        }
    }

    let unresolved = result.unresolved();
    if unresolved.is_empty() {
        return Ok(ExitStatus::Success);
    }
    print_unresolved(&unresolved, Severity::Warning);
    Ok(ExitStatus::Failure)
}

fn finish(result: &FeedResult, out_dir: Option<&Path>) -> Result<()> {
    if let Some(out_dir) = out_dir {
        result.write(out_dir)?;
    }
    print_rewrite_summary(&result.summary(), out_dir.is_none());
    Ok(())
}
