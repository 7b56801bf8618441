//! `watch`: rewrite changed files and flush pending translations on every
//! scheduler tick until interrupted.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::Context;

use super::{FeedResult, feed, load, write_output};
use crate::cli::args::WatchCommand;
use crate::cli::exit_status::ExitStatus;
use crate::cli::report::{print_flush, print_rewrite_summary, print_scan_failures};
use crate::core::scan::SourceSet;
use crate::core::scheduler::TickHandler;
use crate::core::{BuildContext, BuildMode, FlushReport};
use crate::error::Error;

/// Last seen modification time per source file.
#[derive(Debug, Default)]
struct ModifiedTimes(BTreeMap<String, SystemTime>);

impl ModifiedTimes {
    /// Files that are new or modified since the previous call.
    fn changed(&mut self, sources: &SourceSet) -> Vec<String> {
        let files = sources.scan().files;
        self.0.retain(|file, _| files.contains(file));
        files
            .into_iter()
            .filter(|file| {
                let Ok(modified) = fs::metadata(sources.resolve(file)).and_then(|m| m.modified())
                else {
                    return false;
                };
                self.0.insert(file.clone(), modified) != Some(modified)
            })
            .collect()
    }
}

/// Per-tick work of the watch loop: feed changed files before the flush,
/// re-feed affected files after it, and write whatever was touched.
struct WatchLoop<'a> {
    ctx: &'a BuildContext,
    out_dir: Option<&'a Path>,
    verbose: bool,
    times: ModifiedTimes,
    result: FeedResult,
    touched: BTreeSet<String>,
}

impl WatchLoop<'_> {
    fn write_touched(&mut self) -> Result<(), Error> {
        let touched = std::mem::take(&mut self.touched);
        if touched.is_empty() {
            return Ok(());
        }
        let failures: Vec<_> = self
            .result
            .failures
            .iter()
            .filter(|f| touched.contains(&f.file_path))
            .cloned()
            .collect();
        print_scan_failures(&failures, self.verbose);
        if let Some(out_dir) = self.out_dir {
            for file in &touched {
                if let Some(output) = self.result.outputs.get(file) {
                    write_output(out_dir, file, &output.code)?;
                }
            }
        }
        print_rewrite_summary(&self.result.summary(), self.out_dir.is_none());
        Ok(())
    }
}

impl TickHandler for WatchLoop<'_> {
    fn before_flush(&mut self) -> Result<(), Error> {
        let ctx = self.ctx;
        let changed = self.times.changed(&ctx.sources);
        self.result
            .outputs
            .retain(|file, _| ctx.sources.resolve(file).exists());
        feed(ctx, &changed, &mut self.result)?;
        self.touched.extend(changed);
        Ok(())
    }

    fn after_flush(&mut self, report: &FlushReport) -> Result<(), Error> {
        print_flush(report);
        feed(self.ctx, &report.affected_files, &mut self.result)?;
        self.touched.extend(report.affected_files.iter().cloned());
        self.write_touched()
    }
}

pub async fn watch(cmd: WatchCommand) -> anyhow::Result<ExitStatus> {
    let verbose = cmd.common.verbose;
    let (config, root) = load(&cmd.common)?;
    let ctx = BuildContext::new(config, &root, BuildMode::Development, verbose)?;
    let coordinator = ctx
        .coordinator
        .as_ref()
        .context("watch has no translation coordinator")?;

    let mut watch = WatchLoop {
        ctx: &ctx,
        out_dir: cmd.out_dir.as_deref(),
        verbose,
        times: ModifiedTimes::default(),
        result: FeedResult::default(),
        touched: BTreeSet::new(),
    };
    // Initial pass over every file, before the first tick
    watch.before_flush()?;
    watch.write_touched()?;

    let mut scheduler = ctx.scheduler();
    tracing::info!(
        interval = ?scheduler.period(),
        "watching {} source files",
        watch.result.outputs.len()
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
        tracing::info!("interrupted, stopping");
    };
    scheduler.run(coordinator, shutdown, &mut watch).await?;

    Ok(ExitStatus::Success)
}
