pub mod build;
pub mod init;
pub mod sync;
pub mod watch;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use super::args::CommonArgs;
use super::report::RewriteSummary;
use crate::config::{Config, load_config};
use crate::core::BuildContext;
use crate::core::rewrite::{RewriteOutput, UnresolvedPhrase};
use crate::core::scan::ScanFailure;
use crate::error::Error;

/// Load the configuration for a command and apply CLI overrides.
pub fn load(common: &CommonArgs) -> Result<(Config, PathBuf)> {
    let start = match &common.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let loaded = load_config(&start)?;
    if !loaded.from_file && common.verbose {
        eprintln!(
            "{} no {} found, using defaults",
            "warning:".bold().yellow(),
            crate::config::CONFIG_FILE_NAME
        );
    }

    let mut config = loaded.config;
    if let Some(locale_path) = &common.locale_path {
        config.locale_path = Some(locale_path.clone());
    }
    let root = common.root.clone().unwrap_or(loaded.root);
    Ok((config, root))
}

/// Rewrite results of the files fed so far, keyed by file.
#[derive(Debug, Default)]
pub struct FeedResult {
    pub outputs: BTreeMap<String, RewriteOutput>,
    pub failures: Vec<ScanFailure>,
}

impl FeedResult {
    pub fn summary(&self) -> RewriteSummary {
        RewriteSummary {
            files: self.outputs.len(),
            changed_files: self.outputs.values().filter(|o| o.is_changed()).count(),
            replaced: self.outputs.values().map(|o| o.replaced).sum(),
            unresolved: self.outputs.values().map(|o| o.unresolved.len()).sum(),
        }
    }

    pub fn unresolved(&self) -> Vec<UnresolvedPhrase> {
        self.outputs
            .values()
            .flat_map(|o| o.unresolved.iter().cloned())
            .collect()
    }

    /// Write every output below `out_dir`.
    pub fn write(&self, out_dir: &Path) -> Result<(), Error> {
        for (file, output) in &self.outputs {
            write_output(out_dir, file, &output.code)?;
        }
        Ok(())
    }
}

/// Rewrite `files` through the context, replacing earlier results for the same files.
///
/// Parse failures are collected; every other error is returned.
pub fn feed<'a>(
    ctx: &BuildContext,
    files: impl IntoIterator<Item = &'a String>,
    result: &mut FeedResult,
) -> Result<(), Error> {
    for file in files {
        let unit = ctx.sources.read_unit(file)?;
        result.failures.retain(|f| f.file_path != *file);
        match ctx.rewrite_collecting(&unit) {
            Ok(output) => {
                result.outputs.insert(file.clone(), output);
            }
            Err(err @ Error::Parse { .. }) => {
                result.outputs.remove(file);
                tracing::debug!(file = %file, "{}", err);
                result.failures.push(ScanFailure {
                    file_path: file.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Mirror `relative` below `out_dir` and write `code` there.
pub fn write_output(out_dir: &Path, relative: &str, code: &str) -> Result<(), Error> {
    let path = out_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(&path, code).map_err(|e| Error::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_mirrors_relative_path() {
        let dir = tempdir().unwrap();
        write_output(dir.path(), "src/pages/home.ts", "i18n.t('home')").unwrap();
        let written = fs::read_to_string(dir.path().join("src/pages/home.ts")).unwrap();
        assert_eq!(written, "i18n.t('home')");
    }

    #[test]
    fn test_load_applies_overrides() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(crate::config::CONFIG_FILE_NAME),
            r#"{"localePath": "./locales", "namespaces": ["default"]}"#,
        )
        .unwrap();

        let common = CommonArgs {
            root: Some(dir.path().to_path_buf()),
            locale_path: Some("./i18n".to_string()),
            verbose: false,
        };
        let (config, root) = load(&common).unwrap();
        assert_eq!(config.locale_path.as_deref(), Some("./i18n"));
        assert_eq!(root, dir.path());
    }
}
