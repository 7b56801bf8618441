//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `init`: write a default `.transmarkrc.json`
//! - `build`: rewrite marker calls across the source set
//! - `sync`: translate everything unresolved and reconcile the locale files
//! - `watch`: development loop that re-feeds changed files on every tick

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Build(cmd)) => cmd.common.verbose,
            Some(Command::Sync(cmd)) => cmd.common.verbose,
            Some(Command::Watch(cmd)) => cmd.common.verbose,
            Some(Command::Init(_)) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Project root (defaults to the directory holding the config file)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Locale directory (overrides config file)
    #[arg(long)]
    pub locale_path: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct BuildCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Fail on any phrase without a translation instead of requesting one
    #[arg(long, env = "TRANSMARK_PRODUCTION")]
    pub production: bool,

    /// Write rewritten files below this directory (default is dry-run)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct WatchCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Write rewritten files below this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to create the config file in (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite i18n.s() marker calls to i18n.t() key references
    Build(BuildCommand),
    /// Translate unresolved phrases and prune unused keys from the locale files
    Sync(SyncCommand),
    /// Keep rewriting and translating until interrupted
    Watch(WatchCommand),
    /// Initialize a new .transmarkrc.json configuration file
    Init(InitCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let args = Arguments::try_parse_from([
            "transmark",
            "build",
            "--production",
            "--out-dir",
            "dist",
            "--locale-path",
            "i18n",
            "-v",
        ])
        .unwrap();
        let Some(Command::Build(cmd)) = &args.command else {
            panic!("expected build command");
        };
        assert!(cmd.production);
        assert_eq!(cmd.out_dir, Some(PathBuf::from("dist")));
        assert_eq!(cmd.common.locale_path.as_deref(), Some("i18n"));
        assert!(args.verbose());
    }

    #[test]
    fn test_cli_is_well_formed() {
        Arguments::command().debug_assert();
    }
}
