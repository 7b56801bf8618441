//! Per-configuration wiring of the core engines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::core::coordinator::{CoordinatorOptions, TranslationCoordinator};
use crate::core::index::IndexHandle;
use crate::core::parsers::SourceUnit;
use crate::core::reconcile::{ReconcileOptions, ResourceReconciler};
use crate::core::resource::ResourceStore;
use crate::core::rewrite::{BuildMode, RewriteOutput, SourceRewriter};
use crate::core::scan::{Scanner, SourceSet};
use crate::core::scheduler::Scheduler;
use crate::error::Result;
use crate::translate::{Translator, build_translator};

/// Owns everything one build needs: the index handle, the rewriter and,
/// in development mode, the translation coordinator.
pub struct BuildContext {
    pub config: Config,
    pub root: PathBuf,
    pub index: Arc<IndexHandle>,
    pub rewriter: SourceRewriter,
    pub sources: SourceSet,
    pub coordinator: Option<TranslationCoordinator>,
}

impl BuildContext {
    /// Validate the configuration and build a context, creating the
    /// configured translator in development mode.
    pub fn new(config: Config, root: &Path, mode: BuildMode, verbose: bool) -> Result<Self> {
        config.validate()?;
        let translator = match mode {
            BuildMode::Development => Some(build_translator(&config)?),
            BuildMode::Production => None,
        };
        Self::assemble(config, root, mode, verbose, translator)
    }

    /// Development context with an explicit translator.
    pub fn with_translator(
        config: Config,
        root: &Path,
        verbose: bool,
        translator: Box<dyn Translator>,
    ) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, root, BuildMode::Development, verbose, Some(translator))
    }

    fn assemble(
        config: Config,
        root: &Path,
        mode: BuildMode,
        verbose: bool,
        translator: Option<Box<dyn Translator>>,
    ) -> Result<Self> {
        let store = ResourceStore::new(
            config.locale_dir(root),
            config.source_language.clone(),
            config.target_language.clone(),
        );
        let index = Arc::new(IndexHandle::open(
            store.clone(),
            config.default_language,
            config.untranslated_value.clone(),
        )?);

        let coordinator = match translator {
            Some(translator) => Some(TranslationCoordinator::new(
                translator,
                index.clone(),
                ResourceReconciler::new(store, ReconcileOptions::from_config(&config)),
                Scanner::from_config(&config, root, verbose)?,
                CoordinatorOptions::from_config(&config),
            )),
            None => None,
        };

        Ok(Self {
            rewriter: SourceRewriter::from_config(&config, mode)?,
            sources: SourceSet::from_config(&config, root, verbose),
            root: root.to_path_buf(),
            index,
            coordinator,
            config,
        })
    }

    pub fn mode(&self) -> BuildMode {
        self.rewriter.mode()
    }

    /// Rewrite one unit against the current index; in development mode the
    /// unresolved phrases are queued for the next flush.
    pub fn rewrite(&self, unit: &SourceUnit) -> Result<RewriteOutput> {
        let output = self.rewriter.rewrite(unit, &self.index.current())?;
        if let Some(coordinator) = &self.coordinator {
            coordinator.enqueue_unresolved(&output.unresolved);
        }
        Ok(output)
    }

    /// Like [`BuildContext::rewrite`], but unresolved phrases never fail the
    /// call, even in production mode.
    pub fn rewrite_collecting(&self, unit: &SourceUnit) -> Result<RewriteOutput> {
        let output = self
            .rewriter
            .rewrite_collecting(unit, &self.index.current())?;
        if let Some(coordinator) = &self.coordinator {
            coordinator.enqueue_unresolved(&output.unresolved);
        }
        Ok(output)
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.config.interval())
    }
}
