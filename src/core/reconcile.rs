//! Merge of translation outcomes, observed keys and persisted documents.
//!
//! [`merge`] is pure; [`ResourceReconciler`] wraps it with loading and
//! change-detecting writes.

use crate::config::{Config, KeyLanguage};
use crate::core::coordinator::TranslationOutcome;
use crate::core::resource::{ResourceDocument, ResourceStore};
use crate::core::scan::{ObservedKeys, ObservedScan};
use crate::core::unescape_key;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub key_language: KeyLanguage,
    pub sentinel: String,
    /// Remove persisted keys that the latest full scan did not observe.
    pub prune: bool,
}

impl ReconcileOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            key_language: config.default_language,
            sentinel: config.untranslated_value.clone(),
            prune: config.remove_unused_keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocuments {
    pub source: ResourceDocument,
    pub target: ResourceDocument,
    /// Keys removed from the source document by pruning.
    pub pruned: usize,
}

fn is_observed(observed: &ObservedKeys, namespace: &str, key: &str) -> bool {
    observed
        .get(namespace)
        .is_some_and(|keys| keys.contains_key(key))
}

fn translated_value<'a>(
    outcomes: &'a [TranslationOutcome],
    namespace: &str,
    key: &str,
) -> Option<&'a str> {
    outcomes
        .iter()
        .find(|o| o.namespace == namespace && o.key == key)
        .map(|o| o.translated_value.as_str())
}

/// Copy every key of `from` missing in `to` into `to` with the sentinel.
fn mirror_keys(from: &ResourceDocument, to: &mut ResourceDocument, sentinel: &str) {
    for (namespace, entries) in from.namespaces() {
        let target = to.namespace_mut(namespace);
        for key in entries.keys() {
            target
                .entry(key.clone())
                .or_insert_with(|| sentinel.to_string());
        }
    }
}

pub fn merge(
    outcomes: &[TranslationOutcome],
    observed: &ObservedKeys,
    mut source: ResourceDocument,
    mut target: ResourceDocument,
    options: &ReconcileOptions,
) -> MergedDocuments {
    let sentinel = options.sentinel.as_str();

    // Keys produced by this batch count as observed even when the file that
    // raised them lies outside the scanned source set.
    let mut observed = observed.clone();
    for outcome in outcomes {
        observed
            .entry(outcome.namespace.clone())
            .or_default()
            .entry(outcome.key.clone())
            .or_insert_with(|| outcome.source_phrase.clone());
    }

    let mut pruned = 0;
    if options.prune {
        let before = source.key_count();
        source.retain(|ns, key| is_observed(&observed, ns, key));
        target.retain(|ns, key| is_observed(&observed, ns, key));
        pruned = before - source.key_count();
    }

    for (namespace, keys) in &observed {
        for key in keys.keys() {
            for doc in [&mut source, &mut target] {
                doc.namespace_mut(namespace)
                    .entry(key.clone())
                    .or_insert_with(|| sentinel.to_string());
            }
        }
    }

    mirror_keys(&source.clone(), &mut target, sentinel);
    mirror_keys(&target.clone(), &mut source, sentinel);

    for (namespace, entries) in source.clone().namespaces() {
        for (key, value) in entries {
            if value != sentinel {
                continue;
            }
            let phrase = observed
                .get(namespace)
                .and_then(|keys| keys.get(key))
                .cloned()
                .or_else(|| (options.key_language == KeyLanguage::Source).then(|| unescape_key(key)));
            if let Some(phrase) = phrase {
                source.insert(namespace, key.clone(), phrase);
            }
        }
    }

    for (namespace, entries) in target.clone().namespaces() {
        for (key, value) in entries {
            if value != sentinel {
                continue;
            }
            let translation = translated_value(outcomes, namespace, key)
                .map(str::to_string)
                .or_else(|| (options.key_language == KeyLanguage::Target).then(|| unescape_key(key)));
            if let Some(translation) = translation {
                target.insert(namespace, key.clone(), translation);
            }
        }
    }

    MergedDocuments {
        source,
        target,
        pruned,
    }
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub source_written: bool,
    pub target_written: bool,
    pub pruned: usize,
    /// Whether pruning was skipped because the full scan was incomplete.
    pub prune_skipped: bool,
}

impl ReconcileReport {
    pub fn written(&self) -> bool {
        self.source_written || self.target_written
    }
}

pub struct ResourceReconciler {
    store: ResourceStore,
    options: ReconcileOptions,
}

impl ResourceReconciler {
    pub fn new(store: ResourceStore, options: ReconcileOptions) -> Self {
        Self { store, options }
    }

    /// Load both documents, merge and write whichever changed.
    pub fn reconcile(
        &self,
        outcomes: &[TranslationOutcome],
        scan: &ObservedScan,
    ) -> Result<ReconcileReport> {
        let source = self.store.load_source()?;
        let target = self.store.load_target()?;

        let mut options = self.options.clone();
        let prune_skipped = options.prune && !scan.is_complete();
        if prune_skipped {
            tracing::warn!(
                failures = scan.failures.len(),
                "skipping key pruning: some source files could not be scanned"
            );
            options.prune = false;
        }

        let merged = merge(outcomes, &scan.observed, source, target, &options);
        if merged.pruned > 0 {
            tracing::info!(pruned = merged.pruned, "removed unused keys");
        }

        let source_written = self
            .store
            .save_if_changed(&self.store.source_language, &merged.source)?;
        let target_written = self
            .store
            .save_if_changed(&self.store.target_language, &merged.target)?;

        Ok(ReconcileReport {
            source_written,
            target_written,
            pruned: merged.pruned,
            prune_skipped,
        })
    }
}
