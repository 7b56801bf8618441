//! Batched translation of unresolved phrases.
//!
//! The rewriter enqueues phrases it could not resolve; the scheduler calls
//! [`TranslationCoordinator::flush`] on every tick. A flush translates each
//! unique phrase once, races the whole batch against one timeout, checks the
//! produced keys for conflicts, and hands the outcomes to the reconciler.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;

use crate::config::{Config, KeyLanguage};
use crate::core::escape_key;
use crate::core::index::{IndexHandle, NamespaceIndex};
use crate::core::reconcile::{ReconcileReport, ResourceReconciler};
use crate::core::rewrite::UnresolvedPhrase;
use crate::core::scan::Scanner;
use crate::error::{Error, Result};
use crate::translate::Translator;

/// Appended to a key claimed by more than one phrase of a namespace.
pub const CONFLICT_SUFFIX: &str = "__CONFLICT__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub source_phrase: String,
    pub namespace: String,
    pub key: String,
    /// Post-processed translation, unescaped.
    pub translated_value: String,
    pub conflict: bool,
}

/// Two phrases of one namespace produced the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationConflict {
    pub namespace: String,
    /// The key both phrases produced, without the conflict suffix.
    pub key: String,
    pub phrase: String,
    pub existing_phrase: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFailure {
    pub phrase: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    /// Unique phrases sent to the translator.
    pub requested: usize,
    pub outcomes: Vec<TranslationOutcome>,
    pub conflicts: Vec<TranslationConflict>,
    pub failures: Vec<TranslationFailure>,
    /// Files that enqueued phrases in this window; the host should feed them again.
    pub affected_files: BTreeSet<String>,
    pub timed_out: bool,
    pub reconcile: Option<ReconcileReport>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.requested == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    pub timeout: Duration,
    pub lowercase_first: bool,
    pub key_language: KeyLanguage,
}

impl CoordinatorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.timeout(),
            lowercase_first: config.lowercase_first,
            key_language: config.default_language,
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    /// `(phrase, namespace)` pairs.
    requests: BTreeSet<(String, String)>,
    files: BTreeSet<String>,
}

pub struct TranslationCoordinator {
    translator: Box<dyn Translator>,
    index: Arc<IndexHandle>,
    reconciler: ResourceReconciler,
    scanner: Scanner,
    options: CoordinatorOptions,
    pending: Mutex<Pending>,
    version: watch::Sender<u64>,
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply the text transformations to a raw translation.
///
/// Returns `(translated_value, key)`.
pub fn post_process(
    phrase: &str,
    translation: &str,
    options: &CoordinatorOptions,
) -> (String, String) {
    let value = if options.lowercase_first {
        lowercase_first(translation)
    } else {
        translation.to_string()
    };
    let key = match options.key_language {
        KeyLanguage::Target => escape_key(&value),
        KeyLanguage::Source => escape_key(phrase),
    };
    (value, key)
}

/// Turn translated `(phrase, namespace, key, value)` candidates into outcomes,
/// marking keys already held by a different phrase.
///
/// Candidates are processed in the given order; the first claimant of a key wins.
/// Later claimants get `<key>__CONFLICT__`, then `<key>__CONFLICT__2`, and so on,
/// so no two phrases of a namespace ever share a key.
pub fn detect_conflicts(
    candidates: Vec<(String, String, String, String)>,
    index: &NamespaceIndex,
) -> (Vec<TranslationOutcome>, Vec<TranslationConflict>) {
    let mut claimed: HashMap<(String, String), String> = HashMap::new();
    let mut outcomes = Vec::with_capacity(candidates.len());
    let mut conflicts = Vec::new();

    for (phrase, namespace, key, value) in candidates {
        // Phrase other than `phrase` holding `key`, in the index or this batch
        let holder = |claimed: &HashMap<(String, String), String>, key: &str| {
            index
                .phrase_for_key(&namespace, key)
                .filter(|existing| *existing != phrase)
                .map(str::to_string)
                .or_else(|| {
                    claimed
                        .get(&(namespace.clone(), key.to_string()))
                        .filter(|existing| **existing != phrase)
                        .cloned()
                })
        };

        let Some(existing_phrase) = holder(&claimed, &key) else {
            claimed.insert((namespace.clone(), key.clone()), phrase.clone());
            outcomes.push(TranslationOutcome {
                source_phrase: phrase,
                namespace,
                key,
                translated_value: value,
                conflict: false,
            });
            continue;
        };

        let mut marked = format!("{key}{CONFLICT_SUFFIX}");
        let mut attempt = 1;
        while holder(&claimed, &marked).is_some() {
            attempt += 1;
            marked = format!("{key}{CONFLICT_SUFFIX}{attempt}");
        }

        tracing::warn!(
            namespace = %namespace,
            key = %key,
            marked = %marked,
            phrase = %phrase,
            existing = %existing_phrase,
            "translation conflict: key already used by another phrase"
        );
        claimed.insert((namespace.clone(), marked.clone()), phrase.clone());
        outcomes.push(TranslationOutcome {
            source_phrase: phrase.clone(),
            namespace: namespace.clone(),
            key: marked,
            translated_value: value,
            conflict: true,
        });
        conflicts.push(TranslationConflict {
            namespace,
            key,
            phrase,
            existing_phrase,
        });
    }

    (outcomes, conflicts)
}

impl TranslationCoordinator {
    pub fn new(
        translator: Box<dyn Translator>,
        index: Arc<IndexHandle>,
        reconciler: ResourceReconciler,
        scanner: Scanner,
        options: CoordinatorOptions,
    ) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            translator,
            index,
            reconciler,
            scanner,
            options,
            pending: Mutex::new(Pending::default()),
            version,
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a phrase for the next flush. Idempotent per `(phrase, namespace)`.
    pub fn enqueue(&self, phrase: &str, namespace: &str, file: &str) {
        let mut pending = self.pending();
        pending
            .requests
            .insert((phrase.to_string(), namespace.to_string()));
        pending.files.insert(file.to_string());
    }

    pub fn enqueue_unresolved(&self, unresolved: &[UnresolvedPhrase]) {
        for phrase in unresolved {
            self.enqueue(&phrase.phrase, &phrase.namespace, &phrase.location.file_path);
        }
    }

    /// Number of `(phrase, namespace)` pairs waiting for a flush.
    pub fn pending_len(&self) -> usize {
        self.pending().requests.len()
    }

    /// Index version, bumped after every refresh caused by a flush.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    /// Translate everything pending and persist the results.
    pub async fn flush(&self) -> Result<FlushReport> {
        let Pending { requests, files } = std::mem::take(&mut *self.pending());
        let mut report = FlushReport {
            affected_files: files,
            ..Default::default()
        };
        if requests.is_empty() {
            return Ok(report);
        }

        let phrases: BTreeSet<&str> = requests.iter().map(|(phrase, _)| phrase.as_str()).collect();
        report.requested = phrases.len();
        tracing::info!(
            phrases = phrases.len(),
            provider = self.translator.name(),
            "translating pending phrases"
        );

        let calls = phrases.iter().map(|phrase| async move {
            (*phrase, self.translator.translate(phrase).await)
        });
        let settled = match tokio::time::timeout(self.options.timeout, join_all(calls)).await {
            Ok(settled) => settled,
            Err(_) => {
                tracing::warn!("{}", Error::TranslationTimeout(self.options.timeout));
                report.timed_out = true;
                return Ok(report);
            }
        };

        let mut translations: HashMap<&str, String> = HashMap::new();
        for (phrase, result) in settled {
            match result {
                Ok(translation) => {
                    translations.insert(phrase, translation);
                }
                Err(err) => {
                    let err = Error::from(err);
                    tracing::warn!(phrase = %phrase, "{}", err);
                    report.failures.push(TranslationFailure {
                        phrase: phrase.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let candidates = requests
            .iter()
            .filter_map(|(phrase, namespace)| {
                let translation = translations.get(phrase.as_str())?;
                let (value, key) = post_process(phrase, translation, &self.options);
                Some((phrase.clone(), namespace.clone(), key, value))
            })
            .collect();
        let (outcomes, conflicts) = detect_conflicts(candidates, &self.index.current());
        report.outcomes = outcomes;
        report.conflicts = conflicts;

        if !report.outcomes.is_empty() {
            report.reconcile = Some(self.reconcile(&report.outcomes)?);
        }

        tracing::info!(
            translated = report.outcomes.len(),
            conflicts = report.conflicts.len(),
            failures = report.failures.len(),
            "flush finished"
        );
        Ok(report)
    }

    /// Full scan and merge with the persisted documents; the index is refreshed
    /// and its version bumped only when a document was written.
    pub fn reconcile(&self, outcomes: &[TranslationOutcome]) -> Result<ReconcileReport> {
        let scan = self.scanner.scan(outcomes, &self.index.current());
        let report = self.reconciler.reconcile(outcomes, &scan)?;
        if report.written() {
            self.index.refresh()?;
            self.version.send_modify(|version| *version += 1);
        }
        Ok(report)
    }
}
