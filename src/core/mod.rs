//! Core engines.
//!
//! ## Module Structure
//!
//! - `call`: normalized call view and the marker matcher
//! - `parsers`: call sources (swc tree, regex scan)
//! - `index`: phrase -> key lookup per namespace
//! - `rewrite`: marker call substitution
//! - `resource`: language documents on disk
//! - `scan`: source set walking and full scans
//! - `reconcile`: merge of outcomes, observed keys and persisted documents
//! - `coordinator`: batched translation flushes
//! - `scheduler`: timer driving the flushes
//! - `context`: per-configuration wiring of the above

pub mod call;
pub mod context;
pub mod coordinator;
pub mod index;
pub mod parsers;
pub mod reconcile;
pub mod resource;
pub mod rewrite;
pub mod scan;
pub mod scheduler;

pub use context::BuildContext;
pub use coordinator::{FlushReport, TranslationConflict, TranslationCoordinator, TranslationOutcome};
pub use index::{IndexHandle, NamespaceIndex};
pub use resource::{ResourceDocument, ResourceStore};
pub use rewrite::{BuildMode, RewriteOutput, SourceRewriter, UnresolvedPhrase};

use crate::config::{ESCAPED_SEPARATOR, NAMESPACE_SEPARATOR};

/// Escape the namespace separator so text can be used as a key.
pub fn escape_key(text: &str) -> String {
    text.replace(NAMESPACE_SEPARATOR, ESCAPED_SEPARATOR)
}

pub fn unescape_key(key: &str) -> String {
    key.replace(ESCAPED_SEPARATOR, &NAMESPACE_SEPARATOR.to_string())
}
