//! Error taxonomy shared by the core engines.
//!
//! Fatal errors (`Configuration`, `MissingTranslation`, `CorruptResource`, `Io`)
//! abort the current build. `Provider` and `TranslationTimeout` are recovered
//! inside the coordinator: they are logged and the affected phrases are picked
//! up again by a later rewrite pass.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::translate::ProviderError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown namespace, missing required settings or invalid values.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unresolved phrase in production mode.
    #[error(
        "missing translation for \"{phrase}\" in namespace \"{namespace}\" at {file_path}:{line}:{col}"
    )]
    MissingTranslation {
        phrase: String,
        namespace: String,
        file_path: String,
        line: usize,
        col: usize,
    },

    /// A single translate call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The whole translation batch did not settle in time.
    #[error("translation batch timed out after {0:?}")]
    TranslationTimeout(Duration),

    /// A persisted resource document is not `{ namespace: { key: string } }` JSON.
    #[error("corrupt resource file {}: {source}", path.display())]
    CorruptResource {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A source file could not be parsed.
    #[error("failed to parse {file_path}: {message}")]
    Parse { file_path: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error must abort the build rather than be retried on a later cycle.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Provider(_) | Error::TranslationTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_translation_message_names_location() {
        let err = Error::MissingTranslation {
            phrase: "你好".to_string(),
            namespace: "common".to_string(),
            file_path: "./src/app.tsx".to_string(),
            line: 3,
            col: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("你好"));
        assert!(msg.contains("common"));
        assert!(msg.contains("./src/app.tsx:3:7"));
    }

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!Error::TranslationTimeout(Duration::from_secs(5)).is_fatal());
        assert!(!Error::Provider(ProviderError::EmptyResult).is_fatal());
        assert!(Error::configuration("namespace \"x\" is not configured").is_fatal());
    }
}
