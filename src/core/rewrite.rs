//! Marker call substitution.
//!
//! `i18n.s('你好')` becomes `i18n.t('hello')` once the index knows the phrase;
//! `i18n.s('名称', 'dl')` becomes `i18n.t('dl:name')`. The rewriter does no I/O:
//! unresolved phrases are returned to the caller.

use std::path::{Component, Path};

use crate::config::{Config, DEFAULT_NAMESPACE, NAMESPACE_SEPARATOR};
use crate::core::call::{MarkerCall, SourceLocation, match_marker, quote_js};
use crate::core::index::NamespaceIndex;
use crate::core::parsers::{CallSource, SourceUnit, call_source};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Unresolved phrases are left in place and handed to the coordinator.
    #[default]
    Development,
    /// Unresolved phrases fail the build.
    Production,
}

/// A marker call whose phrase has no key yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPhrase {
    pub phrase: String,
    pub namespace: String,
    pub location: SourceLocation,
    pub source_line: String,
}

impl UnresolvedPhrase {
    fn into_error(self) -> Error {
        Error::MissingTranslation {
            phrase: self.phrase,
            namespace: self.namespace,
            file_path: self.location.file_path,
            line: self.location.line,
            col: self.location.col,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    pub code: String,
    /// Number of marker calls replaced.
    pub replaced: usize,
    pub unresolved: Vec<UnresolvedPhrase>,
}

impl RewriteOutput {
    fn unchanged(code: &str) -> Self {
        Self {
            code: code.to_string(),
            replaced: 0,
            unresolved: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        self.replaced > 0
    }
}

/// The string passed to `t()`: the bare key for the default namespace,
/// `<namespace>:<key>` otherwise.
pub fn format_key_reference(namespace: &str, key: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        key.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{key}")
    }
}

pub struct SourceRewriter {
    marker: String,
    namespaces: Vec<String>,
    mode: BuildMode,
    vendor_dirs: Vec<String>,
    call_source: Box<dyn CallSource>,
}

impl SourceRewriter {
    pub fn new(
        marker: impl Into<String>,
        namespaces: Vec<String>,
        mode: BuildMode,
        vendor_dirs: Vec<String>,
        call_source: Box<dyn CallSource>,
    ) -> Self {
        Self {
            marker: marker.into(),
            namespaces,
            mode,
            vendor_dirs,
            call_source,
        }
    }

    pub fn from_config(config: &Config, mode: BuildMode) -> Result<Self> {
        let source = call_source(config.parser, &config.marker_variable)?;
        Ok(Self::new(
            config.marker_variable.clone(),
            config.namespaces.clone(),
            mode,
            config.vendor_dirs.clone(),
            source,
        ))
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether `path` lies below a vendored-code root.
    pub fn is_vendored(&self, path: &str) -> bool {
        Path::new(path).components().any(|component| match component {
            Component::Normal(name) => self
                .vendor_dirs
                .iter()
                .any(|dir| name.to_str() == Some(dir.as_str())),
            _ => false,
        })
    }

    /// Marker calls of a unit in source order.
    pub fn find_markers(&self, unit: &SourceUnit) -> Result<Vec<MarkerCall>> {
        let mut markers: Vec<MarkerCall> = self
            .call_source
            .calls(unit)?
            .iter()
            .filter_map(|call| match_marker(call, &self.marker))
            .collect();
        markers.sort_by_key(|m| m.span.start);
        Ok(markers)
    }

    /// Marker calls of a unit, with unknown namespaces rejected.
    pub fn marker_calls(&self, unit: &SourceUnit) -> Result<Vec<MarkerCall>> {
        let markers = self.find_markers(unit)?;
        for marker in &markers {
            let namespace = marker.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
            if !self.namespaces.iter().any(|ns| ns == namespace) {
                return Err(Error::configuration(format!(
                    "namespace \"{}\" used at {}:{}:{} is not configured",
                    namespace, marker.location.file_path, marker.location.line, marker.location.col
                )));
            }
        }
        Ok(markers)
    }

    /// Rewrite a unit according to the build mode.
    ///
    /// In production the first unresolved phrase is a [`Error::MissingTranslation`].
    pub fn rewrite(&self, unit: &SourceUnit, index: &NamespaceIndex) -> Result<RewriteOutput> {
        let output = self.rewrite_collecting(unit, index)?;
        if self.mode == BuildMode::Production
            && let Some(first) = output.unresolved.first()
        {
            return Err(first.clone().into_error());
        }
        Ok(output)
    }

    /// Rewrite a unit, returning every unresolved phrase regardless of mode.
    pub fn rewrite_collecting(
        &self,
        unit: &SourceUnit,
        index: &NamespaceIndex,
    ) -> Result<RewriteOutput> {
        if self.is_vendored(&unit.path) {
            return Ok(RewriteOutput::unchanged(&unit.code));
        }

        let markers = self.marker_calls(unit)?;
        let mut code = String::with_capacity(unit.code.len());
        let mut cursor = 0;
        let mut replaced = 0;
        let mut unresolved = Vec::new();

        for marker in markers {
            let namespace = marker
                .namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

            let Some(key) = index.lookup(&namespace, &marker.phrase) else {
                unresolved.push(UnresolvedPhrase {
                    phrase: marker.phrase,
                    namespace,
                    location: marker.location,
                    source_line: marker.source_line,
                });
                continue;
            };

            let Some(before) = unit.code.get(cursor..marker.span.start) else {
                continue;
            };
            code.push_str(before);
            code.push_str(&format!(
                "{}.t({})",
                self.marker,
                quote_js(&format_key_reference(&namespace, key), marker.quote)
            ));
            cursor = marker.span.end;
            replaced += 1;
        }
        code.push_str(unit.code.get(cursor..).unwrap_or_default());

        if replaced > 0 {
            tracing::debug!(file = %unit.path, replaced, unresolved = unresolved.len(), "rewrote markers");
        }

        Ok(RewriteOutput {
            code,
            replaced,
            unresolved,
        })
    }
}
