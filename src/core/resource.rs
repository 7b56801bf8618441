//! Language documents on disk: `<localePath>/<language>.json`.
//!
//! A document is `{ namespace: { key: value } }`. Both levels are kept in
//! lexicographic order, so serializing a document is deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type NamespaceEntries = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDocument(BTreeMap<String, NamespaceEntries>);

impl ResourceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text. Blank content is an empty document.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(content).map_err(|source| Error::CorruptResource {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&String, &NamespaceEntries)> {
        self.0.iter()
    }

    pub fn namespace_mut(&mut self, namespace: &str) -> &mut NamespaceEntries {
        self.0.entry(namespace.to_string()).or_default()
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.0.get(namespace)?.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, namespace: &str, key: impl Into<String>, value: impl Into<String>) {
        self.namespace_mut(namespace).insert(key.into(), value.into());
    }

    /// Keep only the entries for which `keep(namespace, key)` holds, then drop emptied namespaces.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        for (namespace, entries) in self.0.iter_mut() {
            entries.retain(|key, _| keep(namespace, key));
        }
        self.0.retain(|_, entries| !entries.is_empty());
    }

    pub fn key_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_pretty_json(&self, path: &Path) -> Result<String> {
        let content = serde_json::to_string_pretty(self).map_err(|source| Error::CorruptResource {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(format!("{}\n", content))
    }
}

impl<const N: usize> From<[(&str, &[(&str, &str)]); N]> for ResourceDocument {
    fn from(namespaces: [(&str, &[(&str, &str)]); N]) -> Self {
        let mut doc = Self::new();
        for (namespace, entries) in namespaces {
            let ns = doc.namespace_mut(namespace);
            for (key, value) in entries {
                ns.insert(key.to_string(), value.to_string());
            }
        }
        doc
    }
}

/// Reads and writes the two language documents of a project.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    locale_dir: PathBuf,
    pub source_language: String,
    pub target_language: String,
}

impl ResourceStore {
    pub fn new(
        locale_dir: impl Into<PathBuf>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            locale_dir: locale_dir.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    pub fn locale_dir(&self) -> &Path {
        &self.locale_dir
    }

    pub fn path_for(&self, language: &str) -> PathBuf {
        self.locale_dir.join(format!("{language}.json"))
    }

    /// Load a language document; a missing or blank file reads as empty.
    pub fn load(&self, language: &str) -> Result<ResourceDocument> {
        let path = self.path_for(language);
        match fs::read_to_string(&path) {
            Ok(content) => ResourceDocument::parse(&path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceDocument::new()),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    pub fn load_source(&self) -> Result<ResourceDocument> {
        self.load(&self.source_language)
    }

    pub fn load_target(&self) -> Result<ResourceDocument> {
        self.load(&self.target_language)
    }

    /// Write the document unless the file already holds the same bytes.
    ///
    /// Returns whether the file was written.
    pub fn save_if_changed(&self, language: &str, doc: &ResourceDocument) -> Result<bool> {
        let path = self.path_for(language);
        let content = doc.to_pretty_json(&path)?;

        match fs::read_to_string(&path) {
            Ok(existing) if existing == content => return Ok(false),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(path, e)),
        }

        fs::create_dir_all(&self.locale_dir).map_err(|e| Error::io(&self.locale_dir, e))?;
        fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        tracing::info!(path = %path.display(), keys = doc.key_count(), "wrote resource file");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn store(dir: &Path) -> ResourceStore {
        ResourceStore::new(dir.join("locales"), "zh", "en")
    }

    #[test]
    fn test_missing_and_empty_files_are_empty_documents() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        assert!(store.load_source().unwrap().is_empty());

        fs::create_dir_all(store.locale_dir()).unwrap();
        fs::write(store.path_for("zh"), "").unwrap();
        assert!(store.load_source().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        fs::create_dir_all(store.locale_dir()).unwrap();

        fs::write(store.path_for("zh"), "{ not json").unwrap();
        assert!(matches!(
            store.load_source().unwrap_err(),
            Error::CorruptResource { .. }
        ));

        fs::write(store.path_for("en"), r#"{"default": {"a": 1}}"#).unwrap();
        assert!(matches!(
            store.load_target().unwrap_err(),
            Error::CorruptResource { .. }
        ));
    }

    #[test]
    fn test_save_is_sorted_pretty_and_skips_unchanged() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let mut doc = ResourceDocument::new();
        doc.insert("zeta", "b", "乙");
        doc.insert("alpha", "z", "丙");
        doc.insert("alpha", "a", "甲");

        assert!(store.save_if_changed("zh", &doc).unwrap());
        let content = fs::read_to_string(store.path_for("zh")).unwrap();
        assert_eq!(
            content,
            "{\n  \"alpha\": {\n    \"a\": \"甲\",\n    \"z\": \"丙\"\n  },\n  \"zeta\": {\n    \"b\": \"乙\"\n  }\n}\n"
        );

        assert!(!store.save_if_changed("zh", &doc).unwrap());
        assert_eq!(store.load_source().unwrap(), doc);
    }

    #[test]
    fn test_retain_drops_empty_namespaces() {
        let mut doc = ResourceDocument::from([
            ("default", &[("hello", "你好"), ("bye", "再见")][..]),
            ("dl", &[("name", "名称")][..]),
        ]);
        doc.retain(|ns, key| ns == "default" && key == "hello");
        assert_eq!(doc, ResourceDocument::from([("default", &[("hello", "你好")][..])]));
    }
}
