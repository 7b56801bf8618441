//! Reverse lookup from source phrases to translation keys, per namespace.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::KeyLanguage;
use crate::core::resource::{ResourceDocument, ResourceStore};
use crate::core::unescape_key;
use crate::error::Result;

/// A phrase carried by more than one key of a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub namespace: String,
    pub phrase: String,
    /// Sorted; the first key is the one the index resolves to.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    /// namespace -> phrase -> key
    phrases: HashMap<String, HashMap<String, String>>,
    /// namespace -> key -> phrase
    keys: HashMap<String, HashMap<String, String>>,
    ambiguities: Vec<Ambiguity>,
}

impl NamespaceIndex {
    /// Build the index from the source-language document.
    ///
    /// With [`KeyLanguage::Target`] the document is inverted (`value -> key`);
    /// with [`KeyLanguage::Source`] each key names its own phrase. Entries whose
    /// value is `sentinel` are skipped.
    pub fn build(doc: &ResourceDocument, key_language: KeyLanguage, sentinel: &str) -> Self {
        let mut index = NamespaceIndex::default();

        for (namespace, entries) in doc.namespaces() {
            let phrases = index.phrases.entry(namespace.clone()).or_default();
            let keys = index.keys.entry(namespace.clone()).or_default();

            // BTreeMap order: the smallest key claims a phrase first
            for (key, value) in entries {
                if value == sentinel {
                    continue;
                }
                let phrase = match key_language {
                    KeyLanguage::Target => value.clone(),
                    KeyLanguage::Source => unescape_key(key),
                };
                keys.insert(key.clone(), phrase.clone());

                match phrases.get(&phrase) {
                    None => {
                        phrases.insert(phrase, key.clone());
                    }
                    Some(winner) => {
                        match index
                            .ambiguities
                            .iter_mut()
                            .find(|a| a.namespace == *namespace && a.phrase == phrase)
                        {
                            Some(ambiguity) => ambiguity.keys.push(key.clone()),
                            None => index.ambiguities.push(Ambiguity {
                                namespace: namespace.clone(),
                                phrase,
                                keys: vec![winner.clone(), key.clone()],
                            }),
                        }
                    }
                }
            }
        }

        index
    }

    /// Build the index from the persisted source-language document.
    pub fn load(store: &ResourceStore, key_language: KeyLanguage, sentinel: &str) -> Result<Self> {
        let doc = store.load_source()?;
        Ok(Self::build(&doc, key_language, sentinel))
    }

    pub fn lookup(&self, namespace: &str, phrase: &str) -> Option<&str> {
        self.phrases.get(namespace)?.get(phrase).map(String::as_str)
    }

    pub fn phrase_for_key(&self, namespace: &str, key: &str) -> Option<&str> {
        self.keys.get(namespace)?.get(key).map(String::as_str)
    }

    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }

    pub fn len(&self) -> usize {
        self.phrases.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared, atomically swappable index.
///
/// Readers clone the current `Arc` and keep using it; a refresh never mutates
/// an index in place.
pub struct IndexHandle {
    current: RwLock<Arc<NamespaceIndex>>,
    store: ResourceStore,
    key_language: KeyLanguage,
    sentinel: String,
}

impl IndexHandle {
    /// Load the initial index from `store`.
    pub fn open(
        store: ResourceStore,
        key_language: KeyLanguage,
        sentinel: impl Into<String>,
    ) -> Result<Self> {
        let handle = Self {
            current: RwLock::new(Arc::new(NamespaceIndex::default())),
            store,
            key_language,
            sentinel: sentinel.into(),
        };
        handle.refresh()?;
        Ok(handle)
    }

    pub fn current(&self) -> Arc<NamespaceIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, index: NamespaceIndex) -> Arc<NamespaceIndex> {
        let index = Arc::new(index);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = index.clone();
        index
    }

    /// Rebuild from the latest persisted state and swap it in.
    pub fn refresh(&self) -> Result<Arc<NamespaceIndex>> {
        let index = NamespaceIndex::load(&self.store, self.key_language, &self.sentinel)?;
        for ambiguity in index.ambiguities() {
            tracing::warn!(
                namespace = %ambiguity.namespace,
                phrase = %ambiguity.phrase,
                keys = ?ambiguity.keys,
                "phrase maps to several keys, using the first"
            );
        }
        tracing::debug!(entries = index.len(), "namespace index rebuilt");
        Ok(self.replace(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SENTINEL: &str = "__NOT_TRANSLATED__";

    #[test]
    fn test_target_keys_invert_document() {
        let doc = ResourceDocument::from([("default", &[("hello", "你好")][..])]);
        let index = NamespaceIndex::build(&doc, KeyLanguage::Target, SENTINEL);
        assert_eq!(index.lookup("default", "你好"), Some("hello"));
        assert_eq!(index.lookup("default", "hello"), None);
        assert_eq!(index.phrase_for_key("default", "hello"), Some("你好"));
    }

    #[test]
    fn test_source_keys_read_as_is() {
        let doc = ResourceDocument::from([("dl", &[("时间&#58;", "时间:")][..])]);
        let index = NamespaceIndex::build(&doc, KeyLanguage::Source, SENTINEL);
        assert_eq!(index.lookup("dl", "时间:"), Some("时间&#58;"));
    }

    #[test]
    fn test_sentinel_values_are_not_indexed() {
        let doc = ResourceDocument::from([("default", &[("bye", SENTINEL), ("hi", "嗨")][..])]);
        let index = NamespaceIndex::build(&doc, KeyLanguage::Target, SENTINEL);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("default", SENTINEL), None);
        assert_eq!(index.phrase_for_key("default", "bye"), None);
    }

    #[test]
    fn test_ambiguous_phrase_resolves_to_smallest_key() {
        let doc = ResourceDocument::from([(
            "default",
            &[("ok", "好"), ("good", "好"), ("fine", "好")][..],
        )]);
        let index = NamespaceIndex::build(&doc, KeyLanguage::Target, SENTINEL);
        assert_eq!(index.lookup("default", "好"), Some("fine"));
        assert_eq!(
            index.ambiguities(),
            &[Ambiguity {
                namespace: "default".to_string(),
                phrase: "好".to_string(),
                keys: vec!["fine".to_string(), "good".to_string(), "ok".to_string()],
            }]
        );
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let doc = ResourceDocument::from([
            ("default", &[("name", "名称")][..]),
            ("dl", &[("data source name", "名称")][..]),
        ]);
        let index = NamespaceIndex::build(&doc, KeyLanguage::Target, SENTINEL);
        assert_eq!(index.lookup("default", "名称"), Some("name"));
        assert_eq!(index.lookup("dl", "名称"), Some("data source name"));
        assert!(index.ambiguities().is_empty());
    }

    #[test]
    fn test_handle_refresh_swaps_index() {
        let dir = tempdir().unwrap();
        let store = ResourceStore::new(dir.path(), "zh", "en");
        let handle = IndexHandle::open(store.clone(), KeyLanguage::Target, SENTINEL).unwrap();
        assert!(handle.current().is_empty());

        let before = handle.current();
        fs::write(store.path_for("zh"), r#"{"default": {"hello": "你好"}}"#).unwrap();
        handle.refresh().unwrap();

        assert_eq!(handle.current().lookup("default", "你好"), Some("hello"));
        assert!(before.is_empty());
    }
}
