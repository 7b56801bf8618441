use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const CONFIG_FILE_NAME: &str = ".transmarkrc.json";

/// Namespace used when a marker call has no second argument.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Separator between namespace and key in a `t()` reference.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Escape sequence standing in for [`NAMESPACE_SEPARATOR`] inside keys.
pub const ESCAPED_SEPARATOR: &str = "&#58;";

/// Language whose text is used to form translation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLanguage {
    /// Keys are the (escaped) translated text; the index inverts the source document.
    #[default]
    Target,
    /// Keys are the source phrases themselves; the index reads the document as-is.
    Source,
}

/// How marker calls are located in source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Full syntax tree via swc.
    #[default]
    Ast,
    /// Regex token scan over the raw text.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Free LibreTranslate-compatible endpoint.
    #[default]
    Libre,
    /// Google Translate v2, requires an API key.
    Google,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Overrides the provider's default endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub locale_path: Option<String>,
    #[serde(default, alias = "ns")]
    pub namespaces: Vec<String>,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub default_language: KeyLanguage,
    #[serde(default = "default_marker_variable", alias = "targetVariable")]
    pub marker_variable: String,
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_vendor_dirs")]
    pub vendor_dirs: Vec<String>,
    #[serde(default)]
    pub parser: ParserKind,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_timeout_ms", alias = "timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub lowercase_first: bool,
    #[serde(default = "default_true")]
    pub remove_unused_keys: bool,
    #[serde(default = "default_untranslated_value")]
    pub untranslated_value: String,
    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_marker_variable() -> String {
    "i18n".to_string()
}

fn default_includes() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_vendor_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_untranslated_value() -> String {
    "__NOT_TRANSLATED__".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale_path: None,
            namespaces: Vec::new(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            default_language: KeyLanguage::default(),
            marker_variable: default_marker_variable(),
            includes: default_includes(),
            ignores: Vec::new(),
            vendor_dirs: default_vendor_dirs(),
            parser: ParserKind::default(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            lowercase_first: true,
            remove_unused_keys: true,
            untranslated_value: default_untranslated_value(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Every failure is an [`Error::Configuration`] and is never retried.
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.locale_path.as_deref().is_none_or(|p| p.trim().is_empty()) {
            return Err(Error::configuration("'localePath' is required"));
        }
        if self.namespaces.is_empty() {
            return Err(Error::configuration(
                "'namespaces' must list at least one namespace",
            ));
        }
        for ns in &self.namespaces {
            if ns.is_empty() || ns.contains(NAMESPACE_SEPARATOR) {
                return Err(Error::configuration(format!(
                    "invalid namespace \"{}\": must be non-empty and must not contain '{}'",
                    ns, NAMESPACE_SEPARATOR
                )));
            }
        }
        if self.source_language == self.target_language {
            return Err(Error::configuration(format!(
                "'sourceLanguage' and 'targetLanguage' are both \"{}\"",
                self.source_language
            )));
        }

        let identifier = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$")
            .map_err(|e| Error::configuration(e.to_string()))?;
        if !identifier.is_match(&self.marker_variable) {
            return Err(Error::configuration(format!(
                "'markerVariable' must be an identifier, got \"{}\"",
                self.marker_variable
            )));
        }

        if self.interval_ms == 0 {
            return Err(Error::configuration("'intervalMs' must be greater than 0"));
        }

        // Validate ignore patterns
        for pattern in &self.ignores {
            Pattern::new(pattern).map_err(|e| {
                Error::configuration(format!(
                    "Invalid glob pattern in 'ignores': \"{}\" ({})",
                    pattern, e
                ))
            })?;
        }

        // Patterns without wildcards are literal directory paths.
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).map_err(|e| {
                    Error::configuration(format!(
                        "Invalid glob pattern in 'includes': \"{}\" ({})",
                        pattern, e
                    ))
                })?;
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Locale directory resolved against the project root.
    pub fn locale_dir(&self, root: &Path) -> PathBuf {
        match self.locale_path.as_deref() {
            Some(path) => root.join(path),
            None => root.to_path_buf(),
        }
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config {
        locale_path: Some("./src/locales".to_string()),
        namespaces: vec![DEFAULT_NAMESPACE.to_string()],
        ..Config::default()
    };
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory containing the config file, or the start directory when none was found.
    pub root: PathBuf,
    /// True if config was loaded from a file.
    pub from_file: bool,
}

/// Load the configuration without validating it, so CLI overrides can be applied first.
pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            Ok(ConfigLoadResult {
                config,
                root,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            root: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}
