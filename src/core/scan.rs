//! Source set walking and full scans.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use glob::{Pattern, glob};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::{Config, DEFAULT_NAMESPACE, ParserKind};
use crate::core::coordinator::TranslationOutcome;
use crate::core::index::NamespaceIndex;
use crate::core::parsers::SourceUnit;
use crate::core::rewrite::{BuildMode, SourceRewriter};
use crate::error::Error;

/// `namespace -> (key -> source phrase)` gathered by a full scan.
pub type ObservedKeys = BTreeMap<String, BTreeMap<String, String>>;

const AST_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];
const TEXT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "vue", "html"];

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Files of a project that may contain marker calls.
#[derive(Debug, Clone)]
pub struct SourceSet {
    root: PathBuf,
    includes: Vec<String>,
    ignores: Vec<String>,
    vendor_dirs: Vec<String>,
    extensions: &'static [&'static str],
    verbose: bool,
}

/// Result of walking a source set.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Paths relative to the project root, using `/` separators.
    pub files: BTreeSet<String>,
    pub skipped_count: usize,
}

impl SourceSet {
    pub fn new(root: impl Into<PathBuf>, includes: Vec<String>, ignores: Vec<String>) -> Self {
        Self {
            root: root.into(),
            includes,
            ignores,
            vendor_dirs: vec!["node_modules".to_string()],
            extensions: AST_EXTENSIONS,
            verbose: false,
        }
    }

    pub fn from_config(config: &Config, root: &Path, verbose: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            includes: config.includes.clone(),
            ignores: config.ignores.clone(),
            vendor_dirs: config.vendor_dirs.clone(),
            extensions: match config.parser {
                ParserKind::Ast => AST_EXTENSIONS,
                ParserKind::Text => TEXT_EXTENSIONS,
            },
            verbose,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a file returned by [`SourceSet::scan`].
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read_unit(&self, relative: &str) -> Result<SourceUnit, Error> {
        let path = self.resolve(relative);
        let code = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(SourceUnit::new(relative, code))
    }

    fn warn(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            eprintln!("{} {}", "warning:".bold().yellow(), message);
        }
    }

    fn is_scannable_file(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".d.ts") {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    fn is_vendor_dir(&self, name: &str) -> bool {
        self.vendor_dirs.iter().any(|dir| dir == name)
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
        let mut glob_patterns: Vec<Pattern> = Vec::new();
        for p in &self.ignores {
            if is_glob_pattern(p) {
                match Pattern::new(p) {
                    Ok(pattern) => glob_patterns.push(pattern),
                    Err(e) => self.warn(format_args!("Invalid ignore pattern '{}': {}", p, e)),
                }
            } else {
                literal_ignore_paths.push(self.root.join(p));
            }
        }

        let dirs_to_scan: Vec<PathBuf> = if self.includes.is_empty() {
            vec![self.root.clone()]
        } else {
            let mut paths = Vec::new();
            for inc in &self.includes {
                if is_glob_pattern(inc) {
                    let full_pattern = self.root.join(inc);
                    match glob(&full_pattern.to_string_lossy()) {
                        Ok(entries) => paths.extend(entries.flatten()),
                        Err(e) => self.warn(format_args!("Invalid glob pattern '{}': {}", inc, e)),
                    }
                } else {
                    let path = self.root.join(inc);
                    if path.exists() {
                        paths.push(path);
                    } else {
                        self.warn(format_args!("Include path does not exist: {}", path.display()));
                    }
                }
            }
            paths
        };

        for dir in dirs_to_scan {
            let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.is_vendor_dir(name)))
            });
            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        result.skipped_count += 1;
                        self.warn(format_args!("Cannot access path: {}", e));
                        continue;
                    }
                };
                let path = entry.path();

                if literal_ignore_paths
                    .iter()
                    .any(|ignore_path| path.starts_with(ignore_path))
                {
                    continue;
                }
                let relative = self.relative(path);
                if glob_patterns
                    .iter()
                    .any(|p| p.matches(&relative) || p.matches(&path.to_string_lossy()))
                {
                    continue;
                }

                if entry.file_type().is_file() && self.is_scannable_file(path) {
                    result.files.insert(relative);
                }
            }
        }

        result
    }
}

/// A file the full scan could not read or parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ObservedScan {
    pub observed: ObservedKeys,
    pub failures: Vec<ScanFailure>,
    pub files: usize,
}

impl ObservedScan {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Extract every marker call of `files` and resolve it with `resolve(namespace, phrase)`.
///
/// Phrases in unconfigured namespaces and phrases `resolve` does not know are skipped.
pub fn full_scan<F>(
    sources: &SourceSet,
    files: &BTreeSet<String>,
    rewriter: &SourceRewriter,
    namespaces: &[String],
    resolve: F,
) -> ObservedScan
where
    F: Fn(&str, &str) -> Option<String> + Sync,
{
    let per_file: Vec<Result<Vec<(String, String, String)>, ScanFailure>> = files
        .par_iter()
        .filter(|file| !rewriter.is_vendored(file))
        .map(|file| -> Result<Vec<(String, String, String)>, ScanFailure> {
            let unit = sources.read_unit(file).map_err(|e| ScanFailure {
                file_path: file.clone(),
                message: e.to_string(),
            })?;
            let markers = rewriter.find_markers(&unit).map_err(|e| ScanFailure {
                file_path: file.clone(),
                message: e.to_string(),
            })?;
            Ok(markers
                .into_iter()
                .filter_map(|marker| {
                    let namespace = marker
                        .namespace
                        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
                    if !namespaces.contains(&namespace) {
                        return None;
                    }
                    let key = resolve(&namespace, &marker.phrase)?;
                    Some((namespace, key, marker.phrase))
                })
                .collect())
        })
        .collect();

    let mut scan = ObservedScan {
        files: per_file.len(),
        ..Default::default()
    };
    for result in per_file {
        match result {
            Ok(entries) => {
                for (namespace, key, phrase) in entries {
                    scan.observed.entry(namespace).or_default().insert(key, phrase);
                }
            }
            Err(failure) => {
                tracing::warn!(file = %failure.file_path, "{}", failure.message);
                scan.failures.push(failure);
            }
        }
    }
    scan
}

/// Full-scan driver: a source set, the call extraction and the namespace list.
pub struct Scanner {
    sources: SourceSet,
    rewriter: SourceRewriter,
    namespaces: Vec<String>,
}

impl Scanner {
    pub fn new(sources: SourceSet, rewriter: SourceRewriter, namespaces: Vec<String>) -> Self {
        Self {
            sources,
            rewriter,
            namespaces,
        }
    }

    pub fn from_config(config: &Config, root: &Path, verbose: bool) -> Result<Self, Error> {
        Ok(Self::new(
            SourceSet::from_config(config, root, verbose),
            SourceRewriter::from_config(config, BuildMode::Development)?,
            config.namespaces.clone(),
        ))
    }

    /// Walk the source set and resolve every marker call, first against the
    /// outcomes of the current batch and then against `index`.
    pub fn scan(&self, outcomes: &[TranslationOutcome], index: &NamespaceIndex) -> ObservedScan {
        let files = self.sources.scan().files;
        let scan = full_scan(
            &self.sources,
            &files,
            &self.rewriter,
            &self.namespaces,
            |namespace, phrase| {
                outcomes
                    .iter()
                    .find(|o| o.namespace == namespace && o.source_phrase == phrase)
                    .map(|o| o.key.clone())
                    .or_else(|| index.lookup(namespace, phrase).map(str::to_string))
            },
        );
        tracing::debug!(
            files = scan.files,
            namespaces = scan.observed.len(),
            failures = scan.failures.len(),
            "full scan finished"
        );
        scan
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::core::parsers::AstCallSource;

    fn files(set: &SourceSet) -> Vec<String> {
        set.scan().files.into_iter().collect()
    }

    #[test]
    fn test_scan_source_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("pages")).unwrap();
        File::create(src.join("app.tsx")).unwrap();
        File::create(src.join("util.mjs")).unwrap();
        File::create(src.join("types.d.ts")).unwrap();
        File::create(src.join("style.css")).unwrap();
        File::create(src.join("pages").join("home.ts")).unwrap();

        let set = SourceSet::new(dir.path(), vec!["src".to_string()], vec![]);
        assert_eq!(
            files(&set),
            vec!["src/app.tsx", "src/pages/home.ts", "src/util.mjs"]
        );
    }

    #[test]
    fn test_scan_skips_vendor_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("src").join("node_modules").join("lib");
        fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("index.js")).unwrap();
        File::create(dir.path().join("src").join("app.js")).unwrap();

        let set = SourceSet::new(dir.path(), vec!["src".to_string()], vec![]);
        assert_eq!(files(&set), vec!["src/app.js"]);
    }

    #[test]
    fn test_scan_ignores_literal_and_glob_patterns() {
        let dir = tempdir().unwrap();
        let components = dir.path().join("src").join("components");
        let generated = dir.path().join("src").join("generated");
        fs::create_dir_all(&components).unwrap();
        fs::create_dir_all(&generated).unwrap();
        File::create(components.join("Button.tsx")).unwrap();
        File::create(components.join("Button.stories.tsx")).unwrap();
        File::create(generated.join("types.ts")).unwrap();

        let set = SourceSet::new(
            dir.path(),
            vec!["src".to_string()],
            vec!["src/generated".to_string(), "**/*.stories.tsx".to_string()],
        );
        assert_eq!(files(&set), vec!["src/components/Button.tsx"]);
    }

    #[test]
    fn test_scan_with_glob_include() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("packages").join("a")).unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        File::create(dir.path().join("packages").join("a").join("index.ts")).unwrap();
        File::create(dir.path().join("lib").join("utils.ts")).unwrap();

        let set = SourceSet::new(dir.path(), vec!["packages/*".to_string()], vec![]);
        assert_eq!(files(&set), vec!["packages/a/index.ts"]);
    }

    #[test]
    fn test_full_scan_observes_resolvable_phrases() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("a.ts"),
            "i18n.s('你好'); i18n.s('名称', 'dl'); i18n.s('未知'); i18n.s('x', 'nope');",
        )
        .unwrap();
        fs::write(src.join("broken.ts"), "const = ;").unwrap();

        let set = SourceSet::new(dir.path(), vec!["src".to_string()], vec![]);
        let namespaces = vec!["default".to_string(), "dl".to_string()];
        let rewriter = SourceRewriter::new(
            "i18n",
            namespaces.clone(),
            BuildMode::Development,
            vec![],
            Box::new(AstCallSource::new("i18n")),
        );
        let scan = full_scan(&set, &set.scan().files, &rewriter, &namespaces, |ns, phrase| {
            match (ns, phrase) {
                ("default", "你好") => Some("hello".to_string()),
                ("dl", "名称") => Some("name".to_string()),
                ("default", "x") => Some("x".to_string()),
                _ => None,
            }
        });

        let mut expected = ObservedKeys::new();
        expected
            .entry("default".to_string())
            .or_default()
            .insert("hello".to_string(), "你好".to_string());
        expected
            .entry("dl".to_string())
            .or_default()
            .insert("name".to_string(), "名称".to_string());
        assert_eq!(scan.observed, expected);
        assert_eq!(scan.files, 2);
        assert!(!scan.is_complete());
        assert_eq!(scan.failures[0].file_path, "src/broken.ts");
    }
}
