//! Per-file configuration resolution.
//!
//! A configuration source is an ordered list of objects mapping glob patterns
//! to partial configurations. Every file a pattern matches gets the defaults
//! with each matching patch applied in declaration order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::process::Command;

use super::{Config, ConfigPatch};
use crate::paths::normalize;

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Config evaluator failed for {}: {message}", .path.display())]
    Evaluator { path: PathBuf, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },

    #[error("Invalid placeholder pattern '{pattern}': {message}")]
    Placeholder { pattern: String, message: String },
}

/// A glob pattern and the partial configuration for the files it matches.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub pattern: String,
    pub patch: ConfigPatch,
}

impl OverrideRule {
    /// Parse override rules from configuration text.
    ///
    /// `.yaml`/`.yml` sources are read as YAML, everything else (including
    /// evaluator output) as JSON.
    pub fn parse(source: &Path, text: &str) -> Result<Vec<Self>, ConfigError> {
        let is_yaml = matches!(
            source.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );

        let entries: Vec<IndexMap<String, ConfigPatch>> = if is_yaml {
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(text).map_err(|e| ConfigError::Parse {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Ok(entries
            .into_iter()
            .flat_map(|entry| {
                entry
                    .into_iter()
                    .map(|(pattern, patch)| OverrideRule { pattern, patch })
            })
            .collect())
    }
}

/// Maps source files to their effective configuration.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    default: Arc<Config>,
    overrides: HashMap<PathBuf, Arc<Config>>,
}

impl ConfigResolver {
    /// A resolver that yields the default configuration for every file.
    pub fn with_defaults(root: &Path) -> Self {
        Self {
            default: Arc::new(Config::with_root(normalize(root))),
            overrides: HashMap::new(),
        }
    }

    /// Read a configuration source and resolve it against the filesystem.
    ///
    /// `.nix` sources are evaluated with `nix eval --json`; relative glob
    /// patterns are anchored at the source's directory.
    pub async fn load(source: &Path, root: &Path) -> Result<Self, ConfigError> {
        let source = normalize(source);
        let text = read_source(&source).await?;
        let rules = OverrideRule::parse(&source, &text)?;
        let base_dir = source.parent().unwrap_or(Path::new("/")).to_path_buf();

        let resolver = Self::from_rules(&rules, &base_dir, root)?;
        tracing::info!(
            "Loaded {} config rules from {} ({} files overridden)",
            rules.len(),
            source.display(),
            resolver.overrides.len()
        );
        Ok(resolver)
    }

    /// Expand `rules` against the filesystem and merge the patches for every
    /// matched file.
    pub fn from_rules(
        rules: &[OverrideRule],
        base_dir: &Path,
        root: &Path,
    ) -> Result<Self, ConfigError> {
        let root = normalize(root);
        let default = Config::with_root(root.clone());

        let mut matched: HashMap<PathBuf, Vec<&ConfigPatch>> = HashMap::new();
        for rule in rules {
            let pattern = anchor_pattern(base_dir, &rule.pattern);
            let paths = glob::glob(&pattern).map_err(|e| ConfigError::Glob {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            })?;

            let mut count = 0;
            for entry in paths {
                match entry {
                    Ok(path) => {
                        matched.entry(normalize(&path)).or_default().push(&rule.patch);
                        count += 1;
                    }
                    Err(e) => tracing::warn!("Skipping unreadable path for '{}': {}", rule.pattern, e),
                }
            }
            tracing::debug!("Config pattern '{}' matched {} files", rule.pattern, count);
        }

        let mut overrides = HashMap::with_capacity(matched.len());
        for (path, patches) in matched {
            let mut config = default.clone();
            for patch in patches {
                config.apply(patch)?;
            }
            config.files.root = normalize(&root.join(&config.files.root));
            overrides.insert(path, Arc::new(config));
        }

        Ok(Self {
            default: Arc::new(default),
            overrides,
        })
    }

    /// Effective configuration for `path`.
    pub fn get(&self, path: &Path) -> Arc<Config> {
        self.overrides
            .get(&normalize(path))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// The configuration used for files no rule matched.
    pub fn default_config(&self) -> &Config {
        &self.default
    }
}

/// Join a relative pattern onto `base_dir`, escaping glob syntax in the base.
fn anchor_pattern(base_dir: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let base = glob::Pattern::escape(&base_dir.to_string_lossy());
    format!("{}/{}", base.trim_end_matches('/'), pattern)
}

async fn read_source(path: &Path) -> Result<String, ConfigError> {
    if path.extension().and_then(|e| e.to_str()) == Some("nix") {
        return evaluate_nix(path).await;
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Evaluate a Nix expression to JSON.
async fn evaluate_nix(path: &Path) -> Result<String, ConfigError> {
    let output = Command::new("nix")
        .args(["--experimental-features", "nix-command", "eval", "--json", "--file"])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ConfigError::Evaluator {
            path: path.to_path_buf(),
            message: format!("failed to run nix: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfigError::Evaluator {
            path: path.to_path_buf(),
            message: stderr.trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| ConfigError::Evaluator {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn site() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("blog")).unwrap();
        fs::write(src.join("a.html"), "").unwrap();
        fs::write(src.join("b.html"), "").unwrap();
        fs::write(src.join("blog/c.md"), "").unwrap();
        temp
    }

    fn rules(json: &str) -> Vec<OverrideRule> {
        OverrideRule::parse(Path::new("htms.json"), json).unwrap()
    }

    #[test]
    fn merges_matching_rules_in_order() {
        let temp = site();
        let root = temp.path().join("src");
        let rules = rules(
            r#"[
                {"src/*.html": {"format": {"pretty": false}}},
                {"src/b.html": {"imports": {"tag": "USE"}, "format": {"pretty": true}}}
            ]"#,
        );

        let resolver = ConfigResolver::from_rules(&rules, temp.path(), &root).unwrap();

        let a = resolver.get(&root.join("a.html"));
        assert!(!a.format.pretty);
        assert_eq!(a.imports.tag, "IMPORT");

        let b = resolver.get(&root.join("b.html"));
        assert!(b.format.pretty);
        assert_eq!(b.imports.tag, "USE");
    }

    #[test]
    fn unmatched_files_get_defaults() {
        let temp = site();
        let root = temp.path().join("src");
        let rules = rules(r#"[{"src/*.html": {"format": {"pretty": false}}}]"#);

        let resolver = ConfigResolver::from_rules(&rules, temp.path(), &root).unwrap();
        let config = resolver.get(&root.join("blog/c.md"));

        assert!(config.format.pretty);
        assert_eq!(config.files.root, normalize(&root));
    }

    #[test]
    fn lookups_normalize_the_query() {
        let temp = site();
        let root = temp.path().join("src");
        let rules = rules(r#"[{"src/a.html": {"template": {"nesting": "<slot/>"}}}]"#);

        let resolver = ConfigResolver::from_rules(&rules, temp.path(), &root).unwrap();

        let config = resolver.get(&root.join("blog/../a.html"));
        assert_eq!(config.template.nesting, "<slot/>");
    }

    #[test]
    fn root_resolves_against_build_root() {
        let temp = site();
        let root = temp.path().join("src");
        let rules = rules(r#"[{"src/**/*.md": {"files": {"root": "blog"}}}]"#);

        let resolver = ConfigResolver::from_rules(&rules, temp.path(), &root).unwrap();

        assert_eq!(
            resolver.get(&root.join("blog/c.md")).files.root,
            normalize(&root.join("blog"))
        );
    }

    #[test]
    fn one_object_may_hold_several_patterns() {
        let rules = rules(r#"[{"*.html": {}, "*.md": {}}, {"*.css": {}}]"#);
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern.as_str()).collect();

        assert_eq!(patterns, vec!["*.html", "*.md", "*.css"]);
    }

    #[tokio::test]
    async fn loads_json_source() {
        let temp = site();
        let source = temp.path().join("htms.json");
        fs::write(&source, r#"[{"src/a.html": {"format": {"pretty": false}}}]"#).unwrap();

        let root = temp.path().join("src");
        let resolver = ConfigResolver::load(&source, &root).await.unwrap();

        assert!(!resolver.get(&root.join("a.html")).format.pretty);
        assert!(resolver.get(&root.join("b.html")).format.pretty);
    }

    #[tokio::test]
    async fn loads_yaml_source() {
        let temp = site();
        let source = temp.path().join("htms.yaml");
        fs::write(
            &source,
            "- \"src/*.html\":\n    imports:\n      tag: COMPONENT\n",
        )
        .unwrap();

        let root = temp.path().join("src");
        let resolver = ConfigResolver::load(&source, &root).await.unwrap();

        assert_eq!(resolver.get(&root.join("a.html")).imports.tag, "COMPONENT");
    }

    #[tokio::test]
    async fn malformed_source_is_a_parse_error() {
        let temp = site();
        let source = temp.path().join("htms.json");
        fs::write(&source, r#"[{"src/a.html": {"format": "#).unwrap();

        let result = ConfigResolver::load(&source, temp.path()).await;

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[tokio::test]
    async fn missing_source_is_a_read_error() {
        let temp = tempdir().unwrap();

        let result = ConfigResolver::load(&temp.path().join("nope.json"), temp.path()).await;

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
