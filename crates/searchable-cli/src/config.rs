//! CLI configuration.
//!
//! ```toml
//! [search]
//! backend = "tantivy"
//! index_path = "/var/lib/searchable/index"
//! time_limit_secs = 3600
//!
//! [content]
//! models = "models.toml"
//! snapshot = "content.json"
//! assets = "assets"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use searchable_core::{Error, Result};
use searchable_fts::SearchConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SEARCHABLE_CONFIG";

/// Where content models and instances are read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// TOML file of `[[model]]` tables.
    pub models: Option<PathBuf>,
    /// JSON snapshot of staged and live instances.
    pub snapshot: Option<PathBuf>,
    /// Root for relative attachment paths.
    pub assets: Option<PathBuf>,
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine and naming settings.
    pub search: SearchConfig,
    /// Content sources.
    pub content: ContentConfig,
}

impl CliConfig {
    /// Default config file location (`<config dir>/searchable/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("searchable").join("config.toml"))
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid configuration: {e}")))
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present, otherwise the built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let content = &mut self.content;
        for path in [&mut content.models, &mut content.snapshot, &mut content.assets]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(index_path) = &mut self.search.index_path {
            if Path::new(index_path.as_str()).is_relative() {
                *index_path = base.join(index_path.as_str()).display().to_string();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::from_toml_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.search.time_limit_secs, 3600);
        assert_eq!(config.search.published_field, "SS_Published");
        assert!(config.content.models.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let config = CliConfig::from_toml_str(
            r#"
            [search]
            backend = "memory"
            relation_separator = "__"
            time_limit_secs = 60

            [content]
            models = "/etc/searchable/models.toml"
            "#,
        )
        .unwrap();
        assert_eq!(config.search.backend, "memory");
        assert_eq!(config.search.relation_separator, "__");
        assert_eq!(config.search.time_limit_secs, 60);
        assert_eq!(
            config.content.models.as_deref(),
            Some(Path::new("/etc/searchable/models.toml"))
        );
    }

    #[test]
    fn test_invalid_toml() {
        let result = CliConfig::from_toml_str("[search\nbackend = 1");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [search]
            index_path = "index"

            [content]
            models = "models.toml"
            snapshot = "/abs/content.json"
            "#,
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.content.models, Some(dir.path().join("models.toml")));
        assert_eq!(
            config.content.snapshot.as_deref(),
            Some(Path::new("/abs/content.json"))
        );
        assert_eq!(
            config.search.index_path,
            Some(dir.path().join("index").display().to_string())
        );
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = CliConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
