//! Engine configuration
//!
//! Tunables the embedder may persist alongside the agent: the marker
//! exclusion list for the dynamic cell path, retention caps, and the opaque
//! render limit. Loaded once; the compiled form is immutable for the life of
//! the engine.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Qualifier fragments excluded on the dynamic cell path. A cell is
    /// dropped when its decoded qualifier contains any fragment. Defaults to
    /// the empty-column marker SQL-on-HBase layers write into every row.
    #[serde(default = "default_excluded_fragments")]
    pub excluded_qualifier_fragments: Vec<String>,

    /// Regex patterns excluded on the dynamic cell path, for deployments
    /// whose bookkeeping qualifiers need more than fragment matching.
    #[serde(default)]
    pub excluded_qualifier_patterns: Vec<String>,

    /// Maximum diagnostic events retained in memory.
    #[serde(default = "default_max_diagnostic_entries")]
    pub max_diagnostic_entries: usize,

    /// Maximum length of the free-text rendering stored for opaque captures.
    #[serde(default = "default_max_render_len")]
    pub max_render_len: usize,
}

fn default_excluded_fragments() -> Vec<String> {
    vec!["_0".to_string()]
}

fn default_max_diagnostic_entries() -> usize {
    1000
}

fn default_max_render_len() -> usize {
    4096
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            excluded_qualifier_fragments: default_excluded_fragments(),
            excluded_qualifier_patterns: Vec::new(),
            max_diagnostic_entries: default_max_diagnostic_entries(),
            max_render_len: default_max_render_len(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            debug!("no engine config file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("failed to read config: {e}")))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| EngineError::config(format!("failed to parse config: {e}")))?;

        // Reject bad patterns at intake rather than at call time.
        for pattern in &config.excluded_qualifier_patterns {
            Regex::new(pattern)
                .map_err(|e| EngineError::config(format!("invalid pattern '{pattern}': {e}")))?;
        }

        Ok(config)
    }

    /// Saves configuration to a JSON file.
    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::config(format!("failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| EngineError::config(format!("failed to write config: {e}")))?;

        debug!("saved engine configuration to {:?}", path);
        Ok(())
    }

    /// Compiles the exclusion settings into their immutable call-time form.
    pub fn compile_exclusions(&self) -> EngineResult<ExclusionRules> {
        let mut patterns = Vec::with_capacity(self.excluded_qualifier_patterns.len());
        for pattern in &self.excluded_qualifier_patterns {
            let compiled = Regex::new(pattern)
                .map_err(|e| EngineError::config(format!("invalid pattern '{pattern}': {e}")))?;
            patterns.push(compiled);
        }

        Ok(ExclusionRules {
            fragments: self.excluded_qualifier_fragments.clone(),
            patterns,
        })
    }
}

/// Compiled marker-qualifier exclusion rules.
///
/// Built once at engine construction; read-only afterwards, so the call-time
/// path needs no synchronization.
#[derive(Debug, Default)]
pub struct ExclusionRules {
    fragments: Vec<String>,
    patterns: Vec<Regex>,
}

impl ExclusionRules {
    /// Returns true when a decoded qualifier names a non-data marker entry.
    pub fn is_excluded(&self, qualifier: &str) -> bool {
        self.fragments.iter().any(|f| qualifier.contains(f.as_str()))
            || self.patterns.iter().any(|p| p.is_match(qualifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_empty_column_marker() {
        let rules = EngineConfig::default()
            .compile_exclusions()
            .expect("defaults compile");
        assert!(rules.is_excluded("_0"));
        assert!(!rules.is_excluded("name"));
    }

    #[test]
    fn pattern_exclusions_compile_and_match() {
        let config = EngineConfig {
            excluded_qualifier_fragments: vec![],
            excluded_qualifier_patterns: vec!["^__meta".to_string()],
            ..Default::default()
        };
        let rules = config.compile_exclusions().expect("patterns compile");
        assert!(rules.is_excluded("__meta_version"));
        assert!(!rules.is_excluded("payload__meta"));
    }

    #[test]
    fn invalid_pattern_is_rejected_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rowguard.json");
        std::fs::write(
            &path,
            r#"{"excluded_qualifier_patterns": ["["]}"#,
        )
        .expect("write");

        match EngineConfig::load(&path) {
            Err(EngineError::Config { message }) => {
                assert!(message.contains("invalid pattern"), "{message}");
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rowguard.json");

        let config = EngineConfig {
            excluded_qualifier_fragments: vec!["_0".to_string(), "__ts".to_string()],
            max_render_len: 128,
            ..Default::default()
        };
        config.save(&path).expect("save");

        let loaded = EngineConfig::load(&path).expect("load");
        assert_eq!(loaded.excluded_qualifier_fragments.len(), 2);
        assert_eq!(loaded.max_render_len, 128);
        assert_eq!(
            loaded.max_diagnostic_entries,
            default_max_diagnostic_entries()
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig::load(&dir.path().join("absent.json")).expect("defaults");
        assert_eq!(config.max_render_len, default_max_render_len());
    }
}
