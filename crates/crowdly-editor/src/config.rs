//! Editor configuration (TOML).
//!
//! ```toml
//! storage_key = "crowdly-web-editor"
//! undo_window_ms = 8000
//! ready_poll_ms = 50
//!
//! [pool]
//! titles = 3
//! chapters = 10
//! paragraphs = 50
//! ```
//!
//! Every field is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crowdly_blocks::PoolLayout;

use crate::error::ConfigError;

/// Storage key the browser prototype used.
pub const DEFAULT_STORAGE_KEY: &str = "crowdly-web-editor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Key the document is saved under.
    pub storage_key: String,
    /// How long a delete can be undone.
    pub undo_window_ms: u64,
    /// Interval between rich-text engine readiness checks.
    pub ready_poll_ms: u64,
    /// Slots per block kind.
    pub pool: PoolLayout,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            undo_window_ms: 8_000,
            ready_poll_ms: 50,
            pool: PoolLayout::default(),
        }
    }
}

impl EditorConfig {
    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    /// `~/.config/crowdly/editor.toml` (platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("crowdly").join("editor.toml"))
    }

    /// `~/.local/share/crowdly/editor.db` (platform equivalent).
    pub fn default_db_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("crowdly").join("editor.db"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(EditorConfig::from_toml("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EditorConfig::from_toml(
            r#"
            undo_window_ms = 3000

            [pool]
            paragraphs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.undo_window(), Duration::from_secs(3));
        assert_eq!(config.ready_poll(), Duration::from_millis(50));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.pool.paragraphs, 5);
        assert_eq!(config.pool.chapters, 10);
    }

    #[test]
    fn test_rejects_bad_types() {
        assert!(matches!(
            EditorConfig::from_toml("undo_window_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.toml");
        std::fs::write(&path, "storage_key = \"draft\"\n").unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap().storage_key, "draft");
    }
}
