use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the project-local database and config.
pub const PROJECT_DIR: &str = ".drishti";

/// Project configuration, loaded from `.drishti/config.toml`.
///
/// Every section and key is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Client-side view behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Fixed page size for client-side pagination.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Lifetime of transient notices, in seconds.
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            notice_ttl_secs: default_notice_ttl(),
        }
    }
}

/// Lifecycle policy selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Use the strict transition table instead of the permissive default.
    #[serde(default)]
    pub strict_transitions: bool,
}

/// Reference store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path, relative to the project root.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

/// Per-user preferences, under `dirs::config_dir()/drishti/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode: `pretty`, `text`, or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Load the project config, falling back to defaults when the file is
/// absent.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("drishti/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_page_size() -> usize {
    12
}

const fn default_notice_ttl() -> u64 {
    5
}

fn default_db_path() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("issues.db")
}

#[cfg(test)]
mod tests {
    use super::{ProjectConfig, load_project_config};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("drishti-config-test-{label}-{id}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = make_temp_dir("project-default");
        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg.client.page_size, 12);
        assert_eq!(cfg.client.notice_ttl_secs, 5);
        assert!(!cfg.lifecycle.strict_transitions);
        assert!(cfg.store.db_path.ends_with("issues.db"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn partial_config_keeps_defaults_for_omitted_keys() {
        let root = make_temp_dir("project-partial");
        let dir = root.join(".drishti");
        std::fs::create_dir_all(&dir).expect("create project dir");
        std::fs::write(
            dir.join("config.toml"),
            "[client]\npage_size = 24\n\n[lifecycle]\nstrict_transitions = true\n",
        )
        .expect("write config");

        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg.client.page_size, 24);
        assert_eq!(cfg.client.notice_ttl_secs, 5, "omitted key keeps default");
        assert!(cfg.lifecycle.strict_transitions);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let root = make_temp_dir("project-bad");
        let dir = root.join(".drishti");
        std::fs::create_dir_all(&dir).expect("create project dir");
        std::fs::write(dir.join("config.toml"), "client = \"not a table\"").expect("write");

        assert!(load_project_config(&root).is_err());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn defaults_roundtrip_through_toml() {
        let cfg = ProjectConfig::default();
        let rendered = toml::to_string(&cfg).expect("serialize");
        let back: ProjectConfig = toml::from_str(&rendered).expect("parse");
        assert_eq!(back.client.page_size, cfg.client.page_size);
        assert_eq!(back.lifecycle.strict_transitions, cfg.lifecycle.strict_transitions);
    }
}
