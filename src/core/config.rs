//! # Configuration
//!
//! The settings document: one fixed-shape record grouped by domain.
//!
//! Settings live in `.cellview.toml` under the working root unless a path is
//! given on the command line. A missing file means "all defaults"; every
//! section is optional in the file so sparse configs parse.
//!
//! Fields are addressed by dotted keys (`git.branch`, `watcher.debounce_delay`)
//! through [`crate::core::accessor`], never by reflection.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::duration;

// ============================================================================
// Settings Document
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub git: GitSettings,
    #[serde(default)]
    pub watcher: WatcherSettings,
    #[serde(default)]
    pub converter: ConverterSettings,
    #[serde(default)]
    pub features: FeatureSettings,
    #[serde(default)]
    pub updates: UpdateSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GitSettings {
    pub remote: String,
    pub branch: String,
    pub auto_push: bool,
    pub auto_pull: bool,
    pub user_name: String,
    pub user_email: String,
    pub commit_template: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub directories: Vec<String>,
    pub ignore_patterns: Vec<String>,
    #[serde(with = "duration::serde_str")]
    pub debounce_delay: Duration,
    pub file_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterSettings {
    pub preserve_formulas: bool,
    pub preserve_styles: bool,
    pub preserve_comments: bool,
    pub compact_json: bool,
    pub ignore_empty_cells: bool,
    pub max_cells_per_sheet: i64,
    pub chunking_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub experimental: bool,
    pub beta_updates: bool,
    pub telemetry: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateSettings {
    pub auto_check: bool,
    #[serde(with = "duration::serde_str")]
    pub check_interval: Duration,
    pub include_prereleases: bool,
    pub auto_download: bool,
    pub notify_on_update: bool,
}

// ============================================================================
// Defaults
// ============================================================================

pub const CONFIG_FILE_NAME: &str = ".cellview.toml";
pub const DEFAULT_MAX_CELLS_PER_SHEET: i64 = 1_000_000;
pub const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &[".xlsx", ".xls", ".xlsm"];

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: String::new(),
            branch: "main".to_string(),
            auto_push: false,
            auto_pull: true,
            user_name: "GitCells".to_string(),
            user_email: "gitcells@localhost".to_string(),
            commit_template: "GitCells: {action} {filename} at {timestamp}".to_string(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            ignore_patterns: vec!["~$*".into(), "*.tmp".into(), ".~lock.*".into()],
            debounce_delay: Duration::from_secs(2),
            file_extensions: DEFAULT_DOCUMENT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            preserve_formulas: true,
            preserve_styles: true,
            preserve_comments: true,
            compact_json: false,
            ignore_empty_cells: true,
            max_cells_per_sheet: DEFAULT_MAX_CELLS_PER_SHEET,
            chunking_strategy: "sheet-based".to_string(),
        }
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            experimental: false,
            beta_updates: false,
            telemetry: true,
        }
    }
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            auto_check: true,
            check_interval: Duration::from_secs(24 * 3600),
            include_prereleases: false,
            auto_download: false,
            notify_on_update: true,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading & Saving
// ============================================================================

/// Where settings live: the explicit path if given, else `<root>/.cellview.toml`.
pub fn config_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME))
}

/// Load settings from `path`. A missing file yields the defaults;
/// a malformed one is a `ConfigError::Parse`.
pub fn load_settings(path: &Path) -> Result<SettingsDocument, ConfigError> {
    if !path.exists() {
        info!("No settings file at {}, using defaults", path.display());
        return Ok(SettingsDocument::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let settings: SettingsDocument = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded settings from {}", path.display());
    debug!("Settings: {:?}", settings);
    Ok(settings)
}

/// Write settings as pretty TOML, creating the parent directory if needed.
pub fn save_settings(path: &Path, settings: &SettingsDocument) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(settings).map_err(ConfigError::Serialize)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(ConfigError::Io)?;
    }
    fs::write(path, contents).map_err(ConfigError::Io)?;
    info!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SettingsDocument::default();
        assert_eq!(settings.git.branch, "main");
        assert!(settings.git.auto_pull);
        assert!(!settings.git.auto_push);
        assert_eq!(settings.watcher.debounce_delay, Duration::from_secs(2));
        assert_eq!(settings.watcher.file_extensions, vec![".xlsx", ".xls", ".xlsm"]);
        assert_eq!(settings.converter.max_cells_per_sheet, DEFAULT_MAX_CELLS_PER_SHEET);
        assert!(settings.converter.ignore_empty_cells);
        assert!(settings.features.telemetry);
        assert_eq!(settings.updates.check_interval, Duration::from_secs(86_400));
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[git]
branch = "develop"
"#;
        let settings: SettingsDocument = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.git.branch, "develop");
        assert_eq!(settings.git.user_name, "GitCells");
        assert_eq!(settings.converter, ConverterSettings::default());
    }

    #[test]
    fn test_durations_are_strings_in_toml() {
        let toml_str = r#"
[watcher]
debounce_delay = "1h30m"

[updates]
check_interval = "500ms"
"#;
        let settings: SettingsDocument = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.watcher.debounce_delay, Duration::from_secs(5400));
        assert_eq!(settings.updates.check_interval, Duration::from_millis(500));

        let written = toml::to_string_pretty(&settings).unwrap();
        assert!(written.contains("debounce_delay = \"1h30m\""));
    }

    #[test]
    fn test_bad_duration_is_parse_error() {
        let toml_str = r#"
[watcher]
debounce_delay = "soon"
"#;
        assert!(toml::from_str::<SettingsDocument>(toml_str).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, SettingsDocument::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = SettingsDocument::default();
        settings.git.remote = "origin".to_string();
        settings.watcher.directories = vec!["reports".to_string()];

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[git\nbranch = ").unwrap();
        assert!(matches!(load_settings(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_path_prefers_explicit() {
        let root = Path::new("/work");
        assert_eq!(config_path(root, None), root.join(CONFIG_FILE_NAME));
        assert_eq!(
            config_path(root, Some(Path::new("/etc/cv.toml"))),
            PathBuf::from("/etc/cv.toml")
        );
    }
}
