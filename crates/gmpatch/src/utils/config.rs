//! Project configuration management.
//!
//! A patch project is a directory holding `gmpatch.config.json`, which points
//! at the game's archive directory and the output root the scope folders are
//! written under.

use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

pub const CONFIG_FILE_NAME: &str = "gmpatch.config.json";

/// Project-wide configuration stored in gmpatch.config.json.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Directory containing the game's archive file.
    pub game_dir: Utf8PathBuf,
    /// Root directory the scope folders live under.
    pub output_dir: Utf8PathBuf,
    /// File name of the active archive inside `game_dir`.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    /// Scopes the project manages, e.g. chapters plus `global`.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_archive_name() -> String {
    "data.win".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["global".to_string()]
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            game_dir: Utf8PathBuf::from("."),
            output_dir: Utf8PathBuf::from("patches"),
            archive_name: default_archive_name(),
            scopes: default_scopes(),
        }
    }
}

impl ToolConfig {
    /// The archive file the game actually loads.
    pub fn active_archive_path(&self) -> Utf8PathBuf {
        self.game_dir.join(&self.archive_name)
    }

    /// The pristine copy generation diffs against.
    pub fn vanilla_archive_path(&self) -> Utf8PathBuf {
        self.game_dir.join(archive_variant(&self.archive_name, "vanilla"))
    }

    /// The operator-managed safety copy.
    pub fn backup_archive_path(&self) -> Utf8PathBuf {
        self.game_dir.join(archive_variant(&self.archive_name, "backup"))
    }

    pub fn load(path: &Utf8Path) -> miette::Result<Self> {
        let content = fs::read_to_string(path.as_std_path()).map_err(CliError::from)?;
        let config =
            serde_json::from_str(&content).map_err(|source| CliError::ConfigParseError { source })?;
        Ok(config)
    }

    pub fn save(&self, path: &Utf8Path) -> miette::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|source| CliError::ConfigParseError { source })?;
        fs::write(path.as_std_path(), content).map_err(CliError::from)?;
        Ok(())
    }
}

/// `data.win` + `vanilla` -> `data-vanilla.win`.
fn archive_variant(archive_name: &str, suffix: &str) -> String {
    match archive_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}-{suffix}.{extension}"),
        None => format!("{archive_name}-{suffix}"),
    }
}

/// Resolve the config file path: an explicit `--config-path`, else
/// `gmpatch.config.json` in the current directory.
pub fn resolve_config_path(config_path: Option<String>) -> miette::Result<Utf8PathBuf> {
    let path = match config_path {
        Some(path) => Utf8PathBuf::from(path),
        None => Utf8PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.as_std_path().exists() {
        return Err(CliError::ConfigNotFound { search_path: path }.into());
    }
    Ok(path)
}

/// Resolve and load in one step; most commands start here.
pub fn load_config(config_path: Option<String>) -> miette::Result<ToolConfig> {
    let path = resolve_config_path(config_path)?;
    ToolConfig::load(&path)
}
