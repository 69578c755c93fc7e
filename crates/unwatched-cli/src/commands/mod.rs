pub mod config;
pub mod prompts;
pub mod report;
pub mod report_ui;

use color_eyre::Result;
use media_report_config::{Config, PathManager};
use std::path::{Path, PathBuf};

/// `<config_dir>/unwatched/config.toml`, or under `UNWATCHED_CONFIG_DIR` when set.
pub fn default_config_path() -> PathBuf {
    PathManager::default().config_file()
}

/// Load the config file, falling back to defaults when it does not exist yet.
pub fn load_config(path: &Path) -> Result<Config> {
    Config::load_or_default(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", path.display(), e))
}
