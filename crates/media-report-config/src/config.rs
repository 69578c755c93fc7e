use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Roughly six months.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 15_770_000;

/// Value written by `config init` templates before a real key is supplied.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tautulli: TautulliConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TautulliConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Library display names to scan, matched exactly
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub deduplicate: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_movies_file")]
    pub movies_file: String,
    #[serde(default = "default_shows_file")]
    pub shows_file: String,
}

/// Order in which candidate rating keys are fetched and written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest keys first
    #[default]
    Descending,
    Ascending,
}

/// What to do when one upstream call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    /// Log the failure, drop the affected library/item, keep going
    #[default]
    Skip,
    /// Stop the whole run without writing reports
    Abort,
}

/// Per-stage failure handling for a report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Listing the libraries table
    #[serde(default)]
    pub libraries: FailureAction,
    /// Listing one library's media info
    #[serde(default)]
    pub library_items: FailureAction,
    /// Expanding a show or episode into episode keys
    #[serde(default)]
    pub expansion: FailureAction,
    /// Fetching metadata for one rating key
    #[serde(default)]
    pub metadata: FailureAction,
    /// Treat an empty metadata response as the end of the valid key range
    /// and stop fetching further keys
    #[serde(default)]
    pub stop_at_end_of_range: bool,
}

fn default_url() -> String {
    "http://localhost:8181/tautulli".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_libraries() -> Vec<String> {
    vec!["TV Shows".to_string(), "Movies".to_string()]
}

fn default_max_age_seconds() -> u64 {
    DEFAULT_MAX_AGE_SECONDS
}

fn default_page_size() -> u32 {
    10_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_movies_file() -> String {
    "unwatched_movies.csv".to_string()
}

fn default_shows_file() -> String {
    "unwatched_shows.csv".to_string()
}

impl Default for TautulliConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            libraries: default_libraries(),
            max_age_seconds: default_max_age_seconds(),
            page_size: default_page_size(),
            sort_order: SortOrder::default(),
            deduplicate: false,
            output_dir: default_output_dir(),
            movies_file: default_movies_file(),
            shows_file: default_shows_file(),
        }
    }
}

impl ReportConfig {
    pub fn movies_path(&self) -> PathBuf {
        self.output_dir.join(&self.movies_file)
    }

    pub fn shows_path(&self) -> PathBuf {
        self.output_dir.join(&self.shows_file)
    }
}

impl TautulliConfig {
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY && key != "api_key"
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.tautulli.url.trim();
        if url.is_empty() {
            return Err(anyhow::anyhow!("tautulli.url is required"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow::anyhow!("tautulli.url must start with http:// or https://: {}", url));
        }
        if !self.tautulli.has_api_key() {
            return Err(anyhow::anyhow!("tautulli.api_key is not configured"));
        }
        if self.tautulli.timeout_secs == 0 {
            return Err(anyhow::anyhow!("tautulli.timeout_secs must be greater than zero"));
        }

        if self.report.libraries.iter().all(|name| name.trim().is_empty()) {
            return Err(anyhow::anyhow!("report.libraries must name at least one library"));
        }
        if self.report.max_age_seconds == 0 {
            return Err(anyhow::anyhow!("report.max_age_seconds must be greater than zero"));
        }
        if self.report.page_size == 0 {
            return Err(anyhow::anyhow!("report.page_size must be greater than zero"));
        }
        if self.report.movies_file.trim().is_empty() || self.report.shows_file.trim().is_empty() {
            return Err(anyhow::anyhow!("report.movies_file and report.shows_file cannot be empty"));
        }
        if self.report.movies_file == self.report.shows_file {
            return Err(anyhow::anyhow!(
                "report.movies_file and report.shows_file must differ (both are {})",
                self.report.movies_file
            ));
        }

        Ok(())
    }
}
