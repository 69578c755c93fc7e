pub mod config;
pub mod paths;

pub use config::{Config, FailureAction, FailurePolicy, ReportConfig, SortOrder, TautulliConfig, DEFAULT_MAX_AGE_SECONDS, PLACEHOLDER_API_KEY};
pub use paths::{PathManager, config_dir_override};
