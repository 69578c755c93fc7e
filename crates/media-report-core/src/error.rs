use crate::policy::Stage;
use media_report_sources::SourceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A failure hit a stage whose policy is `abort`.
    #[error("report aborted during {stage} ({subject}): {source}")]
    Aborted {
        stage: Stage,
        subject: String,
        #[source]
        source: SourceError,
    },

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to create report directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
