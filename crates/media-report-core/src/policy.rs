use crate::error::ReportError;
use media_report_config::{FailureAction, FailurePolicy};
use media_report_sources::SourceError;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Pipeline stage an upstream call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Libraries,
    LibraryItems,
    Expansion,
    Metadata,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Libraries => "libraries",
            Stage::LibraryItems => "library_items",
            Stage::Expansion => "expansion",
            Stage::Metadata => "metadata",
        }
    }

    pub fn action(&self, policy: &FailurePolicy) -> FailureAction {
        match self {
            Stage::Libraries => policy.libraries,
            Stage::LibraryItems => policy.library_items,
            Stage::Expansion => policy.expansion,
            Stage::Metadata => policy.metadata,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that was logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedFailure {
    pub stage: Stage,
    /// Library name or rating key the call was about
    pub subject: String,
    pub category: &'static str,
    pub message: String,
}

/// Apply the policy for `stage` to one failed call.
///
/// `Skip` records the failure and returns `Ok`, `Abort` turns it into a
/// run-ending [`ReportError::Aborted`].
pub fn handle_failure(
    policy: &FailurePolicy,
    stage: Stage,
    subject: String,
    error: SourceError,
    failures: &mut Vec<RecordedFailure>,
) -> Result<(), ReportError> {
    match stage.action(policy) {
        FailureAction::Skip => {
            warn!(stage = %stage, subject = %subject, category = error.category(), error = %error, "Upstream call failed, skipping");
            failures.push(RecordedFailure {
                stage,
                subject,
                category: error.category(),
                message: error.to_string(),
            });
            Ok(())
        }
        FailureAction::Abort => Err(ReportError::Aborted {
            stage,
            subject,
            source: error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_records_failure() {
        let policy = FailurePolicy::default();
        let mut failures = Vec::new();

        handle_failure(
            &policy,
            Stage::Expansion,
            "301".to_string(),
            SourceError::malformed("get_new_rating_keys", "missing top-level entry"),
            &mut failures,
        )
        .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Expansion);
        assert_eq!(failures[0].subject, "301");
        assert_eq!(failures[0].category, "malformed");
    }

    #[test]
    fn test_abort_returns_error() {
        let policy = FailurePolicy {
            library_items: FailureAction::Abort,
            ..FailurePolicy::default()
        };
        let mut failures = Vec::new();

        let err = handle_failure(
            &policy,
            Stage::LibraryItems,
            "Movies".to_string(),
            SourceError::EmptyResult { command: "get_library_media_info" },
            &mut failures,
        )
        .unwrap_err();

        assert!(failures.is_empty());
        assert!(matches!(err, ReportError::Aborted { stage: Stage::LibraryItems, .. }));
        assert!(err.to_string().contains("library_items (Movies)"));
    }

    #[test]
    fn test_stage_actions() {
        let policy = FailurePolicy {
            metadata: FailureAction::Abort,
            ..FailurePolicy::default()
        };
        assert_eq!(Stage::Metadata.action(&policy), FailureAction::Abort);
        assert_eq!(Stage::Libraries.action(&policy), FailureAction::Skip);
    }
}
