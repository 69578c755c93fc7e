pub mod classify;
pub mod error;
pub mod filter;
pub mod policy;
pub mod progress;
pub mod report;
pub mod writer;

pub use classify::{classify, format_added, ClassifiedRows, ReportKind};
pub use error::ReportError;
pub use filter::{filter_unwatched, order_candidates, select_libraries};
pub use policy::{RecordedFailure, Stage};
pub use report::{NoopObserver, ReportObserver, ReportOptions, ReportOutcome, ReportRunner, ReportSummary};
pub use writer::write_report;
