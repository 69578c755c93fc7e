use crate::media::RatingKey;
use serde::Serialize;

/// Column names shared by both report files.
pub const REPORT_HEADER: [&str; 4] = ["Title", "Rating Key", "Date Added", "File Location"];

/// One line of a report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Rating Key")]
    pub rating_key: RatingKey,
    #[serde(rename = "Date Added")]
    pub date_added: String,
    #[serde(rename = "File Location")]
    pub file: String,
}
