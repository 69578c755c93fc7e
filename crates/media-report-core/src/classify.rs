use chrono::{Local, TimeZone};
use media_report_models::{MediaMetadata, ReportRow};
use serde::Serialize;

/// Which report file a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Movie,
    Show,
}

/// Rows for both report files, in metadata fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedRows {
    pub movies: Vec<ReportRow>,
    pub shows: Vec<ReportRow>,
}

impl ClassifiedRows {
    pub fn push(&mut self, kind: ReportKind, row: ReportRow) {
        match kind {
            ReportKind::Movie => self.movies.push(row),
            ReportKind::Show => self.shows.push(row),
        }
    }
}

/// Route a metadata record to the movies or shows report and build its row.
///
/// Records with no series title, or an explicit movie kind, are movies;
/// everything else is an episode titled `"<series>: <episode>"`.
pub fn classify(metadata: &MediaMetadata) -> (ReportKind, ReportRow) {
    let kind = if metadata.is_movie() {
        ReportKind::Movie
    } else {
        ReportKind::Show
    };

    let row = ReportRow {
        title: metadata.display_title(),
        rating_key: metadata.rating_key,
        date_added: format_added(metadata.added_at),
        file: metadata.file.clone(),
    };

    (kind, row)
}

/// Render epoch seconds the way C `ctime` does, in local time:
/// `Mon Nov 14 21:36:44 2016`.
pub fn format_added(added_at: i64) -> String {
    match Local.timestamp_opt(added_at, 0).single() {
        Some(local) => local.format("%a %b %e %H:%M:%S %Y").to_string(),
        None => added_at.to_string(),
    }
}
