use crate::error::ReportError;
use media_report_models::{ReportRow, REPORT_HEADER};
use std::path::Path;
use tracing::debug;

/// Write one report file, replacing any previous content.
///
/// The header is always written, so a run with no qualifying items still
/// leaves a header-only file behind.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let write_err = |source: csv::Error| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_err)?;

    writer.write_record(REPORT_HEADER).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;

    debug!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}
