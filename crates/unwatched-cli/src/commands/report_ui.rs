use crate::output::Output;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use media_report_core::{ReportKind, ReportObserver};
use media_report_models::{LibraryRef, RatingKey, ReportRow};
use serde_json::json;
use std::io::IsTerminal;
use std::time::Duration;

/// Console presentation of a report run: a spinner while libraries are
/// scanned, a bar over the metadata loop, and one line per reported row.
pub struct ReportUI {
    output: Output,
    multi: MultiProgress,
    spinner: ProgressBar,
    bar: ProgressBar,
    interactive: bool,
}

impl ReportUI {
    pub fn new(output: Output) -> Self {
        let interactive = is_interactive() && output.is_human() && !output.is_quiet();
        let multi = MultiProgress::new();

        let (spinner, bar) = if interactive {
            let spinner = multi.add(ProgressBar::new_spinner());
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            spinner.set_message("Scanning libraries...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            let bar = multi.add(ProgressBar::new(0));
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            (spinner, bar)
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bars disabled, using structured logging"
            );
            (ProgressBar::hidden(), ProgressBar::hidden())
        };

        Self {
            output,
            multi,
            spinner,
            bar,
            interactive,
        }
    }

    fn emit_line(&self, line: String) {
        if self.interactive {
            let _ = self.multi.println(line);
        } else {
            self.output.info(line);
        }
    }
}

impl ReportObserver for ReportUI {
    fn libraries_resolved(&self, libraries: &[LibraryRef]) {
        let names: Vec<&str> = libraries.iter().map(|l| l.section_name.as_str()).collect();
        if self.interactive {
            self.spinner.set_message(format!("Expanding unwatched items in {}...", names.join(", ")));
        } else {
            tracing::info!(operation = "progress", libraries = ?names, "Libraries resolved");
        }
    }

    fn candidates_ready(&self, total: usize) {
        if self.interactive {
            self.spinner.finish_and_clear();
            self.bar.set_length(total as u64);
            self.bar.set_message("Fetching metadata");
        } else {
            tracing::info!(operation = "progress", total, "Fetching metadata for candidate rating keys");
        }
    }

    fn metadata_attempted(&self, position: usize, key: RatingKey) {
        if self.interactive {
            self.bar.set_position(position as u64);
            self.bar.set_message(format!("rating key {}", key));
        }
    }

    fn row_classified(&self, kind: ReportKind, row: &ReportRow) {
        if self.output.is_human() {
            self.emit_line(unwatched_line(row));
            self.emit_line(format!("File location: {}", row.file));
        } else {
            self.output.json(&json!({
                "type": "row",
                "report": kind,
                "title": row.title,
                "rating_key": row.rating_key,
                "date_added": row.date_added,
                "file": row.file,
            }));
        }
    }

    fn metadata_finished(&self) {
        if self.interactive {
            self.spinner.finish_and_clear();
            self.bar.finish_and_clear();
        }
    }
}

/// `Old Film (101) was added Tue Nov 14 22:13:20 2023 and has not been watched.`
pub fn unwatched_line(row: &ReportRow) -> String {
    format!(
        "{} ({}) was added {} and has not been watched.",
        row.title, row.rating_key, row.date_added
    )
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
