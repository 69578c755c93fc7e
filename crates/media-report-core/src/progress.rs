use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Progress tracker for the metadata loop.
/// Logs periodic progress lines and a final summary instead of one line per key.
pub struct ProgressTracker {
    total: usize,
    movies: usize,
    shows: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize, // Log every N keys
    last_progress_log: usize,
    error_counts: HashMap<&'static str, usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 0 {
            info!("Fetching metadata for {} rating keys", total);
        }
        Self {
            total,
            movies: 0,
            shows: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_movie(&mut self) {
        self.movies += 1;
    }

    pub fn record_show(&mut self) {
        self.shows += 1;
    }

    /// Record a failed key, grouped by error category for the summary.
    pub fn record_failed(&mut self, category: &'static str) {
        self.failed += 1;
        *self.error_counts.entry(category).or_insert(0) += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// `current` is 1-based.
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        info!(
            "Progress: {}/{} ({:.1} keys/sec) | Movies: {} | Episodes: {} | Failed: {}",
            current, self.total, rate, self.movies, self.shows, self.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed > 0 {
            warn!(
                "{} completed: {} keys in {:.1}s | Movies: {} | Episodes: {} | Failed: {}",
                operation_name, self.total, elapsed, self.movies, self.shows, self.failed
            );

            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {} keys in {:.1}s | Movies: {} | Episodes: {}",
                operation_name, self.total, elapsed, self.movies, self.shows
            );
        }
    }
}
