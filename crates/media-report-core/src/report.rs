use crate::classify::{classify, ClassifiedRows, ReportKind};
use crate::error::ReportError;
use crate::filter::{filter_unwatched, order_candidates, select_libraries};
use crate::policy::{handle_failure, RecordedFailure, Stage};
use crate::progress::ProgressTracker;
use crate::writer::write_report;
use media_report_config::{Config, FailurePolicy, SortOrder};
use media_report_models::{LibraryItem, LibraryRef, RatingKey, ReportRow};
use media_report_sources::MediaCatalog;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Everything a single report run needs besides the catalog itself.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub libraries: Vec<String>,
    pub max_age_seconds: u64,
    pub page_size: u32,
    pub sort_order: SortOrder,
    pub deduplicate: bool,
    pub movies_path: PathBuf,
    pub shows_path: PathBuf,
    pub failure_policy: FailurePolicy,
}

impl ReportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            libraries: config.report.libraries.clone(),
            max_age_seconds: config.report.max_age_seconds,
            page_size: config.report.page_size,
            sort_order: config.report.sort_order,
            deduplicate: config.report.deduplicate,
            movies_path: config.report.movies_path(),
            shows_path: config.report.shows_path(),
            failure_policy: config.failure_policy.clone(),
        }
    }
}

/// Hooks for presenting a run while it happens. All methods default to no-ops.
pub trait ReportObserver: Send + Sync {
    fn libraries_resolved(&self, _libraries: &[LibraryRef]) {}
    fn candidates_ready(&self, _total: usize) {}
    fn metadata_attempted(&self, _position: usize, _key: RatingKey) {}
    fn row_classified(&self, _kind: ReportKind, _row: &ReportRow) {}
    fn metadata_finished(&self) {}
}

pub struct NoopObserver;

impl ReportObserver for NoopObserver {}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Names of the libraries that matched the configured list
    pub libraries: Vec<String>,
    pub items_retained: usize,
    pub candidates: usize,
    pub metadata_attempted: usize,
    pub movies: usize,
    pub shows: usize,
    /// Key at which the metadata loop stopped early, if it did
    pub stopped_at: Option<RatingKey>,
    pub failures: Vec<RecordedFailure>,
    pub movies_path: PathBuf,
    pub shows_path: PathBuf,
    pub duration_seconds: f64,
    #[serde(skip)]
    pub duration: Duration,
}

/// Rows plus the summary of how they were produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub rows: ClassifiedRows,
    pub summary: ReportSummary,
}

struct Candidates {
    libraries: Vec<String>,
    items_retained: usize,
    keys: Vec<RatingKey>,
}

struct MetadataPass {
    rows: ClassifiedRows,
    attempted: usize,
    stopped_at: Option<RatingKey>,
}

pub struct ReportRunner {
    catalog: Box<dyn MediaCatalog>,
    options: ReportOptions,
    observer: Box<dyn ReportObserver>,
}

impl ReportRunner {
    pub fn new(catalog: Box<dyn MediaCatalog>, options: ReportOptions) -> Self {
        Self {
            catalog,
            options,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ReportObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build both reports and write them to disk.
    ///
    /// `now` is epoch seconds, fixed for the whole run. Nothing is written
    /// when a stage configured to abort fails.
    pub async fn run(&self, now: i64) -> Result<ReportSummary, ReportError> {
        let outcome = self.build(now).await?;

        write_report(&self.options.movies_path, &outcome.rows.movies)?;
        write_report(&self.options.shows_path, &outcome.rows.shows)?;
        info!(
            movies = outcome.summary.movies,
            shows = outcome.summary.shows,
            movies_path = %self.options.movies_path.display(),
            shows_path = %self.options.shows_path.display(),
            "Reports written"
        );

        Ok(outcome.summary)
    }

    /// Build both reports in memory without touching the filesystem.
    #[instrument(skip(self), fields(source = self.catalog.source_name()))]
    pub async fn build(&self, now: i64) -> Result<ReportOutcome, ReportError> {
        let start = Instant::now();
        let mut failures = Vec::new();

        let candidates = self.collect_candidates(now, &mut failures).await?;
        let keys = order_candidates(candidates.keys, self.options.sort_order, self.options.deduplicate);
        let candidate_count = keys.len();
        debug!(candidates = candidate_count, order = ?self.options.sort_order, "Candidate keys ordered");

        let pass = self.fetch_and_classify(&keys, &mut failures).await?;

        let duration = start.elapsed();
        let summary = ReportSummary {
            libraries: candidates.libraries,
            items_retained: candidates.items_retained,
            candidates: candidate_count,
            metadata_attempted: pass.attempted,
            movies: pass.rows.movies.len(),
            shows: pass.rows.shows.len(),
            stopped_at: pass.stopped_at,
            failures,
            movies_path: self.options.movies_path.clone(),
            shows_path: self.options.shows_path.clone(),
            duration_seconds: duration.as_secs_f64(),
            duration,
        };

        Ok(ReportOutcome {
            rows: pass.rows,
            summary,
        })
    }

    /// Libraries from the catalog whose names are in the configured list.
    pub async fn resolve_libraries(&self, failures: &mut Vec<RecordedFailure>) -> Result<Vec<LibraryRef>, ReportError> {
        match self.catalog.libraries().await {
            Ok(all) => {
                let selected = select_libraries(all, &self.options.libraries);
                if selected.is_empty() {
                    info!(configured = ?self.options.libraries, "No libraries matched the configured names");
                }
                Ok(selected)
            }
            Err(e) => {
                handle_failure(&self.options.failure_policy, Stage::Libraries, "libraries table".to_string(), e, failures)?;
                Ok(Vec::new())
            }
        }
    }

    /// Never-played, old-enough items of one library, in service order.
    pub async fn unwatched_items(
        &self,
        library: &LibraryRef,
        now: i64,
        failures: &mut Vec<RecordedFailure>,
    ) -> Result<Vec<LibraryItem>, ReportError> {
        match self.catalog.library_items(&library.section_id, self.options.page_size).await {
            Ok(items) => {
                let fetched = items.len();
                let kept = filter_unwatched(items, now, self.options.max_age_seconds);
                info!(library = %library.section_name, fetched, unwatched = kept.len(), "Library scanned");
                Ok(kept)
            }
            Err(e) => {
                handle_failure(
                    &self.options.failure_policy,
                    Stage::LibraryItems,
                    library.section_name.clone(),
                    e,
                    failures,
                )?;
                Ok(Vec::new())
            }
        }
    }

    /// Movies (and any other non-show kind) map to their own key; shows and
    /// episodes expand to every episode key under the show.
    pub async fn expand(&self, item: &LibraryItem, failures: &mut Vec<RecordedFailure>) -> Result<Vec<RatingKey>, ReportError> {
        if !item.media_type.needs_expansion() {
            return Ok(vec![item.rating_key]);
        }

        match self.catalog.episode_keys(item.rating_key, &item.media_type).await {
            Ok(keys) => {
                debug!(rating_key = %item.rating_key, title = %item.title, episodes = keys.len(), "Expanded to episodes");
                Ok(keys)
            }
            Err(e) => {
                handle_failure(
                    &self.options.failure_policy,
                    Stage::Expansion,
                    item.rating_key.to_string(),
                    e,
                    failures,
                )?;
                Ok(Vec::new())
            }
        }
    }

    async fn collect_candidates(&self, now: i64, failures: &mut Vec<RecordedFailure>) -> Result<Candidates, ReportError> {
        let libraries = self.resolve_libraries(failures).await?;
        self.observer.libraries_resolved(&libraries);

        let mut items_retained = 0;
        let mut keys = Vec::new();
        for library in &libraries {
            let items = self.unwatched_items(library, now, failures).await?;
            items_retained += items.len();
            for item in &items {
                keys.extend(self.expand(item, failures).await?);
            }
        }

        Ok(Candidates {
            libraries: libraries.into_iter().map(|l| l.section_name).collect(),
            items_retained,
            keys,
        })
    }

    async fn fetch_and_classify(&self, keys: &[RatingKey], failures: &mut Vec<RecordedFailure>) -> Result<MetadataPass, ReportError> {
        let policy = &self.options.failure_policy;
        let mut tracker = ProgressTracker::new(keys.len(), 50);
        let mut rows = ClassifiedRows::default();
        let mut attempted = 0;
        let mut stopped_at = None;

        self.observer.candidates_ready(keys.len());

        for (idx, key) in keys.iter().enumerate() {
            attempted += 1;
            self.observer.metadata_attempted(idx + 1, *key);

            match self.catalog.metadata(*key).await {
                Ok(metadata) => {
                    let (kind, row) = classify(&metadata);
                    match kind {
                        ReportKind::Movie => tracker.record_movie(),
                        ReportKind::Show => tracker.record_show(),
                    }
                    self.observer.row_classified(kind, &row);
                    rows.push(kind, row);
                }
                Err(e) if policy.stop_at_end_of_range && e.is_end_of_range() => {
                    info!(rating_key = %key, "Metadata lookup returned nothing, treating as end of range");
                    tracker.record_failed(e.category());
                    failures.push(RecordedFailure {
                        stage: Stage::Metadata,
                        subject: key.to_string(),
                        category: e.category(),
                        message: e.to_string(),
                    });
                    stopped_at = Some(*key);
                    break;
                }
                Err(e) => {
                    tracker.record_failed(e.category());
                    if let Err(abort) = handle_failure(policy, Stage::Metadata, key.to_string(), e, failures) {
                        self.observer.metadata_finished();
                        return Err(abort);
                    }
                }
            }

            tracker.log_progress(idx + 1);
        }

        self.observer.metadata_finished();
        tracker.log_summary("Metadata fetch");

        Ok(MetadataPass {
            rows,
            attempted,
            stopped_at,
        })
    }
}

#[cfg(test)]
mod tests;
