use super::*;
use crate::classify::format_added;
use async_trait::async_trait;
use media_report_config::FailureAction;
use media_report_models::{MediaKind, MediaMetadata};
use media_report_sources::SourceError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

const NOW: i64 = 1_700_000_000;
const OLD: i64 = NOW - 20_000_000;
const HEADER: &str = "Title,Rating Key,Date Added,File Location";

#[derive(Default)]
struct FakeCatalog {
    libraries: Vec<LibraryRef>,
    libraries_fail: bool,
    items: HashMap<String, Vec<LibraryItem>>,
    episodes: HashMap<u64, Vec<u64>>,
    metadata: HashMap<u64, MediaMetadata>,
    malformed: HashSet<u64>,
    item_requests: Arc<Mutex<Vec<String>>>,
    metadata_calls: Arc<Mutex<Vec<u64>>>,
}

impl FakeCatalog {
    fn library(mut self, section_id: &str, name: &str) -> Self {
        self.libraries.push(LibraryRef {
            section_id: section_id.to_string(),
            section_name: name.to_string(),
        });
        self.items.entry(section_id.to_string()).or_default();
        self
    }

    fn item(mut self, section_id: &str, key: u64, kind: MediaKind, added_at: i64, play_count: Option<u64>) -> Self {
        self.items.entry(section_id.to_string()).or_default().push(LibraryItem {
            added_at,
            parent_rating_key: None,
            play_count,
            title: format!("Item {}", key),
            rating_key: RatingKey(key),
            media_type: kind,
        });
        self
    }

    fn episodes(mut self, show_key: u64, keys: &[u64]) -> Self {
        self.episodes.insert(show_key, keys.to_vec());
        self
    }

    fn movie(mut self, key: u64, title: &str, file: &str) -> Self {
        self.metadata.insert(key, metadata(key, MediaKind::Movie, "", title, file));
        self
    }

    fn episode(mut self, key: u64, series: &str, title: &str) -> Self {
        let file = format!("/media/tv/{}/{}.mkv", series, key);
        self.metadata.insert(key, metadata(key, MediaKind::Episode, series, title, &file));
        self
    }

    fn malformed(mut self, key: u64) -> Self {
        self.malformed.insert(key);
        self
    }

    fn metadata_calls(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.metadata_calls)
    }
}

fn metadata(key: u64, kind: MediaKind, series: &str, title: &str, file: &str) -> MediaMetadata {
    MediaMetadata {
        added_at: OLD,
        parent_rating_key: None,
        title: title.to_string(),
        rating_key: RatingKey(key),
        media_type: kind,
        grandparent_title: series.to_string(),
        file: file.to_string(),
        file_size: Some(1_000),
    }
}

#[async_trait]
impl MediaCatalog for FakeCatalog {
    fn source_name(&self) -> &str {
        "fake"
    }

    async fn libraries(&self) -> Result<Vec<LibraryRef>, SourceError> {
        if self.libraries_fail {
            return Err(SourceError::Api {
                command: "get_libraries_table",
                message: "Invalid apikey".to_string(),
            });
        }
        Ok(self.libraries.clone())
    }

    async fn library_items(&self, section_id: &str, length: u32) -> Result<Vec<LibraryItem>, SourceError> {
        assert_eq!(length, 10_000);
        self.item_requests.lock().unwrap().push(section_id.to_string());
        self.items
            .get(section_id)
            .cloned()
            .ok_or_else(|| SourceError::malformed("get_library_media_info", "missing field `data`"))
    }

    async fn episode_keys(&self, rating_key: RatingKey, _media_type: &MediaKind) -> Result<Vec<RatingKey>, SourceError> {
        self.episodes
            .get(&rating_key.value())
            .map(|keys| keys.iter().copied().map(RatingKey).collect())
            .ok_or_else(|| SourceError::malformed("get_new_rating_keys", "missing top-level entry \"0\""))
    }

    async fn metadata(&self, rating_key: RatingKey) -> Result<MediaMetadata, SourceError> {
        self.metadata_calls.lock().unwrap().push(rating_key.value());
        if self.malformed.contains(&rating_key.value()) {
            return Err(SourceError::malformed("get_metadata", "media_info is empty"));
        }
        self.metadata
            .get(&rating_key.value())
            .cloned()
            .ok_or(SourceError::EmptyResult { command: "get_metadata" })
    }
}

fn options(dir: &Path) -> ReportOptions {
    ReportOptions {
        libraries: vec!["TV Shows".to_string(), "Movies".to_string()],
        max_age_seconds: 15_770_000,
        page_size: 10_000,
        sort_order: SortOrder::Descending,
        deduplicate: false,
        movies_path: dir.join("unwatched_movies.csv"),
        shows_path: dir.join("unwatched_shows.csv"),
        failure_policy: FailurePolicy::default(),
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

fn keys(rows: &[ReportRow]) -> Vec<u64> {
    rows.iter().map(|r| r.rating_key.value()).collect()
}

/// Movies library with three movies: 10, 20 and 30, all old and unplayed.
fn three_movies() -> FakeCatalog {
    FakeCatalog::default()
        .library("1", "Movies")
        .item("1", 10, MediaKind::Movie, OLD, None)
        .item("1", 20, MediaKind::Movie, OLD, None)
        .item("1", 30, MediaKind::Movie, OLD, None)
        .movie(10, "Ten", "/media/10.mkv")
        .movie(20, "Twenty", "/media/20.mkv")
        .movie(30, "Thirty", "/media/30.mkv")
}

#[tokio::test]
async fn test_single_old_movie_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("1", "Movies")
        .item("1", 101, MediaKind::Movie, OLD, None)
        .movie(101, "Old Film", "/media/old_film.mkv");

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let summary = runner.run(NOW).await.unwrap();

    assert_eq!(
        read_lines(&dir.path().join("unwatched_movies.csv")),
        vec![
            HEADER.to_string(),
            format!("Old Film,101,{},/media/old_film.mkv", format_added(OLD)),
        ]
    );
    assert_eq!(read_lines(&dir.path().join("unwatched_shows.csv")), vec![HEADER.to_string()]);

    assert_eq!(summary.libraries, vec!["Movies".to_string()]);
    assert_eq!(summary.items_retained, 1);
    assert_eq!(summary.movies, 1);
    assert_eq!(summary.shows, 0);
    assert!(summary.failures.is_empty());
}

#[tokio::test]
async fn test_show_expands_to_episodes_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("2", "TV Shows")
        .item("2", 400, MediaKind::Show, OLD, None)
        .episodes(400, &[501, 502])
        .episode(501, "My Show", "Pilot")
        .episode(502, "My Show", "Second");
    let calls = catalog.metadata_calls();

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert!(outcome.rows.movies.is_empty());
    assert_eq!(keys(&outcome.rows.shows), vec![502, 501]);
    assert_eq!(outcome.rows.shows[0].title, "My Show: Second");
    assert_eq!(outcome.rows.shows[1].title, "My Show: Pilot");
    assert_eq!(*calls.lock().unwrap(), vec![502, 501]);
}

#[tokio::test]
async fn test_played_and_recent_items_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("1", "Movies")
        .item("1", 101, MediaKind::Movie, OLD, None)
        .item("1", 102, MediaKind::Movie, OLD, Some(2))
        .item("1", 103, MediaKind::Movie, NOW - 1_000, None)
        .item("1", 104, MediaKind::Movie, OLD, Some(0))
        .movie(101, "Old Film", "/a.mkv")
        .movie(102, "Watched Film", "/b.mkv")
        .movie(103, "New Film", "/c.mkv")
        .movie(104, "Zero Plays", "/d.mkv");
    let calls = catalog.metadata_calls();

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(keys(&outcome.rows.movies), vec![101]);
    assert_eq!(*calls.lock().unwrap(), vec![101]);
    assert_eq!(outcome.summary.items_retained, 1);
}

#[tokio::test]
async fn test_candidates_from_all_libraries_sorted_descending() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("1", "Movies")
        .library("2", "TV Shows")
        .library("3", "Music")
        .item("1", 150, MediaKind::Movie, OLD, None)
        .item("1", 90, MediaKind::Movie, OLD, None)
        .item("2", 400, MediaKind::Show, OLD, None)
        .item("3", 999, MediaKind::Other("artist".to_string()), OLD, None)
        .episodes(400, &[120, 501, 60])
        .movie(150, "B", "/b.mkv")
        .movie(90, "A", "/a.mkv")
        .episode(120, "Show", "E1")
        .episode(501, "Show", "E2")
        .episode(60, "Show", "E3");
    let calls = catalog.metadata_calls();
    let item_requests = Arc::clone(&catalog.item_requests);

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![501, 150, 120, 90, 60]);
    assert_eq!(*item_requests.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
    assert_eq!(keys(&outcome.rows.movies), vec![150, 90]);
    assert_eq!(keys(&outcome.rows.shows), vec![501, 120, 60]);
    assert_eq!(outcome.summary.libraries, vec!["Movies".to_string(), "TV Shows".to_string()]);
}

#[tokio::test]
async fn test_ascending_order() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = three_movies();
    let calls = catalog.metadata_calls();

    let mut opts = options(dir.path());
    opts.sort_order = SortOrder::Ascending;
    let runner = ReportRunner::new(Box::new(catalog), opts);
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![10, 20, 30]);
    assert_eq!(keys(&outcome.rows.movies), vec![10, 20, 30]);
}

#[tokio::test]
async fn test_metadata_failure_does_not_stop_later_keys() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = three_movies().malformed(20);
    let calls = catalog.metadata_calls();

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![30, 20, 10]);
    assert_eq!(keys(&outcome.rows.movies), vec![30, 10]);
    assert_eq!(outcome.summary.metadata_attempted, 3);
    assert_eq!(outcome.summary.failures.len(), 1);
    assert_eq!(outcome.summary.failures[0].stage, Stage::Metadata);
    assert_eq!(outcome.summary.failures[0].subject, "20");
    assert_eq!(outcome.summary.stopped_at, None);
}

#[tokio::test]
async fn test_empty_metadata_is_skipped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = three_movies();
    catalog.metadata.remove(&20);
    let calls = catalog.metadata_calls();

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![30, 20, 10]);
    assert_eq!(keys(&outcome.rows.movies), vec![30, 10]);
    assert_eq!(outcome.summary.failures[0].category, "empty");
}

#[tokio::test]
async fn test_stop_at_end_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = three_movies();
    catalog.metadata.remove(&20);
    let calls = catalog.metadata_calls();

    let mut opts = options(dir.path());
    opts.failure_policy.stop_at_end_of_range = true;
    let runner = ReportRunner::new(Box::new(catalog), opts);
    let summary = runner.run(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![30, 20]);
    assert_eq!(summary.stopped_at, Some(RatingKey(20)));
    assert_eq!(summary.movies, 1);
    assert_eq!(read_lines(&summary.movies_path).len(), 2);
}

#[tokio::test]
async fn test_stop_at_end_of_range_ignores_real_errors() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = three_movies().malformed(20);
    let calls = catalog.metadata_calls();

    let mut opts = options(dir.path());
    opts.failure_policy.stop_at_end_of_range = true;
    let runner = ReportRunner::new(Box::new(catalog), opts);
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![30, 20, 10]);
    assert_eq!(outcome.summary.stopped_at, None);
}

#[tokio::test]
async fn test_metadata_abort_policy() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = three_movies().malformed(20);
    let calls = catalog.metadata_calls();

    let mut opts = options(dir.path());
    opts.failure_policy.metadata = FailureAction::Abort;
    let runner = ReportRunner::new(Box::new(catalog), opts);
    let err = runner.run(NOW).await.unwrap_err();

    assert!(matches!(err, ReportError::Aborted { stage: Stage::Metadata, .. }));
    assert_eq!(*calls.lock().unwrap(), vec![30, 20]);
    assert!(!dir.path().join("unwatched_movies.csv").exists());
    assert!(!dir.path().join("unwatched_shows.csv").exists());
}

#[tokio::test]
async fn test_library_list_failure_is_a_no_op_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = three_movies();
    catalog.libraries_fail = true;
    let calls = catalog.metadata_calls();

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let summary = runner.run(NOW).await.unwrap();

    assert!(calls.lock().unwrap().is_empty());
    assert!(summary.libraries.is_empty());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].stage, Stage::Libraries);
    assert_eq!(read_lines(&summary.movies_path), vec![HEADER.to_string()]);
    assert_eq!(read_lines(&summary.shows_path), vec![HEADER.to_string()]);
}

#[tokio::test]
async fn test_library_list_failure_abort() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = three_movies();
    catalog.libraries_fail = true;

    let mut opts = options(dir.path());
    opts.failure_policy.libraries = FailureAction::Abort;
    let runner = ReportRunner::new(Box::new(catalog), opts);

    let err = runner.run(NOW).await.unwrap_err();
    assert!(matches!(err, ReportError::Aborted { stage: Stage::Libraries, .. }));
    assert!(!dir.path().join("unwatched_movies.csv").exists());
}

#[tokio::test]
async fn test_library_listing_failure_skips_only_that_library() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = FakeCatalog::default()
        .library("2", "TV Shows")
        .library("1", "Movies")
        .item("1", 101, MediaKind::Movie, OLD, None)
        .movie(101, "Old Film", "/a.mkv");
    catalog.items.remove("2");

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(keys(&outcome.rows.movies), vec![101]);
    assert_eq!(outcome.summary.failures.len(), 1);
    assert_eq!(outcome.summary.failures[0].stage, Stage::LibraryItems);
    assert_eq!(outcome.summary.failures[0].subject, "TV Shows");
}

#[tokio::test]
async fn test_expansion_failure_skips_only_that_item() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("2", "TV Shows")
        .item("2", 400, MediaKind::Show, OLD, None)
        .item("2", 450, MediaKind::Show, OLD, None)
        .episodes(450, &[601])
        .episode(601, "Other Show", "Pilot");

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();

    assert_eq!(keys(&outcome.rows.shows), vec![601]);
    assert_eq!(outcome.summary.failures.len(), 1);
    assert_eq!(outcome.summary.failures[0].stage, Stage::Expansion);
    assert_eq!(outcome.summary.failures[0].subject, "400");
}

#[tokio::test]
async fn test_duplicate_episode_keys() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
        .library("2", "TV Shows")
        .item("2", 400, MediaKind::Show, OLD, None)
        .item("2", 501, MediaKind::Episode, OLD, None)
        .episodes(400, &[501])
        .episodes(501, &[501])
        .episode(501, "My Show", "Pilot");

    let runner = ReportRunner::new(Box::new(catalog), options(dir.path()));
    let outcome = runner.build(NOW).await.unwrap();
    assert_eq!(keys(&outcome.rows.shows), vec![501, 501]);

    let catalog = FakeCatalog::default()
        .library("2", "TV Shows")
        .item("2", 400, MediaKind::Show, OLD, None)
        .item("2", 501, MediaKind::Episode, OLD, None)
        .episodes(400, &[501])
        .episodes(501, &[501])
        .episode(501, "My Show", "Pilot");
    let mut opts = options(dir.path());
    opts.deduplicate = true;
    let runner = ReportRunner::new(Box::new(catalog), opts);
    let outcome = runner.build(NOW).await.unwrap();
    assert_eq!(keys(&outcome.rows.shows), vec![501]);
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let build_catalog = || {
        three_movies()
            .library("2", "TV Shows")
            .item("2", 400, MediaKind::Show, OLD, None)
            .episodes(400, &[501, 502])
            .episode(501, "My Show", "Pilot")
            .episode(502, "My Show", "Second")
    };

    let first = ReportRunner::new(Box::new(build_catalog()), options(dir.path()));
    let summary = first.run(NOW).await.unwrap();
    let movies_first = std::fs::read(&summary.movies_path).unwrap();
    let shows_first = std::fs::read(&summary.shows_path).unwrap();

    let second = ReportRunner::new(Box::new(build_catalog()), options(dir.path()));
    second.run(NOW).await.unwrap();

    assert_eq!(std::fs::read(&summary.movies_path).unwrap(), movies_first);
    assert_eq!(std::fs::read(&summary.shows_path).unwrap(), shows_first);
}

#[derive(Default)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl ReportObserver for RecordingObserver {
    fn libraries_resolved(&self, libraries: &[LibraryRef]) {
        self.events.lock().unwrap().push(format!("libraries:{}", libraries.len()));
    }

    fn candidates_ready(&self, total: usize) {
        self.events.lock().unwrap().push(format!("candidates:{}", total));
    }

    fn row_classified(&self, kind: ReportKind, row: &ReportRow) {
        self.events.lock().unwrap().push(format!("{:?}:{}", kind, row.rating_key));
    }

    fn metadata_finished(&self) {
        self.events.lock().unwrap().push("done".to_string());
    }
}

#[tokio::test]
async fn test_observer_sees_rows_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let observer = RecordingObserver::default();
    let events = Arc::clone(&observer.events);

    let runner = ReportRunner::new(Box::new(three_movies().malformed(20)), options(dir.path()))
        .with_observer(Box::new(observer));
    runner.build(NOW).await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["libraries:1", "candidates:3", "Movie:30", "Movie:10", "done"]
    );
}

#[tokio::test]
async fn test_observer_finished_when_metadata_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let observer = RecordingObserver::default();
    let events = Arc::clone(&observer.events);

    let mut opts = options(dir.path());
    opts.failure_policy.metadata = FailureAction::Abort;
    let runner = ReportRunner::new(Box::new(three_movies().malformed(20)), opts).with_observer(Box::new(observer));
    assert!(runner.build(NOW).await.is_err());

    assert_eq!(*events.lock().unwrap(), vec!["libraries:1", "candidates:3", "Movie:30", "done"]);
}
