use crate::media::{MediaKind, RatingKey};
use serde::{Deserialize, Serialize};

/// Full detail record for a single movie or episode, including the
/// location of its first media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Epoch seconds
    pub added_at: i64,
    pub parent_rating_key: Option<RatingKey>,
    pub title: String,
    pub rating_key: RatingKey,
    pub media_type: MediaKind,
    /// Series title for episodes, empty for movies
    pub grandparent_title: String,
    pub file: String,
    pub file_size: Option<u64>,
}

impl MediaMetadata {
    /// Movies are records with no series title or an explicit movie kind.
    pub fn is_movie(&self) -> bool {
        self.grandparent_title.is_empty() || self.media_type == MediaKind::Movie
    }

    /// Title as it appears in the report: `"<series>: <episode>"` for episodes.
    pub fn display_title(&self) -> String {
        if self.is_movie() {
            self.title.clone()
        } else {
            format!("{}: {}", self.grandparent_title, self.title)
        }
    }
}
