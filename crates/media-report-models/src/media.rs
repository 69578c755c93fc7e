use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier the media server assigns to every item (movie, show, season, episode).
///
/// Keys are assigned in increasing order as items are added, so sorting them
/// numerically approximates sorting by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingKey(pub u64);

impl RatingKey {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RatingKey {
    fn from(value: u64) -> Self {
        RatingKey(value)
    }
}

/// Media kind as reported by the server's `media_type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
            MediaKind::Season => "season",
            MediaKind::Episode => "episode",
            MediaKind::Other(s) => s.as_str(),
        }
    }

    /// Shows and episodes are grouped on the server and must be expanded
    /// through the parent/children lookup to reach individual episodes.
    pub fn needs_expansion(&self) -> bool {
        matches!(self, MediaKind::Show | MediaKind::Episode)
    }
}

impl From<String> for MediaKind {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "movie" => MediaKind::Movie,
            "show" => MediaKind::Show,
            "season" => MediaKind::Season,
            "episode" => MediaKind::Episode,
            _ => MediaKind::Other(value),
        }
    }
}

impl From<&str> for MediaKind {
    fn from(value: &str) -> Self {
        MediaKind::from(value.to_string())
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
