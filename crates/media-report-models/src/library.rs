use crate::media::{MediaKind, RatingKey};
use serde::{Deserialize, Serialize};

/// A library section selected for the report by its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    pub section_id: String,
    pub section_name: String,
}

/// One row of a library's media info listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
    /// Epoch seconds
    pub added_at: i64,
    pub parent_rating_key: Option<RatingKey>,
    pub play_count: Option<u64>,
    pub title: String,
    pub rating_key: RatingKey,
    pub media_type: MediaKind,
}

impl LibraryItem {
    /// True when the item has never been played and was added strictly more
    /// than `max_age_seconds` before `now`.
    ///
    /// Any recorded play count, including zero, counts as played.
    pub fn is_unwatched_and_older_than(&self, now: i64, max_age_seconds: u64) -> bool {
        if self.play_count.is_some() {
            return false;
        }
        let age = now.saturating_sub(self.added_at);
        age > 0 && (age as u64) > max_age_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_MONTHS: u64 = 15_770_000;

    fn item(added_at: i64, play_count: Option<u64>) -> LibraryItem {
        LibraryItem {
            added_at,
            parent_rating_key: None,
            play_count,
            title: "Test".to_string(),
            rating_key: RatingKey(1),
            media_type: MediaKind::Movie,
        }
    }

    #[test]
    fn test_old_unplayed_item_is_retained() {
        let now = 1_700_000_000;
        assert!(item(now - 20_000_000, None).is_unwatched_and_older_than(now, SIX_MONTHS));
    }

    #[test]
    fn test_played_item_is_never_retained() {
        let now = 1_700_000_000;
        assert!(!item(now - 20_000_000, Some(3)).is_unwatched_and_older_than(now, SIX_MONTHS));
        assert!(!item(now - 20_000_000, Some(0)).is_unwatched_and_older_than(now, SIX_MONTHS));
    }

    #[test]
    fn test_age_boundary_is_exclusive() {
        let now = 1_700_000_000;
        assert!(!item(now - SIX_MONTHS as i64, None).is_unwatched_and_older_than(now, SIX_MONTHS));
        assert!(item(now - SIX_MONTHS as i64 - 1, None).is_unwatched_and_older_than(now, SIX_MONTHS));
    }

    #[test]
    fn test_future_added_at_is_not_retained() {
        let now = 1_700_000_000;
        assert!(!item(now + 500, None).is_unwatched_and_older_than(now, 0));
    }
}
