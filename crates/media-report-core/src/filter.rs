use media_report_config::SortOrder;
use media_report_models::{LibraryItem, LibraryRef, RatingKey};
use std::collections::HashSet;

/// Libraries whose display name exactly matches one of `names`, in service order.
pub fn select_libraries(all: Vec<LibraryRef>, names: &[String]) -> Vec<LibraryRef> {
    all.into_iter()
        .filter(|library| names.iter().any(|name| name == &library.section_name))
        .collect()
}

/// Items never played and added more than `max_age_seconds` before `now`.
///
/// `now` is taken once per run so every library is judged against the same cutoff.
pub fn filter_unwatched(items: Vec<LibraryItem>, now: i64, max_age_seconds: u64) -> Vec<LibraryItem> {
    items
        .into_iter()
        .filter(|item| item.is_unwatched_and_older_than(now, max_age_seconds))
        .collect()
}

/// Sort candidate keys for metadata lookup. Duplicates are kept unless
/// `deduplicate` is set, in which case the first occurrence wins.
pub fn order_candidates(mut keys: Vec<RatingKey>, order: SortOrder, deduplicate: bool) -> Vec<RatingKey> {
    if deduplicate {
        let mut seen = HashSet::new();
        keys.retain(|key| seen.insert(*key));
    }

    match order {
        SortOrder::Descending => keys.sort_by(|a, b| b.cmp(a)),
        SortOrder::Ascending => keys.sort(),
    }
    keys
}
