pub mod library;
pub mod media;
pub mod metadata;
pub mod report_row;

pub use library::{LibraryItem, LibraryRef};
pub use media::{MediaKind, RatingKey};
pub use metadata::MediaMetadata;
pub use report_row::{ReportRow, REPORT_HEADER};
