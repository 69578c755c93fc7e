use crate::error::SourceError;
use async_trait::async_trait;
use media_report_models::{LibraryItem, LibraryRef, MediaKind, MediaMetadata, RatingKey};

/// Read-only view of a media server's libraries, as exposed by its
/// monitoring service.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    fn source_name(&self) -> &str;

    /// Every library section the service knows about, in service order.
    async fn libraries(&self) -> Result<Vec<LibraryRef>, SourceError>;

    /// Up to `length` items of one library section, unfiltered.
    async fn library_items(&self, section_id: &str, length: u32) -> Result<Vec<LibraryItem>, SourceError>;

    /// Episode keys reachable from a show or episode, flattened across seasons.
    async fn episode_keys(&self, rating_key: RatingKey, media_type: &MediaKind) -> Result<Vec<RatingKey>, SourceError>;

    /// Full metadata, including file location, for one movie or episode.
    async fn metadata(&self, rating_key: RatingKey) -> Result<MediaMetadata, SourceError>;
}
