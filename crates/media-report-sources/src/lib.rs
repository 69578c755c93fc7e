pub mod traits;
pub mod tautulli;
pub mod error;

pub use traits::MediaCatalog;
pub use error::SourceError;
pub use tautulli::TautulliClient;
