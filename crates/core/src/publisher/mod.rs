//! Publication of rendered artifacts to object storage.
//!
//! Keys are derived from the forecast timestamp (see [`PublicationKey`]) so
//! publishing the same forecast twice overwrites the same objects.
//!
//! Files are streamed from disk into the store; nothing is read fully into
//! memory.

mod config;
mod error;
mod key;
mod object;
mod traits;

pub use config::StorageConfig;
pub use error::PublishError;
pub use key::PublicationKey;
pub use object::ObjectPublisher;
pub use traits::{PublishedObject, Publisher};
