//! Storage collaborators: a key-value store for records and an object
//! store for binary assets.

mod blob;
mod kv;
mod signing;
mod sqlite_kv_store;

pub use blob::{
    validate_blob_path, BlobError, BlobStorage, InMemoryBlobStorage, LocalBlobStorage,
};
pub use kv::{InMemoryKeyValueStore, KeyValueStore};
pub use signing::{UrlSigner, BLOB_ROUTE_PREFIX};
pub use sqlite_kv_store::SqliteKeyValueStore;
