//! Error taxonomy for gallery operations.

use std::io;
use thiserror::Error;

/// Errors surfaced by the photo store, location provider, and controller.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// No GPS fix could be obtained within the bounded wait. Recoverable:
    /// callers substitute the zero sentinel reading and continue.
    #[error("could not obtain a location fix")]
    LocationUnavailable,

    /// Camera capture failed or was cancelled by the user. Fatal to the add
    /// operation; nothing is mutated.
    #[error("camera capture failed: {0}")]
    CaptureFailed(String),

    /// A file write or delete under the private data area failed.
    #[error("failed to write {path}")]
    StorageWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A file read failed. Recoverable per-entry during load.
    #[error("failed to read {path}")]
    StorageRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The durable key-value store rejected a read or write.
    #[error("preferences storage failed")]
    Prefs(#[from] PrefsError),

    /// Appending to the location log failed. Swallowed by callers.
    #[error("failed to append to the location log")]
    LogAppend(#[source] io::Error),

    /// Delete was handed a record that does not sit at the supplied index.
    /// The list is left unchanged.
    #[error("photo record does not match the list entry at index {position}")]
    RecordMismatch { position: usize },
}

/// Errors from the SQLite-backed preferences store.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preferences database error")]
    Db(#[from] rusqlite::Error),

    #[error("preferences value could not be encoded or decoded")]
    Encode(#[from] serde_json::Error),

    #[error("preferences storage could not be created")]
    Io(#[from] io::Error),
}
