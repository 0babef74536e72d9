//! Fotomapa: a geotagged photo gallery.
//!
//! Captures photos through an injected camera interface, tags each with a
//! GPS reading (or the zero sentinel when no fix is available), persists
//! the image bytes under a private data area, mirrors the ordered gallery
//! list to a durable key-value store, and keeps a human-readable location
//! log with map links.

pub mod config;
pub mod controller;
pub mod error;
pub mod gallery;
pub mod location;
pub mod logging;
pub mod prefs;

pub use error::{GalleryError, PrefsError};
