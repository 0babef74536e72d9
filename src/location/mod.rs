//! Location access, map links, and the human-readable location log.

pub mod source;

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::GalleryError;
use crate::gallery::PhotoRecord;

pub use source::{CommandPositionSource, NoFixSource, PositionSource};

/// A single GPS reading. Zero coordinates with zero accuracy mean
/// "no fix available".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy in meters.
    pub accuracy: f64,
    /// Epoch milliseconds at which the fix was taken.
    pub timestamp: i64,
}

impl LocationReading {
    /// The sentinel reading recorded when no fix could be obtained.
    pub fn no_fix(timestamp: i64) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            accuracy: 0.0,
            timestamp,
        }
    }

    pub fn is_no_fix(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Build a map URL centered on the given coordinates.
pub fn maps_url(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps?q={latitude},{longitude}")
}

/// Wraps a position source with a bounded wait and owns the append-only
/// location log.
pub struct LocationService {
    source: Arc<dyn PositionSource>,
    log_path: PathBuf,
    fix_timeout: Duration,
}

impl LocationService {
    pub fn new(source: Arc<dyn PositionSource>, log_path: PathBuf, fix_timeout: Duration) -> Self {
        Self {
            source,
            log_path,
            fix_timeout,
        }
    }

    /// Request a single high-accuracy fix. Fails with `LocationUnavailable`
    /// when the source reports no fix or the bounded wait elapses.
    pub async fn current_location(&self) -> Result<LocationReading, GalleryError> {
        match tokio::time::timeout(self.fix_timeout, self.source.current_position()).await {
            Ok(Ok(reading)) => Ok(reading),
            Ok(Err(e)) => {
                debug!("position source reported no fix: {e}");
                Err(GalleryError::LocationUnavailable)
            }
            Err(_) => {
                debug!("position fix timed out after {:?}", self.fix_timeout);
                Err(GalleryError::LocationUnavailable)
            }
        }
    }

    /// Append one block to the location log, creating the file on first use.
    /// Read-modify-write; the log has a single writer.
    pub async fn append_location_log(&self, photo: &PhotoRecord) -> Result<(), GalleryError> {
        let previous = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("creating new location log at {}", self.log_path.display());
                String::new()
            }
            Err(e) => return Err(GalleryError::LogAppend(e)),
        };

        if let Some(parent) = self.log_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(GalleryError::LogAppend)?;
        }

        tokio::fs::write(&self.log_path, previous + &format_log_entry(photo))
            .await
            .map_err(GalleryError::LogAppend)?;

        Ok(())
    }

    pub fn log_path(&self) -> &std::path::Path {
        &self.log_path
    }
}

fn format_log_entry(photo: &PhotoRecord) -> String {
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "\nPHOTO LOCATION\n\
         ==============\n\
         Date: {stamp}\n\
         File: {file}\n\
         Latitude: {lat}\n\
         Longitude: {lon}\n\
         Accuracy: {acc} meters\n\
         Map link: {link}\n\
         \n\
         ----------------------------------------\n",
        file = photo.filepath,
        lat = photo.location.latitude,
        lon = photo.location.longitude,
        acc = photo.location.accuracy,
        link = maps_url(photo.location.latitude, photo.location.longitude),
    )
}
