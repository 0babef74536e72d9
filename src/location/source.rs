//! Position sources providing raw GPS fixes.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::GalleryError;
use crate::location::LocationReading;

/// A device or helper able to produce a single position fix. The caller
/// applies the bounded wait.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<LocationReading, GalleryError>;
}

/// Source that always reports no fix. Used when no fix command is
/// configured, so captures fall back to the sentinel reading.
pub struct NoFixSource;

#[async_trait]
impl PositionSource for NoFixSource {
    async fn current_position(&self) -> Result<LocationReading, GalleryError> {
        Err(GalleryError::LocationUnavailable)
    }
}

/// Runs an external command that prints `latitude longitude accuracy` on
/// stdout, e.g. a geoclue or gpsd helper script.
pub struct CommandPositionSource {
    command: String,
}

impl CommandPositionSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl PositionSource for CommandPositionSource {
    async fn current_position(&self) -> Result<LocationReading, GalleryError> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .map_err(|e| {
                debug!("fix command failed to start: {e}");
                GalleryError::LocationUnavailable
            })?;

        if !output.status.success() {
            debug!(status = %output.status, "fix command exited with failure");
            return Err(GalleryError::LocationUnavailable);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_fix(&stdout).ok_or(GalleryError::LocationUnavailable)
    }
}

fn parse_fix(stdout: &str) -> Option<LocationReading> {
    let mut fields = stdout.split_whitespace();
    let latitude: f64 = fields.next()?.parse().ok()?;
    let longitude: f64 = fields.next()?.parse().ok()?;
    let accuracy: f64 = fields.next().and_then(|f| f.parse().ok()).unwrap_or(0.0);

    Some(LocationReading {
        latitude,
        longitude,
        accuracy,
        timestamp: Utc::now().timestamp_millis(),
    })
}
