//! Camera capture seam.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::GalleryError;

/// A captured image: the bytes to persist plus the platform's transient
/// displayable reference, when it has one.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub web_path: Option<String>,
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Capture a single photo. Cancellation surfaces as `CaptureFailed`.
    async fn capture(&self) -> Result<CapturedImage, GalleryError>;
}

/// Captures by running an external command. `{output}` in the command is
/// replaced with a scratch jpeg path the command must write
/// (e.g. "libcamera-still -o {output}").
pub struct CommandCamera {
    command: Option<String>,
}

impl CommandCamera {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Camera for CommandCamera {
    async fn capture(&self) -> Result<CapturedImage, GalleryError> {
        let Some(command) = &self.command else {
            return Err(GalleryError::CaptureFailed(
                "no capture command configured".to_string(),
            ));
        };

        let output_path =
            std::env::temp_dir().join(format!("capture_{}.jpeg", Utc::now().timestamp_millis()));
        let command = command.replace("{output}", &output_path.to_string_lossy());

        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .await
            .map_err(|e| {
                GalleryError::CaptureFailed(format!("capture command failed to start: {e}"))
            })?;

        if !status.success() {
            return Err(GalleryError::CaptureFailed(format!(
                "capture command exited with {status}"
            )));
        }

        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            GalleryError::CaptureFailed(format!("capture produced no readable image: {e}"))
        })?;

        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            debug!("could not remove capture scratch file: {e}");
        }

        Ok(CapturedImage {
            bytes,
            web_path: None,
        })
    }
}
