//! Gallery controller: user-facing orchestration of the photo store.
//!
//! Dialog presentation and URL handoff stay behind the `Prompter` and
//! `UrlOpener` traits so the controller can be driven from any front end.

use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::error;

use crate::error::GalleryError;
use crate::gallery::PhotoStore;
use crate::location;

/// Confirmation and notice dialogs.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask the user to confirm a destructive action. `true` means accepted.
    async fn confirm(&self, header: &str, message: &str) -> bool;

    /// Show an informational or error notice.
    async fn notify(&self, header: &str, message: &str);
}

/// Hands a URL to an external viewer.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> anyhow::Result<()>;
}

pub struct GalleryController {
    store: PhotoStore,
    prompter: Arc<dyn Prompter>,
    opener: Arc<dyn UrlOpener>,
}

impl GalleryController {
    pub fn new(store: PhotoStore, prompter: Arc<dyn Prompter>, opener: Arc<dyn UrlOpener>) -> Self {
        Self {
            store,
            prompter,
            opener,
        }
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub async fn load_saved_photos(&mut self) -> Result<(), GalleryError> {
        self.store.load_saved_photos().await
    }

    /// Capture and add a photo. Failures surface as a generic notice.
    pub async fn add_photo(&mut self) -> bool {
        match self.store.add_new_photo().await {
            Ok(_) => true,
            Err(e) => {
                error!("adding photo failed: {e}");
                self.prompter
                    .notify("Error", "The photo could not be saved")
                    .await;
                false
            }
        }
    }

    /// Confirm and delete the photo at `position`. Cancelling performs no
    /// action.
    pub async fn delete_photo(&mut self, position: usize) -> bool {
        let Some(record) = self.store.photos().get(position).cloned() else {
            self.prompter
                .notify("Error", "There is no photo at that position")
                .await;
            return false;
        };

        let confirmed = self
            .prompter
            .confirm("Delete photo?", "This action cannot be undone")
            .await;
        if !confirmed {
            return false;
        }

        match self.store.delete_photo(&record, position).await {
            Ok(()) => true,
            Err(e) => {
                error!("deleting photo failed: {e}");
                self.prompter
                    .notify("Error", "The photo could not be deleted")
                    .await;
                false
            }
        }
    }

    /// Open a map view for the coordinates. The sentinel pair shows a
    /// "no location" notice instead of invoking the opener.
    pub async fn open_location(&self, latitude: f64, longitude: f64) -> bool {
        if latitude == 0.0 && longitude == 0.0 {
            self.prompter
                .notify(
                    "No location",
                    "There is no location available for this photo",
                )
                .await;
            return false;
        }

        let url = location::maps_url(latitude, longitude);
        match self.opener.open(&url).await {
            Ok(()) => true,
            Err(e) => {
                error!("opening map link failed: {e}");
                self.prompter
                    .notify("Error", "The map could not be opened")
                    .await;
                false
            }
        }
    }
}

/// Confirmation and notices on the terminal.
pub struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn confirm(&self, header: &str, message: &str) -> bool {
        print!("{header} {message} [y/N]: ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }

    async fn notify(&self, header: &str, message: &str) {
        println!("{header}: {message}");
    }
}

/// Opens URLs with the system default handler.
pub struct SystemUrlOpener;

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open(&self, url: &str) -> anyhow::Result<()> {
        #[cfg(target_os = "windows")]
        {
            std::process::Command::new("cmd")
                .args(["/C", "start", "", url])
                .spawn()?;
            Ok(())
        }
        #[cfg(not(target_os = "windows"))]
        {
            #[cfg(target_os = "macos")]
            let opener = "open";
            #[cfg(not(target_os = "macos"))]
            let opener = "xdg-open";

            std::process::Command::new(opener)
                .arg(url)
                .spawn()
                .map_err(|e| anyhow::anyhow!("Failed to launch {opener}: {e}"))?;
            Ok(())
        }
    }
}
