//! The photo store: capture orchestration, image persistence, and the
//! durable gallery list.

pub mod camera;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{GalleryError, PrefsError};
use crate::location::{LocationReading, LocationService};
use crate::prefs::Preferences;

pub use camera::{Camera, CapturedImage, CommandCamera};

/// Preferences key holding the serialized gallery list.
const PHOTO_STORAGE_KEY: &str = "photos";

/// One gallery entry. Identity is `filepath`, generated from the capture
/// time and unique within the data area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub filepath: String,

    /// Session-only render hint (a data URL after load). Serialized for
    /// compatibility but rebuilt from the file bytes on every load.
    #[serde(rename = "webviewPath", default, skip_serializing_if = "Option::is_none")]
    pub webview_path: Option<String>,

    #[serde(rename = "savedUri", default, skip_serializing_if = "Option::is_none")]
    pub saved_uri: Option<String>,

    /// Always present; the zero sentinel when no fix was available.
    #[serde(default)]
    pub location: LocationReading,

    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,
}

/// Owns the gallery list and is the only writer of its durable copy.
///
/// Callers serialize operations: mutations take `&mut self` and at most one
/// capture is assumed in flight.
pub struct PhotoStore {
    photos: Vec<PhotoRecord>,
    prefs: Preferences,
    data_dir: PathBuf,
    camera: Arc<dyn Camera>,
    location: LocationService,
}

impl PhotoStore {
    pub fn new(
        prefs: Preferences,
        data_dir: PathBuf,
        camera: Arc<dyn Camera>,
        location: LocationService,
    ) -> Self {
        Self {
            photos: Vec::new(),
            prefs,
            data_dir,
            camera,
            location,
        }
    }

    /// The gallery list, newest first.
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn location(&self) -> &LocationService {
        &self.location
    }

    /// Capture a photo, geotag it, persist the bytes, and record it at the
    /// head of the gallery list.
    pub async fn add_new_photo(&mut self) -> Result<PhotoRecord, GalleryError> {
        // A missing fix never aborts the capture.
        let location = match self.location.current_location().await {
            Ok(reading) => reading,
            Err(_) => {
                warn!("no location fix available, continuing without one");
                LocationReading::no_fix(Utc::now().timestamp_millis())
            }
        };

        let captured = self.camera.capture().await?;
        let record = self.save_picture(captured, location).await?;
        self.photos.insert(0, record.clone());

        // Best-effort: the gallery works without the text log.
        if let Err(e) = self.location.append_location_log(&record).await {
            warn!("could not append to the location log: {e}");
        }

        self.save_photo_list()?;
        info!(file = %record.filepath, "photo added to gallery");
        Ok(record)
    }

    /// Delete the photo's backing file and drop its record. The caller
    /// supplies both the record and its current position; a mismatch leaves
    /// everything unchanged.
    pub async fn delete_photo(
        &mut self,
        photo: &PhotoRecord,
        position: usize,
    ) -> Result<(), GalleryError> {
        match self.photos.get(position) {
            Some(current) if current.filepath == photo.filepath => {}
            _ => return Err(GalleryError::RecordMismatch { position }),
        }

        // File first; the list is only touched once the bytes are gone.
        let path = self.data_dir.join(&photo.filepath);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| GalleryError::StorageWrite {
                path: path.display().to_string(),
                source,
            })?;

        self.photos.remove(position);
        self.save_photo_list()?;
        info!(file = %photo.filepath, "photo deleted");
        Ok(())
    }

    /// Rebuild the in-memory list from the durable copy. Records whose
    /// backing file cannot be read are dropped; the durable copy is left
    /// as-is until the next save.
    pub async fn load_saved_photos(&mut self) -> Result<(), GalleryError> {
        let saved = match self.prefs.get(PHOTO_STORAGE_KEY)? {
            Some(raw) => {
                serde_json::from_str::<Vec<PhotoRecord>>(&raw).map_err(PrefsError::from)?
            }
            None => Vec::new(),
        };

        let mut photos = Vec::with_capacity(saved.len());
        for mut record in saved {
            let path = self.data_dir.join(&record.filepath);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %record.filepath, "skipping photo with unreadable backing file: {e}");
                    continue;
                }
            };

            record.webview_path = Some(format!(
                "data:image/jpeg;base64,{}",
                BASE64.encode(&bytes)
            ));

            // Lists written before locations were recorded decode as the
            // all-zero struct; backfill the sentinel timestamp.
            if record.location.timestamp == 0 {
                record.location.timestamp = record
                    .taken_at
                    .map(|t| t.timestamp_millis())
                    .unwrap_or_else(|| Utc::now().timestamp_millis());
            }

            photos.push(record);
        }

        info!(count = photos.len(), "gallery list loaded");
        self.photos = photos;
        Ok(())
    }

    async fn save_picture(
        &self,
        captured: CapturedImage,
        location: LocationReading,
    ) -> Result<PhotoRecord, GalleryError> {
        let file_name = format!("photo_{}.jpeg", Utc::now().timestamp_millis());
        let path = self.data_dir.join(&file_name);

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| GalleryError::StorageWrite {
                path: self.data_dir.display().to_string(),
                source,
            })?;

        tokio::fs::write(&path, &captured.bytes)
            .await
            .map_err(|source| GalleryError::StorageWrite {
                path: path.display().to_string(),
                source,
            })?;

        Ok(PhotoRecord {
            filepath: file_name,
            webview_path: captured.web_path,
            saved_uri: Some(format!("file://{}", path.display())),
            location,
            taken_at: Some(Utc::now()),
        })
    }

    fn save_photo_list(&self) -> Result<(), GalleryError> {
        let encoded = serde_json::to_string(&self.photos).map_err(PrefsError::from)?;
        self.prefs.set(PHOTO_STORAGE_KEY, &encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{NoFixSource, PositionSource};
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    struct StubCamera;

    #[async_trait]
    impl Camera for StubCamera {
        async fn capture(&self) -> Result<CapturedImage, GalleryError> {
            Ok(CapturedImage {
                bytes: b"jpegbytes".to_vec(),
                web_path: Some("blob:session".to_string()),
            })
        }
    }

    struct CancelledCamera;

    #[async_trait]
    impl Camera for CancelledCamera {
        async fn capture(&self) -> Result<CapturedImage, GalleryError> {
            Err(GalleryError::CaptureFailed("user cancelled".to_string()))
        }
    }

    struct FixedSource(LocationReading);

    #[async_trait]
    impl PositionSource for FixedSource {
        async fn current_position(&self) -> Result<LocationReading, GalleryError> {
            Ok(self.0)
        }
    }

    fn caracas_fix() -> LocationReading {
        LocationReading {
            latitude: 10.5,
            longitude: -66.9,
            accuracy: 12.0,
            timestamp: 1_700_000_000_000,
        }
    }

    fn test_store(
        dir: &Path,
        camera: Arc<dyn Camera>,
        source: Arc<dyn PositionSource>,
    ) -> PhotoStore {
        let location = LocationService::new(
            source,
            dir.join("docs").join("ubicaciones.txt"),
            Duration::from_millis(200),
        );
        PhotoStore::new(
            Preferences::in_memory().unwrap(),
            dir.join("photos"),
            camera,
            location,
        )
    }

    fn durable_list(store: &PhotoStore) -> Vec<PhotoRecord> {
        store
            .prefs
            .get(PHOTO_STORAGE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default()
    }

    async fn add_two(store: &mut PhotoStore) -> (PhotoRecord, PhotoRecord) {
        let first = store.add_new_photo().await.unwrap();
        // Filenames carry millisecond resolution
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.add_new_photo().await.unwrap();
        (first, second)
    }

    #[tokio::test]
    async fn test_add_prepends_newest_first() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let (first, second) = add_two(&mut store).await;

        assert_eq!(store.photos().len(), 2);
        assert_eq!(store.photos()[0].filepath, second.filepath);
        assert_eq!(store.photos()[1].filepath, first.filepath);
        assert_eq!(second.location, caracas_fix());

        let durable = durable_list(&store);
        assert_eq!(durable.len(), 2);
        assert_eq!(durable[0].filepath, second.filepath);
    }

    #[tokio::test]
    async fn test_add_grows_durable_copy_by_one() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        assert_eq!(durable_list(&store).len(), 0);
        store.add_new_photo().await.unwrap();
        assert_eq!(durable_list(&store).len(), 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        store.add_new_photo().await.unwrap();
        assert_eq!(durable_list(&store).len(), 2);
    }

    #[tokio::test]
    async fn test_add_writes_image_bytes() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let record = store.add_new_photo().await.unwrap();
        assert!(record.filepath.starts_with("photo_"));
        assert!(record.filepath.ends_with(".jpeg"));

        let on_disk = std::fs::read(dir.path().join("photos").join(&record.filepath)).unwrap();
        assert_eq!(on_disk, b"jpegbytes");
    }

    #[tokio::test]
    async fn test_add_without_fix_records_sentinel() {
        let dir = tempdir().unwrap();
        let mut store = test_store(dir.path(), Arc::new(StubCamera), Arc::new(NoFixSource));

        let record = store.add_new_photo().await.unwrap();
        assert!(record.location.is_no_fix());
        assert_eq!(record.location.accuracy, 0.0);
        assert!(record.location.timestamp > 0);
    }

    #[tokio::test]
    async fn test_capture_failure_mutates_nothing() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(CancelledCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let result = store.add_new_photo().await;
        assert!(matches!(result, Err(GalleryError::CaptureFailed(_))));
        assert!(store.photos().is_empty());
        assert!(durable_list(&store).is_empty());
        assert!(!dir.path().join("photos").exists());
    }

    #[tokio::test]
    async fn test_add_appends_location_log() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let record = store.add_new_photo().await.unwrap();

        let log = std::fs::read_to_string(dir.path().join("docs").join("ubicaciones.txt")).unwrap();
        assert!(log.contains(&record.filepath));
        assert!(log.contains("https://www.google.com/maps?q=10.5,-66.9"));
    }

    #[tokio::test]
    async fn test_log_failure_does_not_fail_add() {
        let dir = tempdir().unwrap();
        // Occupy the log's parent path with a file so every append fails.
        std::fs::write(dir.path().join("docs"), b"not a directory").unwrap();

        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let record = store.add_new_photo().await.unwrap();
        assert_eq!(store.photos().len(), 1);
        assert_eq!(store.photos()[0].filepath, record.filepath);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_entry() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let (first, second) = add_two(&mut store).await;
        let older = store.photos()[1].clone();
        assert_eq!(older.filepath, first.filepath);

        store.delete_photo(&older, 1).await.unwrap();

        assert_eq!(store.photos().len(), 1);
        assert_eq!(store.photos()[0].filepath, second.filepath);
        assert!(!dir.path().join("photos").join(&older.filepath).exists());

        let durable = durable_list(&store);
        assert_eq!(durable.len(), 1);
        assert_eq!(durable[0].filepath, second.filepath);
    }

    #[tokio::test]
    async fn test_delete_mismatched_record_changes_nothing() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let record = store.add_new_photo().await.unwrap();

        let mut stale = record.clone();
        stale.filepath = "photo_0.jpeg".to_string();

        let result = store.delete_photo(&stale, 0).await;
        assert!(matches!(
            result,
            Err(GalleryError::RecordMismatch { position: 0 })
        ));

        let result = store.delete_photo(&record, 7).await;
        assert!(matches!(
            result,
            Err(GalleryError::RecordMismatch { position: 7 })
        ));

        assert_eq!(store.photos().len(), 1);
        assert_eq!(durable_list(&store).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_missing_file_leaves_list() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let record = store.add_new_photo().await.unwrap();
        std::fs::remove_file(dir.path().join("photos").join(&record.filepath)).unwrap();

        let result = store.delete_photo(&record, 0).await;
        assert!(matches!(result, Err(GalleryError::StorageWrite { .. })));
        assert_eq!(store.photos().len(), 1);
        assert_eq!(durable_list(&store).len(), 1);
    }

    #[tokio::test]
    async fn test_load_restores_saved_photos() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let (first, second) = add_two(&mut store).await;

        store.load_saved_photos().await.unwrap();

        assert_eq!(store.photos().len(), 2);
        assert_eq!(store.photos()[0].filepath, second.filepath);
        assert_eq!(store.photos()[1].filepath, first.filepath);
        for photo in store.photos() {
            let hint = photo.webview_path.as_deref().unwrap();
            assert!(hint.starts_with("data:image/jpeg;base64,"));
        }
    }

    #[tokio::test]
    async fn test_load_drops_entries_with_missing_files() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        let first = store.add_new_photo().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.add_new_photo().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = store.add_new_photo().await.unwrap();

        // List is [third, second, first]; lose the middle one's file.
        std::fs::remove_file(dir.path().join("photos").join(&second.filepath)).unwrap();

        store.load_saved_photos().await.unwrap();

        assert_eq!(store.photos().len(), 2);
        assert_eq!(store.photos()[0].filepath, third.filepath);
        assert_eq!(store.photos()[1].filepath, first.filepath);

        // The durable copy still holds all three until the next save.
        assert_eq!(durable_list(&store).len(), 3);
    }

    #[tokio::test]
    async fn test_load_with_no_saved_list() {
        let dir = tempdir().unwrap();
        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );

        store.load_saved_photos().await.unwrap();
        assert!(store.photos().is_empty());
    }

    #[tokio::test]
    async fn test_load_backfills_missing_location() {
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("photos");
        std::fs::create_dir_all(&store_dir).unwrap();
        std::fs::write(store_dir.join("photo_1.jpeg"), b"jpegbytes").unwrap();

        let mut store = test_store(
            dir.path(),
            Arc::new(StubCamera),
            Arc::new(FixedSource(caracas_fix())),
        );
        store
            .prefs
            .set(
                PHOTO_STORAGE_KEY,
                r#"[{"filepath":"photo_1.jpeg","timestamp":"2026-01-02T03:04:05Z"}]"#,
            )
            .unwrap();

        store.load_saved_photos().await.unwrap();

        assert_eq!(store.photos().len(), 1);
        let photo = &store.photos()[0];
        assert!(photo.location.is_no_fix());
        assert_eq!(
            photo.location.timestamp,
            photo.taken_at.unwrap().timestamp_millis()
        );
    }
}
