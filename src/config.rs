use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Private data area holding the captured image files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User-visible documents area holding the location log.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Durable key-value store backing the gallery list.
    #[serde(default = "default_prefs_path")]
    pub prefs_path: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fotomapa")
        .join("photos")
}

fn default_documents_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fotomapa")
}

fn default_prefs_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fotomapa")
        .join("prefs.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            documents_dir: default_documents_dir(),
            prefs_path: default_prefs_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Bounded wait for a single GPS fix, in milliseconds.
    #[serde(default = "default_fix_timeout_ms")]
    pub fix_timeout_ms: u64,

    /// External command printing `latitude longitude accuracy` on stdout
    /// (e.g. a geoclue or gpsd helper). When unset, every fix attempt
    /// reports no fix and photos are saved with the sentinel reading.
    #[serde(default)]
    pub fix_command: Option<String>,

    #[serde(default = "default_log_filename")]
    pub log_filename: String,
}

fn default_fix_timeout_ms() -> u64 {
    3000
}

fn default_log_filename() -> String {
    "ubicaciones.txt".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fix_timeout_ms: default_fix_timeout_ms(),
            fix_command: None,
            log_filename: default_log_filename(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CameraConfig {
    /// External capture command. `{output}` is replaced with the jpeg path
    /// the command must write (e.g. "libcamera-still -o {output}").
    #[serde(default)]
    pub command: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("FOTOMAPA_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fotomapa")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
