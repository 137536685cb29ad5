use directories::{BaseDirs, UserDirs};
use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory (portable installs, tests)
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    fn base_data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.data_dir().join("folio"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::base_data_dir()
    }

    pub fn config_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.config_dir().join("folio"))
    }

    /// Directory backing the local key-value store (one file per key)
    pub fn store_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("store"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn profile_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("profile.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(dirs) = UserDirs::new() {
                return Some(dirs.home_dir().join("Library/Logs/Folio"));
            }
        }
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn log_file_path() -> Option<PathBuf> {
        Self::logs_dir().map(|d| d.join("folio.log"))
    }

    /// Where exported transcripts land unless settings say otherwise
    pub fn export_dir() -> Option<PathBuf> {
        UserDirs::new()
            .and_then(|d| d.download_dir().map(|p| p.to_path_buf()))
            .or_else(|| Self::data_dir().map(|d| d.join("exports")))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        if let Some(d) = Self::data_dir() {
            std::fs::create_dir_all(&d)?;
        }
        if let Some(d) = Self::config_dir() {
            std::fs::create_dir_all(&d)?;
        }
        if let Some(d) = Self::store_dir() {
            std::fs::create_dir_all(&d)?;
        }
        if let Some(d) = Self::logs_dir() {
            std::fs::create_dir_all(&d)?;
        }
        Ok(())
    }
}
