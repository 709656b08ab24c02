//! Seams to the host application
//!
//! The dispatcher resolves two things from its host at `configure` time: a
//! stable per-installation device identifier and the application's static
//! identity (bundle id, version, build). Both are modeled as traits so tests
//! and embedders control them; [`FileDeviceIdStore`] is the stock
//! get-or-create implementation backed by a file under the XDG data
//! directory.

use std::path::PathBuf;

use crate::error::Result;
use crate::events::new_uuid;

/// Static host-application identity captured at configure time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub bundle_id: String,
    pub version: String,
    pub build: String,
}

/// Source of the host application's identity
pub trait AppInfoProvider: Send + Sync {
    fn current_app_info(&self) -> AppInfo;
}

impl AppInfoProvider for AppInfo {
    fn current_app_info(&self) -> AppInfo {
        self.clone()
    }
}

/// Source of the stable per-installation device identifier
pub trait DeviceIdStore: Send + Sync {
    /// Return the persisted identifier, creating and persisting a new one on
    /// first call.
    fn ensure_device_id(&self) -> Result<String>;
}

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Get-or-create device identifier persisted to a file
pub struct FileDeviceIdStore {
    path: PathBuf,
}

impl FileDeviceIdStore {
    /// Store the identifier at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the identifier under `$XDG_DATA_HOME/<app_name>/device_id`
    pub fn in_data_dir(app_name: &str) -> Self {
        Self::new(xdg_data_home().join(app_name).join("device_id"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl DeviceIdStore for FileDeviceIdStore {
    fn ensure_device_id(&self) -> Result<String> {
        if let Ok(existing) = std::fs::read_to_string(&self.path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let id = new_uuid();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &id)?;
        Ok(id)
    }
}
