use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of the release listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    /// Absolute URL of the release notes page for this version
    pub url: String,
    /// Normalized dotted version, e.g. `1.85`
    pub version: String,
    /// Release label as shown on the page, e.g. `November 2023`
    pub label: String,
}

/// A version directory found under the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: String,
    pub installed_at: Option<chrono::DateTime<chrono::Local>>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VscvmSettings {
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
    #[serde(default = "default_desktop_dir")]
    pub desktop_dir: String,
    #[serde(default = "default_desktop_entry")]
    pub desktop_entry: bool,
    #[serde(default = "default_releases_url")]
    pub releases_url: String,
    #[serde(default = "default_list_count")]
    pub list_count: usize,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_install_dir() -> String {
    home().join(".vscvm").to_string_lossy().to_string()
}
pub fn default_desktop_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| home().join(".local").join("share"))
        .join("applications")
        .to_string_lossy()
        .to_string()
}
pub fn default_desktop_entry() -> bool {
    true
}
pub fn default_releases_url() -> String {
    "https://code.visualstudio.com/updates".to_string()
}
pub fn default_list_count() -> usize {
    5
}

impl Default for VscvmSettings {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            desktop_dir: default_desktop_dir(),
            desktop_entry: default_desktop_entry(),
            releases_url: default_releases_url(),
            list_count: default_list_count(),
        }
    }
}

impl VscvmSettings {
    pub fn install_root(&self) -> PathBuf {
        PathBuf::from(&self.install_dir)
    }

    pub fn launcher_path(&self) -> PathBuf {
        self.install_root().join("code")
    }

    pub fn desktop_file_path(&self) -> PathBuf {
        PathBuf::from(&self.desktop_dir).join("vscvm-code.desktop")
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.install_root().join(version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VscvmConfig {
    #[serde(default)]
    pub settings: VscvmSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}
