use crate::download::{download_file, extract_archive, find_code_executable};
use crate::error::VscvmError;
use crate::launcher::{
    active_version, launchable_path, remove_launcher, write_desktop_entry, write_launcher,
};
use crate::platform::{download_target, get_system_info};
use crate::releases::{
    compare_versions, fetch_download_link, fetch_versions, normalize_version,
    resolve_download_url, select_version, version_matches,
};
use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Downloaded and extracted now
    Installed(String),
    /// Already on disk, only re-activated
    Cached(String),
}

/// A version counts as installed when its directory exists and has content.
pub fn is_installed(settings: &VscvmSettings, version: &str) -> bool {
    fs::read_dir(settings.version_dir(version))
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Only normalized version names are version directories. Anything else
/// under the install root belongs to someone else.
pub fn is_version_dir_name(name: &str) -> bool {
    normalize_version(name).as_deref() == Some(name)
}

/// Staging directories left behind by an interrupted install.
fn is_staging_leftover(name: &str) -> bool {
    name.starts_with(".tmp")
}

/// Version directories under the install root, newest first.
pub fn list_installed(settings: &VscvmSettings) -> Result<Vec<InstalledVersion>> {
    let root = settings.install_root();
    if !root.exists() {
        return Ok(Vec::new());
    }

    let active = active_version(settings)?;
    let mut installed = Vec::new();

    for entry in fs::read_dir(&root).with_context(|| format!("Could not read {}", root.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let version = entry.file_name().to_string_lossy().to_string();
        if !is_version_dir_name(&version) || !is_installed(settings, &version) {
            continue;
        }

        let installed_at = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::<chrono::Local>::from);

        installed.push(InstalledVersion {
            active: active.as_deref() == Some(version.as_str()),
            version,
            installed_at,
        });
    }

    installed.sort_by(|a, b| compare_versions(&b.version, &a.version));
    Ok(installed)
}

pub async fn install_version(settings: &VscvmSettings, requested: &str) -> Result<InstallOutcome> {
    let records = fetch_versions(settings).await?;
    let record = select_version(&records, requested)?;
    tracing::info!("Resolved '{}' to {} ({})", requested, record.version, record.label);
    install_release(settings, record).await
}

pub async fn install_release(
    settings: &VscvmSettings,
    record: &VersionRecord,
) -> Result<InstallOutcome> {
    let version_dir = settings.version_dir(&record.version);

    if is_installed(settings, &record.version) {
        tracing::info!("VSCode {} is already installed, skipping download.", record.version);
        let executable = find_code_executable(&version_dir)
            .ok_or_else(|| VscvmError::ExecutableNotFound(record.version.clone()))?;
        activate(settings, &executable)?;
        return Ok(InstallOutcome::Cached(record.version.clone()));
    }

    let target = download_target(&get_system_info())?;
    launchable_path(&version_dir)?;
    let link = fetch_download_link(record, target).await?;
    let resolved = resolve_download_url(&link).await?;

    let file_name = resolved
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| name.ends_with(".tar.gz") || name.ends_with(".tgz"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("vscode-{}.tar.gz", target));

    eprintln!("Installing VSCode {}...", record.version);

    let root = settings.install_root();
    fs::create_dir_all(&root).with_context(|| format!("Could not create {}", root.display()))?;

    let temp_download_dir = TempDir::new()?;
    let archive_path = temp_download_dir.path().join(&file_name);
    download_file(resolved.as_str(), &archive_path).await?;

    // Staging lives inside the root so the final move is a rename
    let staging_dir = TempDir::new_in(&root)?;
    let staging_path = staging_dir.path();
    extract_archive(&archive_path, staging_path)?;

    let executable = find_code_executable(staging_path)
        .ok_or_else(|| VscvmError::ExecutableNotFound(record.version.clone()))?;
    let relative_exec = executable.strip_prefix(staging_path)?.to_path_buf();

    if version_dir.exists() {
        fs::remove_dir_all(&version_dir)?;
    }
    fs::rename(staging_path, &version_dir).with_context(|| {
        format!(
            "Could not move {} to {}",
            staging_path.display(),
            version_dir.display()
        )
    })?;

    activate(settings, &version_dir.join(relative_exec))?;
    Ok(InstallOutcome::Installed(record.version.clone()))
}

fn activate(settings: &VscvmSettings, executable: &Path) -> Result<()> {
    write_launcher(settings, executable)?;
    write_desktop_entry(settings)
}

/// Uninstalls `version`, or the active version when none is given.
/// Returns the removed version.
pub fn uninstall_version(settings: &VscvmSettings, version: Option<&str>) -> Result<String> {
    let active = active_version(settings)?;

    let version = match version {
        None => active.clone().ok_or(VscvmError::NoActiveVersion)?,
        Some(requested) => find_installed(settings, requested)?,
    };

    let dir = settings.version_dir(&version);
    fs::remove_dir_all(&dir).with_context(|| format!("Could not remove {}", dir.display()))?;
    tracing::info!("Removed {}", dir.display());

    if active.as_deref() == Some(version.as_str()) {
        remove_launcher(settings)?;
    }
    Ok(version)
}

fn find_installed(settings: &VscvmSettings, requested: &str) -> Result<String> {
    let not_installed = || VscvmError::NotInstalled(requested.to_string());
    let normalized = normalize_version(requested).ok_or_else(not_installed)?;

    list_installed(settings)?
        .into_iter()
        .map(|v| v.version)
        .find(|v| version_matches(&normalized, v))
        .ok_or_else(|| not_installed().into())
}

/// Removes every installed version except the active one, along with
/// leftover staging directories. Other entries under the root are left
/// alone. Returns the removed versions.
pub fn cleanup_versions(settings: &VscvmSettings) -> Result<Vec<String>> {
    let root = settings.install_root();
    if !root.exists() {
        return Ok(Vec::new());
    }

    let active = active_version(settings)?;
    let mut removed = Vec::new();

    let dirs: Vec<PathBuf> = fs::read_dir(&root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();

    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if active.as_deref() == Some(name.as_str()) {
            continue;
        }

        if is_staging_leftover(&name) {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Could not remove {}", dir.display()))?;
            tracing::debug!("Removed staging leftover {}", dir.display());
        } else if is_version_dir_name(&name) {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Could not remove {}", dir.display()))?;
            tracing::info!("Removed {}", dir.display());
            removed.push(name);
        } else {
            tracing::debug!("Leaving {} alone, not a version directory", dir.display());
        }
    }

    removed.sort_by(|a, b| compare_versions(b, a));
    Ok(removed)
}
