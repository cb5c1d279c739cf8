//! The `code` launcher script and its desktop entry. Together they decide
//! which installed version is active.

use crate::error::VscvmError;
use crate::types::VscvmSettings;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Paths that end up in the launcher and desktop entry must be UTF-8 and
/// fit on one line. Everything else is quoted when written.
pub fn launchable_path(path: &Path) -> Result<&str, VscvmError> {
    path.to_str()
        .filter(|p| !p.contains(['\n', '\r']))
        .ok_or_else(|| VscvmError::UnsupportedPath(path.display().to_string()))
}

/// Single-quotes `word` for `/bin/sh`.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Reads back the first word written by [`shell_quote`].
fn shell_unquote(quoted: &str) -> Option<String> {
    let mut rest = quoted.strip_prefix('\'')?;
    let mut word = String::new();
    loop {
        let end = rest.find('\'')?;
        word.push_str(&rest[..end]);
        rest = &rest[end + 1..];
        match rest.strip_prefix(r"\''") {
            Some(next) => {
                word.push('\'');
                rest = next;
            }
            None => return Some(word),
        }
    }
}

/// Quotes an `Exec=` argument following the desktop entry rules: reserved
/// characters force double quotes, and the value is then string-escaped.
fn desktop_exec_arg(arg: &str) -> String {
    const RESERVED: &str = " \t\"'\\><~|&;$*?#()`";
    if !arg.chars().any(|c| RESERVED.contains(c)) {
        return arg.to_string();
    }

    let mut quoted = String::from("\"");
    for c in arg.chars() {
        match c {
            '\\' => quoted.push_str(r"\\\\"),
            '"' | '`' | '$' => {
                quoted.push_str(r"\\");
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

pub fn write_launcher(settings: &VscvmSettings, executable: &Path) -> Result<()> {
    let launcher = settings.launcher_path();
    if let Some(parent) = launcher.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = launchable_path(executable)?;
    let content = format!("#!/bin/sh\nexec {} \"$@\"\n", shell_quote(target));
    fs::write(&launcher, content)
        .with_context(|| format!("Could not write launcher at {}", launcher.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&launcher)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&launcher, perms)?;
    }

    tracing::info!("Launcher {} -> {}", launcher.display(), executable.display());
    Ok(())
}

pub fn write_desktop_entry(settings: &VscvmSettings) -> Result<()> {
    if !settings.desktop_entry {
        tracing::debug!("Desktop integration disabled, skipping desktop entry");
        return Ok(());
    }

    let desktop_file = settings.desktop_file_path();
    if let Some(parent) = desktop_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let launcher = settings.launcher_path();
    let exec = desktop_exec_arg(launchable_path(&launcher)?);

    let content = format!(
        "[Desktop Entry]\n\
         Name=Visual Studio Code (vscvm)\n\
         Comment=Code Editing. Redefined.\n\
         GenericName=Text Editor\n\
         Exec={} %F\n\
         Icon=vscode\n\
         Type=Application\n\
         Terminal=false\n\
         StartupNotify=false\n\
         StartupWMClass=Code\n\
         Categories=TextEditor;Development;IDE;\n\
         MimeType=text/plain;inode/directory;\n\
         Keywords=vscode;\n",
        exec
    );
    fs::write(&desktop_file, content)
        .with_context(|| format!("Could not write {}", desktop_file.display()))?;

    tracing::info!("Desktop entry written to {}", desktop_file.display());
    Ok(())
}

/// Removes the launcher and desktop entry. Files that are already gone are
/// not an error.
pub fn remove_launcher(settings: &VscvmSettings) -> Result<()> {
    for path in [settings.launcher_path(), settings.desktop_file_path()] {
        match fs::remove_file(&path) {
            Ok(()) => tracing::info!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Could not remove {}", path.display()))
            }
        }
    }
    Ok(())
}

/// The version whose directory the launcher points into, if that directory
/// is still installed.
pub fn active_version(settings: &VscvmSettings) -> Result<Option<String>> {
    let launcher = settings.launcher_path();
    let content = match fs::read_to_string(&launcher) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Could not read {}", launcher.display()))
        }
    };

    let Some(target) = launcher_target(&content) else {
        tracing::warn!("Launcher at {} has no exec line", launcher.display());
        return Ok(None);
    };

    let root = settings.install_root();
    let version = Path::new(&target)
        .strip_prefix(&root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .filter(|v| crate::install::is_version_dir_name(v))
        .filter(|v| crate::install::is_installed(settings, v));

    tracing::debug!("Active version: {:?}", version);
    Ok(version)
}

fn launcher_target(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("exec "))
        .and_then(|rest| shell_unquote(rest.trim_start()))
}
