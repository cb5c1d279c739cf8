use thiserror::Error;

/// Failures the user can act on. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum VscvmError {
    #[error("Version '{0}' not found in the release list")]
    VersionNotFound(String),

    #[error("No versions found on the release page at {0}")]
    EmptyReleaseList(String),

    #[error("Version {0} is not installed")]
    NotInstalled(String),

    #[error("No active VSCode version. Install one with `vscvm install latest`")]
    NoActiveVersion,

    #[error("Could not find a {target} download link on {url}")]
    DownloadLinkNotFound { target: String, url: String },

    #[error("Could not find the code executable in the archive for {0}")]
    ExecutableNotFound(String),

    #[error("Cannot use {0} in a launcher script: paths must be UTF-8 without line breaks")]
    UnsupportedPath(String),

    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
}
