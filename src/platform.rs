use crate::error::VscvmError;
use crate::types::*;

pub fn get_system_info() -> PlatformInfo {
    PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// Name of the download target used in the update service URLs
/// (`https://update.code.visualstudio.com/<build>/<target>/stable`).
///
/// Only the Linux tarball builds are installable: they unpack into a
/// self-contained directory that a launcher script can point at.
pub fn download_target(info: &PlatformInfo) -> Result<&'static str, VscvmError> {
    let target = match (info.os.as_str(), info.arch.as_str()) {
        ("linux", "x86_64") => "linux-x64",
        ("linux", "aarch64") => "linux-arm64",
        ("linux", "arm") => "linux-armhf",
        _ => {
            return Err(VscvmError::UnsupportedPlatform {
                os: info.os.clone(),
                arch: info.arch.clone(),
            })
        }
    };
    tracing::trace!("Download target for {}/{}: {}", info.os, info.arch, target);
    Ok(target)
}
