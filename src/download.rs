use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

pub async fn download_file(url: &str, local_path: &Path) -> Result<()> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());
    tracing::info!("Downloading {}...", filename);

    let response = crate::releases::http_client()?
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Download of {} failed: {}", url, status));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path)
        .with_context(|| format!("Could not create {}", local_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    use futures_util::StreamExt;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_with_message("Download complete");
    Ok(())
}

pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let name = archive_path.to_string_lossy().to_lowercase();
    tracing::info!("Extracting {}...", archive_path.display());

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive_path, extract_dir)
    } else {
        Err(anyhow!(
            "Unsupported archive format: {}",
            archive_path.display()
        ))
    }
}

fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Could not open {}", archive_path.display()))?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    archive
        .unpack(extract_dir)
        .with_context(|| format!("Could not extract to {}", extract_dir.display()))?;

    Ok(())
}

/// Finds the `code` launcher inside an extracted VSCode tree. The tarball
/// ships `VSCode-linux-<arch>/bin/code` (a shell wrapper) next to the
/// Electron binary `VSCode-linux-<arch>/code`; the wrapper is preferred.
pub fn find_code_executable(extract_dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<(i32, PathBuf)> = WalkDir::new(extract_dir)
        .max_depth(4)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "code")
        .map(|e| {
            let path = e.into_path();
            let mut score = 10;
            if path
                .parent()
                .and_then(|p| p.file_name())
                .is_some_and(|n| n == "bin")
            {
                score += 20;
            }
            let depth = path
                .strip_prefix(extract_dir)
                .map_or(0, |p| p.components().count());
            score -= depth as i32;
            (score, path)
        })
        .collect();

    candidates.sort_by_key(|(score, _)| -(*score));

    if let Some((score, path)) = candidates.first() {
        tracing::debug!(
            "Found candidate executable: {} with score {}",
            path.display(),
            score
        );
    }
    candidates.into_iter().map(|(_, path)| path).next()
}
