//! Release discovery: the listing page, per-version details pages and the
//! redirecting download links they point to.

use crate::error::VscvmError;
use crate::types::*;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use scraper::{Html, Selector};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Anchors of the release navigation, one per monthly release.
const VERSION_LINK_SELECTOR: &str = "#docs-navbar a";

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("vscvm/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Could not build HTTP client")
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    tracing::debug!("Fetching {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Request to {} failed: {}", url, status));
    }
    Ok(response.text().await?)
}

/// Fetches the release listing and returns its versions, newest first.
pub async fn fetch_versions(settings: &VscvmSettings) -> Result<Vec<VersionRecord>> {
    let base = Url::parse(&settings.releases_url)
        .with_context(|| format!("Invalid releases URL: {}", settings.releases_url))?;
    let client = http_client()?;
    let html = fetch_page(&client, base.as_str()).await?;

    let records = parse_version_links(&html, &base)?;
    if records.is_empty() {
        return Err(VscvmError::EmptyReleaseList(settings.releases_url.clone()).into());
    }
    tracing::info!("Found {} versions on {}", records.len(), base);
    Ok(records)
}

pub fn parse_version_links(html: &str, base: &Url) -> Result<Vec<VersionRecord>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(VERSION_LINK_SELECTOR)
        .map_err(|e| anyhow!("Invalid selector {}: {:?}", VERSION_LINK_SELECTOR, e))?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let token = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let Some(version) = normalize_version(token) else {
            tracing::trace!("Skipping non-version link {}", href);
            continue;
        };
        if !seen.insert(version.clone()) {
            continue;
        }
        let url = base
            .join(href)
            .with_context(|| format!("Invalid release link: {}", href))?;
        let label = link.text().collect::<String>().trim().to_string();

        records.push(VersionRecord {
            url: url.to_string(),
            version,
            label,
        });
    }

    Ok(records)
}

/// `v1_85`, `v1.85` and `1.85` all normalize to `1.85`. Anything that is not
/// a dotted run of numbers afterwards is rejected.
pub fn normalize_version(token: &str) -> Option<String> {
    let token = token.trim();
    let token = token
        .strip_prefix('v')
        .or_else(|| token.strip_prefix('V'))
        .unwrap_or(token);
    let version = token.replace('_', ".");

    let mut parts = 0;
    for part in version.split('.') {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        parts += 1;
    }
    (parts >= 2).then_some(version)
}

/// Does `requested` name the release `release`? A patch version such as
/// `1.85.2` belongs to the `1.85` release.
pub fn version_matches(requested: &str, release: &str) -> bool {
    if requested == release {
        return true;
    }
    let req: Vec<&str> = requested.split('.').collect();
    let rel: Vec<&str> = release.split('.').collect();
    req.len() > rel.len() && req[..rel.len()] == rel[..]
}

pub fn select_version<'a>(
    records: &'a [VersionRecord],
    requested: &str,
) -> Result<&'a VersionRecord, VscvmError> {
    if requested.trim().eq_ignore_ascii_case("latest") {
        return records
            .first()
            .ok_or_else(|| VscvmError::VersionNotFound(requested.to_string()));
    }

    let normalized = normalize_version(requested)
        .ok_or_else(|| VscvmError::VersionNotFound(requested.to_string()))?;

    records
        .iter()
        .find(|r| version_matches(&normalized, &r.version))
        .ok_or_else(|| VscvmError::VersionNotFound(requested.to_string()))
}

/// Numeric ordering of dotted versions; `1.9` sorts before `1.10`. Names
/// that do not parse sort below every version and among themselves by text,
/// so the ordering stays total for mixed input.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn sort_key(version: &str) -> Option<semver::Version> {
    let padded = match version.split('.').count() {
        1 => format!("{}.0.0", version),
        2 => format!("{}.0", version),
        _ => version.to_string(),
    };
    semver::Version::parse(&padded).ok()
}

/// Finds the `<target>` download link on a version's details page. Links
/// have the shape `<update host>/<build>/<target>/stable`.
pub fn find_download_link(details_html: &str, target: &str) -> Option<String> {
    let pattern = format!(
        r#"(https?://[^\s"'<>/]+/[0-9][\w.\-]*/{}/stable)(?:["'\s<>]|$)"#,
        regex::escape(target)
    );
    let re = regex::Regex::new(&pattern).ok()?;
    re.captures(details_html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub async fn fetch_download_link(record: &VersionRecord, target: &str) -> Result<String> {
    let client = http_client()?;
    let html = fetch_page(&client, &record.url).await?;
    find_download_link(&html, target).ok_or_else(|| {
        VscvmError::DownloadLinkNotFound {
            target: target.to_string(),
            url: record.url.clone(),
        }
        .into()
    })
}

/// Follows the redirect chain of a download link and returns where it ends.
/// Only the response headers are read; the body is dropped unread.
pub async fn resolve_download_url(url: &str) -> Result<Url> {
    let client = http_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {}", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Could not resolve {}: {}", url, status));
    }
    let resolved = response.url().clone();
    drop(response);
    tracing::debug!("Resolved {} -> {}", url, resolved);
    Ok(resolved)
}
