use crate::types::*;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "vscvm";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Setting keys accepted by `config get/set/unset`.
pub const SETTING_KEYS: [&str; 5] = [
    "install_dir",
    "desktop_dir",
    "desktop_entry",
    "releases_url",
    "list_count",
];

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("VSCVM_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    let path = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// The config as stored on disk. `config set` and `config unset` edit and
/// save this one so that environment overrides never get persisted.
pub fn load_file_config() -> Result<VscvmConfig> {
    let config_path = get_config_file_path()?;
    if !config_path.exists() {
        return Ok(VscvmConfig::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
    serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")
}

/// The effective config: the file plus `VSCVM_*` environment overrides.
pub fn load_config() -> Result<VscvmConfig> {
    let mut config = load_file_config()?;
    apply_env_overrides(&mut config.settings);
    Ok(config)
}

fn apply_env_overrides(settings: &mut VscvmSettings) {
    if let Ok(dir) = std::env::var("VSCVM_DIR") {
        settings.install_dir = dir;
    }
    if let Ok(dir) = std::env::var("VSCVM_DESKTOP_DIR") {
        settings.desktop_dir = dir;
    }
    if let Ok(url) = std::env::var("VSCVM_RELEASES_URL") {
        settings.releases_url = url;
    }
}

pub fn save_config(config: &VscvmConfig) -> Result<()> {
    let config_path = get_config_file_path()?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path"))?;

    fs::create_dir_all(config_dir)?;

    let content = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, content)
        .with_context(|| format!("Could not write config file at {}", config_path.display()))?;

    Ok(())
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                format!("_{}", c.to_lowercase())
            } else {
                c.to_string()
            }
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn get_setting(settings: &VscvmSettings, key: &str) -> Option<String> {
    let value = match normalize_key(key).as_str() {
        "install_dir" => settings.install_dir.clone(),
        "desktop_dir" => settings.desktop_dir.clone(),
        "desktop_entry" => settings.desktop_entry.to_string(),
        "releases_url" => settings.releases_url.clone(),
        "list_count" => settings.list_count.to_string(),
        _ => return None,
    };
    Some(value)
}

pub fn set_setting(settings: &mut VscvmSettings, key: &str, value: &str) -> Result<()> {
    match normalize_key(key).as_str() {
        "install_dir" => settings.install_dir = value.to_string(),
        "desktop_dir" => settings.desktop_dir = value.to_string(),
        "desktop_entry" => {
            settings.desktop_entry = value.eq_ignore_ascii_case("true") || value == "1";
        }
        "releases_url" => {
            reqwest::Url::parse(value)
                .with_context(|| format!("Invalid URL for 'releases_url': {}", value))?;
            settings.releases_url = value.to_string();
        }
        "list_count" => {
            settings.list_count = value
                .parse::<usize>()
                .with_context(|| format!("Invalid value for 'list_count': {}", value))?;
        }
        other => return Err(unknown_key(other)),
    }
    Ok(())
}

pub fn unset_setting(settings: &mut VscvmSettings, key: &str) -> Result<()> {
    let defaults = VscvmSettings::default();
    match normalize_key(key).as_str() {
        "install_dir" => settings.install_dir = defaults.install_dir,
        "desktop_dir" => settings.desktop_dir = defaults.desktop_dir,
        "desktop_entry" => settings.desktop_entry = defaults.desktop_entry,
        "releases_url" => settings.releases_url = defaults.releases_url,
        "list_count" => settings.list_count = defaults.list_count,
        other => return Err(unknown_key(other)),
    }
    Ok(())
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "'{}' is not a valid configuration setting. Valid settings: {}",
        key,
        SETTING_KEYS.join(", ")
    )
}

/// Accepts `key=value` or `key value`.
pub fn split_key_value(args: &[String]) -> Result<(String, String)> {
    match args {
        [single] => single
            .split_once('=')
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .ok_or_else(|| anyhow!("Invalid format. Use 'key=value' or 'key value'.")),
        [key, rest @ ..] => Ok((key.clone(), rest.join(" "))),
        [] => Err(anyhow!("Missing key and value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_unset_round_trip_to_defaults() {
        let mut settings = VscvmSettings::default();
        set_setting(&mut settings, "list-count", "12").unwrap();
        set_setting(&mut settings, "desktopEntry", "false").unwrap();
        assert_eq!(settings.list_count, 12);
        assert!(!settings.desktop_entry);

        unset_setting(&mut settings, "list_count").unwrap();
        assert_eq!(settings.list_count, 5);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut settings = VscvmSettings::default();
        assert!(set_setting(&mut settings, "shim-dir", "/tmp").is_err());
        assert!(set_setting(&mut settings, "list-count", "many").is_err());
        assert!(set_setting(&mut settings, "releases-url", "not a url").is_err());
        assert!(get_setting(&settings, "nope").is_none());
    }

    #[test]
    fn splits_both_argument_styles() {
        let eq = split_key_value(&["list-count=3".to_string()]).unwrap();
        assert_eq!(eq, ("list-count".to_string(), "3".to_string()));

        let spaced = split_key_value(&["list-count".to_string(), "3".to_string()]).unwrap();
        assert_eq!(spaced, ("list-count".to_string(), "3".to_string()));

        assert!(split_key_value(&["list-count".to_string()]).is_err());
    }
}
