mod cli;
mod config;
mod download;
mod error;
mod install;
mod launcher;
mod platform;
mod releases;
mod types;

#[cfg(test)]
mod test_site;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use config::{
    get_setting, load_config, load_file_config, normalize_key, save_config, set_setting, split_key_value,
    unset_setting, SETTING_KEYS,
};
use console::style;
use install::{cleanup_versions, install_version, list_installed, uninstall_version, InstallOutcome};
use types::{InstalledVersion, VersionRecord, VscvmConfig, VscvmSettings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;

    match cli.command {
        Commands::Version => {
            println!("vscvm {}", cli::version_string());
        }

        Commands::List {
            count,
            installed,
            active,
        } => {
            let count = count.unwrap_or(config.settings.list_count);
            if active {
                show_active_version(&config.settings)?;
            } else if installed {
                show_installed_versions(&config.settings, count)?;
            } else {
                show_remote_versions(&config.settings, count).await?;
            }
        }

        Commands::Install { version } => {
            match install_version(&config.settings, &version).await? {
                InstallOutcome::Installed(v) => println!("Installed VSCode {}.", v),
                InstallOutcome::Cached(v) => {
                    println!("VSCode {} is already installed, now active.", v)
                }
            }
        }

        Commands::Uninstall { version } => {
            let removed = uninstall_version(&config.settings, version.as_deref())?;
            println!("Uninstalled VSCode {}.", removed);
        }

        Commands::Cleanup => {
            let removed = cleanup_versions(&config.settings)?;
            if removed.is_empty() {
                println!("Nothing to clean up.");
            } else {
                for version in &removed {
                    println!("Removed VSCode {}.", version);
                }
            }
        }

        Commands::Config { action } => manage_config(&config, action)?,
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow!(e))
}

async fn show_remote_versions(settings: &VscvmSettings, count: usize) -> Result<()> {
    let records = releases::fetch_versions(settings).await?;
    let installed = list_installed(settings)?;

    for line in render_remote_versions(&records, &installed, count) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per release, newest first, marked when installed or active.
fn render_remote_versions(
    records: &[VersionRecord],
    installed: &[InstalledVersion],
    count: usize,
) -> Vec<String> {
    records
        .iter()
        .take(count)
        .map(|record| {
            let local = installed.iter().find(|v| v.version == record.version);
            let marker = match local {
                Some(v) if v.active => style("(active)").green().bold().to_string(),
                Some(_) => style("(installed)").cyan().to_string(),
                None => String::new(),
            };
            let line = format!("{} - {} {}", record.version, record.label, marker);
            line.trim_end().to_string()
        })
        .collect()
}

fn show_installed_versions(settings: &VscvmSettings, count: usize) -> Result<()> {
    let installed = list_installed(settings)?;
    if installed.is_empty() {
        println!("No versions installed in {}.", settings.install_dir);
        return Ok(());
    }

    for version in installed.iter().take(count) {
        let marker = if version.active {
            style("*").green().bold()
        } else {
            style(" ")
        };
        let date = version
            .installed_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{} {} {}", marker, version.version, style(date).dim());
    }
    Ok(())
}

fn show_active_version(settings: &VscvmSettings) -> Result<()> {
    match launcher::active_version(settings)? {
        Some(version) => println!("{}", version),
        None => println!("No active version."),
    }
    Ok(())
}

fn manage_config(config: &VscvmConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            if let Some(key) = key {
                let value = get_setting(&config.settings, &key)
                    .ok_or_else(|| anyhow!("Setting '{}' not found", key))?;
                println!("{}", value);
            } else {
                println!("--- vscvm Settings ---");
                for key in SETTING_KEYS {
                    if let Some(value) = get_setting(&config.settings, key) {
                        println!("  {}: {}", key, value);
                    }
                }
            }
        }
        ConfigAction::Set { args } => {
            let (key, value) = split_key_value(&args)?;
            let mut stored = load_file_config()?;
            set_setting(&mut stored.settings, &key, &value)?;
            save_config(&stored)?;
            tracing::info!("Setting '{}' updated to '{}'", normalize_key(&key), value);
        }
        ConfigAction::Unset { key } => {
            let mut stored = load_file_config()?;
            unset_setting(&mut stored.settings, &key)?;
            save_config(&stored)?;
            tracing::info!("Setting '{}' unset", normalize_key(&key));
        }
        ConfigAction::Show { format } => match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(config)?),
            "yaml" => print!("{}", serde_yaml::to_string(config)?),
            "plain" => {
                for key in SETTING_KEYS {
                    if let Some(value) = get_setting(&config.settings, key) {
                        println!("{}={}", key, value);
                    }
                }
            }
            other => return Err(anyhow!("Unknown format '{}'. Use json, yaml or plain.", other)),
        },
    }
    Ok(())
}
