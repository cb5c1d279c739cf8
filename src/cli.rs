use clap::{Parser, Subcommand};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("VSCVM_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("VSCVM_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("VSCVM_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

pub fn version_string() -> &'static str {
    get_version()
}

#[derive(Parser)]
#[command(name = "vscvm")]
#[command(about = "VSCode version manager")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List VSCode versions
    #[command(after_help = "Examples:\n  vscvm list\n  vscvm list --count 10\n  vscvm list --installed\n  vscvm list --active")]
    List {
        /// Number of versions to show (defaults to the list_count setting)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Only show versions installed locally
        #[arg(short, long)]
        installed: bool,
        /// Only show the currently active version
        #[arg(short, long)]
        active: bool,
    },

    /// Install a VSCode version and make it active
    #[command(disable_version_flag = true)]
    Install {
        /// Version to install (e.g. '1.85', '1.85.2' or 'latest')
        version: String,
    },

    /// Uninstall a VSCode version (defaults to the active one)
    #[command(disable_version_flag = true)]
    Uninstall {
        /// Version to uninstall
        version: Option<String>,
    },

    /// Remove every installed version except the active one
    Cleanup,

    /// Manage vscvm's configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the current version
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration setting
    Get {
        /// Key to get (if omitted, shows all settings)
        key: Option<String>,
    },
    /// Set a configuration setting
    Set {
        /// Key and value (e.g., 'list-count=10' or 'list-count 10')
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
    /// Reset a configuration setting to its default
    Unset {
        /// Key to unset (e.g., 'install-dir')
        key: String,
    },
    /// Show full configuration
    Show {
        /// Output format (json, yaml, plain)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
