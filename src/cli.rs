use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    #[command(flatten)]
    pub(crate) paths: PathArgs,

    /// Show debug output (external commands, manifest writes)
    #[clap(short, long, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: AddonsCommand,
}

/// Where add-ons and the manifest live. Relative paths are resolved against the base directory.
#[derive(Debug, Args, Clone, Default)]
pub struct PathArgs {
    /// Base directory for relative paths [env: ADDONS_BASE_DIR]
    #[clap(long, global = true)]
    pub(crate) base_dir: Option<PathBuf>,
    /// Directory add-ons are installed into [env: ADDONS_INSTALL_LOCATION]
    #[clap(long, global = true)]
    pub(crate) install_location: Option<PathBuf>,
    /// Path of the manifest file [env: ADDONS_STATE_PATH]
    #[clap(long, global = true)]
    pub(crate) state_path: Option<PathBuf>,
    /// Config file to use instead of the default `config.toml`
    #[clap(long, global = true)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum AddonsCommand {
    /// Installs or upgrades add-ons and their dependencies
    Install {
        /// `owner/name` or repository URLs; comma separated lists are accepted
        #[clap(required = true)]
        references: Vec<String>,
    },
    /// Removes add-ons. Defaults to all
    Remove {
        /// `owner/name` or repository URLs; comma separated lists are accepted
        references: Vec<String>,
        /// Do not remove add-ons that depend on the ones named
        #[clap(long)]
        no_cascade: bool,
        /// Skip the confirmation prompt
        #[clap(short, long)]
        yes: bool,
    },
    /// Lists installed add-ons
    List,
    /// Lists the official add-ons available for install
    Official,
    /// Output the install path of an add-on if it is installed
    Which {
        reference: String,
    },
}
