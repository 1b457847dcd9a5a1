use std::path::{Component, Path, PathBuf};
use directories::ProjectDirs;
use serde::Deserialize;
use crate::error::{AddonError, Result};
use crate::manifest::ManifestStore;
use crate::name::{UnitKey, DEFAULT_HOSTING_ROOT};

pub const ENV_BASE_DIR: &str = "ADDONS_BASE_DIR";
pub const ENV_INSTALL_LOCATION: &str = "ADDONS_INSTALL_LOCATION";
pub const ENV_STATE_PATH: &str = "ADDONS_STATE_PATH";

pub const DEFAULT_INSTALL_LOCATION: &str = ".";
pub const DEFAULT_STATE_PATH: &str = ".state";
pub const DEFAULT_API_ROOT: &str = "https://api.github.com";
pub const DEFAULT_CATALOG_ORG: &str = "benchbot-addons";
pub const DEFAULT_GIT: &str = "git";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolved settings shared by the manifest store and both orchestrators.
///
/// Built once at the process boundary and passed down explicitly. All paths
/// are absolute.
#[derive(Debug, Clone)]
pub struct Config {
    /// Anchor for relative install/state paths.
    pub base_dir: PathBuf,
    /// Units live at `<install_root>/<owner>/<name>`.
    pub install_root: PathBuf,
    pub manifest_path: PathBuf,
    /// Prefix for references given as `owner/name`.
    pub hosting_root: String,
    pub api_root: String,
    /// Organization whose repositories make up the official catalog.
    pub catalog_org: String,
    pub git_program: String,
}

/// Optional settings read from `config.toml`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub base_dir: Option<PathBuf>,
    pub install_location: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub hosting_root: Option<String>,
    pub api_root: Option<String>,
    pub catalog_org: Option<String>,
    pub git: Option<String>,
}

impl ConfigFile {
    /// Loads a `ConfigFile` from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AddonError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| AddonError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub install_location: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Default settings anchored at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = normalize(base_dir.as_ref());
        Self {
            install_root: anchor(&base_dir, Path::new(DEFAULT_INSTALL_LOCATION)),
            manifest_path: anchor(&base_dir, Path::new(DEFAULT_STATE_PATH)),
            base_dir,
            hosting_root: DEFAULT_HOSTING_ROOT.to_string(),
            api_root: DEFAULT_API_ROOT.to_string(),
            catalog_org: DEFAULT_CATALOG_ORG.to_string(),
            git_program: DEFAULT_GIT.to_string(),
        }
    }

    /// Resolves the configuration from the process environment, the config
    /// file and `overrides`.
    ///
    /// The config file is `overrides.config_file` if given, otherwise
    /// `config.toml` in the user's config directory when it exists.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = match &overrides.config_file {
            Some(path) => Some(ConfigFile::load(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(ConfigFile::load(&path)?),
                _ => None,
            },
        };
        Self::layered(overrides, |name| std::env::var(name).ok(), file)
    }

    /// Merges defaults, `file`, environment (looked up through `env`) and
    /// `overrides`, in increasing order of precedence.
    pub fn layered<E>(overrides: &Overrides, env: E, file: Option<ConfigFile>) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();
        let env_path = |name: &str| env(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        let base_dir = match overrides
            .base_dir
            .clone()
            .or_else(|| env_path(ENV_BASE_DIR))
            .or(file.base_dir)
        {
            Some(dir) => std::path::absolute(&dir).map_err(|e| AddonError::io(&dir, e))?,
            None => default_base_dir()?,
        };

        let mut config = Config::new(&base_dir);
        if let Some(location) = overrides
            .install_location
            .clone()
            .or_else(|| env_path(ENV_INSTALL_LOCATION))
            .or(file.install_location)
        {
            config.install_root = anchor(&config.base_dir, &location);
        }
        if let Some(state) = overrides
            .state_path
            .clone()
            .or_else(|| env_path(ENV_STATE_PATH))
            .or(file.state_path)
        {
            config.manifest_path = anchor(&config.base_dir, &state);
        }
        if let Some(root) = file.hosting_root {
            config.hosting_root = root;
        }
        if let Some(root) = file.api_root {
            config.api_root = root;
        }
        if let Some(org) = file.catalog_org {
            config.catalog_org = org;
        }
        if let Some(git) = file.git {
            config.git_program = git;
        }
        Ok(config)
    }

    /// Where the unit identified by `key` is checked out.
    pub fn install_path(&self, key: &UnitKey) -> PathBuf {
        self.install_root.join(key.owner()).join(key.name())
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(&self.manifest_path)
    }

    /// Renders `path` relative to the install root, e.g. `./owner/name`.
    pub fn display_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.install_root) {
            Ok(rel) => format!(".{}{}", std::path::MAIN_SEPARATOR, rel.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

/// `config.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn default_base_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            AddonError::Config(format!(
                "could not determine a data directory; set {} or pass --base-dir",
                ENV_BASE_DIR
            ))
        })
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "addons", "addons")
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
