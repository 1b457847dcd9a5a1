use std::path::Path;
use std::process::Command;
use reqwest::blocking::Client;
use tracing::debug;
use crate::archive;
use crate::config::Config;
use crate::error::{AddonError, Result};

/// Head of a checkout versus its upstream default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub current: String,
    pub latest: String,
}

impl Comparison {
    pub fn is_up_to_date(&self) -> bool {
        self.current == self.latest
    }
}

/// Everything the installer needs from the outside world.
///
/// [`SystemFetcher`] shells out to git and downloads over HTTP; tests swap in
/// an in-memory remote.
pub trait Fetcher {
    /// Whether `path` already holds a checkout.
    fn is_checkout(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }

    /// Clones `url` into the existing, empty directory `dest` and returns the
    /// checked out revision.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<String>;

    /// Fetches all remote refs and compares `HEAD` with the upstream head.
    fn fetch_and_compare(&self, checkout: &Path) -> Result<Comparison>;

    /// Hard resets the checkout to `fingerprint`.
    fn reset_to(&self, checkout: &Path, fingerprint: &str) -> Result<()>;

    /// Downloads `url` into the file `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Unpacks `archive` into the directory `dest`.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Production [`Fetcher`]: the `git` binary plus blocking HTTP.
#[derive(Debug, Clone)]
pub struct SystemFetcher {
    git: String,
    client: Client,
}

impl SystemFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("addons/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AddonError::Config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self {
            git: config.git_program.clone(),
            client,
        })
    }

    /// Runs git in `dir` and returns its trimmed stdout.
    fn git(&self, dir: &Path, url: &str, args: &[&str]) -> Result<String> {
        debug!(dir = %dir.display(), ?args, "running git");
        let fail = |reason: String| AddonError::Fetch {
            name: dir.display().to_string(),
            url: url.to_string(),
            reason,
        };
        let output = Command::new(&self.git)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| fail(format!("could not run '{}': {}", self.git, e)))?;
        if !output.status.success() {
            return Err(fail(format!(
                "`git {}` failed ({}): {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Fetcher for SystemFetcher {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<String> {
        self.git(dest, url, &["clone", url, "."])?;
        self.git(dest, url, &["rev-parse", "HEAD"])
    }

    fn fetch_and_compare(&self, checkout: &Path) -> Result<Comparison> {
        self.git(checkout, "origin", &["fetch", "--all"])?;
        Ok(Comparison {
            current: self.git(checkout, "origin", &["rev-parse", "HEAD"])?,
            latest: self.git(checkout, "origin", &["rev-parse", "origin/HEAD"])?,
        })
    }

    fn reset_to(&self, checkout: &Path, fingerprint: &str) -> Result<()> {
        self.git(checkout, "origin", &["reset", "--hard", fingerprint])?;
        Ok(())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        archive::download(&self.client, url, dest)
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        archive::extract(archive, dest)
    }
}
