#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use addons::{AddonError, Comparison, Config, Fetcher, Result};
use tempfile::TempDir;

/// Something the installer asked the outside world to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clone(String),
    Fetch(PathBuf),
    Reset(PathBuf, String),
    Download(String),
    Extract(PathBuf),
}

struct Remote {
    revision: String,
    files: Vec<(String, String)>,
}

/// A [`Fetcher`] backed by in-memory repositories and archives.
///
/// Checkouts are real directories so descriptor files can be read from disk;
/// `.git/HEAD` holds the checked out revision.
#[derive(Default)]
pub struct FakeFetcher {
    remotes: RefCell<HashMap<String, Remote>>,
    checkouts: RefCell<HashMap<PathBuf, String>>,
    archives: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<Call>>,
    broken_archives: Cell<bool>,
}

impl FakeFetcher {
    /// Creates or updates the repository at `url`.
    pub fn publish(&self, url: &str, revision: &str, files: &[(&str, &str)]) {
        self.remotes.borrow_mut().insert(
            url.to_string(),
            Remote {
                revision: revision.to_string(),
                files: files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect(),
            },
        );
    }

    /// Makes `url` downloadable; the "archive" extracts to `content.txt`.
    pub fn serve_archive(&self, url: &str, content: &str) {
        self.archives.borrow_mut().insert(url.to_string(), content.to_string());
    }

    /// While set, every extraction fails as if the archive were damaged.
    pub fn break_archives(&self, broken: bool) {
        self.broken_archives.set(broken);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn write_checkout(&self, dest: &Path, url: &str) -> Result<String> {
        let remotes = self.remotes.borrow();
        let remote = remotes.get(url).ok_or_else(|| AddonError::Fetch {
            name: dest.display().to_string(),
            url: url.to_string(),
            reason: "repository not found".to_string(),
        })?;
        let write = |path: PathBuf, content: &str| -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| AddonError::Io { path: parent.into(), source })?;
            }
            fs::write(&path, content).map_err(|source| AddonError::Io { path, source })
        };
        write(dest.join(".git").join("HEAD"), &remote.revision)?;
        for (file, content) in &remote.files {
            write(dest.join(file), content)?;
        }
        Ok(remote.revision.clone())
    }
}

impl Fetcher for FakeFetcher {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<String> {
        self.record(Call::Clone(url.to_string()));
        let revision = self.write_checkout(dest, url)?;
        self.checkouts.borrow_mut().insert(dest.to_path_buf(), url.to_string());
        Ok(revision)
    }

    fn fetch_and_compare(&self, checkout: &Path) -> Result<Comparison> {
        self.record(Call::Fetch(checkout.to_path_buf()));
        let url = self.checkouts.borrow().get(checkout).cloned().unwrap_or_default();
        let current = fs::read_to_string(checkout.join(".git").join("HEAD")).unwrap_or_default();
        let latest = self
            .remotes
            .borrow()
            .get(&url)
            .map(|remote| remote.revision.clone())
            .unwrap_or_else(|| current.clone());
        Ok(Comparison { current, latest })
    }

    fn reset_to(&self, checkout: &Path, fingerprint: &str) -> Result<()> {
        self.record(Call::Reset(checkout.to_path_buf(), fingerprint.to_string()));
        let url = self.checkouts.borrow().get(checkout).cloned().unwrap_or_default();
        self.write_checkout(checkout, &url).map(|_| ())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(Call::Download(url.to_string()));
        match self.archives.borrow().get(url) {
            Some(content) => fs::write(dest, content)
                .map_err(|source| AddonError::Io { path: dest.into(), source }),
            None => Err(AddonError::RemoteContentFetch {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            }),
        }
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        self.record(Call::Extract(dest.to_path_buf()));
        if self.broken_archives.get() {
            return Err(AddonError::Extract {
                archive: archive.to_path_buf(),
                reason: "invalid Zip archive".to_string(),
            });
        }
        let content = fs::read_to_string(archive)
            .map_err(|source| AddonError::Io { path: archive.into(), source })?;
        fs::create_dir_all(dest).map_err(|source| AddonError::Io { path: dest.into(), source })?;
        fs::write(dest.join("content.txt"), content)
            .map_err(|source| AddonError::Io { path: dest.into(), source })
    }
}

/// A config whose install root and manifest live in a fresh temp dir.
pub fn setup() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    (dir, config)
}

pub fn github(reference: &str) -> String {
    format!("https://github.com/{}", reference)
}
