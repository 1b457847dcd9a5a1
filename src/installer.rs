use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};
use crate::archive::archive_file_name;
use crate::config::Config;
use crate::descriptor::{read_dependencies, read_remote, RemoteContent};
use crate::error::{AddonError, Result};
use crate::fetcher::Fetcher;
use crate::manifest::{Manifest, ManifestStore};
use crate::name::{resolve, UnitKey, UnitRef};

/// Number of characters shown when reporting a revision change.
pub const SHORT_HASH_LEN: usize = 8;

/// Installs and upgrades units together with their declared dependencies.
pub struct Installer<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    store: ManifestStore,
}

/// Traversal state for one `install_all` call.
#[derive(Default)]
struct Walk {
    in_progress: Vec<UnitKey>,
    done: HashSet<UnitKey>,
}

impl<'a> Installer<'a> {
    pub fn new(config: &'a Config, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            config,
            fetcher,
            store: config.manifest_store(),
        }
    }

    /// Installs (or upgrades) every unit in `references` and, recursively,
    /// their dependencies.
    ///
    /// Each reference may be a comma separated list. The manifest is saved
    /// after every unit that changes, so units finished before a failure stay
    /// recorded.
    ///
    /// Returns the keys in the order they were visited, parents before their
    /// dependencies. A unit reached twice appears twice.
    ///
    /// # Errors
    /// The first fatal error aborts the whole call: [`AddonError::Fetch`] when a
    /// checkout can't be cloned or updated, [`AddonError::CyclicDependency`]
    /// when the dependency files loop, and I/O or descriptor errors.
    pub fn install_all<S: AsRef<str>>(
        &self,
        manifest: &mut Manifest,
        references: &[S],
    ) -> Result<Vec<UnitKey>> {
        let mut walk = Walk::default();
        let mut installed = Vec::new();
        for reference in split_references(references) {
            installed.extend(self.install_one(manifest, &reference, &mut walk)?);
        }
        Ok(installed)
    }

    fn install_one(
        &self,
        manifest: &mut Manifest,
        reference: &str,
        walk: &mut Walk,
    ) -> Result<Vec<UnitKey>> {
        let unit = resolve(reference, &self.config.hosting_root)?;
        let key = unit.key.clone();

        if walk.in_progress.contains(&key) {
            let mut chain: Vec<String> = walk.in_progress.iter().map(UnitKey::to_string).collect();
            chain.push(key.to_string());
            return Err(AddonError::CyclicDependency { chain });
        }
        if walk.done.contains(&key) {
            return Ok(vec![key]);
        }

        walk.in_progress.push(key.clone());
        let result = self.install_unit(manifest, &unit, walk);
        walk.in_progress.pop();
        if result.is_ok() {
            walk.done.insert(key);
        }
        result
    }

    fn install_unit(&self, manifest: &mut Manifest, unit: &UnitRef, walk: &mut Walk) -> Result<Vec<UnitKey>> {
        let install_path = self.config.install_path(&unit.key);
        info!(
            "Installing addon '{}' in '{}':",
            unit.key,
            self.config.install_root.display()
        );

        let created = !install_path.exists();
        if created {
            std::fs::create_dir_all(&install_path)
                .map_err(|e| AddonError::io(&install_path, e))?;
            info!("\tCreated install path '{}'.", self.config.display_path(&install_path));
        } else {
            info!("\tFound install path '{}'.", self.config.display_path(&install_path));
        }

        let fingerprint = match self.sync_checkout(unit, &install_path) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                if created {
                    self.discard_install_path(&install_path);
                }
                return Err(attribute_fetch_error(e, unit));
            }
        };

        if let Some(remote) = read_remote(&install_path)? {
            self.sync_remote_content(manifest, &unit.key, &install_path, &fingerprint, &remote)?;
        }

        let deps = read_dependencies(&install_path)?;
        let mut installed = vec![unit.key.clone()];
        for dep in &deps {
            installed.extend(self.install_one(manifest, dep, walk)?);
        }

        let record = manifest.record_mut(&unit.key);
        record.hash = fingerprint;
        record.deps = deps;
        self.store.save(manifest)?;
        Ok(installed)
    }

    /// Best-effort removal of an install path this run created, along with its
    /// owner directory once that is empty.
    fn discard_install_path(&self, install_path: &Path) {
        if let Err(e) = std::fs::remove_dir_all(install_path) {
            warn!("\tCould not remove '{}': {}", install_path.display(), e);
            return;
        }
        if let Some(owner_dir) = install_path.parent() {
            if owner_dir != self.config.install_root {
                // fails while other units of the same owner remain
                let _ = std::fs::remove_dir(owner_dir);
            }
        }
    }

    /// Clones or fast-forwards the checkout; returns the revision now checked out.
    fn sync_checkout(&self, unit: &UnitRef, install_path: &Path) -> Result<String> {
        if !self.fetcher.is_checkout(install_path) {
            let fingerprint = self.fetcher.clone_repo(&unit.url, install_path)?;
            info!("\tCloned addon from '{}'.", unit.url);
            return Ok(fingerprint);
        }

        let comparison = self.fetcher.fetch_and_compare(install_path)?;
        if comparison.is_up_to_date() {
            info!("\tNo action - latest already installed.");
        } else {
            self.fetcher.reset_to(install_path, &comparison.latest)?;
            info!(
                "\tUpgraded from '{}' to '{}'.",
                short_hash(&comparison.current),
                short_hash(&comparison.latest)
            );
        }
        Ok(comparison.latest)
    }

    /// Downloads and unpacks the unit's archive unless the manifest already
    /// records the same one. Download and extraction failures only warn.
    fn sync_remote_content(
        &self,
        manifest: &mut Manifest,
        key: &UnitKey,
        install_path: &Path,
        fingerprint: &str,
        remote: &RemoteContent,
    ) -> Result<()> {
        info!("\tFound remote content to install: {} -> {}", remote.url, remote.target);
        let unchanged = manifest.get(key).is_some_and(|record| {
            record.remote.as_deref() == Some(remote.url.as_str())
                && record.remote_target.as_deref() == Some(remote.target.as_str())
        });
        if unchanged {
            info!("\tNo action - remote content is already installed.");
            return Ok(());
        }

        info!("\tRemote content is new. Fetching ...");
        match self.fetch_remote_content(install_path, remote) {
            Ok(()) => {}
            Err(e @ (AddonError::RemoteContentFetch { .. } | AddonError::Extract { .. })) => {
                warn!("\tSkipping remote content for '{}': {}", key, e);
                // the old content may already be gone, so stop claiming it is installed
                if let Some(record) = manifest.get_mut(key) {
                    if record.remote.take().is_some() | record.remote_target.take().is_some() {
                        self.store.save(manifest)?;
                    }
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        info!("\tFetched.");

        let record = manifest.record_mut(key);
        if record.hash.is_empty() {
            record.hash = fingerprint.to_string();
        }
        record.remote = Some(remote.url.clone());
        record.remote_target = Some(remote.target.clone());
        self.store.save(manifest)
    }

    fn fetch_remote_content(&self, install_path: &Path, remote: &RemoteContent) -> Result<()> {
        let scratch = TempDir::new().map_err(|e| AddonError::io(std::env::temp_dir(), e))?;
        let archive = scratch.path().join(archive_file_name(&remote.url));
        self.fetcher.download(&remote.url, &archive)?;

        let target = install_path.join(&remote.target);
        if target.exists() {
            std::fs::remove_dir_all(&target).map_err(|e| AddonError::io(&target, e))?;
        }
        self.fetcher.extract(&archive, &target)
    }
}

/// Splits comma separated reference lists and drops empty entries.
pub fn split_references<S: AsRef<str>>(references: &[S]) -> Vec<String> {
    references
        .iter()
        .flat_map(|r| r.as_ref().split(','))
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncates a revision id for display.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

fn attribute_fetch_error(err: AddonError, unit: &UnitRef) -> AddonError {
    match err {
        AddonError::Fetch { reason, .. } => AddonError::Fetch {
            name: unit.key.to_string(),
            url: unit.url.clone(),
            reason,
        },
        other => other,
    }
}
