use std::fs;
use tracing::{info, warn};
use crate::config::Config;
use crate::error::{AddonError, Result};
use crate::installer::split_references;
use crate::manifest::{Manifest, ManifestStore};
use crate::name::{canonical_key, resolve, UnitKey};

/// Outcome of [`Remover::remove_all`].
#[derive(Debug)]
pub enum Removal {
    /// Nothing was requested and nothing is installed.
    Nothing,
    /// The caller said no; nothing was touched.
    Declined { planned: Vec<UnitKey> },
    Completed {
        removed: Vec<UnitKey>,
        /// Units that could not be removed. The rest of the batch went ahead.
        failed: Vec<(UnitKey, AddonError)>,
    },
}

/// Removes installed units, optionally together with everything that
/// depends on them.
pub struct Remover<'a> {
    config: &'a Config,
    store: ManifestStore,
}

impl<'a> Remover<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            store: config.manifest_store(),
        }
    }

    /// Works out which units a removal request covers.
    ///
    /// An empty `references` means every unit in the manifest. With `cascade`,
    /// any unit whose recorded dependencies name a unit in the set is added,
    /// repeatedly, until nothing new turns up. Dependency entries are compared
    /// by canonical key so `owner/name` and its URL form match each other.
    ///
    /// Requested units come first, then dependents in discovery order.
    pub fn plan<S: AsRef<str>>(
        &self,
        manifest: &Manifest,
        references: &[S],
        cascade: bool,
    ) -> Result<Vec<UnitKey>> {
        let requested = split_references(references);
        let mut planned: Vec<UnitKey> = Vec::new();
        if requested.is_empty() {
            planned.extend(manifest.keys().cloned());
        } else {
            for reference in &requested {
                let key = resolve(reference, &self.config.hosting_root)?.key;
                if !planned.contains(&key) {
                    planned.push(key);
                }
            }
        }

        if cascade {
            let mut next = 0;
            while next < planned.len() {
                let target = planned[next].clone();
                let dependents: Vec<UnitKey> = manifest
                    .iter()
                    .filter(|(key, _)| !planned.contains(*key))
                    .filter(|(_, record)| {
                        record
                            .deps
                            .iter()
                            .any(|dep| canonical_key(dep, &self.config.hosting_root) == target.as_str())
                    })
                    .map(|(key, _)| key.clone())
                    .collect();
                planned.extend(dependents);
                next += 1;
            }
        }
        Ok(planned)
    }

    /// Plans the removal, asks `confirm` for approval and removes every
    /// planned unit.
    ///
    /// `confirm` receives the full plan, cascaded dependents included. If it
    /// returns `false` neither the filesystem nor the manifest is touched. A
    /// unit that fails to be removed is reported in
    /// [`Removal::Completed::failed`] and does not stop the others.
    pub fn remove_all<S, C>(
        &self,
        manifest: &mut Manifest,
        references: &[S],
        cascade: bool,
        confirm: C,
    ) -> Result<Removal>
    where
        S: AsRef<str>,
        C: FnOnce(&[UnitKey]) -> Result<bool>,
    {
        let planned = self.plan(manifest, references, cascade)?;
        if planned.is_empty() {
            return Ok(Removal::Nothing);
        }
        if !confirm(&planned)? {
            return Ok(Removal::Declined { planned });
        }

        let mut removed = Vec::new();
        let mut failed = Vec::new();
        for key in planned {
            match self.remove_one(manifest, &key) {
                Ok(()) => removed.push(key),
                Err(e) => {
                    warn!("Could not remove '{}': {}", key, e);
                    failed.push((key, e));
                }
            }
        }
        Ok(Removal::Completed { removed, failed })
    }

    /// Deletes one unit's checkout and its manifest entry.
    ///
    /// The owner directory goes too once it is empty. The manifest is saved
    /// straight away so it always matches what is left on disk.
    ///
    /// # Errors
    /// [`AddonError::NotInstalled`] if the unit has no install directory; the
    /// manifest is left alone in that case.
    pub fn remove_one(&self, manifest: &mut Manifest, key: &UnitKey) -> Result<()> {
        let install_path = self.config.install_path(key);
        if !install_path.exists() {
            return Err(AddonError::NotInstalled {
                key: key.to_string(),
                path: install_path,
            });
        }

        info!(
            "Removing addon '{}' in '{}':",
            key,
            self.config.install_root.display()
        );
        fs::remove_dir_all(&install_path).map_err(|e| AddonError::io(&install_path, e))?;
        info!("\tRemoved installed directory '{}'", self.config.display_path(&install_path));

        if let Some(parent) = install_path.parent() {
            let is_empty = fs::read_dir(parent)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if parent != self.config.install_root && is_empty {
                fs::remove_dir(parent).map_err(|e| AddonError::io(parent, e))?;
                info!("\tRemoved empty parent directory '{}'", self.config.display_path(parent));
            }
        }

        manifest.remove(key);
        self.store.save(manifest)
    }
}
