use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use crate::error::{AddonError, Result};
use crate::name::UnitKey;

/// What is known about one installed unit.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitRecord {
    /// Revision id of the checked out source.
    pub hash: String,
    /// URL of the last installed remote archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    /// Path, relative to the checkout, the archive was extracted into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_target: Option<String>,
    /// Dependency references exactly as the unit declared them.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// The set of installed units, keyed by `owner/name`.
///
/// Serialized as a flat JSON object. Keys are kept sorted so that writing a
/// freshly loaded manifest reproduces it byte for byte.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Manifest {
    units: BTreeMap<UnitKey, UnitRecord>,
}

impl Manifest {
    pub fn get(&self, key: &UnitKey) -> Option<&UnitRecord> {
        self.units.get(key)
    }

    pub fn get_mut(&mut self, key: &UnitKey) -> Option<&mut UnitRecord> {
        self.units.get_mut(key)
    }

    /// Returns the record for `key`, inserting an empty one if needed.
    pub fn record_mut(&mut self, key: &UnitKey) -> &mut UnitRecord {
        self.units.entry(key.clone()).or_default()
    }

    pub fn insert(&mut self, key: UnitKey, record: UnitRecord) -> Option<UnitRecord> {
        self.units.insert(key, record)
    }

    pub fn remove(&mut self, key: &UnitKey) -> Option<UnitRecord> {
        self.units.remove(key)
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.units.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &UnitKey> {
        self.units.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitKey, &UnitRecord)> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Reads and writes the manifest file.
///
/// There is no locking: two processes working on the same manifest path at
/// once can overwrite each other's changes.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the manifest, or an empty one if the file does not exist yet.
    ///
    /// # Errors
    /// [`AddonError::ManifestCorrupt`] if the file is not a valid manifest,
    /// [`AddonError::Io`] if it cannot be read.
    pub fn load(&self) -> Result<Manifest> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no manifest yet, starting empty");
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| AddonError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Manifest::default());
        }
        serde_json::from_str(&content).map_err(|source| AddonError::ManifestCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrites the manifest file with `manifest`.
    ///
    /// The content goes to a temporary file next to the target which is then
    /// renamed into place, so readers see either the old or the new manifest.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| AddonError::io(&parent, e))?;

        let mut content = serde_json::to_string_pretty(manifest).map_err(|source| {
            AddonError::ManifestCorrupt { path: self.path.clone(), source }
        })?;
        content.push('\n');

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| AddonError::io(&parent, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| AddonError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| AddonError::io(&self.path, e.error))?;
        debug!(path = %self.path.display(), units = manifest.len(), "manifest saved");
        Ok(())
    }
}
