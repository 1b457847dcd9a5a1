use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, AddonError>;

/// Everything that can go wrong while installing, upgrading or removing add-ons.
///
/// Each variant carries the unit, path or URL involved so the message alone is
/// enough for an operator to act on.
#[derive(Error, Debug)]
pub enum AddonError {
    /// The reference has no `owner/name` suffix.
    #[error("Invalid add-on reference '{reference}': expected 'owner/name' or a URL ending in 'owner/name'")]
    InvalidReference { reference: String },

    /// Cloning or updating the checkout failed. Aborts the install chain.
    #[error("Failed to fetch '{name}' from '{url}': {reason}\nAre you sure the repository exists?")]
    Fetch {
        name: String,
        url: String,
        reason: String,
    },

    /// The bundled archive could not be downloaded or extracted. Recoverable.
    #[error("Failed to fetch remote content from '{url}': {reason}")]
    RemoteContentFetch { url: String, reason: String },

    /// A downloaded archive could not be unpacked. Recoverable, like a failed download.
    #[error("Failed to extract '{}': {reason}", archive.display())]
    Extract { archive: PathBuf, reason: String },

    /// The manifest exists but is not valid JSON of the expected shape.
    #[error("Manifest at '{}' is corrupt: {source}", path.display())]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Removal target has no install directory.
    #[error("Are you sure add-on '{key}' is installed? It was not found at:\n\t{}", path.display())]
    NotInstalled { key: String, path: PathBuf },

    /// The dependency graph loops back on itself.
    #[error("Cyclic dependency detected: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// A `.dependencies` or `.remote` file could not be interpreted.
    #[error("Invalid descriptor '{}': {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    /// Listing the official catalog failed.
    #[error("Failed to list official add-ons from '{url}': {reason}")]
    Catalog { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AddonError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AddonError::Io {
            path: path.into(),
            source,
        }
    }
}
