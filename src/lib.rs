//! # Addons Core Library
//!
//! This crate contains the core logic of the `addons` tool, a dependency-aware installer for
//! add-ons that live in git repositories.
//!
//! An add-on ("unit") is referenced as `owner/name` or by a URL ending in `owner/name`. Installing
//! one clones it (or fast-forwards an existing checkout), unpacks the archive named in its
//! `.remote` file, installs every unit listed in its `.dependencies` file and records the result in
//! a JSON manifest. Removal uses the manifest to find, and optionally take along, every unit that
//! depends on the one being removed.
//!
//! Everything is synchronous. There is no locking around the manifest: running two instances
//! against the same manifest path at once can lose updates.
//!
//! ## Modules Overview
//! - [`name`] – Parsing unit references into canonical `owner/name` keys
//! - [`manifest`] – The installed-unit manifest and its on-disk store
//! - [`config`] – Install root, manifest path and service endpoints
//! - [`descriptor`] – `.dependencies` and `.remote` files inside a checkout
//! - [`fetcher`] – The [`Fetcher`] capability and its git/HTTP implementation
//! - [`archive`] – Downloading and unpacking remote content
//! - [`installer`] – Recursive install and upgrade
//! - [`remover`] – Removal with cascading dependents
//! - [`registry`] – Listing the official add-on catalog
//! - [`error`] – The [`AddonError`] type

pub mod archive;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod manifest;
pub mod name;
pub mod registry;
pub mod remover;

pub use config::{Config, ConfigFile, Overrides};
pub use error::{AddonError, Result};
pub use fetcher::{Comparison, Fetcher, SystemFetcher};
pub use installer::Installer;
pub use manifest::{Manifest, ManifestStore, UnitRecord};
pub use name::{resolve, UnitKey, UnitRef};
pub use registry::Catalog;
pub use remover::{Removal, Remover};
