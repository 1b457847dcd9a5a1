//! Descriptor files a unit can ship at the root of its checkout.

use std::fs;
use std::path::{Component, Path};
use crate::error::{AddonError, Result};

/// One dependency reference per line.
pub const DEPENDENCIES_FILE: &str = ".dependencies";
/// A single line: `<archive-url> <extraction-target>`.
pub const REMOTE_FILE: &str = ".remote";

/// Archive a unit wants extracted into its checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContent {
    pub url: String,
    /// Relative to the checkout root.
    pub target: String,
}

/// Reads the dependency references declared by the checkout at `checkout`.
///
/// Blank lines and `#` comments are skipped. A missing file means no
/// dependencies.
pub fn read_dependencies(checkout: &Path) -> Result<Vec<String>> {
    let path = checkout.join(DEPENDENCIES_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path).map_err(|e| AddonError::io(&path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Reads the remote content descriptor, if the checkout has one.
pub fn read_remote(checkout: &Path) -> Result<Option<RemoteContent>> {
    let path = checkout.join(REMOTE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).map_err(|e| AddonError::io(&path, e))?;
    let invalid = |reason: &str| AddonError::InvalidDescriptor {
        path: path.clone(),
        reason: reason.to_string(),
    };

    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| invalid("file is empty"))?;
    let mut fields = line.split_whitespace();
    let (Some(url), Some(target), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(invalid("expected '<archive-url> <extraction-target>'"));
    };

    let components: Vec<_> = Path::new(target).components().collect();
    let escapes = components
        .iter()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    let names_checkout = !components.iter().any(|c| matches!(c, Component::Normal(_)));
    if escapes || names_checkout {
        return Err(invalid("extraction target must be a path inside the checkout"));
    }

    Ok(Some(RemoteContent {
        url: url.to_string(),
        target: target.to_string(),
    }))
}
