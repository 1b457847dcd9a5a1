use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{AddonError, Result};

/// Hosting root used for references given as plain `owner/name`.
pub const DEFAULT_HOSTING_ROOT: &str = "https://github.com";

/// Canonical identity of a unit: `owner/name`.
///
/// Serializes as a plain string so it can key the JSON manifest directly.
/// Deserializing goes through [`UnitKey::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitKey(String);

impl UnitKey {
    /// Builds a key from its two halves.
    pub fn new(owner: &str, name: &str) -> Self {
        UnitKey(format!("{}/{}", owner, name))
    }

    /// Parses an exact `owner/name` key, without any URL handling.
    pub fn parse(key: &str) -> Result<Self> {
        match key.split_once('/') {
            Some((owner, name)) if is_segment(owner) && is_segment(name) => {
                Ok(UnitKey::new(owner, name))
            }
            _ => Err(AddonError::InvalidReference { reference: key.to_string() }),
        }
    }

    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(owner, _)| owner).unwrap_or(&self.0)
    }

    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UnitKey {
    type Error = AddonError;

    fn try_from(key: String) -> Result<Self> {
        UnitKey::parse(&key)
    }
}

impl From<UnitKey> for String {
    fn from(key: UnitKey) -> Self {
        key.0
    }
}

impl AsRef<str> for UnitKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fully resolved unit reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    /// Source URL handed to the version-control client.
    pub url: String,
    pub owner: String,
    pub name: String,
    pub key: UnitKey,
}

/// Resolves a user supplied reference into a [`UnitRef`].
///
/// Accepts `owner/name`, a full URL ending in `owner/name` (a trailing `/` or
/// `.git` is ignored for the key) and scp-like remotes such as
/// `git@github.com:owner/name`. The host of a URL never counts as the owner.
/// References without a scheme are anchored at `hosting_root`.
///
/// # Errors
///
/// Returns [`AddonError::InvalidReference`] if no `owner/name` suffix can be
/// extracted.
///
/// # Example
///
/// ```
/// use addons::name::resolve;
///
/// let short = resolve("owner/repo", "https://github.com").unwrap();
/// let long = resolve("https://github.com/owner/repo", "https://github.com").unwrap();
/// assert_eq!(short.key, long.key);
/// assert_eq!(short.url, "https://github.com/owner/repo");
/// ```
pub fn resolve(reference: &str, hosting_root: &str) -> Result<UnitRef> {
    let invalid = || AddonError::InvalidReference { reference: reference.to_string() };
    let trimmed = reference.trim();
    let has_scheme = trimmed.contains("://");
    let scp_like = !has_scheme && trimmed.contains('@') && trimmed.contains(':');

    let path = if has_scheme {
        trimmed
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .map(|(_host, path)| path)
            .ok_or_else(invalid)?
    } else if scp_like {
        trimmed.split_once(':').map(|(_host, path)| path).ok_or_else(invalid)?
    } else {
        trimmed
    };
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut segments = path.rsplit('/');
    let name = segments.next().filter(|s| is_segment(s)).ok_or_else(invalid)?;
    let owner = segments.next().filter(|s| is_segment(s)).ok_or_else(invalid)?;

    let url = if has_scheme || scp_like {
        trimmed.to_string()
    } else {
        format!("{}/{}/{}", hosting_root.trim_end_matches('/'), owner, name)
    };

    Ok(UnitRef {
        url,
        owner: owner.to_string(),
        name: name.to_string(),
        key: UnitKey::new(owner, name),
    })
}

/// Resolves a reference to its key only, falling back to the raw string.
///
/// Used where unresolvable references must still be compared, e.g. recorded
/// dependency lists.
pub fn canonical_key(reference: &str, hosting_root: &str) -> String {
    resolve(reference, hosting_root)
        .map(|unit| unit.key.0)
        .unwrap_or_else(|_| reference.trim().to_string())
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.chars().any(char::is_whitespace)
}
