use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use crate::config::Config;
use crate::error::{AddonError, Result};

/// Page size requested from the listing API.
pub const PAGE_SIZE: usize = 100;

/// The part of a repository listing entry we care about.
#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    /// `owner/name`, usable directly as an install reference.
    pub full_name: String,
}

/// Lists the official add-ons: the repositories of one hosting organization.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: Client,
    api_root: String,
    organization: String,
}

impl Catalog {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("addons/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AddonError::Config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            organization: config.catalog_org.clone(),
        })
    }

    /// Fetches the `full_name` of every repository in the organization.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Catalog`] if a page can't be fetched or parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use addons::{Catalog, Config};
    ///
    /// let catalog = Catalog::new(&Config::new("/tmp/addons")).unwrap();
    /// for name in catalog.list_official().unwrap() {
    ///     println!("{name}");
    /// }
    /// ```
    pub fn list_official(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for page in 1.. {
            let entries = self.fetch_page(page)?;
            let last = entries.len() < PAGE_SIZE;
            names.extend(entries.into_iter().map(|entry| entry.full_name));
            if last {
                break;
            }
        }
        Ok(names)
    }

    fn fetch_page(&self, page: usize) -> Result<Vec<CatalogEntry>> {
        let url = format!(
            "{}/orgs/{}/repos?per_page={}&page={}",
            self.api_root, self.organization, PAGE_SIZE, page
        );
        debug!(%url, "listing catalog page");
        let fail = |reason: String| AddonError::Catalog { url: url.clone(), reason };
        let body = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| fail(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| fail(e.to_string()))
    }
}
