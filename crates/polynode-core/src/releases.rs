//! The distribution index (`<mirror>/index.json`) and alias resolution.

use log::{debug, warn};
use polynode_model::{InstallError, Version};
use serde::Deserialize;

/// The `lts` field is `false` for non-LTS releases and the line's codename
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Lts {
    Flag(bool),
    Codename(String),
}

impl Lts {
    #[must_use]
    pub fn codename(&self) -> Option<&str> {
        match self {
            Self::Codename(name) => Some(name),
            Self::Flag(_) => None,
        }
    }
}

impl Default for Lts {
    fn default() -> Self {
        Self::Flag(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRelease {
    version: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    lts: Lts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub date: String,
    pub lts: Option<String>,
}

/// Parsed release index.
#[derive(Debug, Clone, Default)]
pub struct ReleaseIndex {
    releases: Vec<Release>,
}

impl ReleaseIndex {
    /// Fetch and parse `<mirror>/index.json`.
    ///
    /// # Errors
    /// Returns a download error when the request fails or the body is not a
    /// release index.
    pub async fn fetch(client: &reqwest::Client, mirror: &str) -> Result<Self, InstallError> {
        let url = format!("{mirror}/index.json");
        debug!("Fetching release index from {url}");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|error| InstallError::download(&url, error))?;
        if !response.status().is_success() {
            return Err(InstallError::download(
                &url,
                format!("HTTP {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|error| InstallError::download(&url, error))?;
        Self::from_json(&body).map_err(|error| InstallError::download(&url, error))
    }

    /// Parse an index body. Entries with unusable versions are skipped.
    ///
    /// # Errors
    /// Returns an error when the body is not a JSON array of releases.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawRelease> = serde_json::from_str(body)?;

        let mut releases: Vec<Release> = raw
            .into_iter()
            .filter_map(|entry| match Version::parse_user_input(&entry.version) {
                Ok(version) => Some(Release {
                    version,
                    date: entry.date,
                    lts: entry.lts.codename().map(str::to_string),
                }),
                Err(error) => {
                    warn!("Ignoring release index entry: {error}");
                    None
                }
            })
            .collect();
        releases.sort_by(|a, b| b.version.cmp(&a.version));

        Ok(Self { releases })
    }

    /// Releases, newest first.
    #[must_use]
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Release> {
        self.releases.first()
    }

    #[must_use]
    pub fn latest_lts(&self) -> Option<&Release> {
        self.releases.iter().find(|release| release.lts.is_some())
    }

    /// Newest release of the LTS line called `codename`, case-insensitively.
    #[must_use]
    pub fn latest_lts_named(&self, codename: &str) -> Option<&Release> {
        self.releases.iter().find(|release| {
            release
                .lts
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(codename))
        })
    }

    /// Resolve an alias (`latest`, `current`, `lts`, `lts/<codename>`).
    /// Returns `None` for anything else, including explicit versions.
    #[must_use]
    pub fn resolve_alias(&self, alias: &str) -> Option<Version> {
        let alias = alias.trim().to_ascii_lowercase();
        let release = match alias.as_str() {
            "latest" | "current" | "node" => self.latest(),
            "lts" | "lts/*" => self.latest_lts(),
            other => self.latest_lts_named(other.strip_prefix("lts/")?),
        };
        release.map(|release| release.version)
    }
}

/// True when `request` names a release through the index rather than an
/// explicit version.
#[must_use]
pub fn is_alias(request: &str) -> bool {
    let request = request.trim().to_ascii_lowercase();
    matches!(request.as_str(), "latest" | "current" | "node" | "lts")
        || request.starts_with("lts/")
}
