use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

use crate::platform::Platform;

/// Environment variable overriding the install root.
pub const ROOT_ENV: &str = "POLYNODE_PATH";

const CURRENT_DIR_NAME: &str = "current";
const REPOSITORY_DIR_NAME: &str = "repository";
const STAGING_DIR_NAME: &str = ".current.staging";
const MARKER_FILE_NAME: &str = "version.info";
const PROXY_FILE_NAME: &str = "proxy.json";
const LOG_FILE_NAME: &str = "polynode.log";
const VERSION_DIR_PREFIX: &str = "node-v";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Could not determine home directory; set POLYNODE_PATH to choose an install root")]
    HomeDirUnavailable,
}

/// Every path the tool reads or writes, derived from one install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub root: PathBuf,
    /// The active slot.
    pub current: PathBuf,
    pub repository: PathBuf,
    dist_suffix: String,
}

impl InstallLayout {
    #[must_use]
    pub fn new(root: PathBuf, dist_suffix: impl Into<String>) -> Self {
        Self {
            current: root.join(CURRENT_DIR_NAME),
            repository: root.join(REPOSITORY_DIR_NAME),
            root,
            dist_suffix: dist_suffix.into(),
        }
    }

    /// Build the layout from the value of [`ROOT_ENV`], falling back to the
    /// platform default root when it is unset or empty.
    ///
    /// # Errors
    /// Returns an error when no override is given and the platform default
    /// cannot be determined.
    pub fn resolve(
        root_override: Option<OsString>,
        platform: &Platform,
    ) -> Result<Self, LayoutError> {
        let root = match root_override.filter(|value| !value.is_empty()) {
            Some(root) => PathBuf::from(root),
            None => platform
                .default_root()
                .ok_or(LayoutError::HomeDirUnavailable)?,
        };
        Ok(Self::new(root, platform.dist_suffix()))
    }

    /// Build the layout from the process environment.
    ///
    /// # Errors
    /// See [`InstallLayout::resolve`].
    pub fn from_env(platform: &Platform) -> Result<Self, LayoutError> {
        Self::resolve(std::env::var_os(ROOT_ENV), platform)
    }

    #[must_use]
    pub fn dist_suffix(&self) -> &str {
        &self.dist_suffix
    }

    #[must_use]
    pub fn current_dir_name(&self) -> &'static str {
        CURRENT_DIR_NAME
    }

    #[must_use]
    pub fn marker_file(&self) -> PathBuf {
        self.current.join(MARKER_FILE_NAME)
    }

    #[must_use]
    pub fn marker_file_name(&self) -> &'static str {
        MARKER_FILE_NAME
    }

    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR_NAME)
    }

    #[must_use]
    pub fn proxy_file(&self) -> PathBuf {
        self.root.join(PROXY_FILE_NAME)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    /// Name of the repository directory for `version`, for example
    /// `node-v20.1.0-win-x64`.
    #[must_use]
    pub fn version_dir_name(&self, version: &impl std::fmt::Display) -> String {
        format!("{VERSION_DIR_PREFIX}{version}-{}", self.dist_suffix)
    }

    #[must_use]
    pub fn version_dir(&self, version: &impl std::fmt::Display) -> PathBuf {
        self.repository.join(self.version_dir_name(version))
    }

    /// Recover the raw version text from a repository directory name, or
    /// `None` when the name does not follow the naming convention.
    #[must_use]
    pub fn version_from_dir_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(VERSION_DIR_PREFIX)?
            .strip_suffix(self.dist_suffix.as_str())?
            .strip_suffix('-')
    }

    /// Name of the distribution archive for `version`.
    #[must_use]
    pub fn archive_name(&self, version: &impl std::fmt::Display) -> String {
        format!("{}.zip", self.version_dir_name(version))
    }

    #[must_use]
    pub fn backup_file(&self, timestamp: &str) -> PathBuf {
        self.root.join(format!("{timestamp}-polynode.zip"))
    }

    /// Ensure the install root and repository exist on disk.
    ///
    /// # Errors
    /// Returns an error if either directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.repository)?;
        Ok(())
    }
}
