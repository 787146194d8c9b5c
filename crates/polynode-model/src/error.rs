use thiserror::Error;

use crate::types::{Version, VersionParseError};

/// Errors raised by the version lifecycle: scanning, switching and
/// uninstalling.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Version {version} is not installed")]
    NotInstalled { version: Version },

    #[error("Version {version} is already the active version")]
    AlreadyActive { version: Version },

    #[error(
        "The active slot at {path} has no version marker (possibly installed manually); \
         re-run with --force to overwrite it"
    )]
    UnmarkedActiveSlot { path: String },

    #[error("Switching to {target} failed during {step}: {source}")]
    SwitchFailed {
        target: Version,
        step: SwitchStep,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl LifecycleError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn switch_failed(target: Version, step: SwitchStep, source: std::io::Error) -> Self {
        Self::SwitchFailed {
            target,
            step,
            source,
        }
    }
}

/// The mutating steps of an activation, reported with `SwitchFailed`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStep {
    #[error("archive of the previous version")]
    Archive,
    #[error("clearing the active slot")]
    Clear,
    #[error("copying into the active slot")]
    Install,
}

/// Errors surfaced by an [`Installer`](crate::Installer).
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Parse(#[from] VersionParseError),

    #[error("Unknown version alias {alias:?}; expected X.Y.Z, \"latest\" or \"lts\"")]
    UnknownAlias { alias: String },

    #[error("Version {version} is already installed")]
    AlreadyInstalled { version: Version },

    #[error("Invalid proxy configuration: {details}")]
    Proxy { details: String },

    #[error("Download of {url} failed: {details}")]
    Download { url: String, details: String },

    #[error("Extraction of {archive} failed: {details}")]
    Extract { archive: String, details: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn download(url: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            details: details.to_string(),
        }
    }

    pub fn extract(archive: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Extract {
            archive: archive.into(),
            details: details.to_string(),
        }
    }
}
