use std::process::ExitCode;

use polynode_core::{ArchiveError, ProxyConfigError};
use polynode_model::{InstallError, LifecycleError, VersionParseError};
use polynode_platform::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Every failure a command can report, grouped by origin.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Version(#[from] VersionParseError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    ProxyConfig(#[from] ProxyConfigError),
    #[error("No version is active; run `polynode use <version>` first")]
    NoActiveVersion,
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable process status per error category.
    #[must_use]
    pub fn status(&self) -> u8 {
        match self {
            Self::Version(_)
            | Self::Install(InstallError::Parse(_) | InstallError::UnknownAlias { .. }) => 2,
            Self::Lifecycle(LifecycleError::NotInstalled { .. }) => 10,
            Self::Lifecycle(LifecycleError::AlreadyActive { .. }) => 11,
            Self::Lifecycle(LifecycleError::UnmarkedActiveSlot { .. }) => 12,
            Self::Lifecycle(LifecycleError::SwitchFailed { .. }) => 13,
            Self::Install(InstallError::AlreadyInstalled { .. }) => 14,
            Self::NoActiveVersion => 15,
            Self::Layout(_) => 20,
            Self::ProxyConfig(_) | Self::Install(InstallError::Proxy { .. }) => 21,
            Self::Install(InstallError::Download { .. }) => 30,
            Self::Install(InstallError::Extract { .. }) | Self::Archive(_) => 31,
            Self::Lifecycle(LifecycleError::Io { .. })
            | Self::Install(InstallError::Io { .. })
            | Self::Io { .. } => 40,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}
