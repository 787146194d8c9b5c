use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A `major.minor.patch` runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version typed by a user, tolerating surrounding whitespace and
    /// a single leading `v` (`v20.11.0`).
    ///
    /// # Errors
    /// Returns the same errors as [`Version::from_str`] once the prefix is
    /// removed.
    pub fn parse_user_input(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        trimmed.strip_prefix('v').unwrap_or(trimmed).parse()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Expected X.Y.Z format, got: {input:?}")]
    InvalidFormat { input: String },
    #[error("Invalid {component} version {value:?} in {input:?}")]
    InvalidComponent {
        component: VersionComponent,
        value: String,
        input: String,
    },
}

impl VersionParseError {
    /// The text that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidFormat { input } | Self::InvalidComponent { input, .. } => input,
        }
    }
}

fn parse_component(
    value: &str,
    component: VersionComponent,
    input: &str,
) -> Result<u32, VersionParseError> {
    // `u32::from_str` accepts a leading `+`, so digits are checked first.
    // Leading zeros are rejected so every version has exactly one spelling.
    let canonical = value.len() == 1 || !value.starts_with('0');
    if value.is_empty() || !canonical || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidComponent {
            component,
            value: value.to_string(),
            input: input.to_string(),
        });
    }

    value
        .parse()
        .map_err(|_| VersionParseError::InvalidComponent {
            component,
            value: value.to_string(),
            input: input.to_string(),
        })
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid_format = || VersionParseError::InvalidFormat {
            input: s.to_string(),
        };

        let mut parts = s.split('.');
        let major_str = parts.next().ok_or_else(invalid_format)?;
        let minor_str = parts.next().ok_or_else(invalid_format)?;
        let patch_str = parts.next().ok_or_else(invalid_format)?;
        if parts.next().is_some() {
            return Err(invalid_format());
        }

        Ok(Version::new(
            parse_component(major_str, VersionComponent::Major, s)?,
            parse_component(minor_str, VersionComponent::Minor, s)?,
            parse_component(patch_str, VersionComponent::Patch, s)?,
        ))
    }
}

/// A repository entry whose name looked like an installed version but whose
/// version text did not parse.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub dir_name: String,
    pub error: VersionParseError,
}

/// Result of scanning the repository directory.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Installed versions, strictly ascending.
    pub installed: Vec<Version>,
    pub skipped: Vec<SkippedEntry>,
}

/// What the active slot currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Marked(String),
    /// The slot exists but carries no readable marker, for example a
    /// hand-installed runtime.
    Unmarked,
}

impl SlotState {
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        match self {
            Self::Marked(marker) => Some(marker),
            Self::Empty | Self::Unmarked => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivateOptions {
    /// Overwrite an active slot that has no marker instead of refusing.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub activated: Version,
    pub previous: Option<Version>,
    /// The previous slot was renamed back into the repository.
    pub archived: bool,
    /// An unmarked slot was removed because `force` was set.
    pub discarded_unmarked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub version: Version,
    /// The removed version was active, so the active slot was deleted too.
    pub cleared_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Resolving,
    Downloading,
    Extracting,
    Finalizing,
}

#[derive(Debug, Clone)]
pub enum InstallProgress {
    Phase(InstallPhase),
    Downloaded { downloaded: u64, total: u64 },
    Complete { version: Version, path: PathBuf },
}
