//! Version lifecycle for polynode.
//!
//! This crate owns everything that touches the install root:
//! - Enumerating installed versions in the repository.
//! - Reading and switching the active slot.
//! - Uninstalling versions.
//! - Downloading and unpacking releases, resolving aliases through the
//!   release index, and reading the persisted `proxy.json`.
//! - Zip backups of the install root.

mod active;
mod archive;
mod config;
mod fs_ops;
mod install;
mod proxy;
mod releases;
mod repository;
mod switcher;
mod uninstall;

pub use active::ActiveTracker;
pub use archive::{ArchiveError, backup_timestamp, create_backup, extract_zip};
pub use config::{DEFAULT_NODE_DIST_MIRROR, MIRROR_ENV, PolynodeConfig};
pub use install::HttpInstaller;
pub use proxy::{ProxyConfig, ProxyConfigError};
pub use releases::{Lts, Release, ReleaseIndex, is_alias};
pub use repository::RepositoryScanner;
pub use switcher::VersionSwitcher;
pub use uninstall::Uninstaller;
