//! Activation of an installed version.
//!
//! The active slot is always regenerable from the repository: activation
//! copies the target's directory and leaves the repository copy in place.
//! The version that was active before is renamed back into the repository,
//! since at that point it is already fully materialized.
//!
//! The copy is made into a staging directory next to the active slot and then
//! renamed over it, so an interrupted copy never shows up as a valid active
//! slot. A leftover staging directory is removed by the next activation.
//!
//! There is no locking. Two processes switching at the same time can race on
//! the active slot.
//!
//! TODO: hard-link files into the staging directory instead of copying them
//! when the repository and the active slot share a volume.

use std::path::Path;

use log::{debug, info, warn};
use polynode_model::{
    ActivateOptions, LifecycleError, SlotState, SwitchOutcome, SwitchStep, Version,
};
use polynode_platform::InstallLayout;

use crate::active::ActiveTracker;
use crate::fs_ops::{copy_dir_recursive, remove_path_if_exists};
use crate::repository::RepositoryScanner;

pub struct VersionSwitcher<'a> {
    layout: &'a InstallLayout,
}

/// How the current active slot will be dealt with.
enum Rotation {
    Nothing,
    Archive(Version),
    Discard,
}

impl<'a> VersionSwitcher<'a> {
    #[must_use]
    pub fn new(layout: &'a InstallLayout) -> Self {
        Self { layout }
    }

    /// Make `target` the active version.
    ///
    /// # Errors
    /// - [`LifecycleError::NotInstalled`] if `target` has no repository
    ///   directory.
    /// - [`LifecycleError::AlreadyActive`] if `target` is already active.
    /// - [`LifecycleError::UnmarkedActiveSlot`] if the slot has no usable
    ///   marker and `options.force` is not set.
    /// - [`LifecycleError::SwitchFailed`] if a filesystem step fails; the
    ///   tool may then be left with no active version.
    ///
    /// The first three leave the filesystem untouched.
    pub fn activate(
        &self,
        target: Version,
        options: ActivateOptions,
    ) -> Result<SwitchOutcome, LifecycleError> {
        let scanner = RepositoryScanner::new(self.layout);
        let source = scanner.version_dir(&target);
        if !source.is_dir() {
            return Err(LifecycleError::NotInstalled { version: target });
        }

        let rotation = self.plan_rotation(target, options)?;

        info!("Activating {target}");
        let outcome = match rotation {
            Rotation::Archive(previous) => {
                self.archive_previous(target, previous)?;
                SwitchOutcome {
                    activated: target,
                    previous: Some(previous),
                    archived: true,
                    discarded_unmarked: false,
                }
            }
            Rotation::Discard => {
                warn!(
                    "Discarding unmarked active slot {}",
                    self.layout.current.display()
                );
                SwitchOutcome {
                    activated: target,
                    previous: None,
                    archived: false,
                    discarded_unmarked: true,
                }
            }
            Rotation::Nothing => SwitchOutcome {
                activated: target,
                previous: None,
                archived: false,
                discarded_unmarked: false,
            },
        };

        self.clear_slot(target)?;
        self.install_slot(target, &source)?;

        info!("Version {target} is now active");
        Ok(outcome)
    }

    fn plan_rotation(
        &self,
        target: Version,
        options: ActivateOptions,
    ) -> Result<Rotation, LifecycleError> {
        let tracker = ActiveTracker::new(self.layout);
        let unmarked = || {
            if options.force {
                Ok(Rotation::Discard)
            } else {
                Err(LifecycleError::UnmarkedActiveSlot {
                    path: self.layout.current.display().to_string(),
                })
            }
        };

        match tracker.slot_state() {
            SlotState::Empty => Ok(Rotation::Nothing),
            SlotState::Unmarked => unmarked(),
            SlotState::Marked(marker) => match marker.parse::<Version>() {
                Ok(previous) if previous == target => {
                    Err(LifecycleError::AlreadyActive { version: target })
                }
                Ok(previous) => Ok(Rotation::Archive(previous)),
                Err(error) => {
                    warn!("Active slot marker cannot be archived: {error}");
                    unmarked()
                }
            },
        }
    }

    fn archive_previous(&self, target: Version, previous: Version) -> Result<(), LifecycleError> {
        let archived = self.layout.version_dir(&previous);
        let fail = |source| LifecycleError::switch_failed(target, SwitchStep::Archive, source);

        if remove_path_if_exists(&archived).map_err(fail)? {
            debug!("Removed stale {}", archived.display());
        }
        std::fs::create_dir_all(&self.layout.repository).map_err(fail)?;
        std::fs::rename(&self.layout.current, &archived).map_err(fail)?;

        info!("Archived {previous} to {}", archived.display());
        Ok(())
    }

    fn clear_slot(&self, target: Version) -> Result<(), LifecycleError> {
        if remove_path_if_exists(&self.layout.current)
            .map_err(|source| LifecycleError::switch_failed(target, SwitchStep::Clear, source))?
        {
            debug!("Cleared {}", self.layout.current.display());
        }
        Ok(())
    }

    fn install_slot(&self, target: Version, source: &Path) -> Result<(), LifecycleError> {
        let staging = self.layout.staging_dir();

        let result = (|| {
            if remove_path_if_exists(&staging)? {
                warn!("Removed leftover staging directory {}", staging.display());
            }
            debug!("Copying {} to {}", source.display(), staging.display());
            copy_dir_recursive(source, &staging)?;
            std::fs::write(
                staging.join(self.layout.marker_file_name()),
                target.to_string(),
            )?;
            std::fs::rename(&staging, &self.layout.current)
        })();

        result.map_err(|source| {
            if let Err(error) = remove_path_if_exists(&staging) {
                warn!("Could not remove staging directory: {error}");
            }
            LifecycleError::switch_failed(target, SwitchStep::Install, source)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polynode_model::{ActivateOptions, LifecycleError, Version};
    use polynode_platform::InstallLayout;

    use super::VersionSwitcher;
    use crate::active::ActiveTracker;

    fn install(layout: &InstallLayout, version: &str) {
        let dir = layout.version_dir(&version);
        std::fs::create_dir_all(dir.join("bin")).expect("version dir");
        std::fs::write(dir.join("bin/node"), format!("node {version}")).expect("binary");
        std::fs::write(dir.join("version.info"), version).expect("marker");
    }

    fn layout(root: &Path) -> InstallLayout {
        InstallLayout::new(root.to_path_buf(), "linux-x64")
    }

    #[test]
    fn activate_writes_marker_even_if_source_lacks_one() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        let dir = layout.version_dir(&"16.0.0");
        std::fs::create_dir_all(&dir).expect("version dir");

        VersionSwitcher::new(&layout)
            .activate(Version::new(16, 0, 0), ActivateOptions::default())
            .expect("activation should succeed");

        assert_eq!(
            ActiveTracker::new(&layout).get_active().as_deref(),
            Some("16.0.0")
        );
        assert!(!dir.join("version.info").exists(), "source is not modified");
    }

    #[test]
    fn leftover_staging_directory_is_replaced() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        install(&layout, "18.2.1");
        let staging = layout.staging_dir();
        std::fs::create_dir_all(staging.join("half-copied")).expect("stale staging");

        VersionSwitcher::new(&layout)
            .activate(Version::new(18, 2, 1), ActivateOptions::default())
            .expect("activation should succeed");

        assert!(!staging.exists());
        assert!(!layout.current.join("half-copied").exists());
        assert!(layout.current.join("bin/node").is_file());
    }

    #[test]
    fn unparseable_marker_is_treated_as_unmarked() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        install(&layout, "18.2.1");
        std::fs::create_dir_all(&layout.current).expect("slot");
        std::fs::write(layout.marker_file(), "garbage").expect("marker");
        let switcher = VersionSwitcher::new(&layout);

        let refused = switcher.activate(Version::new(18, 2, 1), ActivateOptions::default());
        assert!(matches!(
            refused,
            Err(LifecycleError::UnmarkedActiveSlot { .. })
        ));

        let outcome = switcher
            .activate(Version::new(18, 2, 1), ActivateOptions { force: true })
            .expect("forced activation should succeed");
        assert!(outcome.discarded_unmarked);
        assert_eq!(outcome.previous, None);
    }

    #[test]
    fn activation_over_a_plain_file_slot_requires_force() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        install(&layout, "18.2.1");
        std::fs::write(&layout.current, "not a directory").expect("file slot");
        let switcher = VersionSwitcher::new(&layout);

        assert!(
            switcher
                .activate(Version::new(18, 2, 1), ActivateOptions::default())
                .is_err()
        );

        switcher
            .activate(Version::new(18, 2, 1), ActivateOptions { force: true })
            .expect("forced activation should replace the file");
        assert!(layout.current.is_dir());
    }
}
