use log::{info, warn};
use polynode_model::{LifecycleError, UninstallOutcome, Version};
use polynode_platform::InstallLayout;

use crate::active::ActiveTracker;
use crate::fs_ops::remove_path_if_exists;

pub struct Uninstaller<'a> {
    layout: &'a InstallLayout,
}

impl<'a> Uninstaller<'a> {
    #[must_use]
    pub fn new(layout: &'a InstallLayout) -> Self {
        Self { layout }
    }

    /// Remove `version` from the repository. When it is also the active
    /// version the active slot is removed with it.
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotInstalled`] when the version directory
    /// does not exist, or an IO error when removal fails.
    pub fn uninstall(&self, version: Version) -> Result<UninstallOutcome, LifecycleError> {
        let dir = self.layout.version_dir(&version);
        if !dir.is_dir() {
            return Err(LifecycleError::NotInstalled { version });
        }

        let was_active = ActiveTracker::new(self.layout).is_active(&version);

        std::fs::remove_dir_all(&dir).map_err(|error| {
            LifecycleError::io(format!("failed to remove {}", dir.display()), error)
        })?;
        info!("Removed {}", dir.display());

        if was_active {
            warn!("Uninstalled the active version {version}; no version is active now");
            remove_path_if_exists(&self.layout.current).map_err(|error| {
                LifecycleError::io("failed to clear the active slot", error)
            })?;
        }

        Ok(UninstallOutcome {
            version,
            cleared_active: was_active,
        })
    }
}
