use log::{debug, warn};
use polynode_model::{SlotState, Version};
use polynode_platform::{InstallLayout, Platform, version_output};

/// Reads which version occupies the active slot. Never writes.
pub struct ActiveTracker<'a> {
    layout: &'a InstallLayout,
}

impl<'a> ActiveTracker<'a> {
    #[must_use]
    pub fn new(layout: &'a InstallLayout) -> Self {
        Self { layout }
    }

    /// Inspect the active slot and its marker.
    ///
    /// A slot whose marker is missing, unreadable or blank is
    /// [`SlotState::Unmarked`], not an error.
    #[must_use]
    pub fn slot_state(&self) -> SlotState {
        if std::fs::symlink_metadata(&self.layout.current).is_err() {
            return SlotState::Empty;
        }

        let marker_path = self.layout.marker_file();
        match std::fs::read_to_string(&marker_path) {
            Ok(contents) => {
                let marker = contents.trim();
                if marker.is_empty() {
                    debug!("Marker {} is empty", marker_path.display());
                    SlotState::Unmarked
                } else {
                    SlotState::Marked(marker.to_string())
                }
            }
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read {}: {error}", marker_path.display());
                }
                SlotState::Unmarked
            }
        }
    }

    /// The trimmed marker text, or `None` when no version is known to be
    /// active.
    #[must_use]
    pub fn get_active(&self) -> Option<String> {
        match self.slot_state() {
            SlotState::Marked(marker) => Some(marker),
            SlotState::Empty | SlotState::Unmarked => None,
        }
    }

    /// The active version, if the marker holds a well-formed version.
    #[must_use]
    pub fn active_version(&self) -> Option<Version> {
        let marker = self.get_active()?;
        match marker.parse() {
            Ok(version) => Some(version),
            Err(error) => {
                warn!("Active slot marker is not a version: {error}");
                None
            }
        }
    }

    #[must_use]
    pub fn is_active(&self, candidate: &Version) -> bool {
        self.active_version().as_ref() == Some(candidate)
    }

    /// Ask the runtime in the active slot for its version. Only used for
    /// display when the slot has no marker.
    #[must_use]
    pub fn probe_runtime_version(&self, platform: &Platform) -> Option<String> {
        if !self.layout.current.is_dir() {
            return None;
        }
        version_output(&platform.runtime_executable(&self.layout.current))
    }
}
