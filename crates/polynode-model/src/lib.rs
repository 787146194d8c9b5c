mod error;
mod traits;
mod types;

pub use error::{InstallError, LifecycleError, SwitchStep};
pub use traits::Installer;
pub use types::{
    ActivateOptions, InstallPhase, InstallProgress, ScanReport, SkippedEntry, SlotState,
    SwitchOutcome, UninstallOutcome, Version, VersionComponent, VersionParseError,
};
