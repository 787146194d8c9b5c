mod commands;
mod layout;
mod platform;

pub use commands::{HideWindow, version_output};
pub use layout::{InstallLayout, LayoutError, ROOT_ENV};
pub use platform::Platform;
