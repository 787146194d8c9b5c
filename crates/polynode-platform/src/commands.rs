use std::path::Path;
use std::process::Command;

use log::debug;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

impl HideWindow for Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }
}

/// Run `<executable> --version` and return its trimmed output without a
/// leading `v`, or `None` if the executable is missing or fails.
#[must_use]
pub fn version_output(executable: &Path) -> Option<String> {
    if !executable.is_file() {
        return None;
    }

    let output = Command::new(executable)
        .arg("--version")
        .hide_window()
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout);
            let text = text.trim();
            let text = text.strip_prefix('v').unwrap_or(text);
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(output) => {
            debug!(
                "{} --version exited with {:?}",
                executable.display(),
                output.status
            );
            None
        }
        Err(error) => {
            debug!("failed to run {} --version: {error}", executable.display());
            None
        }
    }
}
