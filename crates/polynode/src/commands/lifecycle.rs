use log::warn;
use polynode_core::{ActiveTracker, PolynodeConfig, RepositoryScanner, Uninstaller, VersionSwitcher};
use polynode_model::{ActivateOptions, SlotState, Version};

use crate::error::Result;

pub fn use_version(config: &PolynodeConfig, request: &str, force: bool) -> Result<()> {
    let version = Version::parse_user_input(request)?;
    let outcome =
        VersionSwitcher::new(&config.layout).activate(version, ActivateOptions { force })?;

    if let Some(previous) = outcome.previous {
        println!("Moved {previous} back to the repository");
    }
    if outcome.discarded_unmarked {
        println!("Replaced the unmarked runtime in {}", config.layout.current.display());
    }
    println!("Now using node {}", outcome.activated);
    Ok(())
}

pub fn uninstall(config: &PolynodeConfig, request: &str) -> Result<()> {
    let version = Version::parse_user_input(request)?;
    let outcome = Uninstaller::new(&config.layout).uninstall(version)?;

    println!("Uninstalled {}", outcome.version);
    if outcome.cleared_active {
        println!("It was the active version; run `polynode use <version>` to pick another");
    }
    Ok(())
}

/// One line per installed version, the active one flagged with `*`.
pub(crate) fn render_list(installed: &[Version], active: Option<Version>) -> Vec<String> {
    installed
        .iter()
        .map(|version| {
            if Some(*version) == active {
                format!("* {version} (active)")
            } else {
                format!("  {version}")
            }
        })
        .collect()
}

pub fn list(config: &PolynodeConfig) -> Result<()> {
    let report = RepositoryScanner::new(&config.layout).scan()?;
    let tracker = ActiveTracker::new(&config.layout);

    if report.installed.is_empty() {
        println!("No versions installed in {}", config.layout.repository.display());
    }
    for line in render_list(&report.installed, tracker.active_version()) {
        println!("{line}");
    }
    for skipped in &report.skipped {
        println!("  ? {} ({})", skipped.dir_name, skipped.error);
    }
    if tracker.slot_state() == SlotState::Unmarked {
        warn!("The active slot holds a runtime polynode did not install");
    }
    Ok(())
}

pub fn version(config: &PolynodeConfig) -> Result<()> {
    let tracker = ActiveTracker::new(&config.layout);

    match tracker.slot_state() {
        SlotState::Marked(marker) => println!("{marker}"),
        SlotState::Unmarked => match tracker.probe_runtime_version(&config.platform) {
            Some(reported) => println!("{reported} (unmarked, reported by the runtime)"),
            None => println!("Unknown version in {}", config.layout.current.display()),
        },
        SlotState::Empty => println!("No active version"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use polynode_model::Version;

    use super::render_list;

    #[test]
    fn render_list_flags_active_version() {
        let installed = [Version::new(16, 0, 0), Version::new(18, 2, 1)];

        let lines = render_list(&installed, Some(Version::new(18, 2, 1)));

        assert_eq!(lines, vec!["  16.0.0", "* 18.2.1 (active)"]);
    }

    #[test]
    fn render_list_without_active_version() {
        let lines = render_list(&[Version::new(20, 1, 0)], None);

        assert_eq!(lines, vec!["  20.1.0"]);
    }
}
