use std::path::PathBuf;

use log::{debug, warn};
use polynode_model::{LifecycleError, ScanReport, SkippedEntry, Version};
use polynode_platform::InstallLayout;

/// Read-only view of the installed version directories.
pub struct RepositoryScanner<'a> {
    layout: &'a InstallLayout,
}

impl<'a> RepositoryScanner<'a> {
    #[must_use]
    pub fn new(layout: &'a InstallLayout) -> Self {
        Self { layout }
    }

    /// Enumerate the repository.
    ///
    /// Entries that are not directories, the reserved active slot name, and
    /// names outside the `node-v<version>-<dist>` convention are ignored.
    /// Names that match the convention but carry an unparseable version are
    /// reported in [`ScanReport::skipped`] and logged, never fatal.
    ///
    /// # Errors
    /// Returns an error when the repository exists but cannot be read. A
    /// missing repository is an empty one.
    pub fn scan(&self) -> Result<ScanReport, LifecycleError> {
        let repository = &self.layout.repository;
        let entries = match std::fs::read_dir(repository) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("Repository {} does not exist yet", repository.display());
                return Ok(ScanReport::default());
            }
            Err(error) => {
                return Err(LifecycleError::io(
                    format!("failed to read repository {}", repository.display()),
                    error,
                ));
            }
        };

        let mut report = ScanReport::default();
        for entry in entries {
            let entry = entry.map_err(|error| {
                LifecycleError::io(
                    format!("failed to read entry in {}", repository.display()),
                    error,
                )
            })?;

            if !entry.path().is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                debug!("Ignoring non UTF-8 repository entry {file_name:?}");
                continue;
            };

            if name == self.layout.current_dir_name() {
                continue;
            }

            let Some(raw) = self.layout.version_from_dir_name(name) else {
                debug!("Ignoring repository entry {name}");
                continue;
            };

            match raw.parse::<Version>() {
                Ok(version) => report.installed.push(version),
                Err(error) => {
                    warn!("Skipping repository entry {name}: {error}");
                    report.skipped.push(SkippedEntry {
                        dir_name: name.to_string(),
                        error,
                    });
                }
            }
        }

        report.installed.sort();
        report.skipped.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
        Ok(report)
    }

    /// Installed versions in ascending order.
    ///
    /// # Errors
    /// See [`RepositoryScanner::scan`].
    pub fn list_installed(&self) -> Result<Vec<Version>, LifecycleError> {
        Ok(self.scan()?.installed)
    }

    #[must_use]
    pub fn version_dir(&self, version: &Version) -> PathBuf {
        self.layout.version_dir(version)
    }

    #[must_use]
    pub fn is_installed(&self, version: &Version) -> bool {
        self.version_dir(version).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use polynode_model::{Version, VersionParseError};
    use polynode_platform::InstallLayout;

    use super::RepositoryScanner;

    fn layout(root: &Path) -> InstallLayout {
        InstallLayout::new(root.to_path_buf(), "win-x64")
    }

    fn mkdir(layout: &InstallLayout, name: &str) {
        std::fs::create_dir_all(layout.repository.join(name)).expect("repository dir");
    }

    #[test]
    fn scan_of_missing_repository_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());

        let report = RepositoryScanner::new(&layout)
            .scan()
            .expect("missing repository is not an error");

        assert!(report.installed.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn list_installed_sorts_numerically() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        for name in [
            "node-v1.10.0-win-x64",
            "node-v1.2.3-win-x64",
            "node-v20.1.0-win-x64",
            "node-v1.2.10-win-x64",
        ] {
            mkdir(&layout, name);
        }

        let installed = RepositoryScanner::new(&layout)
            .list_installed()
            .expect("scan should succeed");

        let rendered: Vec<String> = installed.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["1.2.3", "1.2.10", "1.10.0", "20.1.0"]);
    }

    #[test]
    fn scan_excludes_reserved_and_foreign_entries() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        mkdir(&layout, "current");
        mkdir(&layout, "node-v18.2.1-win-x64");
        mkdir(&layout, "node-v16.0.0-linux-x64");
        mkdir(&layout, "downloads");
        mkdir(&layout, ".extract-abc");
        std::fs::write(layout.repository.join("node-v20.1.0-win-x64"), "not a dir")
            .expect("plain file should be written");
        std::fs::write(layout.repository.join("node-v20.1.0-win-x64.zip"), "zip")
            .expect("archive should be written");

        let report = RepositoryScanner::new(&layout)
            .scan()
            .expect("scan should succeed");

        assert_eq!(report.installed, vec![Version::new(18, 2, 1)]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn scan_skips_and_reports_unparseable_versions() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        mkdir(&layout, "node-v18.2.1-win-x64");
        mkdir(&layout, "node-v18.x.1-win-x64");
        mkdir(&layout, "node-v18.2-win-x64");

        let report = RepositoryScanner::new(&layout)
            .scan()
            .expect("bad names must not abort the scan");

        assert_eq!(report.installed, vec![Version::new(18, 2, 1)]);
        let skipped: Vec<&str> = report
            .skipped
            .iter()
            .map(|entry| entry.dir_name.as_str())
            .collect();
        assert_eq!(skipped, vec!["node-v18.2-win-x64", "node-v18.x.1-win-x64"]);
        assert!(matches!(
            report.skipped[0].error,
            VersionParseError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn is_installed_checks_version_directory() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = layout(temp.path());
        mkdir(&layout, "node-v18.2.1-win-x64");
        let scanner = RepositoryScanner::new(&layout);

        assert!(scanner.is_installed(&Version::new(18, 2, 1)));
        assert!(!scanner.is_installed(&Version::new(9, 9, 9)));
    }
}
