use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use polynode_platform::InstallLayout;
use thiserror::Error;

const BACKUP_ROOT: &str = "polynode";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Zip {
        context: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ArchiveError {
    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::Io {
            context,
            source: std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        }
    }

    fn zip(context: &'static str, source: zip::result::ZipError) -> Self {
        Self::Zip { context, source }
    }
}

/// Unpack `zip_path` into `dest`. Entries whose paths would escape `dest`
/// are skipped.
///
/// # Errors
/// Returns an error when the archive cannot be read or a file cannot be
/// written.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = std::fs::File::open(zip_path)
        .map_err(|error| ArchiveError::io_with_path("failed to open zip file", zip_path, &error))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|error| ArchiveError::zip("failed to read zip archive", error))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| ArchiveError::zip("failed to read zip entry", error))?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path {:?}", entry.name());
            continue;
        };
        let out_path = dest.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|error| {
                ArchiveError::io_with_path("failed to create directory", &out_path, &error)
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                ArchiveError::io_with_path("failed to create parent directory", parent, &error)
            })?;
        }
        let mut outfile = std::fs::File::create(&out_path).map_err(|error| {
            ArchiveError::io_with_path("failed to create extracted file", &out_path, &error)
        })?;
        std::io::copy(&mut entry, &mut outfile).map_err(|error| {
            ArchiveError::io_with_path("failed to extract archive entry", &out_path, &error)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
            }
        }
    }

    debug!("Extracted {} to {}", zip_path.display(), dest.display());
    Ok(())
}

/// Timestamp used in backup file names, for example `20240131T174502`.
#[must_use]
pub fn backup_timestamp() -> String {
    chrono::Local::now().format("%Y%m%dT%H%M%S").to_string()
}

/// Zip every regular file of the active slot and the repository into
/// `<root>/<timestamp>-polynode.zip`, under a top-level `polynode/` folder.
/// Missing directories are skipped; symlinks are not followed.
///
/// # Errors
/// Returns an error when a file cannot be read or the archive cannot be
/// written. A partially written archive is removed.
pub fn create_backup(layout: &InstallLayout, timestamp: &str) -> Result<PathBuf, ArchiveError> {
    let backup_path = layout.backup_file(timestamp);

    let result = write_backup(layout, &backup_path);
    if result.is_err() {
        let _ = std::fs::remove_file(&backup_path);
    }
    let count = result?;

    info!("Backed up {count} files to {}", backup_path.display());
    Ok(backup_path)
}

fn write_backup(layout: &InstallLayout, backup_path: &Path) -> Result<usize, ArchiveError> {
    let file = std::fs::File::create(backup_path).map_err(|error| {
        ArchiveError::io_with_path("failed to create backup file", backup_path, &error)
    })?;
    let mut writer = zip::ZipWriter::new(file);

    let mut count = 0;
    for dir in [&layout.current, &layout.repository] {
        if !dir.is_dir() {
            debug!("Nothing to back up in {}", dir.display());
            continue;
        }
        count += add_tree(&mut writer, &layout.root, dir)?;
    }

    writer
        .finish()
        .map_err(|error| ArchiveError::zip("failed to finalize backup", error))?;
    Ok(count)
}

fn add_tree(
    writer: &mut zip::ZipWriter<std::fs::File>,
    root: &Path,
    dir: &Path,
) -> Result<usize, ArchiveError> {
    let mut count = 0;
    let entries = std::fs::read_dir(dir)
        .map_err(|error| ArchiveError::io_with_path("failed to read directory", dir, &error))?;

    for entry in entries {
        let entry = entry
            .map_err(|error| ArchiveError::io_with_path("failed to read directory", dir, &error))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|error| ArchiveError::io_with_path("failed to inspect", &path, &error))?;

        if file_type.is_dir() {
            count += add_tree(writer, root, &path)?;
        } else if file_type.is_file() {
            add_file(writer, root, &path)?;
            count += 1;
        }
    }
    Ok(count)
}

fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut name = String::from(BACKUP_ROOT);
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

fn add_file(
    writer: &mut zip::ZipWriter<std::fs::File>,
    root: &Path,
    path: &Path,
) -> Result<(), ArchiveError> {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => options.unix_permissions(metadata.permissions().mode()),
            Err(_) => options,
        }
    };

    writer
        .start_file(entry_name(root, path), options)
        .map_err(|error| ArchiveError::zip("failed to add backup entry", error))?;
    let content = std::fs::read(path)
        .map_err(|error| ArchiveError::io_with_path("failed to read file", path, &error))?;
    writer
        .write_all(&content)
        .map_err(|error| ArchiveError::io_with_path("failed to write backup entry", path, &error))
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Write as _};
    use std::path::Path;

    use polynode_platform::InstallLayout;

    use super::{backup_timestamp, create_backup, extract_zip};

    #[test]
    fn extract_zip_expands_files_and_directories() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let zip_path = temp.path().join("node.zip");
        let extract_dir = temp.path().join("extract");

        let zip_file = std::fs::File::create(&zip_path).expect("zip file should be created");
        let mut writer = zip::ZipWriter::new(zip_file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        writer
            .add_directory("node-v20.1.0-linux-x64/bin/", options)
            .expect("directory entry should be written");
        writer
            .start_file("node-v20.1.0-linux-x64/bin/node", options)
            .expect("file entry should be started");
        writer.write_all(b"runtime").expect("file entry should be written");
        writer.finish().expect("zip archive should be finalized");

        extract_zip(&zip_path, &extract_dir).expect("zip should extract");

        let extracted = std::fs::read(extract_dir.join("node-v20.1.0-linux-x64/bin/node"))
            .expect("extracted file should exist");
        assert_eq!(extracted, b"runtime");
    }

    #[test]
    fn extract_zip_skips_unsafe_paths() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let zip_path = temp.path().join("unsafe.zip");
        let extract_dir = temp.path().join("extract");

        let zip_file = std::fs::File::create(&zip_path).expect("zip file should be created");
        let mut writer = zip::ZipWriter::new(zip_file);
        let options = zip::write::SimpleFileOptions::default();
        writer
            .start_file("../escaped.txt", options)
            .expect("unsafe file entry should be started");
        writer.write_all(b"nope").expect("entry should be written");
        writer.finish().expect("zip archive should be finalized");

        extract_zip(&zip_path, &extract_dir).expect("extraction should not fail");

        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn extract_zip_rejects_non_zip_input() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let bogus = temp.path().join("bogus.zip");
        std::fs::write(&bogus, "<html>not found</html>").expect("file should be written");

        assert!(extract_zip(&bogus, &temp.path().join("out")).is_err());
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).expect("backup should exist");
        let mut archive = zip::ZipArchive::new(file).expect("backup should be a zip");
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn backup_contains_slot_and_repository_files() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = InstallLayout::new(temp.path().to_path_buf(), "linux-x64");
        let version_dir = layout.version_dir(&"18.2.1");
        std::fs::create_dir_all(version_dir.join("bin")).expect("version dir");
        std::fs::write(version_dir.join("bin/node"), "node").expect("binary");
        std::fs::create_dir_all(&layout.current).expect("slot");
        std::fs::write(layout.marker_file(), "18.2.1").expect("marker");
        std::fs::write(layout.proxy_file(), "{}").expect("proxy file outside backup scope");

        let backup = create_backup(&layout, "20240131T174502").expect("backup should succeed");

        assert_eq!(backup, temp.path().join("20240131T174502-polynode.zip"));
        assert_eq!(
            entry_names(&backup),
            vec![
                "polynode/current/version.info".to_string(),
                "polynode/repository/node-v18.2.1-linux-x64/bin/node".to_string(),
            ]
        );

        let file = std::fs::File::open(&backup).expect("backup should exist");
        let mut archive = zip::ZipArchive::new(file).expect("backup should be a zip");
        let mut marker = String::new();
        archive
            .by_name("polynode/current/version.info")
            .expect("marker entry")
            .read_to_string(&mut marker)
            .expect("marker should be readable");
        assert_eq!(marker, "18.2.1");
    }

    #[test]
    fn backup_of_empty_root_is_an_empty_zip() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let layout = InstallLayout::new(temp.path().to_path_buf(), "linux-x64");

        let backup = create_backup(&layout, "20240101T000000").expect("backup should succeed");

        assert!(entry_names(&backup).is_empty());
    }

    #[test]
    fn backup_timestamp_is_compact() {
        let stamp = backup_timestamp();

        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'T');
        assert!(
            stamp
                .chars()
                .enumerate()
                .all(|(i, c)| i == 8 || c.is_ascii_digit())
        );
    }
}
