use std::io;
use std::path::Path;

fn with_path(path: &Path, error: &io::Error) -> io::Error {
    io::Error::new(error.kind(), format!("{}: {error}", path.display()))
}

/// Remove a file or directory tree if it exists. Symlinks are removed, not
/// followed.
pub(crate) fn remove_path_if_exists(path: &Path) -> io::Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(with_path(path, &error)),
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|error| with_path(path, &error))?;
    Ok(true)
}

/// Recursively duplicate `src` into `dest`, creating `dest`.
pub(crate) fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dest).map_err(|error| with_path(dest, &error))?;

    for entry in std::fs::read_dir(src).map_err(|error| with_path(src, &error))? {
        let entry = entry.map_err(|error| with_path(src, &error))?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|error| with_path(&src_path, &error))?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path).map_err(|error| {
                io::Error::new(
                    error.kind(),
                    format!("{} -> {}: {error}", src_path.display(), dest_path.display()),
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    // Distributions link bin/npm into lib/; the relative link must survive.
    let target = std::fs::read_link(src).map_err(|error| with_path(src, &error))?;
    std::os::unix::fs::symlink(&target, dest).map_err(|error| with_path(dest, &error))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    if src.is_dir() {
        copy_dir_recursive(src, dest)
    } else {
        std::fs::copy(src, dest)
            .map(|_| ())
            .map_err(|error| with_path(src, &error))
    }
}

#[cfg(test)]
mod tests {
    use super::{copy_dir_recursive, remove_path_if_exists};

    #[test]
    fn copy_dir_recursive_duplicates_nested_tree() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("bin/deep")).expect("source tree should be created");
        std::fs::write(src.join("version.info"), "18.2.1").expect("marker should be written");
        std::fs::write(src.join("bin/deep/node"), "binary").expect("file should be written");

        let dest = temp.path().join("dest");
        copy_dir_recursive(&src, &dest).expect("copy should succeed");

        assert_eq!(
            std::fs::read_to_string(dest.join("bin/deep/node")).expect("copied file"),
            "binary"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("version.info")).expect("copied marker"),
            "18.2.1"
        );
        assert!(src.join("bin/deep/node").is_file(), "source must be untouched");
    }

    #[cfg(unix)]
    #[test]
    fn copy_dir_recursive_preserves_relative_symlinks() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("lib")).expect("lib dir");
        std::fs::create_dir_all(src.join("bin")).expect("bin dir");
        std::fs::write(src.join("lib/cli.js"), "cli").expect("target file");
        std::os::unix::fs::symlink("../lib/cli.js", src.join("bin/npm")).expect("symlink");

        let dest = temp.path().join("dest");
        copy_dir_recursive(&src, &dest).expect("copy should succeed");

        let link = std::fs::read_link(dest.join("bin/npm")).expect("copied entry is a link");
        assert_eq!(link, std::path::Path::new("../lib/cli.js"));
        assert_eq!(
            std::fs::read_to_string(dest.join("bin/npm")).expect("link resolves in copy"),
            "cli"
        );
    }

    #[test]
    fn remove_path_if_exists_handles_files_dirs_and_missing() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let dir = temp.path().join("dir");
        std::fs::create_dir_all(dir.join("nested")).expect("dir should be created");
        let file = temp.path().join("file");
        std::fs::write(&file, "x").expect("file should be written");

        assert!(remove_path_if_exists(&dir).expect("dir removal"));
        assert!(remove_path_if_exists(&file).expect("file removal"));
        assert!(!remove_path_if_exists(&temp.path().join("missing")).expect("missing is ok"));
        assert!(!dir.exists());
        assert!(!file.exists());
    }
}
