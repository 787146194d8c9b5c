use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Operating-system conventions, selected once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Distribution OS name as used in release archive names.
    pub os: &'static str,
    /// Distribution architecture name as used in release archive names.
    pub arch: &'static str,
    /// Separator between `PATH` entries.
    pub path_separator: char,
    pub executable_suffix: &'static str,
    /// Whether the runtime executable sits in a `bin/` subdirectory of a
    /// distribution rather than at its top level.
    pub executables_in_bin: bool,
}

impl Platform {
    #[must_use]
    pub fn current() -> Self {
        let os = if cfg!(target_os = "windows") {
            "win"
        } else if cfg!(target_os = "macos") {
            "darwin"
        } else {
            "linux"
        };

        let arch = if cfg!(target_arch = "aarch64") {
            "arm64"
        } else if cfg!(target_arch = "x86") {
            "x86"
        } else {
            "x64"
        };

        if cfg!(target_os = "windows") {
            Self::windows(arch)
        } else {
            Self {
                os,
                arch,
                path_separator: ':',
                executable_suffix: "",
                executables_in_bin: true,
            }
        }
    }

    #[must_use]
    pub fn windows(arch: &'static str) -> Self {
        Self {
            os: "win",
            arch,
            path_separator: ';',
            executable_suffix: ".exe",
            executables_in_bin: false,
        }
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "win"
    }

    /// Suffix of distribution names, for example `win-x64`.
    #[must_use]
    pub fn dist_suffix(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Install root used when `POLYNODE_PATH` is not set.
    #[must_use]
    pub fn default_root(&self) -> Option<PathBuf> {
        if self.is_windows() {
            Some(PathBuf::from("C:\\polynode"))
        } else {
            dirs::home_dir().map(|home| home.join(".polynode"))
        }
    }

    /// Directory holding the runtime executables inside an installed
    /// distribution.
    #[must_use]
    pub fn runtime_dir(&self, distribution: &Path) -> PathBuf {
        if self.executables_in_bin {
            distribution.join("bin")
        } else {
            distribution.to_path_buf()
        }
    }

    #[must_use]
    pub fn runtime_executable(&self, distribution: &Path) -> PathBuf {
        self.runtime_dir(distribution)
            .join(format!("node{}", self.executable_suffix))
    }

    /// Prepend `dir` to an existing `PATH` value.
    #[must_use]
    pub fn prepend_path(&self, dir: &Path, existing: Option<&OsString>) -> OsString {
        let mut path = dir.as_os_str().to_os_string();
        if let Some(existing) = existing.filter(|value| !value.is_empty()) {
            path.push(self.path_separator.to_string());
            path.push(existing);
        }
        path
    }

    /// Interactive shell to spawn, honoring `$SHELL` outside Windows.
    #[must_use]
    pub fn shell_program(&self, shell_env: Option<OsString>) -> OsString {
        if self.is_windows() {
            return OsString::from("cmd.exe");
        }
        shell_env
            .filter(|shell| !shell.is_empty())
            .unwrap_or_else(|| OsString::from("/bin/bash"))
    }

    /// Shell command that puts `dir` first on `PATH`.
    #[must_use]
    pub fn path_command(&self, dir: &Path) -> String {
        if self.is_windows() {
            format!("set PATH={};%PATH%", dir.display())
        } else {
            format!("export PATH=\"{}:$PATH\"", dir.display())
        }
    }

    /// File name and contents of a script that puts the active runtime on
    /// `PATH`.
    #[must_use]
    pub fn setenv_script(&self, runtime_dir: &Path) -> (&'static str, String) {
        let command = self.path_command(runtime_dir);
        if self.is_windows() {
            ("setenv.cmd", format!("@ECHO OFF\r\n{command}\r\n"))
        } else {
            ("setenv.sh", format!("{command}\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::Path;

    use super::Platform;

    fn linux() -> Platform {
        Platform {
            os: "linux",
            arch: "x64",
            path_separator: ':',
            executable_suffix: "",
            executables_in_bin: true,
        }
    }

    #[test]
    fn dist_suffix_joins_os_and_arch() {
        assert_eq!(linux().dist_suffix(), "linux-x64");
        assert_eq!(Platform::windows("x64").dist_suffix(), "win-x64");
    }

    #[test]
    fn runtime_executable_follows_distribution_layout() {
        let dist = Path::new("/opt/polynode/current");

        assert_eq!(
            linux().runtime_executable(dist),
            Path::new("/opt/polynode/current/bin/node")
        );
        assert_eq!(
            Platform::windows("x64").runtime_executable(dist),
            dist.join("node.exe")
        );
    }

    #[test]
    fn prepend_path_uses_platform_separator() {
        let existing = OsString::from("/usr/bin");

        let unix = linux().prepend_path(Path::new("/p/current/bin"), Some(&existing));
        assert_eq!(unix, OsString::from("/p/current/bin:/usr/bin"));

        let windows = Platform::windows("x64").prepend_path(Path::new("C:/p"), Some(&existing));
        assert_eq!(windows, OsString::from("C:/p;/usr/bin"));

        let alone = linux().prepend_path(Path::new("/p"), None);
        assert_eq!(alone, OsString::from("/p"));
    }

    #[test]
    fn shell_program_falls_back_when_unset() {
        assert_eq!(linux().shell_program(None), OsString::from("/bin/bash"));
        assert_eq!(
            linux().shell_program(Some(OsString::from("/usr/bin/zsh"))),
            OsString::from("/usr/bin/zsh")
        );
        assert_eq!(
            Platform::windows("x64").shell_program(Some(OsString::from("/usr/bin/zsh"))),
            OsString::from("cmd.exe")
        );
    }

    #[test]
    fn setenv_script_matches_shell_flavor() {
        let (name, contents) = linux().setenv_script(Path::new("/p/current/bin"));
        assert_eq!(name, "setenv.sh");
        assert_eq!(contents, "export PATH=\"/p/current/bin:$PATH\"\n");

        let (name, contents) =
            Platform::windows("x64").setenv_script(Path::new("C:\\polynode\\current"));
        assert_eq!(name, "setenv.cmd");
        assert!(contents.contains("set PATH=C:\\polynode\\current;%PATH%"));
    }

    #[test]
    fn windows_default_root_is_fixed() {
        assert_eq!(
            Platform::windows("x64").default_root(),
            Some(std::path::PathBuf::from("C:\\polynode"))
        );
    }
}
