//! Where the toolchain keeps its precompiled standard library archives.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Environment variable naming the standard library installation root
pub const STDLIB_ROOT_ENV: &str = "VX_STDLIB_ROOT";

/// File extension of compiled package archives
pub const ARCHIVE_EXTENSION: &str = "a";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("VX_STDLIB_ROOT not set")]
    RootNotSet,

    #[error("VX_STDLIB_ROOT is not valid UTF-8")]
    RootNotUtf8,

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Standard library archive layout: `<root>/<install_suffix>/<import/path>.a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdlibLayout {
    /// Absolute installation root
    pub root: Utf8PathBuf,
    /// Platform directory under the root, e.g. `linux_amd64`
    pub install_suffix: String,
}

impl StdlibLayout {
    pub fn new(root: impl Into<Utf8PathBuf>, install_suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            install_suffix: install_suffix.into(),
        }
    }

    /// Read the root from [`STDLIB_ROOT_ENV`].
    ///
    /// A relative root is resolved against the current directory.
    pub fn from_env(install_suffix: impl Into<String>) -> Result<Self, LayoutError> {
        let root = match std::env::var(STDLIB_ROOT_ENV) {
            Ok(root) => Utf8PathBuf::from(root),
            Err(std::env::VarError::NotPresent) => return Err(LayoutError::RootNotSet),
            Err(std::env::VarError::NotUnicode(_)) => return Err(LayoutError::RootNotUtf8),
        };

        let root = if root.is_absolute() {
            root
        } else {
            let cwd = std::env::current_dir().map_err(LayoutError::CurrentDir)?;
            let cwd = Utf8PathBuf::try_from(cwd)
                .map_err(|e| LayoutError::CurrentDir(std::io::Error::other(e)))?;
            cwd.join(root)
        };

        Ok(Self::new(root, install_suffix))
    }

    /// Directory holding the platform's standard library archives
    pub fn package_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.install_suffix)
    }

    /// Archive location of a standard library package
    pub fn archive_path(&self, import_path: &str) -> Utf8PathBuf {
        let mut path = self.package_dir();
        for segment in import_path.split('/') {
            path.push(segment);
        }
        archive_file(&path)
    }
}

fn archive_file(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}.{ARCHIVE_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets or clears the root variable for the lifetime of the guard
    struct RootEnv {
        previous: Option<std::ffi::OsString>,
        _lock: MutexGuard<'static, ()>,
    }

    impl RootEnv {
        fn set(value: Option<&str>) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let previous = std::env::var_os(STDLIB_ROOT_ENV);
            // SAFETY: every test touching the environment holds ENV_LOCK.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(STDLIB_ROOT_ENV, value),
                    None => std::env::remove_var(STDLIB_ROOT_ENV),
                }
            }
            Self {
                previous,
                _lock: lock,
            }
        }
    }

    impl Drop for RootEnv {
        fn drop(&mut self) {
            // SAFETY: ENV_LOCK is still held.
            unsafe {
                match &self.previous {
                    Some(value) => std::env::set_var(STDLIB_ROOT_ENV, value),
                    None => std::env::remove_var(STDLIB_ROOT_ENV),
                }
            }
        }
    }

    #[test]
    fn from_env_requires_root() {
        let _env = RootEnv::set(None);

        let err = StdlibLayout::from_env("linux_amd64").unwrap_err();
        assert!(matches!(err, LayoutError::RootNotSet));
        assert_eq!(err.to_string(), "VX_STDLIB_ROOT not set");
    }

    #[test]
    fn from_env_keeps_absolute_root() {
        let _env = RootEnv::set(Some("/opt/std"));

        let layout = StdlibLayout::from_env("linux_amd64").unwrap();
        assert_eq!(layout, StdlibLayout::new("/opt/std", "linux_amd64"));
    }

    #[test]
    fn from_env_resolves_relative_root_against_cwd() {
        let _env = RootEnv::set(Some("toolchain/std"));
        let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();

        let layout = StdlibLayout::from_env("linux_amd64").unwrap();
        assert_eq!(layout.root, cwd.join("toolchain/std"));
        assert!(layout.root.is_absolute());
        assert_eq!(
            layout.archive_path("fmt"),
            cwd.join("toolchain/std/linux_amd64/fmt.a")
        );
    }

    #[test]
    fn archive_path_joins_root_suffix_and_import() {
        let layout = StdlibLayout::new("/std", "linux_amd64");
        assert_eq!(
            layout.archive_path("fmt"),
            Utf8PathBuf::from("/std/linux_amd64/fmt.a")
        );
    }

    #[test]
    fn archive_path_nested_package() {
        let layout = StdlibLayout::new("/std", "linux_amd64");
        assert_eq!(
            layout.archive_path("net/http"),
            Utf8Path::new("/std/linux_amd64").join("net").join("http.a")
        );
    }

    #[test]
    fn dotted_last_segment_keeps_its_dot() {
        let layout = StdlibLayout::new("/std", "linux_amd64");
        assert_eq!(
            layout.archive_path("crypto/x509.v2"),
            Utf8PathBuf::from("/std/linux_amd64/crypto/x509.v2.a")
        );
    }
}
