//! In-memory mock filesystem for testing report units without a real host.
//!
//! This module provides `MockFs` which simulates `/proc`, `/sys` and `/etc`
//! in memory, allowing tests to run on macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files, directories and symlinks in memory. Paths registered with
/// [`MockFs::deny`] fail with `PermissionDenied` to simulate a sandbox.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, Vec<u8>>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Map from link path to its target.
    links: HashMap<PathBuf, PathBuf>,
    /// Paths whose reads fail with `PermissionDenied`.
    denied: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.add_bytes(path, content.into().into_bytes());
    }

    /// Adds a file with binary content.
    pub fn add_bytes(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds a symbolic link pointing at `target`.
    pub fn add_link(&mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.links.insert(path, target.as_ref().to_path_buf());
    }

    /// Makes every read of `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        self.denied.insert(path.as_ref().to_path_buf());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    fn check_denied(&self, path: &Path) -> io::Result<()> {
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        Ok(())
    }

    fn not_found(what: &str, path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("{what} not found: {:?}", path))
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check_denied(path)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found("file", path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.links.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.check_denied(path)?;
        if !self.directories.contains(path) {
            return Err(Self::not_found("directory", path));
        }

        let mut entries = HashSet::new();

        // Direct children only.
        for child in self
            .files
            .keys()
            .chain(self.links.keys())
            .chain(self.directories.iter())
        {
            if child != path && child.parent().is_some_and(|parent| parent == path) {
                entries.insert(child.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.check_denied(path)?;
        self.links
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found("link", path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/net/eth0/mtu", "1500");
        fs.add_file("/sys/class/net/eth0/flags", "0x1003");
        fs.add_file("/sys/class/net/lo/mtu", "65536");

        let entries = fs.read_dir(Path::new("/sys/class/net")).unwrap();
        assert_eq!(entries.len(), 2);

        let eth0 = fs.read_dir(Path::new("/sys/class/net/eth0")).unwrap();
        assert_eq!(eth0.len(), 2);
    }

    #[test]
    fn test_mock_fs_links() {
        let mut fs = MockFs::new();
        fs.add_link("/etc/localtime", "/usr/share/zoneinfo/Europe/Berlin");

        assert!(fs.exists(Path::new("/etc/localtime")));
        assert_eq!(
            fs.read_link(Path::new("/etc/localtime")).unwrap(),
            PathBuf::from("/usr/share/zoneinfo/Europe/Berlin")
        );
    }

    #[test]
    fn test_mock_fs_denied() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/self/environ", "A=1");
        fs.deny("/proc/self/environ");

        let err = fs.read_to_string(Path::new("/proc/self/environ")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
