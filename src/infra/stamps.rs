//! Content digests and build stamps
//!
//! A stamp records the SHA-256 digest of a unit's sources after its last
//! successful build. When the current digest matches the stamp the unit's
//! output is up to date and the worker skips it. A unit's digest also covers
//! the stamps of its dependencies, so rebuilding a dependency invalidates
//! every unit that depends on it.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::defaults::STAMP_DIR;
use crate::core::unit::Unit;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Compute the digest of every file below `dir`
///
/// Files are visited in sorted order and both relative paths and contents
/// feed the hash, so renames change the digest. Directories whose name is
/// in `ignored` are not descended into.
pub fn digest_dir(dir: &Path, ignored: &[String]) -> Result<String, FilesystemError> {
    let mut hasher = Sha256::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !ignored.iter().any(|i| entry.file_name() == i.as_str())
        });

    for entry in walker {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let content = std::fs::read(entry.path()).map_err(|e| FilesystemError::ReadFile {
            path: entry.path().to_path_buf(),
            error: e.to_string(),
        })?;

        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(&content);
        hasher.update([0u8]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Stamp files under `<root>/.geppetto/stamps`
#[derive(Debug, Clone)]
pub struct StampStore {
    dir: PathBuf,
}

impl StampStore {
    /// Store rooted at a target directory
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join(STAMP_DIR),
        }
    }

    /// Stamp file for a unit, named by the digest of the unit name
    pub fn path(&self, unit: &str) -> PathBuf {
        let file = hex::encode(Sha256::digest(unit.as_bytes()));
        self.dir.join(format!("{file}.sha256"))
    }

    /// Digest of a unit's sources and the current stamps of its dependencies
    ///
    /// A dependency without a stamp contributes an empty one.
    pub fn digest_unit(
        &self,
        unit: &Unit,
        ignored: &[String],
    ) -> Result<String, FilesystemError> {
        let mut hasher = Sha256::new();
        hasher.update(digest_dir(&unit.path, ignored)?.as_bytes());

        let mut deps: Vec<&String> = unit.depends_on.iter().collect();
        deps.sort();
        for dep in deps {
            hasher.update([0u8]);
            hasher.update(dep.as_bytes());
            hasher.update([0u8]);
            hasher.update(self.read(dep).unwrap_or_default().as_bytes());
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Recorded digest, if any
    pub fn read(&self, unit: &str) -> Option<String> {
        filesystem::read_file(&self.path(unit))
            .ok()
            .map(|s| s.trim().to_string())
    }

    /// Record a digest after a successful build
    pub fn write(&self, unit: &str, digest: &str) -> Result<(), FilesystemError> {
        filesystem::write_file(&self.path(unit), digest)
    }

    /// True when the recorded digest equals `digest`
    pub fn is_current(&self, unit: &str, digest: &str) -> bool {
        self.read(unit).is_some_and(|stamp| stamp == digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ignored() -> Vec<String> {
        vec!["node_modules".to_string()]
    }

    #[test]
    fn test_digest_is_stable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "two").unwrap();

        let first = digest_dir(dir.path(), &ignored()).unwrap();
        let second = digest_dir(dir.path(), &ignored()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_digest_changes_with_content_and_names() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        let before = digest_dir(dir.path(), &ignored()).unwrap();

        std::fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let changed = digest_dir(dir.path(), &ignored()).unwrap();
        assert_ne!(before, changed);

        std::fs::rename(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
        let renamed = digest_dir(dir.path(), &ignored()).unwrap();
        assert_ne!(changed, renamed);
    }

    #[test]
    fn test_digest_skips_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.js"), "x").unwrap();
        let before = digest_dir(dir.path(), &ignored()).unwrap();

        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/dep.js"), "y").unwrap();
        assert_eq!(before, digest_dir(dir.path(), &ignored()).unwrap());
    }

    #[test]
    fn test_stamp_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = StampStore::new(dir.path());

        assert!(store.read("@org/ui").is_none());
        assert!(!store.is_current("@org/ui", "abc"));

        store.write("@org/ui", "abc").unwrap();
        assert!(store.is_current("@org/ui", "abc"));
        assert!(!store.is_current("@org/ui", "def"));
    }

    #[test]
    fn test_stamp_paths_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = StampStore::new(dir.path());

        assert_ne!(store.path("example.com/a_b"), store.path("example.com/a/b"));
        assert_eq!(store.path("@org/ui").parent(), Some(dir.path().join(STAMP_DIR).as_path()));

        store.write("example.com/a_b", "one").unwrap();
        store.write("example.com/a/b", "two").unwrap();
        assert!(store.is_current("example.com/a_b", "one"));
        assert!(store.is_current("example.com/a/b", "two"));
    }

    #[test]
    fn test_unit_digest_follows_dependency_stamps() {
        use crate::core::unit::UnitKind;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main").unwrap();
        let state = TempDir::new().unwrap();
        let store = StampStore::new(state.path());
        let unit = Unit::new("app", UnitKind::Go, dir.path()).with_dependencies(["lib"]);

        let unstamped = store.digest_unit(&unit, &ignored()).unwrap();
        store.write("lib", "first").unwrap();
        let first = store.digest_unit(&unit, &ignored()).unwrap();
        assert_ne!(unstamped, first);
        assert_eq!(first, store.digest_unit(&unit, &ignored()).unwrap());

        store.write("lib", "second").unwrap();
        assert_ne!(first, store.digest_unit(&unit, &ignored()).unwrap());
    }
}
