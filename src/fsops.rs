//! Filesystem primitives
//!
//! Native equivalents of the `rm -r`, `cp -R` and `mv` calls the build phase
//! makes. Callers decide whether a failure is fatal; these functions only
//! report it.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// An immediate child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// True for real directories; symlinks are not followed
    pub is_dir: bool,
}

impl Entry {
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.name.ends_with(suffix)
    }
}

/// Result of listing one directory level.
#[derive(Debug, Default)]
pub struct DirScan {
    /// Entries read, sorted by name
    pub entries: Vec<Entry>,
    /// First error hit; `entries` holds whatever was read before it
    pub error: Option<io::Error>,
}

impl DirScan {
    pub fn into_result(self) -> io::Result<Vec<Entry>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.entries),
        }
    }
}

/// List the immediate children of `dir`, sorted by file name.
pub fn scan_dir(dir: &Path) -> DirScan {
    let mut scan = DirScan::default();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in walker {
        match entry {
            Ok(entry) => scan.entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().is_dir(),
            }),
            Err(err) => {
                scan.error = Some(err.into());
                break;
            }
        }
    }

    scan
}

/// Remove a file, symlink or directory tree. A missing path is not an error.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Recursively copy `from` to a new path `to`, preserving symlinks.
///
/// `to` must not exist yet; its parent must. Returns the number of files
/// and symlinks copied.
pub fn copy_tree(from: &Path, to: &Path) -> io::Result<u64> {
    let mut copied = 0;

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let dest = to.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

/// Move `from` to `to`, replacing whatever was at `to`.
///
/// Falls back to copy + remove when a rename is not possible (e.g. across
/// filesystems).
pub fn move_tree(from: &Path, to: &Path) -> io::Result<()> {
    // Surface a missing source before touching the destination
    fs::symlink_metadata(from)?;
    remove_tree(to)?;

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    copy_tree(from, to)?;
    remove_tree(from)
}

/// Copy a single file over `to`.
pub fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}
