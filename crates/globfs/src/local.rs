//! Real filesystem backend.
//!
//! Thin synchronous wrapper over `std::fs`. Relative paths resolve against
//! the process working directory.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::traits::{DirEntryKind, Dirent, NativeFileSystem, RawDirEntry, RawPath, Stats};

/// Native filesystem access through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl StdFs {
    pub fn new() -> Self {
        Self
    }

    fn kind_of(file_type: fs::FileType) -> DirEntryKind {
        if file_type.is_symlink() {
            DirEntryKind::Symlink
        } else if file_type.is_dir() {
            DirEntryKind::Directory
        } else {
            DirEntryKind::File
        }
    }

    /// Non-UTF-8 names are handed over as bytes and decoded by the adapter.
    #[cfg(unix)]
    fn name_bytes(name: OsString) -> Vec<u8> {
        use std::os::unix::ffi::OsStringExt;
        name.into_vec()
    }

    #[cfg(not(unix))]
    fn name_bytes(name: OsString) -> Vec<u8> {
        name.to_string_lossy().into_owned().into_bytes()
    }
}

impl NativeFileSystem for StdFs {
    fn stat(&self, path: &str) -> io::Result<Stats> {
        let meta = fs::metadata(path)?;
        Ok(Stats::new(Self::kind_of(meta.file_type())))
    }

    fn lstat(&self, path: &str) -> io::Result<Stats> {
        let meta = fs::symlink_metadata(path)?;
        Ok(Stats::new(Self::kind_of(meta.file_type())))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RawDirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let kind = Self::kind_of(entry.file_type()?);
            let raw = match entry.file_name().into_string() {
                Ok(name) => RawDirEntry::Dirent(Dirent::new(name, kind)),
                Err(name) => RawDirEntry::Bytes(Self::name_bytes(name)),
            };
            entries.push(raw);
        }
        // read_dir order is platform-defined; keep listings stable.
        entries.sort_by(|a, b| a.name_lossy().cmp(&b.name_lossy()));
        Ok(entries)
    }

    fn realpath(&self, path: &str) -> io::Result<RawPath> {
        let resolved: PathBuf = fs::canonicalize(path)?;
        Ok(match resolved.into_os_string().into_string() {
            Ok(text) => RawPath::Text(text),
            Err(raw) => RawPath::Bytes(Self::name_bytes(raw)),
        })
    }
}
