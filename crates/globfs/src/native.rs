//! Adapter from a conventional filesystem API to [`GlobFileSystem`].
//!
//! The native API fails in the usual ways (missing paths, permissions,
//! dangling links). Every failure stops here and turns into a sentinel.

use tracing::trace;

use crate::traits::{DirectoryState, GlobFileSystem, NativeFileSystem, RawDirEntry};

/// Wraps a [`NativeFileSystem`] to implement [`GlobFileSystem`].
#[derive(Debug, Clone, Default)]
pub struct NativeAdapter<N> {
    native: N,
}

/// Adapt a native filesystem API into the glob capability interface.
pub fn convert_native_fs<N: NativeFileSystem>(native: N) -> NativeAdapter<N> {
    NativeAdapter::new(native)
}

impl<N: NativeFileSystem> NativeAdapter<N> {
    pub fn new(native: N) -> Self {
        Self { native }
    }

    /// The wrapped native filesystem.
    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn into_inner(self) -> N {
        self.native
    }
}

impl<N: NativeFileSystem> GlobFileSystem for NativeAdapter<N> {
    fn is_directory(&self, path: &str) -> DirectoryState {
        let lstat = match self.native.lstat(path) {
            Ok(stats) => stats,
            Err(e) => {
                trace!(path, error = %e, "lstat failed, treating as missing");
                return DirectoryState::DoesNotExist;
            }
        };

        // A dangling link keeps its own lstat metadata and so reads as a file.
        let stats = if lstat.is_symbolic_link() {
            self.native.stat(path).unwrap_or_else(|e| {
                trace!(path, error = %e, "stat through symlink failed, using lstat");
                lstat
            })
        } else {
            lstat
        };

        if stats.is_directory() {
            DirectoryState::IsDirectory
        } else {
            DirectoryState::IsFile
        }
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        match self.native.lstat(path) {
            Ok(stats) => stats.is_symbolic_link(),
            Err(e) => {
                trace!(path, error = %e, "lstat failed, not a symlink");
                false
            }
        }
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        match self.native.read_dir(path) {
            Ok(entries) => entries.into_iter().map(RawDirEntry::into_name).collect(),
            Err(e) => {
                trace!(path, error = %e, "readdir failed, returning empty listing");
                Vec::new()
            }
        }
    }

    fn realpath(&self, path: &str) -> String {
        match self.native.realpath(path) {
            Ok(resolved) => resolved.into_string(),
            Err(e) => {
                trace!(path, error = %e, "realpath failed, returning input");
                path.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DirEntryKind, Dirent, RawPath, Stats};
    use std::collections::HashMap;
    use std::io;

    /// Scripted native API: each path maps to fixed lstat/stat answers.
    #[derive(Default)]
    struct Scripted {
        lstat: HashMap<&'static str, DirEntryKind>,
        stat: HashMap<&'static str, DirEntryKind>,
        listing: Vec<RawDirEntry>,
        realpath: Option<RawPath>,
    }

    fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "not found")
    }

    impl NativeFileSystem for Scripted {
        fn stat(&self, path: &str) -> io::Result<Stats> {
            self.stat.get(path).copied().map(Stats::new).ok_or_else(not_found)
        }

        fn lstat(&self, path: &str) -> io::Result<Stats> {
            self.lstat.get(path).copied().map(Stats::new).ok_or_else(not_found)
        }

        fn read_dir(&self, _path: &str) -> io::Result<Vec<RawDirEntry>> {
            Ok(self.listing.clone())
        }

        fn realpath(&self, _path: &str) -> io::Result<RawPath> {
            self.realpath.clone().ok_or_else(not_found)
        }
    }

    #[test]
    fn missing_path_does_not_exist() {
        let fs = convert_native_fs(Scripted::default());
        assert_eq!(fs.is_directory("/nope"), DirectoryState::DoesNotExist);
        assert!(!fs.is_symbolic_link("/nope"));
    }

    #[test]
    fn symlink_to_directory_follows_target() {
        let mut native = Scripted::default();
        native.lstat.insert("/link", DirEntryKind::Symlink);
        native.stat.insert("/link", DirEntryKind::Directory);
        let fs = convert_native_fs(native);

        assert_eq!(fs.is_directory("/link"), DirectoryState::IsDirectory);
        assert!(fs.is_symbolic_link("/link"));
    }

    #[test]
    fn broken_symlink_is_a_file() {
        let mut native = Scripted::default();
        native.lstat.insert("/dangling", DirEntryKind::Symlink);
        let fs = convert_native_fs(native);

        assert_eq!(fs.is_directory("/dangling"), DirectoryState::IsFile);
        assert!(fs.is_symbolic_link("/dangling"));
    }

    #[test]
    fn directory_is_not_restatted() {
        let mut native = Scripted::default();
        // stat would disagree; it must not be consulted for a non-link.
        native.lstat.insert("/dir", DirEntryKind::Directory);
        native.stat.insert("/dir", DirEntryKind::File);
        let fs = convert_native_fs(native);

        assert_eq!(fs.is_directory("/dir"), DirectoryState::IsDirectory);
    }

    #[test]
    fn mixed_entry_shapes_normalize() {
        let native = Scripted {
            listing: vec![
                RawDirEntry::Name("a".into()),
                RawDirEntry::Dirent(Dirent::new("b", DirEntryKind::File)),
                RawDirEntry::Bytes(b"c".to_vec()),
            ],
            ..Default::default()
        };
        let fs = convert_native_fs(native);
        assert_eq!(fs.read_directory("/"), vec!["a", "b", "c"]);
    }

    #[test]
    fn realpath_bytes_become_text() {
        let native = Scripted {
            realpath: Some(RawPath::Bytes(b"/real/path".to_vec())),
            ..Default::default()
        };
        let fs = convert_native_fs(native);
        assert_eq!(fs.realpath("/link/path"), "/real/path");
    }

    #[test]
    fn realpath_failure_returns_input() {
        let fs = convert_native_fs(Scripted::default());
        assert_eq!(fs.realpath("/gone/away"), "/gone/away");
    }
}
