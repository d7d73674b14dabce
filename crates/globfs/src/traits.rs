//! Core filesystem traits and types.
//!
//! Two seams live here:
//!
//! - [`GlobFileSystem`]: the four questions a glob engine asks. Total, never fails.
//! - [`NativeFileSystem`]: a conventional stat/lstat/readdir/realpath API that
//!   does fail, and that [`NativeAdapter`](crate::NativeAdapter) tames.

use std::borrow::Cow;
use std::io;
use std::rc::Rc;

/// Outcome of asking whether a path is a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryState {
    /// The path exists and (after following symlinks) is a directory.
    IsDirectory,
    /// The path exists and is anything other than a directory.
    IsFile,
    /// The path could not be shown to exist.
    DoesNotExist,
}

impl DirectoryState {
    pub fn is_directory(self) -> bool {
        matches!(self, DirectoryState::IsDirectory)
    }

    pub fn exists(self) -> bool {
        !matches!(self, DirectoryState::DoesNotExist)
    }
}

/// The minimal filesystem surface a glob engine needs.
///
/// Paths are opaque strings and are used as-is for caching; no normalization
/// happens at this layer. None of the methods can fail: implementations absorb
/// errors and answer with a sentinel instead.
pub trait GlobFileSystem {
    /// Classify `path` as directory, file, or missing.
    fn is_directory(&self, path: &str) -> DirectoryState;

    /// Returns `true` only if `path` itself (not its target) is a symlink.
    fn is_symbolic_link(&self, path: &str) -> bool;

    /// Entry basenames of a directory.
    ///
    /// Only meaningful after [`is_directory`](Self::is_directory) answered
    /// [`DirectoryState::IsDirectory`] for the same path.
    fn read_directory(&self, path: &str) -> Vec<String>;

    /// Resolve every symlink component of `path`.
    fn realpath(&self, path: &str) -> String;
}

impl<T: GlobFileSystem + ?Sized> GlobFileSystem for &T {
    fn is_directory(&self, path: &str) -> DirectoryState {
        (**self).is_directory(path)
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        (**self).is_symbolic_link(path)
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        (**self).read_directory(path)
    }

    fn realpath(&self, path: &str) -> String {
        (**self).realpath(path)
    }
}

impl<T: GlobFileSystem + ?Sized> GlobFileSystem for Box<T> {
    fn is_directory(&self, path: &str) -> DirectoryState {
        (**self).is_directory(path)
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        (**self).is_symbolic_link(path)
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        (**self).read_directory(path)
    }

    fn realpath(&self, path: &str) -> String {
        (**self).realpath(path)
    }
}

impl<T: GlobFileSystem + ?Sized> GlobFileSystem for Rc<T> {
    fn is_directory(&self, path: &str) -> DirectoryState {
        (**self).is_directory(path)
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        (**self).is_symbolic_link(path)
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        (**self).read_directory(path)
    }

    fn realpath(&self, path: &str) -> String {
        (**self).realpath(path)
    }
}

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
    File,
    Directory,
    Symlink,
}

/// Metadata returned by [`NativeFileSystem::stat`] and [`NativeFileSystem::lstat`].
///
/// Only the bits a glob pass cares about are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub kind: DirEntryKind,
}

impl Stats {
    pub fn new(kind: DirEntryKind) -> Self {
        Self { kind }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == DirEntryKind::Directory
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.kind == DirEntryKind::Symlink
    }
}

/// A descriptor-style directory entry (name plus type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirent {
    /// Name of the entry (not full path).
    pub name: String,
    /// Kind of entry, as seen without following symlinks.
    pub kind: DirEntryKind,
}

impl Dirent {
    pub fn new(name: impl Into<String>, kind: DirEntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One directory entry in whatever shape the native API produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDirEntry {
    /// A plain UTF-8 name.
    Name(String),
    /// A richer descriptor carrying the name.
    Dirent(Dirent),
    /// Undecoded name bytes.
    Bytes(Vec<u8>),
}

impl RawDirEntry {
    /// Borrow the entry name, decoding bytes lossily.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        match self {
            RawDirEntry::Name(name) => Cow::Borrowed(name),
            RawDirEntry::Dirent(dirent) => Cow::Borrowed(&dirent.name),
            RawDirEntry::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Collapse any entry shape into a plain name.
    ///
    /// Bytes are decoded as UTF-8, with invalid sequences replaced.
    pub fn into_name(self) -> String {
        match self {
            RawDirEntry::Name(name) => name,
            RawDirEntry::Dirent(dirent) => dirent.name,
            RawDirEntry::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// A resolved real path as text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPath {
    Text(String),
    Bytes(Vec<u8>),
}

impl RawPath {
    pub fn into_string(self) -> String {
        match self {
            RawPath::Text(text) => text,
            RawPath::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Conventional synchronous filesystem API.
///
/// Every operation may fail with an `io::Error`. Relative paths are resolved
/// however the implementation sees fit (process cwd for [`StdFs`](crate::StdFs),
/// the configured cwd for [`MemoryFs`](crate::MemoryFs)).
pub trait NativeFileSystem {
    /// Get metadata, following symlinks.
    fn stat(&self, path: &str) -> io::Result<Stats>;

    /// Get metadata for a path without following a trailing symlink.
    fn lstat(&self, path: &str) -> io::Result<Stats>;

    /// List the entries of a directory.
    fn read_dir(&self, path: &str) -> io::Result<Vec<RawDirEntry>>;

    /// Resolve a path to its canonical, symlink-free form.
    fn realpath(&self, path: &str) -> io::Result<RawPath>;
}

impl<T: NativeFileSystem + ?Sized> NativeFileSystem for &T {
    fn stat(&self, path: &str) -> io::Result<Stats> {
        (**self).stat(path)
    }

    fn lstat(&self, path: &str) -> io::Result<Stats> {
        (**self).lstat(path)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RawDirEntry>> {
        (**self).read_dir(path)
    }

    fn realpath(&self, path: &str) -> io::Result<RawPath> {
        (**self).realpath(path)
    }
}

impl<T: NativeFileSystem + ?Sized> NativeFileSystem for Rc<T> {
    fn stat(&self, path: &str) -> io::Result<Stats> {
        (**self).stat(path)
    }

    fn lstat(&self, path: &str) -> io::Result<Stats> {
        (**self).lstat(path)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RawDirEntry>> {
        (**self).read_dir(path)
    }

    fn realpath(&self, path: &str) -> io::Result<RawPath> {
        (**self).realpath(path)
    }
}
