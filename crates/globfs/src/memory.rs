//! In-memory filesystem implementation.
//!
//! A simulated tree with files, directories and symlinks, exposed through
//! [`NativeFileSystem`]. Used to inject fake filesystems into a glob pass and
//! throughout the tests. All data is ephemeral.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io;

use crate::traits::{DirEntryKind, Dirent, NativeFileSystem, RawDirEntry, RawPath, Stats};

/// Symlink hops allowed in one resolution before giving up.
const MAX_SYMLINK_HOPS: usize = 40;

/// Which raw shape `read_dir` and `realpath` hand back.
///
/// Native APIs differ here; the adapter has to cope with all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryEncoding {
    /// Plain names and text paths.
    #[default]
    Names,
    /// Descriptor entries carrying name and kind; text paths.
    Dirents,
    /// Raw bytes for names and paths.
    Bytes,
}

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8> },
    Directory,
    Symlink { target: String },
}

impl Entry {
    fn kind(&self) -> DirEntryKind {
        match self {
            Entry::File { .. } => DirEntryKind::File,
            Entry::Directory => DirEntryKind::Directory,
            Entry::Symlink { .. } => DirEntryKind::Symlink,
        }
    }
}

type Entries = BTreeMap<String, Entry>;

/// In-memory filesystem.
///
/// Keys are absolute, normalized paths. Relative paths given to any method
/// are resolved against the configured working directory (default `/`).
/// Single-threaded: mutation goes through a `RefCell`, so a `MemoryFs` can be
/// changed between glob passes while adapters still borrow it.
#[derive(Debug)]
pub struct MemoryFs {
    entries: RefCell<Entries>,
    cwd: String,
    encoding: EntryEncoding,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem rooted at `/`.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        // Root directory always exists
        entries.insert("/".to_string(), Entry::Directory);
        Self {
            entries: RefCell::new(entries),
            cwd: "/".to_string(),
            encoding: EntryEncoding::default(),
        }
    }

    /// Set the working directory used for relative paths.
    ///
    /// The directory is not created.
    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = normalize(&self.absolute(cwd));
        self
    }

    /// Choose the raw shape of directory entries and real paths.
    pub fn with_encoding(mut self, encoding: EntryEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build a filesystem from `(relative path, contents)` pairs placed under `cwd`.
    pub fn from_files<'a, I>(files: I, cwd: &str) -> io::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let fs = Self::new().with_cwd(cwd);
        for (path, data) in files {
            fs.write_file(path, data)?;
        }
        Ok(fs)
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn encoding(&self) -> EntryEncoding {
        self.encoding
    }

    /// Write a file, creating parent directories as needed.
    pub fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let abs = normalize(&self.absolute(path));
        let (parent, name) = split_parent(&abs).ok_or_else(|| is_a_directory(path))?;

        let mut entries = self.entries.borrow_mut();
        let parent = mkdir_all(&mut entries, parent)?;
        let mut target = join(&parent, name);

        // Writing through a symlink lands on its target.
        if let Some(Entry::Symlink { .. }) = entries.get(&target) {
            target = resolve(&entries, &target, true)?;
        }
        if let Some(Entry::Directory) = entries.get(&target) {
            return Err(is_a_directory(path));
        }

        entries.insert(
            target,
            Entry::File {
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    /// Read a file's contents, following symlinks.
    pub fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let entries = self.entries.borrow();
        let real = resolve(&entries, &self.absolute(path), true)?;
        match entries.get(&real) {
            Some(Entry::File { data }) => Ok(data.clone()),
            Some(_) => Err(is_a_directory(path)),
            None => Err(not_found(path)),
        }
    }

    /// Create a directory and any missing parents.
    pub fn mkdir(&self, path: &str) -> io::Result<()> {
        let abs = normalize(&self.absolute(path));
        let mut entries = self.entries.borrow_mut();
        mkdir_all(&mut entries, &abs)?;
        Ok(())
    }

    /// Create a symlink at `link` pointing to `target`.
    ///
    /// The target is stored as given and resolved relative to the link's
    /// directory when followed.
    pub fn symlink(&self, target: &str, link: &str) -> io::Result<()> {
        let abs = normalize(&self.absolute(link));
        let (parent, name) = split_parent(&abs).ok_or_else(|| already_exists(link))?;

        let mut entries = self.entries.borrow_mut();
        let parent = resolve(&entries, parent, true)?;
        match entries.get(&parent) {
            Some(Entry::Directory) => {}
            _ => return Err(not_a_directory(link)),
        }
        let at = join(&parent, name);
        if entries.contains_key(&at) {
            return Err(already_exists(link));
        }
        entries.insert(
            at,
            Entry::Symlink {
                target: target.to_string(),
            },
        );
        Ok(())
    }

    /// Remove a file or symlink. The link itself is removed, never its target.
    pub fn unlink(&self, path: &str) -> io::Result<()> {
        let mut entries = self.entries.borrow_mut();
        let at = resolve(&entries, &self.absolute(path), false)?;
        match entries.get(&at).map(Entry::kind) {
            Some(DirEntryKind::Directory) => Err(is_a_directory(path)),
            Some(_) => {
                entries.remove(&at);
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    /// Remove an empty directory.
    pub fn rmdir(&self, path: &str) -> io::Result<()> {
        let mut entries = self.entries.borrow_mut();
        let at = resolve(&entries, &self.absolute(path), false)?;
        if at == "/" {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove root directory",
            ));
        }
        match entries.get(&at) {
            Some(Entry::Directory) => {}
            Some(_) => return Err(not_a_directory(path)),
            None => return Err(not_found(path)),
        }
        if children(&entries, &at).next().is_some() {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("directory not empty: {path}"),
            ));
        }
        entries.remove(&at);
        Ok(())
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            join(&self.cwd, path)
        }
    }

    fn entry_stats(&self, path: &str, follow: bool) -> io::Result<Stats> {
        let entries = self.entries.borrow();
        let at = resolve(&entries, &self.absolute(path), follow)?;
        entries
            .get(&at)
            .map(|entry| Stats::new(entry.kind()))
            .ok_or_else(|| not_found(path))
    }
}

impl NativeFileSystem for MemoryFs {
    fn stat(&self, path: &str) -> io::Result<Stats> {
        self.entry_stats(path, true)
    }

    fn lstat(&self, path: &str) -> io::Result<Stats> {
        self.entry_stats(path, false)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RawDirEntry>> {
        let entries = self.entries.borrow();
        let dir = resolve(&entries, &self.absolute(path), true)?;
        match entries.get(&dir) {
            Some(Entry::Directory) => {}
            Some(_) => return Err(not_a_directory(path)),
            None => return Err(not_found(path)),
        }

        let listing = children(&entries, &dir)
            .map(|(name, entry)| match self.encoding {
                EntryEncoding::Names => RawDirEntry::Name(name.to_string()),
                EntryEncoding::Dirents => RawDirEntry::Dirent(Dirent::new(name, entry.kind())),
                EntryEncoding::Bytes => RawDirEntry::Bytes(name.as_bytes().to_vec()),
            })
            .collect();
        Ok(listing)
    }

    fn realpath(&self, path: &str) -> io::Result<RawPath> {
        let entries = self.entries.borrow();
        let real = resolve(&entries, &self.absolute(path), true)?;
        Ok(match self.encoding {
            EntryEncoding::Bytes => RawPath::Bytes(real.into_bytes()),
            EntryEncoding::Names | EntryEncoding::Dirents => RawPath::Text(real),
        })
    }
}

/// Walk `path` component by component, following symlinks.
///
/// A trailing symlink is followed only when `follow_last` is set. Returns the
/// physical key of the final entry.
fn resolve(entries: &Entries, path: &str, follow_last: bool) -> io::Result<String> {
    let mut pending: VecDeque<String> = path.split('/').map(str::to_string).collect();
    let mut resolved: Vec<String> = Vec::new();
    let mut hops = 0;

    while let Some(component) = pending.pop_front() {
        match component.as_str() {
            "" | "." => continue,
            ".." => {
                resolved.pop();
                continue;
            }
            _ => {}
        }
        resolved.push(component);
        let current = join_components(&resolved);
        let is_last = pending.iter().all(|c| c.is_empty() || c == ".");

        match entries.get(&current) {
            None => return Err(not_found(path)),
            Some(Entry::Symlink { target }) if follow_last || !is_last => {
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links: {path}"
                    )));
                }
                resolved.pop();
                if target.starts_with('/') {
                    resolved.clear();
                }
                for part in target.split('/').rev() {
                    pending.push_front(part.to_string());
                }
            }
            Some(Entry::File { .. }) if !is_last => return Err(not_a_directory(path)),
            Some(_) => {}
        }
    }

    Ok(join_components(&resolved))
}

/// Create every missing directory along `path`, following existing symlinks.
///
/// Returns the physical key of the final directory.
fn mkdir_all(entries: &mut Entries, path: &str) -> io::Result<String> {
    let mut current = "/".to_string();
    for component in path.split('/').filter(|c| !c.is_empty()) {
        let candidate = join(&current, component);
        current = match entries.get(&candidate) {
            None => {
                entries.insert(candidate.clone(), Entry::Directory);
                candidate
            }
            Some(Entry::Directory) => candidate,
            Some(Entry::Symlink { .. }) => {
                let real = resolve(entries, &candidate, true)?;
                match entries.get(&real) {
                    Some(Entry::Directory) => real,
                    _ => return Err(not_a_directory(path)),
                }
            }
            Some(Entry::File { .. }) => return Err(not_a_directory(path)),
        };
    }
    Ok(current)
}

/// Direct children of the directory stored at `dir`, in name order.
fn children<'a>(entries: &'a Entries, dir: &'a str) -> impl Iterator<Item = (&'a str, &'a Entry)> {
    entries.iter().filter_map(move |(key, entry)| {
        let (parent, name) = split_parent(key)?;
        (parent == dir).then_some((name, entry))
    })
}

/// Lexically normalize an absolute path: collapse `.`, `..` and repeated slashes.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn join_components(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

/// Split a normalized absolute key into parent and basename. `None` for root.
fn split_parent(path: &str) -> Option<(&str, &str)> {
    if path == "/" {
        return None;
    }
    let idx = path.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &path[..idx] };
    Some((parent, &path[idx + 1..]))
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {path}"))
}

fn not_a_directory(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotADirectory, format!("not a directory: {path}"))
}

fn is_a_directory(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::IsADirectory, format!("is a directory: {path}"))
}

fn already_exists(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::AlreadyExists, format!("file exists: {path}"))
}
