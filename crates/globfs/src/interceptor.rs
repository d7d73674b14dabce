//! Lazy cache views for a glob engine.
//!
//! A glob engine keeps four internal caches keyed by absolute path: directory
//! listings, stat results, real paths and symlink flags. Instead of letting it
//! warm them itself, [`create_glob_interceptor`] hands it four views that look
//! like already-populated caches. Every read is computed on demand from a
//! [`GlobFileSystem`]; every write is dropped; every presence check succeeds.
//!
//! ```
//! use globfs::{CacheView, ListingEntry, MemoryFs, convert_native_fs, create_glob_interceptor, memoize};
//!
//! let native = MemoryFs::new();
//! native.write_file("/src/lib.rs", b"").unwrap();
//!
//! let fs = memoize(convert_native_fs(&native));
//! let caches = create_glob_interceptor(&fs);
//!
//! assert_eq!(caches.cache.get("/src"), Ok(ListingEntry::Entries(vec!["lib.rs".into()])));
//! assert_eq!(caches.cache.get("/src/lib.rs"), Ok(ListingEntry::File));
//! assert!(caches.realpath_cache.get("lib.rs").is_err());
//! ```

use std::convert::Infallible;
use std::path::MAIN_SEPARATOR;

use tracing::debug;

use crate::error::InterceptError;
use crate::traits::{DirectoryState, GlobFileSystem};

/// Presence metadata a view reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub writable: bool,
    pub configurable: bool,
}

/// Reported for every key of every view.
pub const PERMISSIVE_DESCRIPTOR: EntryDescriptor = EntryDescriptor {
    writable: true,
    configurable: true,
};

/// Minimal stat shape: only "is this a directory".
#[derive(Debug, PartialEq, Eq)]
pub struct StatShape {
    is_directory: bool,
}

impl StatShape {
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }
}

/// Shared stat shape for every directory.
pub static DIRECTORY_STATS: StatShape = StatShape { is_directory: true };

/// Shared stat shape for everything that exists and is not a directory.
pub static FILE_STATS: StatShape = StatShape {
    is_directory: false,
};

/// What the listing view yields for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// The path is a directory with these entry names.
    Entries(Vec<String>),
    /// The path exists and is not a directory.
    File,
    /// The path does not exist.
    Missing,
}

impl ListingEntry {
    pub fn entries(&self) -> Option<&[String]> {
        match self {
            ListingEntry::Entries(names) => Some(names),
            ListingEntry::File | ListingEntry::Missing => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ListingEntry::Entries(_))
    }
}

/// A read-through, write-discarding key/value view keyed by path.
pub trait CacheView {
    type Value;
    type Error;

    /// Compute the value for `key`.
    fn get(&self, key: &str) -> Result<Self::Value, Self::Error>;

    /// Accepts a write from the consumer and drops it.
    fn set(&self, key: &str, value: Self::Value) {
        let _ = (key, value);
    }

    /// Presence metadata for `key`. Always reported, whatever `get` yields.
    fn descriptor(&self, key: &str) -> Option<EntryDescriptor> {
        let _ = key;
        Some(PERMISSIVE_DESCRIPTOR)
    }

    /// Whether the view claims an entry for `key`. Always `true`.
    fn contains_key(&self, key: &str) -> bool {
        self.descriptor(key).is_some()
    }
}

macro_rules! view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<'a, F: ?Sized> {
            fs: &'a F,
        }

        impl<'a, F: ?Sized> $name<'a, F> {
            pub fn new(fs: &'a F) -> Self {
                Self { fs }
            }
        }

        impl<F: ?Sized> Clone for $name<'_, F> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<F: ?Sized> Copy for $name<'_, F> {}

        impl<F: ?Sized> std::fmt::Debug for $name<'_, F> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}

view!(
    /// Directory listings: entries, a plain-file marker, or missing.
    ListingView
);
view!(
    /// Stat shapes: [`DIRECTORY_STATS`], [`FILE_STATS`], or `None`.
    StatView
);
view!(
    /// Real paths, refusing keys that are not paths.
    RealpathView
);
view!(
    /// Symlink flags.
    SymlinkView
);

impl<F: GlobFileSystem + ?Sized> CacheView for ListingView<'_, F> {
    type Value = ListingEntry;
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<ListingEntry, Infallible> {
        Ok(match self.fs.is_directory(key) {
            DirectoryState::IsDirectory => ListingEntry::Entries(self.fs.read_directory(key)),
            DirectoryState::IsFile => ListingEntry::File,
            DirectoryState::DoesNotExist => ListingEntry::Missing,
        })
    }
}

impl<F: GlobFileSystem + ?Sized> CacheView for StatView<'_, F> {
    type Value = Option<&'static StatShape>;
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<&'static StatShape>, Infallible> {
        Ok(match self.fs.is_directory(key) {
            DirectoryState::IsDirectory => Some(&DIRECTORY_STATS),
            DirectoryState::IsFile => Some(&FILE_STATS),
            DirectoryState::DoesNotExist => None,
        })
    }
}

impl<F: GlobFileSystem + ?Sized> CacheView for RealpathView<'_, F> {
    type Value = String;
    type Error = InterceptError;

    fn get(&self, key: &str) -> Result<String, InterceptError> {
        if !is_path_shaped(key) {
            debug!(key, "realpath probe rejected, consumer should fall back");
            return Err(InterceptError::UseFallback {
                key: key.to_string(),
            });
        }
        Ok(self.fs.realpath(key))
    }
}

impl<F: GlobFileSystem + ?Sized> CacheView for SymlinkView<'_, F> {
    type Value = bool;
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<bool, Infallible> {
        Ok(self.fs.is_symbolic_link(key))
    }
}

/// A key is path-shaped when it contains a separator.
fn is_path_shaped(key: &str) -> bool {
    key.contains('/') || key.contains(MAIN_SEPARATOR)
}

/// The four views, ready to be installed into a glob engine's options.
pub struct GlobInterceptor<'a, F: ?Sized> {
    pub cache: ListingView<'a, F>,
    pub stat_cache: StatView<'a, F>,
    pub realpath_cache: RealpathView<'a, F>,
    pub symlinks: SymlinkView<'a, F>,
}

impl<F: ?Sized> Clone for GlobInterceptor<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized> Copy for GlobInterceptor<'_, F> {}

impl<F: ?Sized> std::fmt::Debug for GlobInterceptor<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobInterceptor").finish_non_exhaustive()
    }
}

/// Build the four lazy views over `fs`.
///
/// The views borrow `fs`; wrap it with [`memoize`](crate::memoize) first if
/// repeated reads should not reach the filesystem again.
pub fn create_glob_interceptor<F: GlobFileSystem + ?Sized>(fs: &F) -> GlobInterceptor<'_, F> {
    GlobInterceptor {
        cache: ListingView::new(fs),
        stat_cache: StatView::new(fs),
        realpath_cache: RealpathView::new(fs),
        symlinks: SymlinkView::new(fs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFs;
    use crate::native::convert_native_fs;
    use rstest::rstest;

    fn tree() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.write_file("/dir/file.txt", b"x").unwrap();
        fs.symlink("/dir", "/link").unwrap();
        fs.symlink("/nowhere", "/dangling").unwrap();
        fs
    }

    #[rstest]
    #[case("/dir", ListingEntry::Entries(vec!["file.txt".into()]))]
    #[case("/dir/file.txt", ListingEntry::File)]
    #[case("/link", ListingEntry::Entries(vec!["file.txt".into()]))]
    #[case("/dangling", ListingEntry::File)]
    #[case("/missing", ListingEntry::Missing)]
    fn listing_view(#[case] key: &str, #[case] expected: ListingEntry) {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);
        assert_eq!(views.cache.get(key), Ok(expected));
    }

    #[rstest]
    #[case("/dir", Some(&DIRECTORY_STATS))]
    #[case("/dir/file.txt", Some(&FILE_STATS))]
    #[case("/dangling", Some(&FILE_STATS))]
    #[case("/missing", None)]
    fn stat_view(#[case] key: &str, #[case] expected: Option<&'static StatShape>) {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);
        assert_eq!(views.stat_cache.get(key), Ok(expected));
    }

    #[test]
    fn stat_shapes_are_shared() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        let a = views.stat_cache.get("/dir").unwrap().unwrap();
        let b = views.stat_cache.get("/link").unwrap().unwrap();
        assert!(a.is_directory());
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn realpath_view_resolves_paths() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        assert_eq!(views.realpath_cache.get("/link/file.txt").unwrap(), "/dir/file.txt");
        assert_eq!(views.realpath_cache.get("/dir").unwrap(), "/dir");
    }

    #[rstest]
    #[case("file.txt")]
    #[case("link")]
    #[case("")]
    fn realpath_view_rejects_non_path_keys(#[case] key: &str) {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        let err = views.realpath_cache.get(key).unwrap_err();
        assert!(err.is_fallback());
        assert_eq!(err.code(), crate::error::FALLBACK_ERROR_CODE);
    }

    #[test]
    fn symlink_view() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        assert_eq!(views.symlinks.get("/link"), Ok(true));
        assert_eq!(views.symlinks.get("/dangling"), Ok(true));
        assert_eq!(views.symlinks.get("/dir"), Ok(false));
        assert_eq!(views.symlinks.get("/missing"), Ok(false));
    }

    #[test]
    fn writes_are_discarded() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        views.cache.set("/dir", ListingEntry::Missing);
        views.stat_cache.set("/dir", None);
        views.symlinks.set("/dir", true);
        views.realpath_cache.set("/dir", "/elsewhere".into());

        assert!(views.cache.get("/dir").unwrap().is_directory());
        assert_eq!(views.stat_cache.get("/dir"), Ok(Some(&DIRECTORY_STATS)));
        assert_eq!(views.symlinks.get("/dir"), Ok(false));
        assert_eq!(views.realpath_cache.get("/dir").unwrap(), "/dir");
    }

    #[test]
    fn every_key_is_present() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        for key in ["/missing", "/dir", "not-a-path", ""] {
            assert!(views.cache.contains_key(key));
            assert!(views.stat_cache.contains_key(key));
            assert!(views.realpath_cache.contains_key(key));
            assert!(views.symlinks.contains_key(key));
            assert_eq!(views.cache.descriptor(key), Some(PERMISSIVE_DESCRIPTOR));
        }
    }

    #[test]
    fn views_follow_filesystem_changes() {
        let native = tree();
        let fs = convert_native_fs(&native);
        let views = create_glob_interceptor(&fs);

        assert!(views.cache.get("/dir").unwrap().is_directory());
        native.unlink("/dir/file.txt").unwrap();
        native.rmdir("/dir").unwrap();
        assert_eq!(views.cache.get("/dir"), Ok(ListingEntry::Missing));
        assert_eq!(views.cache.get("/link"), Ok(ListingEntry::File));
    }

    #[test]
    fn works_over_trait_objects() {
        let native = tree();
        let fs: Box<dyn GlobFileSystem + '_> = Box::new(convert_native_fs(&native));
        let views = create_glob_interceptor(fs.as_ref());
        assert_eq!(views.symlinks.get("/link"), Ok(true));
    }
}
