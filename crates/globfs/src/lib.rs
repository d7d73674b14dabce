//! globfs: a filesystem capability layer for glob engines.
//!
//! This crate provides:
//!
//! - **GlobFileSystem**: the four filesystem questions a glob pass asks
//! - **NativeAdapter**: answers them on top of a stat/lstat/readdir/realpath API
//!   (`StdFs` for the real disk, `MemoryFs` for simulated trees)
//! - **MemoizedFs**: asks the underlying filesystem at most once per path
//! - **GlobInterceptor**: four lazy views a glob engine reads as its own warm caches
//!
//! ```text
//! StdFs / MemoryFs ──convert_native_fs──▶ NativeAdapter
//!                                             │ memoize (optional)
//!                                             ▼
//!                          create_glob_interceptor ──▶ cache / stat_cache /
//!                                                      realpath_cache / symlinks
//! ```

mod error;
mod interceptor;
mod local;
mod memoize;
mod memory;
mod native;
mod traits;

pub use error::{FALLBACK_ERROR_CODE, InterceptError};
pub use interceptor::{
    CacheView, DIRECTORY_STATS, EntryDescriptor, FILE_STATS, GlobInterceptor, ListingEntry,
    ListingView, PERMISSIVE_DESCRIPTOR, RealpathView, StatShape, StatView, SymlinkView,
    create_glob_interceptor,
};
pub use local::StdFs;
pub use memoize::{CacheStats, MemoizedFs, memoize};
pub use memory::{EntryEncoding, MemoryFs};
pub use native::{NativeAdapter, convert_native_fs};
pub use traits::{
    DirEntryKind, DirectoryState, Dirent, GlobFileSystem, NativeFileSystem, RawDirEntry, RawPath,
    Stats,
};
