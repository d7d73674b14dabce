//! Memoizing decorator for [`GlobFileSystem`].
//!
//! Each operation gets its own table keyed by path. A key is computed at most
//! once per decorator, negative answers included. There is no invalidation:
//! build a fresh decorator per matching pass when passes must not share state.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::trace;

use crate::traits::{DirectoryState, GlobFileSystem};

/// Number of cached keys per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub is_directory: usize,
    pub is_symbolic_link: usize,
    pub read_directory: usize,
    pub realpath: usize,
}

/// A [`GlobFileSystem`] that remembers every answer of the one it wraps.
///
/// Not `Sync`: the tables live in `RefCell`s and are meant for one thread
/// and one pass. No table borrow is held while the wrapped implementation
/// runs, so re-entrant calls are fine.
#[derive(Debug, Default)]
pub struct MemoizedFs<F> {
    inner: F,
    is_directory: RefCell<HashMap<String, DirectoryState>>,
    is_symbolic_link: RefCell<HashMap<String, bool>>,
    read_directory: RefCell<HashMap<String, Vec<String>>>,
    realpath: RefCell<HashMap<String, String>>,
}

/// Wrap `fs` so each (operation, path) pair reaches it at most once.
pub fn memoize<F: GlobFileSystem>(fs: F) -> MemoizedFs<F> {
    MemoizedFs::new(fs)
}

impl<F: GlobFileSystem> MemoizedFs<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            is_directory: RefCell::default(),
            is_symbolic_link: RefCell::default(),
            read_directory: RefCell::default(),
            realpath: RefCell::default(),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Drop the caches and hand back the wrapped implementation.
    pub fn into_inner(self) -> F {
        self.inner
    }

    pub fn cached_entries(&self) -> CacheStats {
        CacheStats {
            is_directory: self.is_directory.borrow().len(),
            is_symbolic_link: self.is_symbolic_link.borrow().len(),
            read_directory: self.read_directory.borrow().len(),
            realpath: self.realpath.borrow().len(),
        }
    }
}

/// Read-through lookup: hit returns a clone, miss computes and stores.
fn lookup<V: Clone>(
    table: &RefCell<HashMap<String, V>>,
    op: &'static str,
    key: &str,
    compute: impl FnOnce() -> V,
) -> V {
    if let Some(hit) = table.borrow().get(key) {
        return hit.clone();
    }

    trace!(op, path = key, "cache miss");
    let value = compute();
    table
        .borrow_mut()
        .entry(key.to_string())
        .or_insert(value)
        .clone()
}

impl<F: GlobFileSystem> GlobFileSystem for MemoizedFs<F> {
    fn is_directory(&self, path: &str) -> DirectoryState {
        lookup(&self.is_directory, "is_directory", path, || {
            self.inner.is_directory(path)
        })
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        lookup(&self.is_symbolic_link, "is_symbolic_link", path, || {
            self.inner.is_symbolic_link(path)
        })
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        lookup(&self.read_directory, "read_directory", path, || {
            self.inner.read_directory(path)
        })
    }

    fn realpath(&self, path: &str) -> String {
        lookup(&self.realpath, "realpath", path, || self.inner.realpath(path))
    }
}
