//! Call-counting wrapper for observing how often a filesystem is asked.

use std::cell::Cell;

use globfs::{DirectoryState, GlobFileSystem};

/// Calls seen per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub is_directory: usize,
    pub is_symbolic_link: usize,
    pub read_directory: usize,
    pub realpath: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.is_directory + self.is_symbolic_link + self.read_directory + self.realpath
    }
}

/// Forwards to the wrapped [`GlobFileSystem`] and counts every call.
#[derive(Debug, Default)]
pub struct CountingFs<F> {
    inner: F,
    is_directory: Cell<usize>,
    is_symbolic_link: Cell<usize>,
    read_directory: Cell<usize>,
    realpath: Cell<usize>,
}

impl<F> CountingFs<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            is_directory: Cell::new(0),
            is_symbolic_link: Cell::new(0),
            read_directory: Cell::new(0),
            realpath: Cell::new(0),
        }
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            is_directory: self.is_directory.get(),
            is_symbolic_link: self.is_symbolic_link.get(),
            read_directory: self.read_directory.get(),
            realpath: self.realpath.get(),
        }
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl<F: GlobFileSystem> GlobFileSystem for CountingFs<F> {
    fn is_directory(&self, path: &str) -> DirectoryState {
        bump(&self.is_directory);
        self.inner.is_directory(path)
    }

    fn is_symbolic_link(&self, path: &str) -> bool {
        bump(&self.is_symbolic_link);
        self.inner.is_symbolic_link(path)
    }

    fn read_directory(&self, path: &str) -> Vec<String> {
        bump(&self.read_directory);
        self.inner.read_directory(path)
    }

    fn realpath(&self, path: &str) -> String {
        bump(&self.realpath);
        self.inner.realpath(path)
    }
}
