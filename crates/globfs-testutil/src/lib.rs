//! Test utilities for globfs.
//!
//! - [`walker`]: a reference glob engine that reads only from the four lazy views
//! - [`counting`]: a call-counting [`GlobFileSystem`](globfs::GlobFileSystem) wrapper
//! - fixture trees shared by the scenario tests

pub mod counting;
pub mod walker;

use std::io;
use std::path::Path;

use globfs::MemoryFs;
use tracing_subscriber::EnvFilter;

pub use counting::{CallCounts, CountingFs};
pub use walker::{Glob, GlobCaches, GlobError, GlobOptions, OPTIONS_PROBE_KEY, glob_sync};

/// Files of the standard fixture tree, relative to its root.
pub const FIXTURE_FILES: &[&str] = &[
    "a/b/x/x.txt",
    "a/b/b.txt",
    "a/c/.gitkeep",
    "a/d/d.txt",
    "a/a.txt",
];

/// Contents written to every fixture file.
pub const FIXTURE_CONTENT: &[u8] = b"i love tests";

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// The fixture tree as a simulated filesystem rooted at `cwd`.
pub fn fixture_memory_fs(cwd: &str) -> io::Result<MemoryFs> {
    MemoryFs::from_files(FIXTURE_FILES.iter().map(|path| (*path, FIXTURE_CONTENT)), cwd)
}

/// Write the fixture tree to the real filesystem under `root`.
pub fn write_fixture_tree(root: &Path) -> io::Result<()> {
    for path in FIXTURE_FILES {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, FIXTURE_CONTENT)?;
    }
    Ok(())
}
