//! Reference glob walker.
//!
//! A small synchronous glob engine whose only view of the filesystem is the
//! four caches it is configured with. It never stats or lists anything itself,
//! so a pass over a [`GlobInterceptor`] exercises exactly the lazy-read
//! contract of the views.
//!
//! Supported syntax: one pattern, split on `/`. A segment of `**` matches zero
//! or more directories and never crawls symlinked directories; any other
//! segment is matched against single entry names with `globset`.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::path::Path;

use globfs::{
    CacheView, GlobFileSystem, GlobInterceptor, InterceptError, ListingEntry, StatShape,
};
use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Key the realpath routine reads from its cache to pick up resolver options.
///
/// A cache that refuses it sends the walker down the component-wise path.
pub const OPTIONS_PROBE_KEY: &str = "encoding";

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("empty glob pattern")]
    EmptyPattern,

    #[error("invalid glob segment '{segment}': {source}")]
    InvalidPattern {
        segment: String,
        #[source]
        source: globset::Error,
    },

    #[error("cannot determine working directory: {0}")]
    Cwd(#[from] std::io::Error),
}

/// Options for one matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GlobOptions {
    /// Directory the pattern is matched from. Relative values resolve
    /// against the process working directory.
    pub cwd: String,
    /// Let wildcards match names starting with `.`.
    pub dot: bool,
    /// Drop directories from the results.
    pub nodir: bool,
    /// Report absolute paths.
    pub absolute: bool,
    /// Report fully resolved real paths (implies absolute).
    pub realpath: bool,
    /// Append `/` to directories.
    pub mark: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            cwd: "/".to_string(),
            dot: false,
            nodir: false,
            absolute: false,
            realpath: false,
            mark: false,
        }
    }
}

impl GlobOptions {
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = cwd.into();
        self
    }
}

/// The cache slots of the walker, as trait objects.
pub struct GlobCaches<'a> {
    pub cache: &'a dyn CacheView<Value = ListingEntry, Error = Infallible>,
    pub stat_cache: &'a dyn CacheView<Value = Option<&'static StatShape>, Error = Infallible>,
    pub realpath_cache: &'a dyn CacheView<Value = String, Error = InterceptError>,
    pub symlinks: &'a dyn CacheView<Value = bool, Error = Infallible>,
}

impl<'a, F> From<&'a GlobInterceptor<'a, F>> for GlobCaches<'a>
where
    F: GlobFileSystem + ?Sized + 'a,
{
    fn from(interceptor: &'a GlobInterceptor<'a, F>) -> Self {
        Self {
            cache: &interceptor.cache,
            stat_cache: &interceptor.stat_cache,
            realpath_cache: &interceptor.realpath_cache,
            symlinks: &interceptor.symlinks,
        }
    }
}

enum Segment {
    Globstar,
    Pattern { source: String, matcher: GlobMatcher },
}

/// A compiled pattern bound to its options and caches.
pub struct Glob<'a> {
    segments: Vec<Segment>,
    options: GlobOptions,
    cwd: String,
    caches: GlobCaches<'a>,
}

impl<'a> Glob<'a> {
    pub fn new(pattern: &str, options: GlobOptions, caches: GlobCaches<'a>) -> Result<Self, GlobError> {
        let segments = compile(pattern)?;
        let cwd = absolute_cwd(&options.cwd)?;
        debug!(pattern, cwd = %cwd, segments = segments.len(), "compiled glob");
        Ok(Self {
            segments,
            options,
            cwd,
            caches,
        })
    }

    /// Run one matching pass. Results are sorted and unique.
    pub fn matches(&self) -> Vec<String> {
        let mut found = BTreeSet::new();
        self.process(None, &self.segments, &mut found);

        let resolve_real = self.options.realpath && self.trusts_fast_realpath();
        let mut results = BTreeSet::new();
        for matched in found {
            let abs = self.absolute(Some(&matched));
            let Some(is_dir) = self.stat_is_dir(&abs) else {
                continue;
            };
            if self.options.nodir && is_dir {
                continue;
            }

            let mut out = if self.options.realpath {
                if resolve_real {
                    self.caches.realpath_cache.get(&abs).unwrap_or(abs)
                } else {
                    self.realpath_by_components(&abs)
                }
            } else if self.options.absolute {
                abs
            } else {
                matched
            };
            if self.options.mark && is_dir && !out.ends_with('/') {
                out.push('/');
            }
            results.insert(out);
        }

        debug!(cwd = %self.cwd, matches = results.len(), "glob pass finished");
        results.into_iter().collect()
    }

    fn process(&self, prefix: Option<&str>, remain: &[Segment], found: &mut BTreeSet<String>) {
        let Some((segment, rest)) = remain.split_first() else {
            if let Some(prefix) = prefix {
                found.insert(prefix.to_string());
            }
            return;
        };

        let abs = self.absolute(prefix);
        let Some(entries) = self.read_dir(&abs) else {
            return;
        };

        match segment {
            Segment::Globstar => {
                // Zero directories matched.
                self.process(prefix, rest, found);

                if prefix.is_some() && self.is_symlink(&abs) {
                    return;
                }
                for entry in entries.iter().filter(|e| self.options.dot || !e.starts_with('.')) {
                    let child = join_rel(prefix, entry);
                    self.process(Some(&child), rest, found);
                    self.process(Some(&child), remain, found);
                }
            }
            Segment::Pattern { source, matcher } => {
                for entry in &entries {
                    if !self.segment_matches(source, matcher, entry) {
                        continue;
                    }
                    let child = join_rel(prefix, entry);
                    if rest.is_empty() {
                        found.insert(child);
                    } else {
                        self.process(Some(&child), rest, found);
                    }
                }
            }
        }
    }

    fn segment_matches(&self, source: &str, matcher: &GlobMatcher, name: &str) -> bool {
        if name.starts_with('.') && !self.options.dot && !source.starts_with('.') {
            return false;
        }
        matcher.is_match(name)
    }

    /// Probe the realpath cache for resolver options.
    ///
    /// An answer means the cache is an ordinary options bag and entries can be
    /// looked up directly; a refusal means resolve component by component.
    fn trusts_fast_realpath(&self) -> bool {
        match self.caches.realpath_cache.get(OPTIONS_PROBE_KEY) {
            Ok(_) => true,
            Err(err) => {
                debug!(code = err.code(), syscall = err.syscall(), "realpath fast path refused");
                false
            }
        }
    }

    /// Walk `abs` from the root, swapping in the cached real path whenever
    /// a prefix is a symlink.
    fn realpath_by_components(&self, abs: &str) -> String {
        let mut resolved = String::from("/");
        for component in abs.split('/').filter(|c| !c.is_empty()) {
            let next = join_abs(&resolved, component);
            resolved = if self.is_symlink(&next) {
                self.caches.realpath_cache.get(&next).unwrap_or(next)
            } else {
                next
            };
        }
        resolved
    }

    fn read_dir(&self, abs: &str) -> Option<Vec<String>> {
        match self.caches.cache.get(abs).ok()? {
            ListingEntry::Entries(names) => Some(names),
            ListingEntry::File | ListingEntry::Missing => None,
        }
    }

    fn stat_is_dir(&self, abs: &str) -> Option<bool> {
        self.caches
            .stat_cache
            .get(abs)
            .ok()
            .flatten()
            .map(StatShape::is_directory)
    }

    fn is_symlink(&self, abs: &str) -> bool {
        self.caches.symlinks.get(abs).unwrap_or(false)
    }

    fn absolute(&self, rel: Option<&str>) -> String {
        match rel {
            Some(rel) => join_abs(&self.cwd, rel),
            None => self.cwd.clone(),
        }
    }
}

/// Compile and run a pattern in one go.
pub fn glob_sync(pattern: &str, options: GlobOptions, caches: GlobCaches<'_>) -> Result<Vec<String>, GlobError> {
    Ok(Glob::new(pattern, options, caches)?.matches())
}

fn compile(pattern: &str) -> Result<Vec<Segment>, GlobError> {
    if pattern.is_empty() {
        return Err(GlobError::EmptyPattern);
    }

    let mut segments = Vec::new();
    for part in pattern.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == "**" {
            // Adjacent globstars match the same thing as one.
            if !matches!(segments.last(), Some(Segment::Globstar)) {
                segments.push(Segment::Globstar);
            }
            continue;
        }
        let matcher = GlobBuilder::new(part)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| GlobError::InvalidPattern {
                segment: part.to_string(),
                source,
            })?
            .compile_matcher();
        segments.push(Segment::Pattern {
            source: part.to_string(),
            matcher,
        });
    }

    if segments.is_empty() {
        return Err(GlobError::EmptyPattern);
    }
    Ok(segments)
}

fn absolute_cwd(cwd: &str) -> Result<String, GlobError> {
    if cwd.starts_with('/') {
        return Ok(trim_trailing_slash(cwd));
    }
    let joined = std::env::current_dir()?.join(Path::new(cwd));
    Ok(trim_trailing_slash(&joined.to_string_lossy()))
}

fn trim_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn join_abs(dir: &str, rel: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{rel}")
    } else {
        format!("{dir}/{rel}")
    }
}

fn join_rel(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}/{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globfs::{MemoryFs, convert_native_fs, create_glob_interceptor};

    #[test]
    fn test_empty_pattern_rejected() {
        let native = MemoryFs::new();
        let fs = convert_native_fs(&native);
        let interceptor = create_glob_interceptor(&fs);

        let err = Glob::new("", GlobOptions::default(), (&interceptor).into()).err();
        assert!(matches!(err, Some(GlobError::EmptyPattern)));
        let err = Glob::new("./", GlobOptions::default(), (&interceptor).into()).err();
        assert!(matches!(err, Some(GlobError::EmptyPattern)));
    }

    #[test]
    fn test_invalid_segment_rejected() {
        let native = MemoryFs::new();
        let fs = convert_native_fs(&native);
        let interceptor = create_glob_interceptor(&fs);

        let err = Glob::new("a/[z-a", GlobOptions::default(), (&interceptor).into()).err();
        match err {
            Some(GlobError::InvalidPattern { segment, .. }) => assert_eq!(segment, "[z-a"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_segments() {
        let native = MemoryFs::new();
        native.write_file("/src/lib.rs", b"").unwrap();
        native.write_file("/src/main.rs", b"").unwrap();
        let fs = convert_native_fs(&native);
        let interceptor = create_glob_interceptor(&fs);

        let found = glob_sync("src/*.rs", GlobOptions::default(), (&interceptor).into()).unwrap();
        assert_eq!(found, vec!["src/lib.rs", "src/main.rs"]);
        let found = glob_sync("src/lib.rs", GlobOptions::default(), (&interceptor).into()).unwrap();
        assert_eq!(found, vec!["src/lib.rs"]);
    }

    #[test]
    fn test_explicit_dot_segment_matches_hidden() {
        let native = MemoryFs::new();
        native.write_file("/.hidden", b"").unwrap();
        native.write_file("/shown", b"").unwrap();
        let fs = convert_native_fs(&native);
        let interceptor = create_glob_interceptor(&fs);

        let found = glob_sync("*", GlobOptions::default(), (&interceptor).into()).unwrap();
        assert_eq!(found, vec!["shown"]);
        let found = glob_sync(".*", GlobOptions::default(), (&interceptor).into()).unwrap();
        assert_eq!(found, vec![".hidden"]);
    }

    #[test]
    fn test_cwd_trailing_slash() {
        assert_eq!(absolute_cwd("/foo/").unwrap(), "/foo");
        assert_eq!(absolute_cwd("/").unwrap(), "/");
    }
}
