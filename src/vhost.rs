//! Virtual host resolution
//!
//! Maps the value of a request's `Host` header onto the document root that
//! serves it, and turns request URLs into filesystem paths that are
//! guaranteed to stay inside that root.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};
use thiserror::Error;

/// Why a request could not be mapped onto a file path.
///
/// Both cases are answered with 404 Not Found.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No document root is configured for the requested host.
    #[error("unknown virtual host {0:?}")]
    UnknownHost(String),

    /// The cleaned path lies outside the host's document root.
    #[error("path {path:?} escapes document root {root:?}")]
    PathEscape { path: PathBuf, root: PathBuf },
}

/// Read-only mapping from host name to document root.
///
/// Built once at startup and shared between connection tasks.
#[derive(Debug, Clone, Default)]
pub struct VirtualHosts {
    roots: HashMap<String, PathBuf>,
}

impl VirtualHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `root` for `host`, replacing any previous root.
    ///
    /// The root is stored lexically cleaned so containment checks compare
    /// like with like.
    pub fn insert(&mut self, host: impl Into<String>, root: impl AsRef<Path>) -> Option<PathBuf> {
        self.roots.insert(host.into(), clean_path(root.as_ref()))
    }

    /// Looks up the document root for `host`.
    pub fn resolve(&self, host: &str) -> Option<&Path> {
        self.roots.get(host).map(PathBuf::as_path)
    }

    /// Computes the file a request for `url` on `host` refers to.
    pub fn candidate_path(&self, host: &str, url: &str) -> Result<PathBuf, ResolveError> {
        let root = self
            .resolve(host)
            .ok_or_else(|| ResolveError::UnknownHost(host.to_string()))?;

        let mut joined = root.as_os_str().to_owned();
        joined.push(url);
        let path = clean_path(Path::new(&joined));

        if !path.starts_with(root) {
            return Err(ResolveError::PathEscape {
                path,
                root: root.to_path_buf(),
            });
        }

        Ok(path)
    }

    /// Checks that every document root exists and is a directory.
    pub fn verify(&self) -> anyhow::Result<()> {
        for (host, root) in &self.roots {
            let meta = std::fs::metadata(root)
                .with_context(|| format!("docroot {} for host {host} does not exist", root.display()))?;
            if !meta.is_dir() {
                bail!("docroot {} for host {host} is not a directory", root.display());
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.roots.iter().map(|(h, r)| (h.as_str(), r.as_path()))
    }
}

/// Shortest path equivalent to `path` by purely lexical processing.
///
/// `.` segments are dropped and `..` removes the preceding segment. A `..`
/// at the root stays at the root; leading `..` on a relative path is kept.
/// The filesystem is never consulted.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
