//! Resource roots: logical `root/rest` references mapped to directories.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Separator between the resource root and the rest of a logical path.
pub const SEPARATOR: char = '/';

/// Resource resolution errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid resource root {root:?}: must be non-empty and contain no '/'")]
    InvalidRoot { root: String },

    #[error("no resource map provided for {path}")]
    Unmapped { root: String, path: String },

    #[error("cannot expand '~' in {dir}: home directory is unknown")]
    NoHomeDir { dir: String },

    #[error("failed to read {path} from {}: {source}", resolved.display())]
    Unreadable {
        path: String,
        resolved: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },
}

/// Mapping from resource root name to directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    roots: BTreeMap<String, String>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(root, dir)` pairs; later pairs win.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, ResourceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (root, dir) in entries {
            map.insert(root, dir)?;
        }
        Ok(map)
    }

    /// Map `root` to `dir`, returning the directory it replaced.
    pub fn insert(
        &mut self,
        root: impl Into<String>,
        dir: impl Into<String>,
    ) -> Result<Option<String>, ResourceError> {
        let root = root.into();
        if root.is_empty() || root.contains(SEPARATOR) {
            return Err(ResourceError::InvalidRoot { root });
        }
        Ok(self.roots.insert(root, dir.into()))
    }

    /// Apply every entry of `other` on top of this map.
    pub fn merge(&mut self, other: ResourceMap) {
        self.roots.extend(other.roots);
    }

    pub fn get(&self, root: &str) -> Option<&str> {
        self.roots.get(root).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.roots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve a logical path to a filesystem path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ResourceError> {
        let (root, rest) = split_root(path);
        let dir = match self.get(root) {
            Some(dir) if !dir.is_empty() => dir,
            _ => {
                return Err(ResourceError::Unmapped {
                    root: root.to_string(),
                    path: path.to_string(),
                })
            }
        };

        let base = expand_home(dir)?;
        let rest = rest.trim_start_matches(SEPARATOR);
        Ok(if rest.is_empty() { base } else { base.join(rest) })
    }

    /// Resolve and read a logical path.
    pub fn load(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let resolved = self.resolve(path)?;
        tracing::debug!(path, resolved = %resolved.display(), "loading resource file");

        fs::read(&resolved).map_err(|source| ResourceError::Unreadable {
            path: path.to_string(),
            resolved,
            source,
        })
    }

    /// Resolve and read a logical path as UTF-8 text.
    pub fn load_to_string(&self, path: &str) -> Result<String, ResourceError> {
        String::from_utf8(self.load(path)?).map_err(|_| ResourceError::NotUtf8 {
            path: path.to_string(),
        })
    }
}

/// Split a logical path into its root and the remainder.
pub fn split_root(path: &str) -> (&str, &str) {
    path.split_once(SEPARATOR).unwrap_or((path, ""))
}

/// Expand a leading `~` or `~/` against the home directory.
pub fn expand_home(dir: &str) -> Result<PathBuf, ResourceError> {
    let rest = match dir.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(SEPARATOR) => rest.trim_start_matches(SEPARATOR),
        _ => return Ok(PathBuf::from(dir)),
    };

    let home = dirs::home_dir().ok_or_else(|| ResourceError::NoHomeDir {
        dir: dir.to_string(),
    })?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}
