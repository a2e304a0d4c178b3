//! On-disk requirement cache keyed by package version

use super::RequirementSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CACHE_FILE_NAME: &str = "buildreq_cache.json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to access requirement cache {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Malformed requirement cache {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: String,
    requirements: Vec<String>,
    #[serde(default)]
    stored_at: Option<String>,
}

/// Persists a [`RequirementSet`] between runs of the same package version.
#[derive(Debug, Clone)]
pub struct RequirementCache {
    path: PathBuf,
}

impl RequirementCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file inside a package directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore cached requirements into `set` when the cached version matches.
    ///
    /// Returns the number of entries restored. A missing cache or a cache for
    /// another version restores nothing.
    pub fn load_into(&self, version: &str, set: &mut RequirementSet) -> Result<usize, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let cached: CacheFile =
            serde_json::from_str(&content).map_err(|source| CacheError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        if cached.version != version {
            debug!(
                cached = %cached.version,
                current = %version,
                "Requirement cache is for another version, ignoring"
            );
            return Ok(0);
        }

        let restored = set.extend_entries(cached.requirements);
        info!("Restored {} cached build requirement(s)", restored);
        Ok(restored)
    }

    pub fn store(&self, version: &str, set: &RequirementSet) -> Result<(), CacheError> {
        let file = CacheFile {
            version: version.to_string(),
            requirements: set.iter().map(str::to_string).collect(),
            stored_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| CacheError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
