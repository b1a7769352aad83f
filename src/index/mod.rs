//! Library index
//!
//! The index maps library names to published releases. The orchestrator only
//! sees the [`IndexLookup`] trait; [`LibraryIndex`] is the file-backed
//! implementation used by the CLI.
//!
//! Index files are YAML (or JSON, by `.json` extension):
//!
//! ```yaml
//! libraries:
//!   - name: Servo
//!     version: 1.1.0
//!     url: https://downloads.example.com/Servo-1.1.0.zip
//!     size: 48213
//!     checksum: "SHA-256:9f86d08188..."
//! ```


use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LibrarianError, Result};
use crate::release::{ReleaseDescriptor, ReleaseSelector, SourceKind, Version};

/// Resolves a name/version selector to a concrete release
pub trait IndexLookup: Send + Sync {
    /// `None` when no release matches
    fn lookup(&self, selector: &ReleaseSelector) -> Option<ReleaseDescriptor>;
}

/// Single release entry of the index file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRelease {
    pub name: String,
    pub version: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl IndexRelease {
    fn to_descriptor(&self) -> ReleaseDescriptor {
        let mut descriptor = ReleaseDescriptor::new(
            self.name.clone(),
            Version::parse(&self.version),
            SourceKind::Index,
            self.url.clone(),
        );
        if let Some(size) = self.size {
            descriptor = descriptor.with_size(size);
        }
        if let Some(checksum) = &self.checksum {
            descriptor = descriptor.with_checksum(checksum.clone());
        }
        descriptor
    }
}

/// File-backed library index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryIndex {
    #[serde(default)]
    libraries: Vec<IndexRelease>,
}

impl LibraryIndex {
    pub fn new(libraries: Vec<IndexRelease>) -> Self {
        Self { libraries }
    }

    /// Load an index file; `.json` files are read as JSON, everything else
    /// as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LibrarianError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| LibrarianError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        let index: Self = parsed.map_err(|reason| LibrarianError::ConfigParseFailed {
            path: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(
            "Loaded {} releases from index {}",
            index.libraries.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn releases(&self) -> &[IndexRelease] {
        &self.libraries
    }

    /// Semver releases rank above opaque ones; among equals the entry listed
    /// last wins.
    fn rank(a: &Version, b: &Version) -> Ordering {
        match (a.as_semver(), b.as_semver()) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

impl IndexLookup for LibraryIndex {
    fn lookup(&self, selector: &ReleaseSelector) -> Option<ReleaseDescriptor> {
        self.libraries
            .iter()
            .filter(|release| release.name == selector.name)
            .map(IndexRelease::to_descriptor)
            .filter(|descriptor| selector.constraint.matches(descriptor.version()))
            .max_by(|a, b| Self::rank(a.version(), b.version()))
    }
}
