//! Release domain types
//!
//! Identities of installable library versions, of already-installed
//! libraries, and of the name/version selectors users type on the command
//! line.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LibrarianError, Result};

/// Metadata file every installed library carries at its root
pub const LIBRARY_METADATA_FILE: &str = "library.yaml";

/// Version used when a library does not declare one
pub const UNVERSIONED: &str = "unversioned";

/// A library version: semantic when it parses as one, opaque otherwise
#[derive(Debug, Clone)]
pub enum Version {
    Semver(semver::Version),
    Opaque(String),
}

impl Version {
    /// Parse leniently: `1.2` is read as `1.2.0`, anything that still is not
    /// semver is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(version) = semver::Version::parse(raw) {
            return Version::Semver(version);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if (1..3).contains(&parts.len())
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        {
            let mut padded = parts.join(".");
            for _ in parts.len()..3 {
                padded.push_str(".0");
            }
            if let Ok(version) = semver::Version::parse(&padded) {
                return Version::Semver(version);
            }
        }

        Version::Opaque(raw.to_string())
    }

    pub fn as_semver(&self) -> Option<&semver::Version> {
        match self {
            Version::Semver(v) => Some(v),
            Version::Opaque(_) => None,
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Version::Semver(a), Version::Semver(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Semver(v) => write!(f, "{v}"),
            Version::Opaque(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Version::parse(raw)
    }
}

/// Where a release comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Index,
    Archive,
    Git,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SourceKind::Index => "index",
            SourceKind::Archive => "archive",
            SourceKind::Git => "git",
        };
        f.write_str(kind)
    }
}

/// Immutable identity of an installable library version plus its source
/// location.
///
/// Two descriptors are equal when name and version are equal; the source
/// location does not take part in equality.
#[derive(Debug, Clone)]
pub struct ReleaseDescriptor {
    name: String,
    version: Version,
    source: SourceKind,
    locator: String,
    size: Option<u64>,
    checksum: Option<String>,
}

impl ReleaseDescriptor {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        source: SourceKind,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            source,
            locator: locator.into(),
            size: None,
            checksum: None,
        }
    }

    /// Expected download size published by the index
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Expected checksum published by the index, e.g. `SHA-256:ab12...`
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }
}

impl PartialEq for ReleaseDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for ReleaseDescriptor {}

impl fmt::Display for ReleaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A currently installed library, as seen by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackageRef {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
}

impl fmt::Display for InstalledPackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Version part of a selector
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    Latest,
    Exact(Version),
    Requirement(semver::VersionReq),
}

impl VersionConstraint {
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Latest => true,
            VersionConstraint::Exact(wanted) => wanted == version,
            VersionConstraint::Requirement(req) => {
                version.as_semver().is_some_and(|v| req.matches(v))
            }
        }
    }
}

/// What the user asked the index for: `Servo`, `Servo@1.1.0`, `Servo@^1.2`
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSelector {
    pub name: String,
    pub constraint: VersionConstraint,
}

impl ReleaseSelector {
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: VersionConstraint::Latest,
        }
    }

    pub fn exact(name: impl Into<String>, version: &str) -> Self {
        Self {
            name: name.into(),
            constraint: VersionConstraint::Exact(Version::parse(version)),
        }
    }

    /// Parse `name`, `name@latest`, `name@<version>` or `name@<requirement>`
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((name, version)) = spec.split_once('@') else {
            return Self::validate_name(spec).map(|()| Self::latest(spec));
        };

        Self::validate_name(name)?;
        let version = version.trim();
        if version.is_empty() {
            return Err(LibrarianError::ConfigInvalid {
                message: format!("missing version after '@' in '{spec}'"),
            });
        }
        if version == "latest" {
            return Ok(Self::latest(name));
        }

        let looks_like_requirement =
            version.starts_with(&['^', '~', '>', '<', '=', '*'][..]) || version.contains(',');
        if !looks_like_requirement {
            return Ok(Self::exact(name, version));
        }

        let req = semver::VersionReq::parse(version).map_err(|e| LibrarianError::ConfigInvalid {
            message: format!("invalid version requirement '{version}': {e}"),
        })?;
        Ok(Self {
            name: name.to_string(),
            constraint: VersionConstraint::Requirement(req),
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(LibrarianError::ConfigInvalid {
                message: "missing library name".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ReleaseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            VersionConstraint::Latest => f.write_str(&self.name),
            VersionConstraint::Exact(v) => write!(f, "{}@{v}", self.name),
            VersionConstraint::Requirement(req) => write!(f, "{}@{req}", self.name),
        }
    }
}

/// Directory name a library is installed under.
///
/// Every character outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Contents of `library.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibraryMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LibraryMetadata {
    /// Read `library.yaml` from a library root. `Ok(None)` when the file is
    /// absent.
    pub fn read_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(LIBRARY_METADATA_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| LibrarianError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let metadata: Self =
            serde_yaml::from_str(&content).map_err(|e| LibrarianError::ConfigParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(metadata))
    }

    /// Metadata naming `release`, for libraries that ship without their own
    pub fn for_release(release: &ReleaseDescriptor) -> Self {
        Self {
            name: release.name().to_string(),
            version: Some(release.version().to_string()),
            description: None,
        }
    }

    /// Write `library.yaml` into a library root
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(LIBRARY_METADATA_FILE);
        let content = serde_yaml::to_string(self)?;
        fs::write(&path, content).map_err(|e| LibrarianError::IoError {
            message: format!("Failed to write {}: {}", path.display(), e),
        })
    }

    pub fn version(&self) -> Version {
        Version::parse(self.version.as_deref().unwrap_or(UNVERSIONED))
    }
}
