//! Where an install request gets its library from
//!
//! Each variant resolves its own [`ReleaseDescriptor`] and produces the
//! staged payload; everything else is shared by [`Installer::run`].

use std::path::{Path, PathBuf};

use crate::archive::ArchiveFormat;
use crate::error::Result;
use crate::error::index::not_found;
use crate::error::install::{fetch_failed, prerequisite_failed};
use crate::git::url::{library_name_from_url, split_ref};
use crate::progress::{DownloadSink, TaskReporter};
use crate::release::{
    InstalledPackageRef, LibraryMetadata, ReleaseDescriptor, ReleaseSelector, SourceKind,
    UNVERSIONED, Version,
};

use super::Installer;
use super::fetch::Fetcher;
use super::staging::{StagingSlot, library_root};

/// Fetched content, ready for the materializer
#[derive(Debug)]
pub(crate) enum Payload {
    /// Archive that still has to be extracted
    Archive(PathBuf),
    /// Library tree already inside the staging area
    Tree(PathBuf),
}

pub(crate) trait InstallSource {
    /// What the request is about, before it has been resolved
    fn label(&self) -> String;

    /// Title of the `Begin` event, asked once before resolving (`None`) and
    /// once after the prerequisite check (`Some`)
    fn announce(&self, release: Option<&ReleaseDescriptor>) -> Option<String>;

    fn resolve(
        &mut self,
        installer: &Installer,
        staging: &mut StagingSlot,
    ) -> Result<ReleaseDescriptor>;

    /// Whether the installed set is consulted before installing
    fn consults_catalog(&self) -> bool;

    fn fetch(
        &mut self,
        installer: &Installer,
        release: &ReleaseDescriptor,
        staging: &mut StagingSlot,
        task: &TaskReporter<'_>,
    ) -> Result<Payload>;

    fn placing_message(
        &self,
        release: &ReleaseDescriptor,
        target: &Path,
        conflicting: Option<&InstalledPackageRef>,
    ) -> String;

    fn completion_message(&self, release: &ReleaseDescriptor) -> String;
}

/// Release published in the library index
pub(crate) struct IndexSource<'a> {
    selector: &'a ReleaseSelector,
    downloads: &'a dyn DownloadSink,
}

impl<'a> IndexSource<'a> {
    pub(crate) fn new(selector: &'a ReleaseSelector, downloads: &'a dyn DownloadSink) -> Self {
        Self {
            selector,
            downloads,
        }
    }
}

impl InstallSource for IndexSource<'_> {
    fn label(&self) -> String {
        self.selector.to_string()
    }

    fn announce(&self, release: Option<&ReleaseDescriptor>) -> Option<String> {
        release.map(|release| format!("Installing {release}"))
    }

    fn resolve(&mut self, installer: &Installer, _: &mut StagingSlot) -> Result<ReleaseDescriptor> {
        installer
            .index
            .lookup(self.selector)
            .ok_or_else(|| not_found(self.label()))
    }

    fn consults_catalog(&self) -> bool {
        true
    }

    fn fetch(
        &mut self,
        installer: &Installer,
        release: &ReleaseDescriptor,
        _: &mut StagingSlot,
        task: &TaskReporter<'_>,
    ) -> Result<Payload> {
        let fetcher = Fetcher {
            downloader: installer.downloader.as_ref(),
            downloads_dir: &installer.downloads_dir,
        };
        fetcher
            .fetch(release, task, self.downloads)
            .map(Payload::Archive)
            .map_err(|(context, cause)| fetch_failed(release.to_string(), context, cause))
    }

    fn placing_message(
        &self,
        release: &ReleaseDescriptor,
        target: &Path,
        conflicting: Option<&InstalledPackageRef>,
    ) -> String {
        match conflicting {
            Some(old) => format!("Replacing {old} with {release}"),
            None => format!("Extracting {release} into {}", target.display()),
        }
    }

    fn completion_message(&self, release: &ReleaseDescriptor) -> String {
        format!("Installed {release}")
    }
}

/// Local archive file
pub(crate) struct ArchiveSource<'a> {
    path: &'a Path,
    root: Option<PathBuf>,
}

impl<'a> ArchiveSource<'a> {
    pub(crate) fn new(path: &'a Path) -> Self {
        Self { path, root: None }
    }

    /// File name without its archive extension
    fn stem(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let lower = file_name.to_lowercase();
        [".tar.gz", ".tgz", ".tar", ".zip"]
            .iter()
            .find(|ext| lower.ends_with(*ext))
            .map_or(file_name.clone(), |ext| {
                file_name[..file_name.len() - ext.len()].to_string()
            })
    }
}

impl InstallSource for ArchiveSource<'_> {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn announce(&self, release: Option<&ReleaseDescriptor>) -> Option<String> {
        match release {
            None => Some(format!("Installing archive {}", self.path.display())),
            Some(_) => None,
        }
    }

    fn resolve(
        &mut self,
        installer: &Installer,
        staging: &mut StagingSlot,
    ) -> Result<ReleaseDescriptor> {
        let label = self.label();
        let reading = format!("reading {}", self.path.display());

        if !self.path.is_file() {
            return Err(fetch_failed(label, reading, "archive not found"));
        }
        ArchiveFormat::detect(self.path).map_err(|e| fetch_failed(&label, &reading, e))?;

        let content = staging
            .get()
            .map_err(|e| fetch_failed(&label, "creating staging area", e))?
            .content_dir();
        installer
            .extractor
            .extract(self.path, &content)
            .map_err(|e| fetch_failed(&label, format!("extracting {}", self.path.display()), e))?;
        let root = library_root(&content).map_err(|e| fetch_failed(&label, &reading, e))?;

        let metadata = LibraryMetadata::read_from(&root)
            .map_err(|e| fetch_failed(&label, "reading library metadata", e))?;
        let (name, version) = match metadata {
            Some(metadata) => (metadata.name.clone(), metadata.version()),
            None => {
                let name = if root == content {
                    self.stem()
                } else {
                    root.file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| self.stem())
                };
                (name, Version::parse(UNVERSIONED))
            }
        };
        tracing::debug!("Archive {} holds {}@{}", self.path.display(), name, version);

        self.root = Some(root);
        Ok(ReleaseDescriptor::new(
            name,
            version,
            SourceKind::Archive,
            self.path.display().to_string(),
        ))
    }

    fn consults_catalog(&self) -> bool {
        false
    }

    fn fetch(
        &mut self,
        _: &Installer,
        release: &ReleaseDescriptor,
        _: &mut StagingSlot,
        _: &TaskReporter<'_>,
    ) -> Result<Payload> {
        self.root.take().map(Payload::Tree).ok_or_else(|| {
            fetch_failed(
                release.to_string(),
                format!("reading {}", self.path.display()),
                "archive has not been extracted",
            )
        })
    }

    fn placing_message(
        &self,
        release: &ReleaseDescriptor,
        target: &Path,
        _: Option<&InstalledPackageRef>,
    ) -> String {
        format!("Extracting {release} into {}", target.display())
    }

    fn completion_message(&self, release: &ReleaseDescriptor) -> String {
        format!("Installed {release} from archive")
    }
}

/// Git repository URL, optionally pinned with a `#ref` fragment
pub(crate) struct GitSource<'a> {
    url: &'a str,
}

impl<'a> GitSource<'a> {
    pub(crate) fn new(url: &'a str) -> Self {
        Self { url }
    }
}

impl InstallSource for GitSource<'_> {
    fn label(&self) -> String {
        self.url.to_string()
    }

    fn announce(&self, release: Option<&ReleaseDescriptor>) -> Option<String> {
        match release {
            None => Some(format!("Cloning {}", self.url)),
            Some(_) => None,
        }
    }

    fn resolve(&mut self, _: &Installer, _: &mut StagingSlot) -> Result<ReleaseDescriptor> {
        let (repo, git_ref) = split_ref(self.url);
        let name = library_name_from_url(repo).ok_or_else(|| {
            prerequisite_failed(
                self.label(),
                "deriving the library name",
                "URL has no repository path",
            )
        })?;
        Ok(ReleaseDescriptor::new(
            name,
            Version::parse(git_ref.unwrap_or("HEAD")),
            SourceKind::Git,
            self.url,
        ))
    }

    fn consults_catalog(&self) -> bool {
        false
    }

    fn fetch(
        &mut self,
        installer: &Installer,
        release: &ReleaseDescriptor,
        staging: &mut StagingSlot,
        _: &TaskReporter<'_>,
    ) -> Result<Payload> {
        let package = release.to_string();
        let (repo, git_ref) = split_ref(self.url);
        let content = staging
            .get()
            .map_err(|e| fetch_failed(&package, "creating staging area", e))?
            .content_dir();

        installer
            .git
            .clone_repo(repo, git_ref, &content)
            .map_err(|e| fetch_failed(&package, format!("cloning {repo}"), e))?;
        Ok(Payload::Tree(content))
    }

    fn placing_message(
        &self,
        release: &ReleaseDescriptor,
        target: &Path,
        _: Option<&InstalledPackageRef>,
    ) -> String {
        format!("Installing {} into {}", release.name(), target.display())
    }

    fn completion_message(&self, release: &ReleaseDescriptor) -> String {
        format!("Installed {} from git", release.name())
    }
}
