//! Library install orchestration
//!
//! Every request, whatever its source, runs through the same stages:
//!
//! ```text
//! Resolving -> Checking -> Fetching -> Materializing -> Rescanning -> Done
//!                  \-> AlreadySatisfied (done, nothing fetched)
//! ```
//!
//! The first failing stage ends the request with an error tagged by that
//! stage. Nothing is retried. A successful request emits exactly one
//! `Complete` progress event, after the catalog has been rescanned; a failed
//! request emits none.
//!
//! Index installs consult the installed set and may report the request as
//! already satisfied. Archive and git installs never do: they always install,
//! swapping out whatever sits at the target path.

pub mod fetch;
pub mod materialize;
pub mod prerequisite;
pub mod source;
pub mod staging;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{ArchiveExtractor, Extractor};
use crate::catalog::Catalog;
use crate::download::{Downloader, FileDownloader};
use crate::error::Result;
use crate::error::install::{materialize_failed, prerequisite_failed, rescan_failed};
use crate::git::{Git2Cloner, GitCloner};
use crate::index::IndexLookup;
use crate::progress::{DownloadSink, ProgressSink, TaskReporter};
use crate::release::{
    InstalledPackageRef, LIBRARY_METADATA_FILE, LibraryMetadata, ReleaseDescriptor,
    ReleaseSelector,
};

use self::materialize::{Filesystem, LocalFs, Materializer, Move};
use self::prerequisite::{PrerequisiteDecision, target_path};
use self::source::{ArchiveSource, GitSource, IndexSource, InstallSource, Payload};
use self::staging::{StagingSlot, library_root};

/// Installs libraries into a libraries directory
///
/// Cheap to share between threads: requests for different libraries can run
/// concurrently on the same installer. Requests for the same library must be
/// serialized by the caller.
pub struct Installer {
    libraries_dir: PathBuf,
    downloads_dir: PathBuf,
    index: Arc<dyn IndexLookup>,
    catalog: Arc<dyn Catalog>,
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn Extractor>,
    git: Arc<dyn GitCloner>,
    fs: Arc<dyn Filesystem>,
}

impl Installer {
    /// Installer with the default downloader, extractor, git client and
    /// filesystem
    pub fn new(
        libraries_dir: impl Into<PathBuf>,
        downloads_dir: impl Into<PathBuf>,
        index: Arc<dyn IndexLookup>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            libraries_dir: libraries_dir.into(),
            downloads_dir: downloads_dir.into(),
            index,
            catalog,
            downloader: Arc::new(FileDownloader),
            extractor: Arc::new(ArchiveExtractor),
            git: Arc::new(Git2Cloner),
            fs: Arc::new(LocalFs),
        }
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_git_cloner(mut self, git: Arc<dyn GitCloner>) -> Self {
        self.git = git;
        self
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn libraries_dir(&self) -> &Path {
        &self.libraries_dir
    }

    /// Install a release from the index.
    ///
    /// Succeeds without doing anything when the same name and version are
    /// already installed; progress then carries a single "Already installed"
    /// event.
    pub fn install_from_index(
        &self,
        selector: &ReleaseSelector,
        downloads: &dyn DownloadSink,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        self.run(&mut IndexSource::new(selector, downloads), progress)
    }

    /// Install a library from a local zip, tar or tar.gz archive
    pub fn install_from_archive(&self, archive: &Path, progress: &dyn ProgressSink) -> Result<()> {
        self.run(&mut ArchiveSource::new(archive), progress)
    }

    /// Install a library from a git URL, optionally suffixed with `#<ref>`
    pub fn install_from_git(&self, url: &str, progress: &dyn ProgressSink) -> Result<()> {
        self.run(&mut GitSource::new(url), progress)
    }

    fn run(&self, source: &mut dyn InstallSource, progress: &dyn ProgressSink) -> Result<()> {
        let task = TaskReporter::new(progress);
        let mut staging = StagingSlot::new(&self.libraries_dir);
        let span = tracing::info_span!("install", request = %source.label());
        let _guard = span.enter();

        if let Some(title) = source.announce(None) {
            task.begin(title);
        }

        tracing::debug!("resolving");
        let release = source.resolve(self, &mut staging)?;

        tracing::debug!(release = %release, "checking");
        let (target, conflicting) = if source.consults_catalog() {
            match self.check_prerequisites(&release)? {
                PrerequisiteDecision::AlreadySatisfied { path } => {
                    tracing::debug!("{} already installed at {}", release, path.display());
                    task.complete(format!("Already installed {release}"));
                    return Ok(());
                }
                PrerequisiteDecision::CleanInstall { target } => (target, None),
                PrerequisiteDecision::ReplaceInstall {
                    target,
                    conflicting,
                } => (target, Some(conflicting)),
            }
        } else {
            let target = target_path(&self.libraries_dir, release.name()).map_err(|e| {
                prerequisite_failed(release.to_string(), "computing install path", e)
            })?;
            (target, None)
        };

        if let Some(title) = source.announce(Some(&release)) {
            task.begin(title);
        }

        tracing::debug!("fetching");
        let payload = source.fetch(self, &release, &mut staging, &task)?;

        tracing::debug!(target = %target.display(), "materializing");
        task.message(source.placing_message(&release, &target, conflicting.as_ref()));
        self.materialize(
            &release,
            payload,
            &target,
            conflicting.as_ref(),
            &mut staging,
        )?;
        // Superseded content goes with the staging area
        drop(staging);

        tracing::debug!("rescanning");
        self.catalog
            .rescan()
            .map_err(|e| rescan_failed(release.to_string(), e))?;

        task.complete(source.completion_message(&release));
        Ok(())
    }

    fn check_prerequisites(&self, release: &ReleaseDescriptor) -> Result<PrerequisiteDecision> {
        let package = release.to_string();
        let installed = self
            .catalog
            .list_installed()
            .map_err(|e| prerequisite_failed(&package, "listing installed libraries", e))?;

        prerequisite::check(release, &installed, &self.libraries_dir, self.fs.as_ref())
            .map_err(|e| prerequisite_failed(&package, "checking install destination", e))
    }

    fn materialize(
        &self,
        release: &ReleaseDescriptor,
        payload: Payload,
        target: &Path,
        conflicting: Option<&InstalledPackageRef>,
        slot: &mut StagingSlot,
    ) -> Result<()> {
        let package = release.to_string();
        let staging = slot
            .get()
            .map_err(|e| materialize_failed(&package, "creating staging area", e))?;

        let staged = match payload {
            Payload::Archive(archive) => {
                let context = format!("extracting {}", archive.display());
                let content = staging.content_dir();
                self.extractor
                    .extract(&archive, &content)
                    .map_err(|e| materialize_failed(&package, &context, e))?;
                library_root(&content).map_err(|e| materialize_failed(&package, &context, e))?
            }
            Payload::Tree(root) => root,
        };
        record_metadata(release, &staged)
            .map_err(|e| materialize_failed(&package, "recording library metadata", e))?;

        let previous = staging.previous_dir();
        let displaced_dir = staging.displaced_dir();
        let displaced = conflicting
            .filter(|old| old.path.as_path() != target && self.fs.exists(&old.path))
            .map(|old| (old.path.as_path(), displaced_dir.as_path()));

        let moves = Move {
            staged: &staged,
            target,
            previous: &previous,
            displaced,
        };
        match Materializer::new(self.fs.as_ref()).place(&moves) {
            Ok(placement) => {
                tracing::debug!(?placement, "placed {}", target.display());
                Ok(())
            }
            Err(err) => {
                let stranded = err.is_stranded();
                let err =
                    materialize_failed(&package, format!("swapping into {}", target.display()), err);
                if stranded {
                    if let Some(staging) = slot.take() {
                        let kept = staging.keep();
                        tracing::error!("Previous installation preserved in {}", kept.display());
                    }
                }
                Err(err)
            }
        }
    }
}

/// Give a staged library without `library.yaml` one naming `release`, so the
/// catalog reads back what was installed
fn record_metadata(release: &ReleaseDescriptor, root: &Path) -> Result<()> {
    if root.join(LIBRARY_METADATA_FILE).exists() {
        return Ok(());
    }
    tracing::debug!("Recording {} in {}", release, root.display());
    LibraryMetadata::for_release(release).write_to(root)
}
