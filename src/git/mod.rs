//! Git operations for installing libraries from repositories
//!
//! This module handles:
//! - Cloning repositories (HTTPS, SSH and local) into a target directory
//! - Checking out an optional ref (branch, tag or SHA)
//! - Stripping the `.git` directory so the installed library is not a repository
//!
//! The orchestrator only sees [`GitCloner`]; [`Git2Cloner`] is the libgit2
//! implementation.

pub mod auth;
pub mod url;

use std::fs;
use std::path::Path;

use git2::{ErrorClass, FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};

use crate::error::CollaboratorError;

use self::auth::setup_auth_callbacks;
use self::url::{is_local_url, normalize_file_url, normalize_ssh_url};

/// Clones a repository into a directory that does not exist yet
pub trait GitCloner: Send + Sync {
    fn clone_repo(
        &self,
        url: &str,
        git_ref: Option<&str>,
        target: &Path,
    ) -> Result<(), CollaboratorError>;
}

/// libgit2-backed cloner
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Cloner;

impl GitCloner for Git2Cloner {
    fn clone_repo(
        &self,
        url: &str,
        git_ref: Option<&str>,
        target: &Path,
    ) -> Result<(), CollaboratorError> {
        {
            let repo = clone(url, target, git_ref.is_none())?;
            if let Some(git_ref) = git_ref {
                checkout_ref(&repo, git_ref)?;
            }
        }

        let git_dir = target.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir)
                .map_err(|e| format!("Failed to remove {}: {e}", git_dir.display()))?;
        }
        Ok(())
    }
}

/// Clone `url` into `target`. Shallow only for remote URLs.
fn clone(url: &str, target: &Path, shallow: bool) -> Result<Repository, String> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    if shallow && !is_local_url(url) {
        fetch_options.depth(1);
    }

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);

    let normalized = normalize_ssh_url(url);
    let normalized = normalize_file_url(&normalized);
    tracing::debug!("Cloning {} into {}", normalized, target.display());

    builder
        .clone(normalized.as_ref(), target)
        .map_err(|e| format!("Failed to clone {url}: {}", interpret_git_error(&e)))
}

/// Detach HEAD at `git_ref` and force the working tree to match
fn checkout_ref(repo: &Repository, git_ref: &str) -> Result<(), String> {
    let candidates = [
        git_ref.to_string(),
        format!("refs/tags/{git_ref}"),
        format!("refs/remotes/origin/{git_ref}"),
        format!("refs/heads/{git_ref}"),
    ];

    let commit = candidates
        .iter()
        .find_map(|candidate| {
            repo.revparse_single(candidate)
                .and_then(|object| object.peel_to_commit())
                .ok()
        })
        .ok_or_else(|| format!("Failed to resolve git ref '{git_ref}'"))?;

    repo.set_head_detached(commit.id())
        .and_then(|()| {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.force();
            repo.checkout_head(Some(&mut checkout))
        })
        .map_err(|e| format!("Failed to checkout '{git_ref}': {}", e.message()))
}

/// Turn a libgit2 error into a short user-facing reason
fn interpret_git_error(err: &git2::Error) -> String {
    let message = err.message().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if has(&["not found", "404", "too many redirects", "authentication replays"]) {
        "Repository not found".to_string()
    } else if has(&["authentication", "credentials"]) {
        "Authentication failed".to_string()
    } else if has(&["permission denied", "access denied"]) {
        "Permission denied".to_string()
    } else if has(&["connection", "network", "timeout", "timed out"]) {
        "Network error".to_string()
    } else {
        match err.class() {
            ErrorClass::Http => format!("HTTP error: {}", err.message()),
            ErrorClass::Ssh => format!("SSH error: {}", err.message()),
            _ => err.message().to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a repository with one commit containing `files`, tagged `v1.0.0`
    pub(crate) fn init_repo_with_files(dir: &Path, files: &[(&str, &str)]) -> git2::Oid {
        let repo = Repository::init(dir).unwrap();
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }

        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
        let commit = repo.find_commit(oid).unwrap();
        repo.tag_lightweight("v1.0.0", commit.as_object(), false)
            .unwrap();
        oid
    }

    #[test]
    fn test_clone_local_repository_strips_git_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Servo");
        fs::create_dir_all(&source).unwrap();
        init_repo_with_files(&source, &[("library.yaml", "name: Servo\n"), ("Servo.h", "//")]);

        let target = temp.path().join("out");
        Git2Cloner
            .clone_repo(&format!("file://{}", source.display()), None, &target)
            .unwrap();

        assert!(target.join("Servo.h").is_file());
        assert!(target.join("library.yaml").is_file());
        assert!(!target.join(".git").exists());
    }

    #[test]
    fn test_clone_through_shared_cloner() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Servo");
        fs::create_dir_all(&source).unwrap();
        init_repo_with_files(&source, &[("Servo.h", "//")]);

        let cloner: std::sync::Arc<dyn GitCloner> = std::sync::Arc::new(Git2Cloner);
        let target = temp.path().join("out");
        cloner
            .clone_repo(&source.display().to_string(), None, &target)
            .unwrap();
        assert!(target.join("Servo.h").is_file());
    }

    #[test]
    fn test_clone_with_tag_ref() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Servo");
        fs::create_dir_all(&source).unwrap();
        init_repo_with_files(&source, &[("Servo.h", "// v1")]);

        let target = temp.path().join("out");
        Git2Cloner
            .clone_repo(&source.display().to_string(), Some("v1.0.0"), &target)
            .unwrap();
        assert_eq!(fs::read_to_string(target.join("Servo.h")).unwrap(), "// v1");
    }

    #[test]
    fn test_clone_unknown_ref_fails() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Servo");
        fs::create_dir_all(&source).unwrap();
        init_repo_with_files(&source, &[("Servo.h", "//")]);

        let err = Git2Cloner
            .clone_repo(
                &source.display().to_string(),
                Some("does-not-exist"),
                &temp.path().join("out"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn test_clone_missing_repository_fails() {
        let temp = TempDir::new().unwrap();
        let result = Git2Cloner.clone_repo(
            &format!("file://{}", temp.path().join("missing").display()),
            None,
            &temp.path().join("out"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_interpret_git_error() {
        let err = git2::Error::new(
            git2::ErrorCode::NotFound,
            ErrorClass::Http,
            "remote returned 404",
        );
        assert_eq!(interpret_git_error(&err), "Repository not found");

        let err = git2::Error::new(
            git2::ErrorCode::GenericError,
            ErrorClass::Ssh,
            "handshake went sideways",
        );
        assert_eq!(
            interpret_git_error(&err),
            "SSH error: handshake went sideways"
        );
    }
}
