//! Common test utilities for Librarian integration tests

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A librarian home with its own libraries directory, downloads cache and
/// index file
pub struct TestHome {
    /// Temporary directory
    pub temp: TempDir,
    /// Librarian home (`LIBRARIAN_HOME`)
    pub path: PathBuf,
    index: Vec<String>,
}

impl TestHome {
    /// Create a new, empty home
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("home");
        fs::create_dir_all(&path).expect("Failed to create home directory");
        Self {
            temp,
            path,
            index: Vec::new(),
        }
    }

    pub fn libraries(&self) -> PathBuf {
        self.path.join("libraries")
    }

    /// Command running the librarian binary against this home
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("librarian").expect("librarian binary");
        cmd.env("LIBRARIAN_HOME", &self.path);
        cmd.env_remove("LIBRARIAN_LIBRARIES_DIR");
        cmd.env_remove("LIBRARIAN_INDEX");
        cmd.env_remove("RUST_LOG");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    /// Write a file relative to the temp root
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.temp.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Read a file from the libraries directory
    pub fn read_library_file(&self, path: &str) -> String {
        fs::read_to_string(self.libraries().join(path)).expect("Failed to read library file")
    }

    pub fn library_exists(&self, path: &str) -> bool {
        self.libraries().join(path).exists()
    }

    /// Non-hidden and hidden entries of the libraries directory, sorted
    pub fn library_entries(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.libraries()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Build a library archive under the temp root and return its path
    pub fn library_zip(&self, file_name: &str, name: &str, version: Option<&str>) -> PathBuf {
        let path = self.temp.path().join("dist").join(file_name);
        let mut entries = vec![(format!("{name}/src/{name}.h"), "#pragma once\n".to_string())];
        if let Some(version) = version {
            entries.push((
                format!("{name}/library.yaml"),
                format!("name: {name}\nversion: {version}\ndescription: The {name} library\n"),
            ));
        }
        write_zip(&path, &entries);
        path
    }

    /// Publish `name@version` in the home's index
    pub fn publish(&mut self, name: &str, version: &str) -> PathBuf {
        let archive = self.library_zip(&format!("{name}-{version}.zip"), name, Some(version));
        let size = fs::metadata(&archive).expect("archive metadata").len();
        self.index.push(format!(
            "  - name: {name}\n    version: \"{version}\"\n    url: \"file://{}\"\n    size: {size}\n",
            archive.display()
        ));
        self.write_index();
        archive
    }

    fn write_index(&self) {
        let content = format!("libraries:\n{}", self.index.concat());
        fs::write(self.path.join("index.yaml"), content).expect("Failed to write index");
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a zip archive with the given entries
pub fn write_zip(path: &Path, entries: &[(String, String)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create archive directory");
    }
    let mut zip = zip::ZipWriter::new(File::create(path).expect("Failed to create archive"));
    for (name, content) in entries {
        zip.start_file(name.as_str(), SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(content.as_bytes())
            .expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish archive");
}

/// Create a git repository with one commit tagged `v1.0.0`
pub fn init_git_library(dir: &Path, name: &str) {
    fs::create_dir_all(dir).expect("Failed to create repository directory");
    let repo = git2::Repository::init(dir).expect("Failed to init repository");
    fs::write(dir.join(format!("{name}.h")), "#pragma once\n").expect("Failed to write header");

    let mut index = repo.index().expect("index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("add files");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("find tree");
    let sig = git2::Signature::now("Test", "test@test.com").expect("signature");
    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("commit");
    let commit = repo.find_commit(oid).expect("find commit");
    repo.tag_lightweight("v1.0.0", commit.as_object(), false)
        .expect("tag");
}
