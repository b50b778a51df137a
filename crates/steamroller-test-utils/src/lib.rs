//! Test utilities for steamroller crates.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// A temporary directory standing in for one resource root.
pub struct ResourceFixture {
    root: String,
    dir: TempDir,
}

impl ResourceFixture {
    /// Create an empty directory for the resource root `root`.
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            dir: temp_dir(),
        }
    }

    /// Write `contents` to `name` (which may contain `/`) inside the root.
    pub fn with_file(self, name: &str, contents: &str) -> Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        std::fs::write(&path, contents).expect("Failed to write fixture file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Logical reference to `name` inside this root, e.g. `some-place/task.yml`.
    pub fn reference(&self, name: &str) -> String {
        format!("{}/{}", self.root, name)
    }

    /// Absolute path of `name` inside this root.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `(root, directory)` pair for building a resource map.
    pub fn entry(&self) -> (String, String) {
        (self.root.clone(), self.dir.path().to_string_lossy().into_owned())
    }

    /// `root=directory` in the command-line override form.
    pub fn override_arg(&self) -> String {
        format!("{}={}", self.root, self.dir.path().display())
    }
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
