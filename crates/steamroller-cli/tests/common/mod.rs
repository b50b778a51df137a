//! Common test utilities for CLI testing.

use assert_cmd::Command;
use steamroller_test_utils::ResourceFixture;
use tempfile::TempDir;

pub const PIPELINE: &str = r#"---
jobs:
- name: build
  plan:
  - task: compile
    file: ci/tasks/compile.yml
"#;

pub const TASK: &str = r#"---
platform: linux
run:
  path: ci/scripts/compile.sh
"#;

pub const SCRIPT: &str = "#!/bin/sh\necho compiling\n";

/// A `ci` resource root holding one task and its script, plus a scratch
/// directory for pipeline and config files.
pub struct TestContext {
    pub resources: ResourceFixture,
    pub work_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let resources = ResourceFixture::new("ci")
            .with_file("tasks/compile.yml", TASK)
            .with_file("scripts/compile.sh", SCRIPT);

        Self {
            resources,
            work_dir: steamroller_test_utils::temp_dir(),
        }
    }

    /// Write `contents` into the scratch directory and return its path.
    pub fn write(&self, name: &str, contents: &str) -> String {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write file");
        path.to_string_lossy().into_owned()
    }

    /// A command with logging env cleared so stderr is predictable.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("steamroller").expect("Binary not found");
        cmd.current_dir(self.work_dir.path())
            .env_remove("STEAMROLLER_CONFIG")
            .env_remove("STEAMROLLER_LOG_LEVEL")
            .env_remove("STEAMROLLER_LOG_FORMAT")
            .env_remove("STEAMROLLER_LOG_FILE")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
