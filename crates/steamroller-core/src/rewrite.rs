//! Two-pass pipeline rewrite: inline task files, then inline run scripts.

use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::document::{self, DocumentError, Value};
use crate::interpreter::{InterpreterError, InterpreterRegistry};
use crate::patch::{Patch, PatchError, Pointer};
use crate::resource::{ResourceError, ResourceMap};
use crate::traversal::{find_run_path_references, find_task_file_references};

/// Top-level key holding the job list; every patch is anchored here.
pub const JOBS_KEY: &str = "jobs";

/// Rewrite errors.
#[derive(Debug, Error)]
pub enum SteamrollError {
    #[error("failed to parse pipeline: {0}")]
    Pipeline(#[source] DocumentError),

    #[error("failed to parse task file {path}: {source}")]
    TaskFile {
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("cannot inline script {path}: {source}")]
    Interpreter {
        path: String,
        #[source]
        source: InterpreterError,
    },

    #[error("failed to apply patch: {0}")]
    Patch(#[from] PatchError),

    #[error("failed to serialize pipeline: {0}")]
    Serialize(#[source] DocumentError),
}

/// Flattens pipelines against a resource map.
#[derive(Debug, Clone, Copy)]
pub struct Steamroller<'a> {
    resources: &'a ResourceMap,
    interpreters: &'a InterpreterRegistry,
}

impl<'a> Steamroller<'a> {
    /// Use the built-in interpreter table.
    pub fn new(resources: &'a ResourceMap) -> Self {
        Self::with_interpreters(resources, InterpreterRegistry::builtin())
    }

    pub fn with_interpreters(
        resources: &'a ResourceMap,
        interpreters: &'a InterpreterRegistry,
    ) -> Self {
        Self {
            resources,
            interpreters,
        }
    }

    /// Rewrite `pipeline` into a self-contained document.
    pub fn steamroll(&self, pipeline: &[u8]) -> Result<Vec<u8>, SteamrollError> {
        let parsed = document::parse(pipeline).map_err(SteamrollError::Pipeline)?;
        let patch = self.task_file_patch(&parsed)?;
        let inlined = {
            let _span = info_span!("inline_task_files", operations = patch.len()).entered();
            patch.apply(&parsed)?
        };
        let bytes = document::serialize(&inlined).map_err(SteamrollError::Serialize)?;

        let reparsed = document::parse(&bytes).map_err(SteamrollError::Pipeline)?;
        let patch = self.run_path_patch(&reparsed)?;
        if patch.is_empty() {
            return Ok(bytes);
        }
        let rewritten = {
            let _span = info_span!("inline_run_paths", operations = patch.len()).entered();
            patch.apply(&reparsed)?
        };
        document::serialize(&rewritten).map_err(SteamrollError::Serialize)
    }

    /// Build the patch that inlines every mapped `task`/`file` reference.
    pub fn task_file_patch(&self, pipeline: &Value) -> Result<Patch, SteamrollError> {
        let mut patch = Patch::new();
        let Some(jobs) = pipeline.get(JOBS_KEY) else {
            return Ok(patch);
        };

        for file in find_task_file_references(jobs) {
            let Some(bytes) = self.skip_unresolved(&file, self.resources.load(&file)) else {
                continue;
            };
            let config = document::parse(&bytes).map_err(|source| SteamrollError::TaskFile {
                path: file.clone(),
                source,
            })?;

            debug!(file = %file, "inlining task config");
            let selected = Pointer::root().key(JOBS_KEY).select("file", file.as_str());
            patch.add(selected.clone().key("config"), config);
            patch.remove(selected.key("file"));
        }

        info!(operations = patch.len(), "built task file patch");
        Ok(patch)
    }

    /// Build the patch that replaces every mapped `run.path` script with an
    /// inline interpreter invocation.
    pub fn run_path_patch(&self, pipeline: &Value) -> Result<Patch, SteamrollError> {
        let mut patch = Patch::new();
        let Some(jobs) = pipeline.get(JOBS_KEY) else {
            return Ok(patch);
        };

        for path in find_run_path_references(jobs) {
            let Some(script) = self.skip_unresolved(&path, self.resources.load_to_string(&path))
            else {
                continue;
            };
            let invocation = self
                .interpreters
                .invocation(&path, &script)
                .map_err(|source| SteamrollError::Interpreter {
                    path: path.clone(),
                    source,
                })?;

            debug!(path = %path, "inlining run script");
            patch.replace(Pointer::root().key(JOBS_KEY).select("path", path.as_str()), invocation);
        }

        info!(operations = patch.len(), "built run path patch");
        Ok(patch)
    }

    /// The loaded contents, or `None` when the reference should be left alone.
    fn skip_unresolved<T>(&self, path: &str, loaded: Result<T, ResourceError>) -> Option<T> {
        match loaded {
            Ok(contents) => Some(contents),
            Err(ResourceError::Unmapped { root, .. }) => {
                debug!(path, root = %root, "resource not mapped, leaving reference in place");
                None
            }
            Err(ResourceError::NotUtf8 { .. }) => {
                warn!(path, "skipping script that is not valid UTF-8");
                None
            }
            Err(err) => {
                warn!(path, error = %err, "skipping unreadable resource");
                None
            }
        }
    }
}

/// Rewrite `pipeline` with the built-in interpreters.
pub fn steamroll(resources: &ResourceMap, pipeline: &[u8]) -> Result<Vec<u8>, SteamrollError> {
    Steamroller::new(resources).steamroll(pipeline)
}
