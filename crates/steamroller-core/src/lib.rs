//! Flattens Concourse pipelines.
//!
//! Task files referenced by `task`/`file` pairs are inlined as `config`, and
//! scripts referenced by `run.path` are replaced with inline interpreter
//! invocations, so the resulting pipeline has no external file references.
//!
//! ```no_run
//! use steamroller_core::{steamroll, ResourceMap};
//!
//! let resources = ResourceMap::from_entries([("ci", "~/workspace/ci")]).unwrap();
//! let pipeline = std::fs::read("pipeline.yml").unwrap();
//! let flat = steamroll(&resources, &pipeline).unwrap();
//! ```

pub mod document;
pub mod interpreter;
pub mod patch;
pub mod resource;
pub mod rewrite;
pub mod traversal;

pub use document::{DocumentError, Mapping, Value};
pub use interpreter::{Interpreter, InterpreterError, InterpreterRegistry};
pub use patch::{ApplyReason, OpKind, Operation, Patch, PatchError, Pointer, Segment};
pub use resource::{ResourceError, ResourceMap};
pub use rewrite::{steamroll, SteamrollError, Steamroller};
pub use traversal::{find_run_path_references, find_task_file_references};
