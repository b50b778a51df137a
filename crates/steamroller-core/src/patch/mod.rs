//! Ordered add/remove/replace patches over a [`Value`] tree.
//!
//! A [`Patch`] is applied to a working copy of the input document. Every
//! operation sees the result of the ones before it, and any failure discards
//! the working copy, so callers either get the fully patched document or an
//! error and their original tree.

mod apply;
pub mod pointer;

use std::fmt;

use thiserror::Error;

use crate::document::Value;

pub use pointer::{Pointer, PointerError, Segment};

/// Operation discriminant, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Remove,
    Replace,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
        })
    }
}

/// A single patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert or overwrite a key inside the addressed mapping.
    Add { path: Pointer, value: Value },
    /// Delete a key, or the element picked by a trailing selector.
    Remove { path: Pointer },
    /// Swap the whole addressed value.
    Replace { path: Pointer, value: Value },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Add { .. } => OpKind::Add,
            Operation::Remove { .. } => OpKind::Remove,
            Operation::Replace { .. } => OpKind::Replace,
        }
    }

    pub fn path(&self) -> &Pointer {
        match self {
            Operation::Add { path, .. }
            | Operation::Remove { path }
            | Operation::Replace { path, .. } => path,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

/// Why an operation could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyReason {
    #[error("key `{0}` does not exist")]
    MissingKey(String),

    #[error("plain key `{0}` cannot address a sequence element, use a key=value selector")]
    KeyOnSequence(String),

    #[error("selector `{selector}` needs a sequence, found {found}")]
    SelectorOnNonSequence { selector: String, found: &'static str },

    #[error("cannot descend into `{key}` of a {found}")]
    NotAContainer { key: String, found: &'static str },

    #[error("add cannot target a selected sequence element, use replace")]
    AddAtSelector,

    #[error("cannot remove the document root")]
    RemoveRoot,

    #[error("resolved location is no longer reachable")]
    Unreachable,
}

/// Patch application errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error("{op} {path}: selector `{selector}` matched {matches} elements, expected exactly one")]
    AmbiguousOrMissingSelector {
        op: OpKind,
        path: Pointer,
        selector: String,
        matches: usize,
    },

    #[error("{op} {path}: {reason}")]
    Apply {
        op: OpKind,
        path: Pointer,
        reason: ApplyReason,
    },
}

/// An ordered batch of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<Operation>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn add(&mut self, path: Pointer, value: impl Into<Value>) {
        self.push(Operation::Add {
            path,
            value: value.into(),
        });
    }

    pub fn remove(&mut self, path: Pointer) {
        self.push(Operation::Remove { path });
    }

    pub fn replace(&mut self, path: Pointer, value: impl Into<Value>) {
        self.push(Operation::Replace {
            path,
            value: value.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Apply every operation in order to a copy of `doc`.
    pub fn apply(&self, doc: &Value) -> Result<Value, PatchError> {
        let mut working = doc.clone();
        for operation in &self.operations {
            tracing::trace!(%operation, "applying patch operation");
            apply::apply_operation(&mut working, operation)?;
        }
        Ok(working)
    }
}

impl FromIterator<Operation> for Patch {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
