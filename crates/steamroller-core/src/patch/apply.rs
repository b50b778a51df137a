//! Path resolution and tree mutation.
//!
//! Resolution walks the immutable tree and turns a [`Pointer`] into concrete
//! steps (mapping keys and sequence positions). Mutation then follows those
//! steps on the working copy. Sequence positions never appear in patch paths;
//! they only come out of selector matching.

use super::{ApplyReason, OpKind, Operation, PatchError, Pointer, Segment};
use crate::document::{Mapping, Value};

/// Concrete location step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
}

pub(super) fn apply_operation(doc: &mut Value, operation: &Operation) -> Result<(), PatchError> {
    let op = operation.kind();
    let path = operation.path();
    let fail = |reason| PatchError::Apply {
        op,
        path: path.clone(),
        reason,
    };

    let steps = resolve(doc, op, path)?;

    match operation {
        // A selected mapping may sit under a key rather than in the sequence
        // itself, so the last step alone does not tell whether one was used.
        Operation::Add { .. } if matches!(path.segments().last(), Some(Segment::Select { .. })) => {
            return Err(fail(ApplyReason::AddAtSelector))
        }
        Operation::Add { value, .. } => match steps.split_last() {
            None => *doc = value.clone(),
            Some((Step::Key(key), parents)) => match navigate_mut(doc, parents, true) {
                Some(Value::Mapping(map)) => {
                    map.insert(key.clone(), value.clone());
                }
                _ => return Err(fail(ApplyReason::Unreachable)),
            },
            Some((Step::Index(_), _)) => return Err(fail(ApplyReason::Unreachable)),
        },
        Operation::Remove { .. } => match steps.split_last() {
            None => return Err(fail(ApplyReason::RemoveRoot)),
            Some((Step::Key(key), parents)) => match navigate_mut(doc, parents, false) {
                Some(Value::Mapping(map)) => {
                    if map.shift_remove(key).is_none() {
                        return Err(fail(ApplyReason::MissingKey(key.clone())));
                    }
                }
                _ => return Err(fail(ApplyReason::Unreachable)),
            },
            Some((Step::Index(index), parents)) => match navigate_mut(doc, parents, false) {
                Some(Value::Sequence(items)) if *index < items.len() => {
                    items.remove(*index);
                }
                _ => return Err(fail(ApplyReason::Unreachable)),
            },
        },
        Operation::Replace { value, .. } => match navigate_mut(doc, &steps, false) {
            Some(slot) => *slot = value.clone(),
            None => return Err(fail(ApplyReason::Unreachable)),
        },
    }

    Ok(())
}

/// Turn `path` into concrete steps against `doc`.
///
/// `Add` may name keys that do not exist yet; once resolution leaves the
/// existing tree only plain keys can follow.
fn resolve(doc: &Value, op: OpKind, path: &Pointer) -> Result<Vec<Step>, PatchError> {
    let fail = |reason| PatchError::Apply {
        op,
        path: path.clone(),
        reason,
    };

    let mut steps = Vec::with_capacity(path.segments().len());
    let mut current = Some(doc);

    for segment in path.segments() {
        match segment {
            Segment::Key(key) => {
                current = match current {
                    Some(Value::Mapping(map)) => match map.get(key) {
                        Some(child) => Some(child),
                        None if op == OpKind::Add => None,
                        None => return Err(fail(ApplyReason::MissingKey(key.clone()))),
                    },
                    Some(Value::Sequence(_)) => {
                        return Err(fail(ApplyReason::KeyOnSequence(key.clone())))
                    }
                    Some(other) => {
                        return Err(fail(ApplyReason::NotAContainer {
                            key: key.clone(),
                            found: other.kind(),
                        }))
                    }
                    None => None,
                };
                steps.push(Step::Key(key.clone()));
            }
            Segment::Select { key, value } => {
                let selector = segment.to_string();
                let sequence = match current {
                    Some(sequence @ Value::Sequence(_)) => sequence,
                    Some(other) => {
                        return Err(fail(ApplyReason::SelectorOnNonSequence {
                            selector,
                            found: other.kind(),
                        }))
                    }
                    None => {
                        return Err(fail(ApplyReason::SelectorOnNonSequence {
                            selector,
                            found: "missing value",
                        }))
                    }
                };

                let mut matches = Vec::new();
                collect_matches(sequence, key, value, &mut Vec::new(), &mut matches);

                if matches.len() != 1 {
                    return Err(PatchError::AmbiguousOrMissingSelector {
                        op,
                        path: path.clone(),
                        selector,
                        matches: matches.len(),
                    });
                }
                let (trail, node) = matches.remove(0);
                steps.extend(trail);
                current = Some(node);
            }
        }
    }

    Ok(steps)
}

/// Find mappings under `node` whose `key` entry renders as `expected`.
///
/// The search covers the whole subtree so that a selector issued at a
/// sequence also reaches mappings nested inside its elements. A matching
/// mapping is not searched further.
fn collect_matches<'a>(
    node: &'a Value,
    key: &str,
    expected: &str,
    trail: &mut Vec<Step>,
    out: &mut Vec<(Vec<Step>, &'a Value)>,
) {
    match node {
        Value::Mapping(map) => {
            let hit = map
                .get(key)
                .and_then(Value::scalar_string)
                .is_some_and(|rendered| rendered == expected);
            if hit {
                out.push((trail.clone(), node));
                return;
            }
            for (child_key, child) in map {
                trail.push(Step::Key(child_key.clone()));
                collect_matches(child, key, expected, trail, out);
                trail.pop();
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                trail.push(Step::Index(index));
                collect_matches(child, key, expected, trail, out);
                trail.pop();
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Follow `steps` mutably. With `create`, missing keys become empty mappings.
fn navigate_mut<'a>(node: &'a mut Value, steps: &[Step], create: bool) -> Option<&'a mut Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(node);
    };

    let child = match step {
        Step::Key(key) => match node {
            Value::Mapping(map) => {
                if create {
                    map.entry(key.clone())
                        .or_insert_with(|| Value::Mapping(Mapping::new()))
                } else {
                    map.get_mut(key)?
                }
            }
            _ => return None,
        },
        Step::Index(index) => match node {
            Value::Sequence(items) => items.get_mut(*index)?,
            _ => return None,
        },
    };
    navigate_mut(child, rest, create)
}
