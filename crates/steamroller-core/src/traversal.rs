//! Read-only scans that locate file references in a pipeline tree.

use std::collections::BTreeSet;

use crate::document::{Mapping, Value};

/// Collect the `file` of every mapping that also has a `task` key.
///
/// ```yaml
/// - task: unit
///   file: repo/ci/unit.yml
/// ```
pub fn find_task_file_references(root: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    walk_mappings(root, &mut |map| {
        if !map.contains_key("task") {
            return;
        }
        if let Some(file) = map.get("file").and_then(Value::as_str) {
            found.insert(file.to_string());
        }
    });
    found
}

/// Collect the `run.path` of every mapping whose `run` is itself a mapping.
///
/// ```yaml
/// run:
///   path: repo/ci/unit.sh
/// ```
pub fn find_run_path_references(root: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    walk_mappings(root, &mut |map| {
        if let Some(path) = map
            .get("run")
            .and_then(|run| run.get("path"))
            .and_then(Value::as_str)
        {
            found.insert(path.to_string());
        }
    });
    found
}

/// Visit every mapping reachable from `node`, matched or not.
fn walk_mappings(node: &Value, visit: &mut impl FnMut(&Mapping)) {
    match node {
        Value::Mapping(map) => {
            visit(map);
            for child in map.values() {
                walk_mappings(child, visit);
            }
        }
        Value::Sequence(items) => {
            for child in items {
                walk_mappings(child, visit);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_task_files_found_at_any_depth() {
        let doc = parse(
            br#"
- name: build
  plan:
  - task: unit
    file: repo/unit.yml
  - do:
    - task: lint
      file: repo/lint.yml
  on_failure:
    task: notify
    file: ops/notify.yml
"#,
        )
        .unwrap();

        assert_eq!(
            find_task_file_references(&doc),
            set(&["ops/notify.yml", "repo/lint.yml", "repo/unit.yml"])
        );
    }

    #[test]
    fn test_task_file_requires_task_key_and_string_file() {
        let doc = parse(
            br#"
- put: artifact
  params:
    file: repo/out.tgz
- task: odd
  file: [not, a, string]
"#,
        )
        .unwrap();

        assert!(find_task_file_references(&doc).is_empty());
    }

    #[test]
    fn test_duplicate_task_files_collapse() {
        let doc = parse(
            br#"
- task: a
  file: repo/shared.yml
- task: b
  file: repo/shared.yml
"#,
        )
        .unwrap();

        assert_eq!(find_task_file_references(&doc), set(&["repo/shared.yml"]));
    }

    #[test]
    fn test_run_paths_found_inside_configs() {
        let doc = parse(
            br#"
- name: build
  plan:
  - task: unit
    config:
      run:
        path: repo/ci/unit.sh
  - task: inline
    config:
      run:
        path: echo
        args: [hi]
"#,
        )
        .unwrap();

        assert_eq!(find_run_path_references(&doc), set(&["echo", "repo/ci/unit.sh"]));
    }

    #[test]
    fn test_run_that_is_not_a_mapping_is_ignored() {
        let doc = parse(
            br#"
- run: just-a-string
- run:
    path: 42
- run: [path]
"#,
        )
        .unwrap();

        assert!(find_run_path_references(&doc).is_empty());
    }

    #[test]
    fn test_scalars_have_no_references() {
        assert!(find_task_file_references(&Value::from("task")).is_empty());
        assert!(find_run_path_references(&Value::Null).is_empty());
    }
}
