//! Interpreters used to turn script files into inline run steps.

use std::collections::HashMap;

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

use crate::document::Value;

/// Wraps a shell script so multi-line bodies with arbitrary quoting survive
/// being passed as a single `-c` argument.
pub const SHELL_TEMPLATE: &str = "cat > task.sh <<'EO_SH'
{{{contents}}}
EO_SH

chmod +x task.sh
./task.sh
";

static BUILTIN: Lazy<InterpreterRegistry> = Lazy::new(InterpreterRegistry::standard);

/// Interpreter lookup and rendering errors.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("no interpreter registered for extension {extension:?}")]
    Unknown { extension: String },

    #[error("failed to render inline script: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// How to invoke one kind of script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Executable placed in `run.path`.
    pub path: String,
    /// Arguments placed before the script text.
    pub args: Vec<String>,
    /// Optional handlebars template applied to the script; `{{{contents}}}`
    /// is the raw file text.
    pub template: Option<String>,
}

impl Interpreter {
    pub fn new(path: impl Into<String>, args: &[&str]) -> Self {
        Self {
            path: path.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

#[derive(Serialize)]
struct InlineScript<'a> {
    contents: &'a str,
}

/// Extension-keyed interpreter table.
#[derive(Debug)]
pub struct InterpreterRegistry {
    interpreters: HashMap<String, Interpreter>,
    renderer: Handlebars<'static>,
}

impl InterpreterRegistry {
    /// A registry with no interpreters.
    pub fn empty() -> Self {
        let mut renderer = Handlebars::new();
        renderer.set_strict_mode(true);
        renderer.register_escape_fn(handlebars::no_escape);

        Self {
            interpreters: HashMap::new(),
            renderer,
        }
    }

    /// The shell, Ruby, Python and Node interpreters.
    pub fn standard() -> Self {
        let shell = Interpreter::new("sh", &["-c"]).with_template(SHELL_TEMPLATE);

        let mut registry = Self::empty();
        registry.register("", shell.clone());
        registry.register(".sh", shell);
        registry.register(".rb", Interpreter::new("ruby", &["-e"]));
        registry.register(".py", Interpreter::new("python", &["-c"]));
        registry.register(".js", Interpreter::new("node", &["-e"]));
        registry
    }

    /// Shared process-wide instance of [`InterpreterRegistry::standard`].
    pub fn builtin() -> &'static InterpreterRegistry {
        &BUILTIN
    }

    /// Register `interpreter` for `extension` (with leading dot, or empty).
    pub fn register(
        &mut self,
        extension: impl Into<String>,
        interpreter: Interpreter,
    ) -> Option<Interpreter> {
        self.interpreters.insert(extension.into(), interpreter)
    }

    pub fn resolve(&self, extension: &str) -> Result<&Interpreter, InterpreterError> {
        self.interpreters
            .get(extension)
            .ok_or_else(|| InterpreterError::Unknown {
                extension: extension.to_string(),
            })
    }

    /// Resolve by the extension of a logical script path.
    pub fn for_path(&self, path: &str) -> Result<&Interpreter, InterpreterError> {
        self.resolve(extension(path))
    }

    /// Apply the interpreter's template to `script`, if it has one.
    pub fn render(&self, interpreter: &Interpreter, script: &str) -> Result<String, InterpreterError> {
        match &interpreter.template {
            Some(template) => Ok(self
                .renderer
                .render_template(template, &InlineScript { contents: script })?),
            None => Ok(script.to_string()),
        }
    }

    /// Build the `{path, args}` run step that executes `script` inline.
    pub fn invocation(&self, path: &str, script: &str) -> Result<Value, InterpreterError> {
        let interpreter = self.for_path(path)?;
        let rendered = self.render(interpreter, script)?;

        let mut args: Vec<Value> = interpreter.args.iter().cloned().map(Value::from).collect();
        args.push(Value::from(rendered));

        Ok(Value::from_iter([
            ("path", Value::from(interpreter.path.clone())),
            ("args", Value::Sequence(args)),
        ]))
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Extension of the last path segment including the dot, or `""`.
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rfind('.').map_or("", |dot| &name[dot..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("repo/ci/build.sh", ".sh" ; "shell")]
    #[test_case("repo/ci/build", "" ; "no extension")]
    #[test_case("repo/ci.d/build", "" ; "dot in directory")]
    #[test_case("repo/ci/tool.tar.gz", ".gz" ; "last dot wins")]
    fn test_extension(path: &str, expected: &str) {
        assert_eq!(extension(path), expected);
    }

    #[test_case("", "sh", &["-c"] ; "no extension uses shell")]
    #[test_case(".sh", "sh", &["-c"] ; "shell")]
    #[test_case(".rb", "ruby", &["-e"] ; "ruby")]
    #[test_case(".py", "python", &["-c"] ; "python")]
    #[test_case(".js", "node", &["-e"] ; "node")]
    fn test_standard_interpreters(extension: &str, path: &str, args: &[&str]) {
        let registry = InterpreterRegistry::standard();
        let interpreter = registry.resolve(extension).unwrap();
        assert_eq!(interpreter.path, path);
        assert_eq!(interpreter.args, args);
    }

    #[test]
    fn test_unknown_extension() {
        match InterpreterRegistry::builtin().for_path("repo/build.pl") {
            Err(InterpreterError::Unknown { extension }) => assert_eq!(extension, ".pl"),
            other => panic!("Expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_shell_script_is_wrapped_verbatim() {
        let registry = InterpreterRegistry::standard();
        let shell = registry.resolve(".sh").unwrap();
        let script = "#!/bin/bash\necho \"<b>&'quoted'</b>\"";

        assert_eq!(
            registry.render(shell, script).unwrap(),
            "cat > task.sh <<'EO_SH'\n#!/bin/bash\necho \"<b>&'quoted'</b>\"\nEO_SH\n\nchmod +x task.sh\n./task.sh\n"
        );
    }

    #[test]
    fn test_other_scripts_pass_through() {
        let registry = InterpreterRegistry::standard();
        let value = registry.invocation("repo/hello.py", "print('hi')\n").unwrap();
        assert_eq!(
            value,
            Value::from_iter([
                ("path", Value::from("python")),
                ("args", Value::from(vec!["-c", "print('hi')\n"])),
            ])
        );
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = InterpreterRegistry::empty();
        registry.register(
            ".pl",
            Interpreter::new("perl", &["-e"]).with_template("# inlined\n{{{contents}}}"),
        );

        let value = registry.invocation("repo/x.pl", "print 1;").unwrap();
        assert_eq!(
            value.get("args"),
            Some(&Value::from(vec!["-e", "# inlined\nprint 1;"]))
        );
        assert!(registry.for_path("repo/x.sh").is_err());
    }
}
