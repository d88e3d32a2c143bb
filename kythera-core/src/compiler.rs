use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;

use crate::ast::{Program, parse_program};
use crate::error::{CoreError, TranslateError};
use crate::lower::{RUNTIME_NAMESPACE, quote};
use crate::translator::Translator;
use crate::types::Type;

/// Module path the runtime prelude loads when the driver is not told otherwise.
pub const DEFAULT_RUNTIME_PATH: &str = "./compiler/runtime";

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationArtifact {
    /// Emitted statements, one per line group, without the runtime prelude.
    pub output: String,
    /// Top-level bindings in declaration order.
    pub bindings: IndexMap<String, Type>,
}

impl CompilationArtifact {
    /// The emitted text preceded by the statement that binds the runtime.
    pub fn with_prelude(&self, runtime_path: &str) -> String {
        format!("{}{}", runtime_prelude(runtime_path), self.output)
    }

    /// `name: type` for every top-level binding.
    pub fn describe_bindings(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|(name, ty)| format!("{name}: {ty}"))
            .collect()
    }
}

pub fn translate(program: Program) -> Result<CompilationArtifact, TranslateError> {
    let mut translator = Translator::with_program(program);
    let output = translator.visit_program()?;
    Ok(CompilationArtifact {
        output,
        bindings: translator.root_bindings().clone(),
    })
}

/// Parse a JSON parse tree and translate it.
pub fn compile(source: &str) -> Result<CompilationArtifact, CoreError> {
    let program = parse_program(source)?;
    Ok(translate(program)?)
}

pub fn compile_file(path: impl AsRef<Path>) -> Result<CompilationArtifact, CoreError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => CoreError::MissingSource(path.to_path_buf()),
        _ => CoreError::SourceIo(err),
    })?;
    compile(&source)
}

pub fn runtime_prelude(runtime_path: &str) -> String {
    format!(
        "const {RUNTIME_NAMESPACE} = require({});\n",
        quote(runtime_path)
    )
}

/// Statements that log every top-level binding's name and value.
pub fn binding_dump(bindings: &IndexMap<String, Type>) -> String {
    let mut out = String::new();
    for name in bindings.keys() {
        out.push_str(&format!("console.log({});\nconsole.log({name});\n", quote(&format!("{name}:"))));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPARISON: &str = r#"[
        { "kind": "let", "identifier": "a",
          "value": { "kind": "literal", "type": { "kind": "type", "type": "int" }, "value": 1 } },
        { "kind": "let", "identifier": "b",
          "value": { "kind": "literal", "type": { "kind": "type", "type": "int" }, "value": 2 } },
        { "kind": "let", "identifier": "c",
          "value": { "kind": "binary", "operator": "==",
                     "left": { "kind": "identifier", "name": "a" },
                     "right": { "kind": "identifier", "name": "b" } } }
    ]"#;

    #[test]
    fn compiles_json_parse_tree() {
        let artifact = compile(COMPARISON).expect("compile should succeed");
        assert_eq!(artifact.describe_bindings(), vec!["a: int", "b: int", "c: bool"]);
        assert_eq!(artifact.output.lines().count(), 3);
    }

    #[test]
    fn prepends_runtime_prelude() {
        let artifact = compile(COMPARISON).expect("compile should succeed");
        let text = artifact.with_prelude(DEFAULT_RUNTIME_PATH);
        assert!(text.starts_with("const KYTHERA = require(\"./compiler/runtime\");\nlet a = "));
    }

    #[test]
    fn dumps_bindings_in_declaration_order() {
        let artifact = compile(COMPARISON).expect("compile should succeed");
        assert_eq!(
            binding_dump(&artifact.bindings),
            "console.log(\"a:\");\nconsole.log(a);\n\
             console.log(\"b:\");\nconsole.log(b);\n\
             console.log(\"c:\");\nconsole.log(c);\n"
        );
    }

    #[test]
    fn reports_malformed_trees() {
        let err = compile("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::ParseTree(_)));

        let err = compile(r#"[{ "kind": "let", "identifier": "a" }]"#).unwrap_err();
        assert!(matches!(err, CoreError::ParseTree(_)), "{err}");

        let err = compile(
            r#"[{ "kind": "let", "identifier": "a", "value": { "kind": "literal", "value": 3 } }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ParseTree(_)), "{err}");
    }

    #[test]
    fn object_fields_follow_source_order() {
        let artifact = compile(
            r#"[{ "kind": "let", "identifier": "p", "value": {
                "kind": "literal",
                "type": { "kind": "type", "type": "obj", "structure": {
                    "zeta": { "kind": "type", "type": "int" },
                    "alpha": { "kind": "type", "type": "int" }
                } },
                "value": {
                    "alpha": { "kind": "literal", "type": { "kind": "type", "type": "int" }, "value": 1 },
                    "zeta": { "kind": "literal", "type": { "kind": "type", "type": "int" }, "value": 2 }
                }
            } }]"#,
        )
        .expect("compile should succeed");
        let zeta = artifact.output.find("\"zeta\"").expect("zeta emitted");
        let alpha = artifact.output.find("\"alpha\"").expect("alpha emitted");
        assert!(zeta < alpha);
    }

    #[test]
    fn reports_translation_failures() {
        let err = compile(r#"[{ "kind": "identifier", "name": "ghost" }]"#).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Translate(TranslateError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn compiles_files_and_reports_missing_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("program.json");
        fs::write(&path, COMPARISON).expect("write program");
        let artifact = compile_file(&path).expect("compile should succeed");
        assert_eq!(artifact.bindings.len(), 3);

        let err = compile_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::MissingSource(_)));
    }
}
