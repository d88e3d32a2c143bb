use std::path::PathBuf;

use thiserror::Error;

use crate::types::Type;

/// Failures raised while translating a loaded program.
///
/// Every variant is fatal to the current `visit_program` call: no partial
/// output is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("no program is loaded")]
    NoProgramLoaded,
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),
    #[error("'{0}' cannot be used as a binding name")]
    InvalidIdentifier(String),
    #[error("'{0}' is already declared in this scope")]
    DuplicateDeclaration(String),
    #[error("unhandled node kind: {0}")]
    UnhandledNodeKind(String),
    #[error("{0} is not valid as an assignment target")]
    UnsupportedAssignmentTarget(String),
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        context: String,
    },
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),
    #[error("malformed {tag} literal: {detail}")]
    MalformedLiteral { tag: String, detail: String },
    #[error("operator '{operator}' cannot be applied to {ty}")]
    InvalidOperand { operator: String, ty: Type },
    #[error("a value of type {0} is not callable")]
    NotCallable(Type),
    #[error("function expects {expected} arguments but received {found}")]
    ArityMismatch { expected: usize, found: usize },
}

/// Errors surfaced to drivers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("source file was not found at {0}")]
    MissingSource(PathBuf),
    #[error("malformed parse tree: {0}")]
    ParseTree(#[from] serde_json::Error),
    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),
}
