//! Core of the Kythera toolchain.
//!
//! The translator turns a parse tree produced by the external parser into
//! text for the host runtime, resolving names and checking types on the way:
//!
//!   parse tree (JSON)
//!     -> ast         (closed node enums)
//!     -> translator  (scopes + structural types + emission, one pass)
//!     -> emitted text + top-level bindings
//!
//! Drivers (CLI, REPL) should depend on this crate rather than reimplementing
//! the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Input tree
// ---------------------------------------------------------------------

pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, value blueprints, scopes
// ---------------------------------------------------------------------

pub mod types;
pub mod value;
pub mod scope;

// ---------------------------------------------------------------------
// Translation and compiler orchestration
// ---------------------------------------------------------------------

pub mod lower;
pub mod translator;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{
    CompilationArtifact, DEFAULT_RUNTIME_PATH, binding_dump, compile, compile_file,
    runtime_prelude, translate,
};
pub use error::{CoreError, TranslateError};
pub use translator::Translator;
pub use types::Type;
