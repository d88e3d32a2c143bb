//! Value blueprints: what an emitted value constructor should build.

use indexmap::IndexMap;

use crate::ast::{Node, Parameter};
use crate::types::Type;

/// Raw payload of a literal, shaped by its type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'a str),
    Null,
    /// Types are values too.
    Type(Type),
    /// Parameters and body are translated only when the constructor is
    /// emitted, inside the function's own scope.
    Function {
        parameters: &'a [Parameter],
        body: &'a [Node],
    },
    /// Field expressions, translated in the scope of the literal.
    Object(&'a IndexMap<String, Node>),
}

/// A literal's payload paired with its derived type.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint<'a> {
    pub payload: Payload<'a>,
    pub ty: Type,
}

impl<'a> Blueprint<'a> {
    pub fn new(payload: Payload<'a>, ty: Type) -> Self {
        Blueprint { payload, ty }
    }
}
