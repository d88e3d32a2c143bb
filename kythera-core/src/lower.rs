//! Type lowering and runtime type constructor emission.

use crate::ast::{Node, TypeDescriptor, TypeTag};
use crate::error::TranslateError;
use crate::types::{ObjType, Primitive, Type};

/// Name the host runtime namespace is bound to in emitted text.
pub const RUNTIME_NAMESPACE: &str = "KYTHERA";

/// View `node` as a type descriptor.
pub fn expect_descriptor(node: &Node) -> Result<&TypeDescriptor, TranslateError> {
    match node {
        Node::Type(descriptor) => Ok(descriptor),
        other => Err(TranslateError::InvalidTypeDescriptor(format!(
            "expected a type descriptor but got a '{}' node",
            other.kind()
        ))),
    }
}

/// Lower a type descriptor node into a [`Type`].
pub fn make_kythera_type(node: &Node) -> Result<Type, TranslateError> {
    let descriptor = expect_descriptor(node)?;

    if let Some(name) = &descriptor.name {
        return Err(TranslateError::UnsupportedFeature(format!(
            "named type '{name}'"
        )));
    }

    match &descriptor.tag {
        TypeTag::Int => Ok(Type::INT),
        TypeTag::Float => Ok(Type::FLOAT),
        TypeTag::Bool => Ok(Type::BOOL),
        TypeTag::Str => Ok(Type::STR),
        TypeTag::Null => Ok(Type::NULL),
        TypeTag::Type => Ok(Type::TYPE),
        TypeTag::Fn => {
            let parameters = descriptor
                .parameters
                .iter()
                .map(make_kythera_type)
                .collect::<Result<Vec<_>, _>>()?;
            let returns = descriptor.returns.as_deref().ok_or_else(|| {
                TranslateError::InvalidTypeDescriptor(
                    "fn type is missing its return type".to_string(),
                )
            })?;
            Ok(Type::function(parameters, make_kythera_type(returns)?))
        }
        TypeTag::Obj => {
            let mut obj = ObjType::default();
            for (field, field_descriptor) in &descriptor.structure {
                obj.fields
                    .insert(field.clone(), make_kythera_type(field_descriptor)?);
            }
            Ok(Type::Obj(obj))
        }
        TypeTag::List => Err(TranslateError::UnsupportedFeature(
            "list types".to_string(),
        )),
        TypeTag::Unknown(tag) => Err(TranslateError::InvalidTypeDescriptor(format!(
            "invalid builtin type: {tag}"
        ))),
    }
}

/// Emit the runtime expression that constructs `ty`.
///
/// Primitives resolve to the runtime's interned table; compound types are
/// rebuilt from their parts.
pub fn make_type_constructor(ty: &Type) -> Result<String, TranslateError> {
    match ty {
        Type::Primitive(primitive) => Ok(primitive_constructor(*primitive)),
        Type::Fn(fn_ty) => {
            let parameters = fn_ty
                .parameters
                .iter()
                .map(make_type_constructor)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!(
                "new {RUNTIME_NAMESPACE}.type(\"fn\", {{ parameters: [{}], returns: {}}})",
                parameters.join(","),
                make_type_constructor(&fn_ty.returns)?
            ))
        }
        Type::Obj(obj) => {
            let mut fields = String::new();
            for (name, field_ty) in &obj.fields {
                fields.push_str(&format!(
                    "{}: {},",
                    quote(name),
                    make_type_constructor(field_ty)?
                ));
            }
            Ok(format!("new {RUNTIME_NAMESPACE}.type(\"obj\", {{{fields}}})"))
        }
        Type::List => Err(TranslateError::UnsupportedFeature(
            "list types".to_string(),
        )),
    }
}

fn primitive_constructor(primitive: Primitive) -> String {
    format!(
        "{RUNTIME_NAMESPACE}.type.PRIMITIVES[\"{}\"]",
        primitive.name()
    )
}

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", RUNTIME_NAMESPACE,
];

/// Check that `name` can be emitted verbatim as a host binding name.
pub fn check_identifier(name: &str) -> Result<&str, TranslateError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid_start || !valid_rest || RESERVED_WORDS.contains(&name) {
        return Err(TranslateError::InvalidIdentifier(name.to_string()));
    }
    Ok(name)
}

/// Quote `text` as a double-quoted string literal for the host runtime.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{2028}' || c == '\u{2029}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
