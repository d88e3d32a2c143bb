//! Parse tree consumed by the translator.
//!
//! The tree is produced by an external parser and handed over as JSON. Every
//! node carries a `kind` discriminator; type descriptors are nodes of kind
//! `type` with a second `type` field naming the subtype.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// A whole program: the top-level statements in source order.
pub type Program = Vec<Node>;

/// Parse a JSON parse tree into a [`Program`].
pub fn parse_program(json: &str) -> Result<Program, serde_json::Error> {
    serde_json::from_str(json)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", remote = "Self")]
pub enum Node {
    #[serde(rename = "let")]
    Let(Let),
    #[serde(rename = "assign")]
    Assign(Assign),
    #[serde(rename = "return")]
    Return(Return),
    #[serde(rename = "if")]
    If(If),
    #[serde(rename = "while")]
    While(While),
    #[serde(rename = "identifier")]
    Identifier(Identifier),
    #[serde(rename = "literal")]
    Literal(Literal),
    #[serde(rename = "new")]
    New(New),
    #[serde(rename = "binary")]
    Binary(Binary),
    #[serde(rename = "unary")]
    Unary(Unary),
    #[serde(rename = "call")]
    Call(Call),
    #[serde(rename = "objAccess")]
    ObjAccess(ObjAccess),
    #[serde(rename = "access")]
    Access(Access),
    #[serde(rename = "type")]
    Type(TypeDescriptor),
    /// Any node whose kind the translator does not know about.
    #[serde(skip_deserializing)]
    Unknown(UnknownNode),
}

/// Only kinds outside [`Node::KINDS`] become [`Node::Unknown`]; a known kind
/// with missing or malformed fields is a deserialization error.
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value.get("kind").and_then(serde_json::Value::as_str) {
            Some(kind) if !Node::KINDS.contains(&kind) => Ok(Node::Unknown(UnknownNode {
                kind: kind.to_string(),
            })),
            _ => Node::deserialize(value).map_err(de::Error::custom),
        }
    }
}

impl Node {
    pub const KINDS: [&'static str; 14] = [
        "let",
        "assign",
        "return",
        "if",
        "while",
        "identifier",
        "literal",
        "new",
        "binary",
        "unary",
        "call",
        "objAccess",
        "access",
        "type",
    ];

    /// The `kind` discriminator as it appeared in the input tree.
    pub fn kind(&self) -> &str {
        match self {
            Node::Let(_) => "let",
            Node::Assign(_) => "assign",
            Node::Return(_) => "return",
            Node::If(_) => "if",
            Node::While(_) => "while",
            Node::Identifier(_) => "identifier",
            Node::Literal(_) => "literal",
            Node::New(_) => "new",
            Node::Binary(_) => "binary",
            Node::Unary(_) => "unary",
            Node::Call(_) => "call",
            Node::ObjAccess(_) => "objAccess",
            Node::Access(_) => "access",
            Node::Type(_) => "type",
            Node::Unknown(node) => node.kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode {
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Let {
    pub identifier: String,
    pub value: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Assign {
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Return {
    #[serde(default)]
    pub value: Option<Box<Node>>,
}

/// `if` statement. An `else if` chain is an `else` body holding a single `if`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct If {
    pub condition: Box<Node>,
    #[serde(default)]
    pub body: Vec<Node>,
    #[serde(rename = "else", default)]
    pub alternate: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct While {
    pub condition: Box<Node>,
    #[serde(default)]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Identifier {
    pub name: String,
}

/// A literal of any type, including function and object literals.
///
/// `ty` is the declared type descriptor. The meaning of `value` depends on
/// its tag: a scalar for primitives, a type descriptor for `type`, a
/// field-to-expression map for `obj`. Function literals carry `parameters`
/// and `body` instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Literal {
    #[serde(rename = "type")]
    pub ty: Box<Node>,
    #[serde(default)]
    pub value: Option<LiteralValue>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Node(Box<Node>),
    Fields(IndexMap<String, Node>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct New {
    pub target: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Binary {
    pub operator: BinaryOp,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Unary {
    pub operator: UnaryOp,
    pub operand: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Call {
    pub callee: Box<Node>,
    #[serde(default)]
    pub arguments: Vec<Node>,
}

/// `object.property`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjAccess {
    pub object: Box<Node>,
    pub property: String,
}

/// `object[index]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Access {
    pub object: Box<Node>,
    pub index: Box<Node>,
}

/// Type descriptor node, prior to lowering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type")]
    pub tag: TypeTag,
    /// Present only on nominal types, which are rejected.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Node>,
    #[serde(default)]
    pub returns: Option<Box<Node>>,
    #[serde(default)]
    pub structure: IndexMap<String, Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Str,
    Null,
    Type,
    Fn,
    Obj,
    List,
    #[serde(untagged)]
    Unknown(String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Str => "str",
            TypeTag::Null => "null",
            TypeTag::Type => "type",
            TypeTag::Fn => "fn",
            TypeTag::Obj => "obj",
            TypeTag::List => "list",
            TypeTag::Unknown(other) => other.as_str(),
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        serde_json::from_value(value).expect("node should deserialize")
    }

    #[test]
    fn parses_let_with_int_literal() {
        let parsed = node(json!({
            "kind": "let",
            "identifier": "a",
            "value": {
                "kind": "literal",
                "type": { "kind": "type", "type": "int" },
                "value": 3
            }
        }));
        let Node::Let(binding) = parsed else {
            panic!("expected a let node");
        };
        assert_eq!(binding.identifier, "a");
        let Node::Literal(literal) = *binding.value else {
            panic!("expected a literal");
        };
        assert_eq!(literal.value, Some(LiteralValue::Int(3)));
    }

    #[test]
    fn unknown_kinds_are_kept_with_their_name() {
        let parsed = node(json!({ "kind": "match", "arms": [] }));
        assert!(matches!(parsed, Node::Unknown(_)));
        assert_eq!(parsed.kind(), "match");
    }

    #[test]
    fn known_kinds_with_missing_fields_are_malformed() {
        let missing_value: Result<Node, _> =
            serde_json::from_value(json!({ "kind": "let", "identifier": "a" }));
        let err = missing_value.unwrap_err();
        assert!(err.to_string().contains("missing field `value`"), "{err}");

        let untyped_literal: Result<Node, _> = serde_json::from_value(json!({
            "kind": "let",
            "identifier": "a",
            "value": { "kind": "literal", "value": 3 }
        }));
        let err = untyped_literal.unwrap_err();
        assert!(err.to_string().contains("missing field `type`"), "{err}");

        let no_kind: Result<Node, _> = serde_json::from_value(json!({ "name": "a" }));
        assert!(no_kind.is_err());
    }

    #[test]
    fn unknown_type_tags_are_kept_with_their_name() {
        let parsed = node(json!({ "kind": "type", "type": "u128" }));
        let Node::Type(descriptor) = parsed else {
            panic!("expected a type descriptor");
        };
        assert_eq!(descriptor.tag, TypeTag::Unknown("u128".to_string()));
        assert_eq!(descriptor.tag.to_string(), "u128");
    }

    #[test]
    fn object_structure_keeps_declaration_order() {
        let parsed = node(json!({
            "kind": "type",
            "type": "obj",
            "structure": {
                "zeta": { "kind": "type", "type": "int" },
                "alpha": { "kind": "type", "type": "str" }
            }
        }));
        let Node::Type(descriptor) = parsed else {
            panic!("expected a type descriptor");
        };
        let keys: Vec<_> = descriptor.structure.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn literal_payload_distinguishes_nodes_from_field_maps() {
        let type_literal = node(json!({
            "kind": "literal",
            "type": { "kind": "type", "type": "type" },
            "value": { "kind": "type", "type": "bool" }
        }));
        let Node::Literal(literal) = type_literal else {
            panic!("expected a literal");
        };
        assert!(matches!(literal.value, Some(LiteralValue::Node(_))));

        let object_literal = node(json!({
            "kind": "literal",
            "type": { "kind": "type", "type": "obj", "structure": {} },
            "value": { "x": { "kind": "identifier", "name": "a" } }
        }));
        let Node::Literal(literal) = object_literal else {
            panic!("expected a literal");
        };
        assert!(matches!(literal.value, Some(LiteralValue::Fields(_))));
    }

    #[test]
    fn parses_operators_and_else_chains() {
        let parsed = node(json!({
            "kind": "if",
            "condition": {
                "kind": "binary",
                "operator": "==",
                "left": { "kind": "identifier", "name": "a" },
                "right": { "kind": "identifier", "name": "b" }
            },
            "body": [],
            "else": [{
                "kind": "if",
                "condition": { "kind": "identifier", "name": "c" },
                "body": []
            }]
        }));
        let Node::If(branch) = parsed else {
            panic!("expected an if node");
        };
        assert!(matches!(*branch.condition, Node::Binary(Binary { operator: BinaryOp::Eq, .. })));
        assert_eq!(branch.alternate.map(|body| body.len()), Some(1));
    }

    #[test]
    fn parse_program_reads_a_statement_array() {
        let program = parse_program(r#"[{ "kind": "identifier", "name": "x" }]"#).expect("parse");
        assert_eq!(program.len(), 1);
        assert_eq!(program[0].kind(), "identifier");
    }
}
