//! Structural type system for Kythera.
//!
//! Types are identified by shape, never by name: two function types are the
//! same type when their parameters and results line up, two object types are
//! the same type when they declare the same fields with the same types.
//! Types are first-class values, so `type` is itself one of the primitives.

use std::fmt;

use indexmap::IndexMap;

/// Primitive type tags. Each one has exactly one [`Type`] instance,
/// available through [`Primitive::ty`] or the constants on [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    Str,
    Null,
    Type,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Int,
        Primitive::Float,
        Primitive::Bool,
        Primitive::Str,
        Primitive::Null,
        Primitive::Type,
    ];

    /// Key of this primitive in the runtime's interned primitive table.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Str => "str",
            Primitive::Null => "null",
            Primitive::Type => "type",
        }
    }

    pub fn ty(self) -> Type {
        Type::Primitive(self)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Primitive::Int | Primitive::Float)
    }
}

/// Function shape: ordered parameter types and one return type.
#[derive(Debug, Clone)]
pub struct FnType {
    pub parameters: Vec<Type>,
    pub returns: Box<Type>,
}

/// Object shape: field name to field type, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjType {
    pub fields: IndexMap<String, Type>,
}

#[derive(Debug, Clone)]
pub enum Type {
    Primitive(Primitive),
    Fn(FnType),
    Obj(ObjType),
    /// Placeholder tag. Lowering never produces it and emission rejects it.
    List,
}

impl Type {
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const FLOAT: Type = Type::Primitive(Primitive::Float);
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const STR: Type = Type::Primitive(Primitive::Str);
    pub const NULL: Type = Type::Primitive(Primitive::Null);
    pub const TYPE: Type = Type::Primitive(Primitive::Type);

    pub fn function(parameters: Vec<Type>, returns: Type) -> Type {
        Type::Fn(FnType {
            parameters,
            returns: Box::new(returns),
        })
    }

    pub fn object<I, K>(fields: I) -> Type
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Obj(ObjType {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// The tag the runtime type constructor is called with.
    pub fn tag(&self) -> &'static str {
        match self {
            Type::Primitive(primitive) => primitive.name(),
            Type::Fn(_) => "fn",
            Type::Obj(_) => "obj",
            Type::List => "list",
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_numeric)
    }

    /// Structural equality.
    ///
    /// * primitives: same tag
    /// * `fn`: same arity, pairwise equal parameters, equal return types
    /// * `obj`: identical field-name sets, each field's types equal;
    ///   declaration order is irrelevant
    pub fn structurally_eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Fn(a), Type::Fn(b)) => {
                a.parameters.len() == b.parameters.len()
                    && a
                        .parameters
                        .iter()
                        .zip(&b.parameters)
                        .all(|(lt, rt)| lt.structurally_eq(rt))
                    && a.returns.structurally_eq(&b.returns)
            }
            (Type::Obj(a), Type::Obj(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields.iter().all(|(name, ty)| {
                        b.fields
                            .get(name)
                            .is_some_and(|other_ty| ty.structurally_eq(other_ty))
                    })
            }
            (Type::List, Type::List) => true,
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        self.structurally_eq(other)
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(primitive) => f.write_str(primitive.name()),
            Type::Fn(fn_ty) => {
                f.write_str("fn(")?;
                for (i, param) in fn_ty.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", fn_ty.returns)
            }
            Type::Obj(obj) => {
                if obj.fields.is_empty() {
                    return f.write_str("obj {}");
                }
                f.write_str("obj { ")?;
                for (i, (name, ty)) in obj.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                f.write_str(" }")
            }
            Type::List => f.write_str("list"),
        }
    }
}
