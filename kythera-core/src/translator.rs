//! Syntax-directed translation.
//!
//! A single recursive walk over the parse tree resolves names, derives and
//! checks types, and emits host runtime text. There is no separate checking
//! pass: every expression visit returns both its emitted text and its type.
//!
//! The current scope is passed explicitly to every visit as a [`ScopeId`]
//! into the [`ScopeTree`] owned by the walk.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::{
    Assign, Binary, BinaryOp, Call, If, Let, Literal, LiteralValue, New, Node, Parameter, Program,
    Return, TypeTag, Unary, UnaryOp, While,
};
use crate::error::TranslateError;
use crate::lower::{
    RUNTIME_NAMESPACE, check_identifier, expect_descriptor, make_kythera_type,
    make_type_constructor, quote,
};
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::types::{FnType, ObjType, Primitive, Type};
use crate::value::{Blueprint, Payload};

/// Emitted text of an expression together with its derived type.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowered {
    pub output: String,
    pub ty: Type,
}

/// Holds a loaded program and the scopes of its last successful translation.
///
/// One translator handles one program at a time; `load` replaces both.
#[derive(Debug, Default)]
pub struct Translator {
    program: Option<Program>,
    scopes: ScopeTree,
}

impl Translator {
    pub fn new() -> Self {
        Translator::default()
    }

    pub fn with_program(program: Program) -> Self {
        let mut translator = Translator::new();
        translator.load(program);
        translator
    }

    /// Store `program` and reset to a fresh root scope. Nothing is translated.
    pub fn load(&mut self, program: Program) {
        self.program = Some(program);
        self.scopes = ScopeTree::new();
    }

    /// Translate every top-level statement of the loaded program.
    ///
    /// Either the whole program translates or nothing is returned. On failure
    /// the root bindings are left empty.
    pub fn visit_program(&mut self) -> Result<String, TranslateError> {
        let program = self.program.as_ref().ok_or(TranslateError::NoProgramLoaded)?;
        self.scopes = ScopeTree::new();

        let mut walk = Walk {
            scopes: ScopeTree::new(),
        };
        let root = walk.scopes.root();
        let output = walk.visit_statements(program, root)?;

        self.scopes = walk.scopes;
        Ok(output)
    }

    /// Name to type of every top-level binding, in declaration order.
    pub fn root_bindings(&self) -> &IndexMap<String, Type> {
        self.scopes.symbols(self.scopes.root())
    }
}

/// State of one translation: the arena of every scope it opens.
struct Walk {
    scopes: ScopeTree,
}

impl Walk {
    fn visit_statements(&mut self, nodes: &[Node], scope: ScopeId) -> Result<String, TranslateError> {
        let mut output = String::new();
        for node in nodes {
            if let Some(statement) = self.visit_node(node, scope)? {
                output.push_str(&statement);
                output.push_str(";\n");
            }
        }
        Ok(output)
    }

    /// Statement dispatcher. `None` means the statement emits nothing.
    fn visit_node(&mut self, node: &Node, scope: ScopeId) -> Result<Option<String>, TranslateError> {
        let statement = match node {
            Node::Let(binding) => self.visit_let(binding, scope)?,
            Node::Assign(assign) => self.visit_assign(assign, scope)?,
            Node::Return(ret) => return self.visit_return(ret, scope),
            Node::If(branch) => self.visit_if(branch, scope)?,
            Node::While(repeat) => self.visit_while(repeat, scope)?,
            Node::Unknown(unknown) => {
                return Err(TranslateError::UnhandledNodeKind(unknown.kind.clone()));
            }
            Node::Identifier(_)
            | Node::Literal(_)
            | Node::New(_)
            | Node::Binary(_)
            | Node::Unary(_)
            | Node::Call(_)
            | Node::ObjAccess(_)
            | Node::Access(_)
            | Node::Type(_) => self.visit_expression_node(node, scope)?.output,
        };
        debug!(kind = node.kind(), "emitted statement");
        Ok(Some(statement))
    }

    /// Expression dispatcher.
    fn visit_expression_node(&mut self, node: &Node, scope: ScopeId) -> Result<Lowered, TranslateError> {
        match node {
            Node::Identifier(identifier) => Ok(Lowered {
                output: identifier.name.clone(),
                ty: self.resolve(scope, &identifier.name)?.clone(),
            }),
            Node::Literal(literal) => self.visit_literal(literal, scope),
            Node::New(new) => self.visit_new(new),
            Node::Binary(binary) => self.visit_binary(binary, scope),
            Node::Unary(unary) => self.visit_unary(unary, scope),
            Node::Call(call) => self.visit_call(call, scope),
            other => Err(TranslateError::UnhandledNodeKind(other.kind().to_string())),
        }
    }

    fn resolve(&self, scope: ScopeId, name: &str) -> Result<&Type, TranslateError> {
        if !self.scopes.has(scope, name) {
            return Err(TranslateError::UndefinedVariable(name.to_string()));
        }
        self.scopes.get(scope, name)
    }

    fn visit_literal(&mut self, literal: &Literal, scope: ScopeId) -> Result<Lowered, TranslateError> {
        let descriptor = expect_descriptor(&literal.ty)?;
        let ty = make_kythera_type(&literal.ty)?;

        let payload = match (&descriptor.tag, literal.value.as_ref()) {
            (TypeTag::Int, Some(LiteralValue::Int(value))) => Payload::Int(*value),
            (TypeTag::Float, Some(LiteralValue::Float(value))) => Payload::Float(*value),
            (TypeTag::Float, Some(LiteralValue::Int(value))) => Payload::Float(*value as f64),
            (TypeTag::Bool, Some(LiteralValue::Bool(value))) => Payload::Bool(*value),
            (TypeTag::Str, Some(LiteralValue::Str(value))) => Payload::Str(value),
            (TypeTag::Null, None) => Payload::Null,
            (TypeTag::Type, Some(LiteralValue::Node(value))) => {
                Payload::Type(make_kythera_type(value)?)
            }
            (TypeTag::Fn, None) => Payload::Function {
                parameters: &literal.parameters,
                body: &literal.body,
            },
            (TypeTag::Obj, Some(LiteralValue::Fields(fields))) => Payload::Object(fields),
            (tag, value) => {
                return Err(TranslateError::MalformedLiteral {
                    tag: tag.to_string(),
                    detail: match value {
                        Some(value) => format!("unexpected payload {value:?}"),
                        None => "missing payload".to_string(),
                    },
                });
            }
        };

        let blueprint = Blueprint::new(payload, ty);
        let output = self.make_value_constructor(&blueprint, scope)?;
        Ok(Lowered {
            output,
            ty: blueprint.ty,
        })
    }

    fn visit_new(&mut self, new: &New) -> Result<Lowered, TranslateError> {
        let target = make_kythera_type(&new.target)?;
        debug!(target = %target, "lowered target type for new");
        Ok(Lowered {
            output: format!("{}.makeNew()", make_type_constructor(&target)?),
            ty: target,
        })
    }

    fn visit_let(&mut self, binding: &Let, scope: ScopeId) -> Result<String, TranslateError> {
        let name = check_identifier(&binding.identifier)?;
        let value = self.visit_expression_node(&binding.value, scope)?;
        self.scopes.create(scope, name, value.ty)?;
        Ok(format!("let {name} = {}", value.output))
    }

    fn visit_assign(&mut self, assign: &Assign, scope: ScopeId) -> Result<String, TranslateError> {
        let Node::Identifier(target) = assign.left.as_ref() else {
            return Err(TranslateError::UnsupportedAssignmentTarget(
                assign.left.kind().to_string(),
            ));
        };

        let declared = self.resolve(scope, &target.name)?.clone();
        let value = self.visit_expression_node(&assign.right, scope)?;
        if declared != value.ty {
            return Err(TranslateError::TypeMismatch {
                expected: declared,
                found: value.ty,
                context: format!("assignment to {}", target.name),
            });
        }
        Ok(format!("{} = {}", target.name, value.output))
    }

    /// Outside any function the statement is dropped without an error.
    fn visit_return(&mut self, ret: &Return, scope: ScopeId) -> Result<Option<String>, TranslateError> {
        if !self.scopes.is_in_function(scope) {
            warn!("dropping return statement outside of a function");
            return Ok(None);
        }
        match &ret.value {
            Some(value) => {
                let value = self.visit_expression_node(value, scope)?;
                Ok(Some(format!("return {}", value.output)))
            }
            None => Ok(Some("return".to_string())),
        }
    }

    fn visit_if(&mut self, branch: &If, scope: ScopeId) -> Result<String, TranslateError> {
        let condition = self.visit_condition(&branch.condition, scope, "if condition")?;
        let then_body = self.visit_block(&branch.body, scope)?;
        let mut output = format!("if ({condition}.value) {{\n{then_body}}}");
        if let Some(alternate) = &branch.alternate {
            let else_body = self.visit_block(alternate, scope)?;
            output.push_str(&format!(" else {{\n{else_body}}}"));
        }
        Ok(output)
    }

    fn visit_while(&mut self, repeat: &While, scope: ScopeId) -> Result<String, TranslateError> {
        let condition = self.visit_condition(&repeat.condition, scope, "while condition")?;
        let body = self.visit_block(&repeat.body, scope)?;
        Ok(format!("while ({condition}.value) {{\n{body}}}"))
    }

    fn visit_condition(
        &mut self,
        node: &Node,
        scope: ScopeId,
        context: &str,
    ) -> Result<String, TranslateError> {
        let condition = self.visit_expression_node(node, scope)?;
        if condition.ty != Type::BOOL {
            return Err(TranslateError::TypeMismatch {
                expected: Type::BOOL,
                found: condition.ty,
                context: context.to_string(),
            });
        }
        Ok(condition.output)
    }

    fn visit_block(&mut self, body: &[Node], parent: ScopeId) -> Result<String, TranslateError> {
        let block = self.scopes.push_child(parent, ScopeKind::Block);
        self.visit_statements(body, block)
    }

    fn visit_binary(&mut self, binary: &Binary, scope: ScopeId) -> Result<Lowered, TranslateError> {
        let left = self.visit_expression_node(&binary.left, scope)?;
        let right = self.visit_expression_node(&binary.right, scope)?;
        let operator = binary.operator;

        if left.ty != right.ty {
            return Err(TranslateError::TypeMismatch {
                expected: left.ty,
                found: right.ty,
                context: format!("operands of '{}'", operator.symbol()),
            });
        }

        let operand = left.ty.as_primitive();
        let accepted = match operator {
            BinaryOp::Add => left.ty.is_numeric() || operand == Some(Primitive::Str),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => left.ty.is_numeric(),
            BinaryOp::Eq | BinaryOp::Ne => true,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => left.ty.is_numeric(),
            BinaryOp::And | BinaryOp::Or => operand == Some(Primitive::Bool),
        };
        if !accepted {
            return Err(TranslateError::InvalidOperand {
                operator: operator.symbol().to_string(),
                ty: left.ty,
            });
        }

        let ty = match operator {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                left.ty.clone()
            }
            _ => Type::BOOL,
        };

        let (l, r) = (&left.output, &right.output);
        let expression = match operator {
            BinaryOp::Div if operand == Some(Primitive::Int) => {
                format!("Math.trunc({l}.value / {r}.value)")
            }
            BinaryOp::Eq => format!("{l}.value === {r}.value"),
            BinaryOp::Ne => format!("{l}.value !== {r}.value"),
            _ => format!("{l}.value {} {r}.value", operator.symbol()),
        };

        Ok(Lowered {
            output: format!(
                "new {RUNTIME_NAMESPACE}.value({expression}, {})",
                make_type_constructor(&ty)?
            ),
            ty,
        })
    }

    fn visit_unary(&mut self, unary: &Unary, scope: ScopeId) -> Result<Lowered, TranslateError> {
        let operand = self.visit_expression_node(&unary.operand, scope)?;
        let accepted = match unary.operator {
            UnaryOp::Neg => operand.ty.is_numeric(),
            UnaryOp::Not => operand.ty == Type::BOOL,
        };
        if !accepted {
            return Err(TranslateError::InvalidOperand {
                operator: unary.operator.symbol().to_string(),
                ty: operand.ty,
            });
        }
        Ok(Lowered {
            output: format!(
                "new {RUNTIME_NAMESPACE}.value({}({}.value), {})",
                unary.operator.symbol(),
                operand.output,
                make_type_constructor(&operand.ty)?
            ),
            ty: operand.ty,
        })
    }

    fn visit_call(&mut self, call: &Call, scope: ScopeId) -> Result<Lowered, TranslateError> {
        let callee = self.visit_expression_node(&call.callee, scope)?;
        let signature = match callee.ty {
            Type::Fn(signature) => signature,
            other => return Err(TranslateError::NotCallable(other)),
        };
        if signature.parameters.len() != call.arguments.len() {
            return Err(TranslateError::ArityMismatch {
                expected: signature.parameters.len(),
                found: call.arguments.len(),
            });
        }

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for (index, (argument, expected)) in
            call.arguments.iter().zip(&signature.parameters).enumerate()
        {
            let argument = self.visit_expression_node(argument, scope)?;
            if &argument.ty != expected {
                return Err(TranslateError::TypeMismatch {
                    expected: expected.clone(),
                    found: argument.ty,
                    context: format!("argument {} of call", index + 1),
                });
            }
            arguments.push(argument.output);
        }

        Ok(Lowered {
            output: format!("{}.value({})", callee.output, arguments.join(", ")),
            ty: *signature.returns,
        })
    }

    /// Emit the runtime constructor for a literal value, with its type attached.
    fn make_value_constructor(
        &mut self,
        blueprint: &Blueprint<'_>,
        scope: ScopeId,
    ) -> Result<String, TranslateError> {
        let payload = match (&blueprint.payload, &blueprint.ty) {
            (Payload::Str(text), _) => quote(text),
            (Payload::Int(value), _) => value.to_string(),
            (Payload::Float(value), _) => value.to_string(),
            (Payload::Bool(value), _) => value.to_string(),
            (Payload::Null, _) => "null".to_string(),
            (Payload::Type(ty), _) => make_type_constructor(ty)?,
            (Payload::Function { parameters, body }, Type::Fn(signature)) => {
                self.emit_function(parameters, body, signature, scope)?
            }
            (Payload::Object(fields), Type::Obj(shape)) => self.emit_object(fields, shape, scope)?,
            (_, ty) => {
                return Err(TranslateError::MalformedLiteral {
                    tag: ty.tag().to_string(),
                    detail: "payload does not match its declared type".to_string(),
                });
            }
        };
        Ok(format!(
            "new {RUNTIME_NAMESPACE}.value({payload}, {})",
            make_type_constructor(&blueprint.ty)?
        ))
    }

    /// Parameters are bound in a fresh function scope, which the body is
    /// translated in and which is never entered again afterwards.
    fn emit_function(
        &mut self,
        parameters: &[Parameter],
        body: &[Node],
        signature: &FnType,
        scope: ScopeId,
    ) -> Result<String, TranslateError> {
        if parameters.len() != signature.parameters.len() {
            return Err(TranslateError::MalformedLiteral {
                tag: "fn".to_string(),
                detail: format!(
                    "{} parameter names for {} parameter types",
                    parameters.len(),
                    signature.parameters.len()
                ),
            });
        }

        let function_scope = self.scopes.push_child(scope, ScopeKind::Function);
        let mut names = Vec::with_capacity(parameters.len());
        for (param, ty) in parameters.iter().zip(&signature.parameters) {
            let name = check_identifier(&param.name)?;
            self.scopes.create(function_scope, name, ty.clone())?;
            names.push(name);
        }

        let statements = self.visit_statements(body, function_scope)?;
        Ok(format!("({}) => {{\n{statements}}}", names.join(",")))
    }

    fn emit_object(
        &mut self,
        fields: &IndexMap<String, Node>,
        shape: &ObjType,
        scope: ScopeId,
    ) -> Result<String, TranslateError> {
        if let Some(extra) = fields.keys().find(|name| !shape.fields.contains_key(*name)) {
            return Err(TranslateError::MalformedLiteral {
                tag: "obj".to_string(),
                detail: format!("field '{extra}' is not declared by the object type"),
            });
        }

        let mut entries = String::new();
        for (name, declared) in &shape.fields {
            let expression = fields.get(name).ok_or_else(|| TranslateError::MalformedLiteral {
                tag: "obj".to_string(),
                detail: format!("missing a value for field '{name}'"),
            })?;
            let value = self.visit_expression_node(expression, scope)?;
            if &value.ty != declared {
                return Err(TranslateError::TypeMismatch {
                    expected: declared.clone(),
                    found: value.ty,
                    context: format!("field '{name}'"),
                });
            }
            entries.push_str(&format!("{}: {},", quote(name), value.output));
        }
        Ok(format!("{{{entries}}}"))
    }
}
