//! Lexical scopes.
//!
//! All scopes created while translating one program live in a single
//! [`ScopeTree`] arena and are released together with it. A scope refers to
//! its parent by [`ScopeId`], so lookups walk outward without any owning
//! back-references.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::TranslateError;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    /// Body of an `if` branch or `while` loop.
    Block,
    /// Body of a function literal; marks a function boundary.
    Function,
}

#[derive(Debug)]
struct ScopeData {
    symbols: IndexMap<String, Type>,
    parent: Option<ScopeId>,
    kind: ScopeKind,
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}

impl ScopeTree {
    /// A tree holding only the root scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![ScopeData {
                symbols: IndexMap::new(),
                parent: None,
                kind: ScopeKind::Root,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a fresh scope nested in `parent`. Ids are never reused.
    pub fn push_child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            symbols: IndexMap::new(),
            parent: Some(parent),
            kind,
        });
        debug!(scope = id.0, parent = parent.0, ?kind, "opened scope");
        id
    }

    #[cfg(test)]
    fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.data(scope).kind
    }

    /// Declare `name` in `scope` itself.
    ///
    /// A name may shadow one from an enclosing scope, but may not be declared
    /// twice in the same scope.
    pub fn create(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
    ) -> Result<(), TranslateError> {
        let symbols = &mut self.data_mut(scope).symbols;
        if symbols.contains_key(name) {
            return Err(TranslateError::DuplicateDeclaration(name.to_string()));
        }
        symbols.insert(name.to_string(), ty);
        Ok(())
    }

    /// Resolve `name` starting at `scope` and walking outward to the root.
    pub fn get(&self, scope: ScopeId, name: &str) -> Result<&Type, TranslateError> {
        self.lookup(scope, name)
            .ok_or_else(|| TranslateError::UndefinedSymbol(name.to_string()))
    }

    pub fn has(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name).is_some()
    }

    /// Whether `scope` is, or is nested inside, a function body.
    pub fn is_in_function(&self, scope: ScopeId) -> bool {
        self.ancestors(scope)
            .any(|data| data.kind == ScopeKind::Function)
    }

    /// Bindings declared directly in `scope`, in declaration order.
    pub fn symbols(&self, scope: ScopeId) -> &IndexMap<String, Type> {
        &self.data(scope).symbols
    }

    fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Type> {
        self.ancestors(scope)
            .find_map(|data| data.symbols.get(name))
    }

    fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = &ScopeData> {
        let mut next = Some(scope);
        std::iter::from_fn(move || {
            let data = self.data(next?);
            next = data.parent;
            Some(data)
        })
    }

    fn data(&self, scope: ScopeId) -> &ScopeData {
        &self.scopes[scope.0]
    }

    fn data_mut(&mut self, scope: ScopeId) -> &mut ScopeData {
        &mut self.scopes[scope.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.create(root, "a", Type::INT).unwrap();
        let inner = tree.push_child(root, ScopeKind::Function);
        tree.create(inner, "b", Type::STR).unwrap();

        assert_eq!(tree.get(inner, "a").unwrap(), &Type::INT);
        assert_eq!(tree.get(inner, "b").unwrap(), &Type::STR);
        assert!(tree.has(inner, "a"));
        assert!(!tree.has(root, "b"));
        assert_eq!(
            tree.get(root, "b").unwrap_err(),
            TranslateError::UndefinedSymbol("b".to_string())
        );
    }

    #[test]
    fn inner_declarations_shadow_outer_ones() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.create(root, "x", Type::INT).unwrap();
        let inner = tree.push_child(root, ScopeKind::Block);
        tree.create(inner, "x", Type::BOOL).unwrap();

        assert_eq!(tree.get(inner, "x").unwrap(), &Type::BOOL);
        assert_eq!(tree.get(root, "x").unwrap(), &Type::INT);
    }

    #[test]
    fn rejects_redeclaration_in_the_same_scope() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.create(root, "x", Type::INT).unwrap();
        let err = tree.create(root, "x", Type::INT).unwrap_err();
        assert_eq!(err, TranslateError::DuplicateDeclaration("x".to_string()));
    }

    #[test]
    fn function_boundary_is_visible_from_nested_blocks() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let block = tree.push_child(root, ScopeKind::Block);
        let function = tree.push_child(root, ScopeKind::Function);
        let nested = tree.push_child(function, ScopeKind::Block);

        assert!(!tree.is_in_function(root));
        assert!(!tree.is_in_function(block));
        assert!(tree.is_in_function(function));
        assert!(tree.is_in_function(nested));
        assert_eq!(tree.kind(nested), ScopeKind::Block);
    }

    #[test]
    fn child_scopes_are_never_reused() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let first = tree.push_child(root, ScopeKind::Function);
        let second = tree.push_child(root, ScopeKind::Function);
        assert_ne!(first, second);
        tree.create(first, "p", Type::INT).unwrap();
        assert!(!tree.has(second, "p"));
    }

    #[test]
    fn symbols_keep_declaration_order() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        for name in ["c", "a", "b"] {
            tree.create(root, name, Type::NULL).unwrap();
        }
        let names: Vec<_> = tree.symbols(root).keys().cloned().collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
