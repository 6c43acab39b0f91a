//! Node arena and `add_*` creation methods.

use std::sync::Arc;

use luma_common::interner::{Atom, Interner};
use luma_common::span::Span;

use crate::node::{
    BinaryOp, EnumMemberDecl, LogicalOp, MemberAnn, Node, NodeId, NodeKind, ObjectProperty,
    ParamAnn, ParamDecl, PredicateAnn, UnaryOp, VarDeclKind,
};

/// Flat node pool for one source file.
///
/// The arena shares an [`Interner`] with the rest of the program so that
/// atoms created while building the AST compare equal to atoms created by
/// the type interner.
#[derive(Debug)]
pub struct NodeArena {
    interner: Arc<Interner>,
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new(interner: Arc<Interner>) -> Self {
        Self {
            interner,
            nodes: Vec::new(),
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Intern a name, for use in nodes built by hand.
    pub fn atom(&self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map(|node| node.span).unwrap_or(Span::ZERO)
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.span = span;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span: Span::ZERO,
        });
        id
    }

    // ---- Expressions ----

    pub fn add_ident(&mut self, name: &str) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::Ident { name })
    }

    pub fn add_number(&mut self, value: f64) -> NodeId {
        self.add(NodeKind::NumberLit { value })
    }

    pub fn add_string(&mut self, value: &str) -> NodeId {
        let value = self.atom(value);
        self.add(NodeKind::StringLit { value })
    }

    pub fn add_bool(&mut self, value: bool) -> NodeId {
        self.add(NodeKind::BoolLit { value })
    }

    pub fn add_null(&mut self) -> NodeId {
        self.add(NodeKind::NullLit)
    }

    pub fn add_undefined(&mut self) -> NodeId {
        self.add(NodeKind::UndefinedLit)
    }

    pub fn add_object(&mut self, properties: Vec<(Atom, NodeId)>) -> NodeId {
        let properties = properties
            .into_iter()
            .map(|(name, value)| ObjectProperty { name, value })
            .collect();
        self.add(NodeKind::ObjectLit { properties })
    }

    pub fn add_member(&mut self, object: NodeId, property: &str) -> NodeId {
        let property = self.atom(property);
        self.add(NodeKind::Member {
            object,
            property,
            optional: false,
        })
    }

    pub fn add_optional_member(&mut self, object: NodeId, property: &str) -> NodeId {
        let property = self.atom(property);
        self.add(NodeKind::Member {
            object,
            property,
            optional: true,
        })
    }

    pub fn add_call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Call { callee, arguments })
    }

    pub fn add_unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.add(NodeKind::Unary { op, operand })
    }

    pub fn add_binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.add(NodeKind::Binary { op, left, right })
    }

    pub fn add_logical(&mut self, op: LogicalOp, left: NodeId, right: NodeId) -> NodeId {
        self.add(NodeKind::Logical { op, left, right })
    }

    pub fn add_assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.add(NodeKind::Assign { target, value })
    }

    pub fn add_conditional(
        &mut self,
        condition: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    ) -> NodeId {
        self.add(NodeKind::Conditional {
            condition,
            when_true,
            when_false,
        })
    }

    pub fn add_paren(&mut self, expr: NodeId) -> NodeId {
        self.add(NodeKind::Paren { expr })
    }

    // ---- Statements ----

    pub fn add_var_decl(
        &mut self,
        name: &str,
        decl_kind: VarDeclKind,
        annotation: NodeId,
        initializer: NodeId,
    ) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::VarDecl {
            name,
            decl_kind,
            annotation,
            initializer,
        })
    }

    pub fn add_expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.add(NodeKind::ExprStmt { expr })
    }

    pub fn add_block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Block { statements })
    }

    pub fn add_if(&mut self, condition: NodeId, then_branch: NodeId, else_branch: NodeId) -> NodeId {
        self.add(NodeKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn add_while(&mut self, condition: NodeId, body: NodeId) -> NodeId {
        self.add(NodeKind::While { condition, body })
    }

    pub fn add_do_while(&mut self, body: NodeId, condition: NodeId) -> NodeId {
        self.add(NodeKind::DoWhile { body, condition })
    }

    pub fn add_for(
        &mut self,
        initializer: NodeId,
        condition: NodeId,
        incrementor: NodeId,
        body: NodeId,
    ) -> NodeId {
        self.add(NodeKind::For {
            initializer,
            condition,
            incrementor,
            body,
        })
    }

    pub fn add_return(&mut self, expr: NodeId) -> NodeId {
        self.add(NodeKind::Return { expr })
    }

    pub fn add_break(&mut self) -> NodeId {
        self.add(NodeKind::Break)
    }

    pub fn add_continue(&mut self) -> NodeId {
        self.add(NodeKind::Continue)
    }

    pub fn add_throw(&mut self, expr: NodeId) -> NodeId {
        self.add(NodeKind::Throw { expr })
    }

    pub fn add_try(
        &mut self,
        block: NodeId,
        catch_name: Atom,
        catch_block: NodeId,
        finally_block: NodeId,
    ) -> NodeId {
        self.add(NodeKind::Try {
            block,
            catch_name,
            catch_block,
            finally_block,
        })
    }

    pub fn add_func_decl(
        &mut self,
        name: &str,
        params: Vec<ParamDecl>,
        return_annotation: NodeId,
        predicate: Option<PredicateAnn>,
        body: NodeId,
    ) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::FuncDecl {
            name,
            params,
            return_annotation,
            predicate,
            body,
        })
    }

    pub fn add_interface_decl(&mut self, name: &str, members: Vec<MemberAnn>) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::InterfaceDecl { name, members })
    }

    pub fn add_type_alias_decl(&mut self, name: &str, annotation: NodeId) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::TypeAliasDecl { name, annotation })
    }

    pub fn add_enum_decl(&mut self, name: &str, members: Vec<(&str, NodeId)>) -> NodeId {
        let name = self.atom(name);
        let members = members
            .into_iter()
            .map(|(member, value)| EnumMemberDecl {
                name: self.atom(member),
                value,
            })
            .collect();
        self.add(NodeKind::EnumDecl { name, members })
    }

    // ---- Type annotations ----

    pub fn add_type_name(&mut self, name: &str) -> NodeId {
        let name = self.atom(name);
        self.add(NodeKind::TypeName { name })
    }

    pub fn add_type_string_lit(&mut self, value: &str) -> NodeId {
        let value = self.atom(value);
        self.add(NodeKind::TypeStringLit { value })
    }

    pub fn add_type_number_lit(&mut self, value: f64) -> NodeId {
        self.add(NodeKind::TypeNumberLit { value })
    }

    pub fn add_type_bool_lit(&mut self, value: bool) -> NodeId {
        self.add(NodeKind::TypeBoolLit { value })
    }

    pub fn add_type_union(&mut self, members: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::TypeUnion { members })
    }

    pub fn add_type_object(&mut self, members: Vec<MemberAnn>) -> NodeId {
        self.add(NodeKind::TypeObject { members })
    }

    pub fn add_type_func(&mut self, params: Vec<ParamAnn>, return_annotation: NodeId) -> NodeId {
        self.add(NodeKind::TypeFunc {
            params,
            return_annotation,
        })
    }

    pub fn add_type_ctor(&mut self, params: Vec<ParamAnn>, instance: NodeId) -> NodeId {
        self.add(NodeKind::TypeCtor { params, instance })
    }

    /// Shorthand for an object type member.
    pub fn member_ann(&self, name: &str, annotation: NodeId) -> MemberAnn {
        MemberAnn {
            name: self.atom(name),
            annotation,
            optional: false,
        }
    }

    /// Shorthand for an optional object type member.
    pub fn optional_member_ann(&self, name: &str, annotation: NodeId) -> MemberAnn {
        MemberAnn {
            name: self.atom(name),
            annotation,
            optional: true,
        }
    }

    /// Shorthand for a function declaration parameter.
    pub fn param(&self, name: &str, annotation: NodeId) -> ParamDecl {
        ParamDecl {
            name: self.atom(name),
            annotation,
            optional: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> NodeArena {
        NodeArena::new(Arc::new(Interner::new()))
    }

    #[test]
    fn nodes_get_sequential_ids() {
        let mut arena = arena();
        let a = arena.add_ident("x");
        let b = arena.add_number(1.0);
        let c = arena.add_binary(BinaryOp::Add, a, b);
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(c, NodeId(2));
        assert!(matches!(
            arena.kind(c),
            Some(NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            })
        ));
    }

    #[test]
    fn idents_share_atoms() {
        let mut arena = arena();
        let a = arena.add_ident("x");
        let b = arena.add_ident("x");
        let (Some(NodeKind::Ident { name: na }), Some(NodeKind::Ident { name: nb })) =
            (arena.kind(a).cloned(), arena.kind(b).cloned())
        else {
            panic!("expected identifiers");
        };
        assert_eq!(na, nb);
    }

    #[test]
    fn spans_default_to_zero_and_can_be_set() {
        let mut arena = arena();
        let id = arena.add_null();
        assert_eq!(arena.span(id), Span::ZERO);
        arena.set_span(id, Span::new(3, 7));
        assert_eq!(arena.span(id), Span::new(3, 7));
    }
}
