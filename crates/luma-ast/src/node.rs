//! Node kinds.
//!
//! `NodeKind` is a closed union: every consumer matches exhaustively, so
//! adding a kind is a compile error at each dispatch site until it is
//! handled.

use luma_common::Atom;
use luma_common::Span;

/// Index of a node in its [`crate::NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!x`
    Not,
    /// `typeof x`
    TypeOf,
    /// `-x`
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    InstanceOf,
}

impl BinaryOp {
    /// Equality operators participate in narrowing.
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq
        )
    }

    /// `==` / `!=` also equate `null` and `undefined`.
    pub fn is_loose_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    /// True for the negated forms `!=` and `!==`.
    pub fn is_negated(self) -> bool {
        matches!(self, BinaryOp::NotEq | BinaryOp::StrictNotEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
    Let,
    Const,
}

/// `name: value` entry of an object literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectProperty {
    pub name: Atom,
    pub value: NodeId,
}

/// Function declaration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Atom,
    /// Type annotation node, or `NodeId::NONE` for an untyped parameter.
    pub annotation: NodeId,
    pub optional: bool,
}

/// Parameter of a function *type annotation*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamAnn {
    pub name: Atom,
    pub annotation: NodeId,
    pub optional: bool,
}

/// Member of an object type annotation or interface body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberAnn {
    pub name: Atom,
    pub annotation: NodeId,
    pub optional: bool,
}

/// `param is T` return-position predicate on a function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateAnn {
    pub param: Atom,
    pub annotation: NodeId,
}

/// One member of an enum declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMemberDecl {
    pub name: Atom,
    /// Explicit initializer (a number or string literal node), or
    /// `NodeId::NONE` for auto-numbering.
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ---- Expressions ----
    Ident {
        name: Atom,
    },
    NumberLit {
        value: f64,
    },
    StringLit {
        value: Atom,
    },
    BoolLit {
        value: bool,
    },
    NullLit,
    UndefinedLit,
    ObjectLit {
        properties: Vec<ObjectProperty>,
    },
    Member {
        object: NodeId,
        property: Atom,
        /// `obj?.prop`
        optional: bool,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Logical {
        op: LogicalOp,
        left: NodeId,
        right: NodeId,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        condition: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    },
    Paren {
        expr: NodeId,
    },

    // ---- Statements ----
    VarDecl {
        name: Atom,
        decl_kind: VarDeclKind,
        /// Type annotation node, or `NodeId::NONE` to infer from the
        /// initializer.
        annotation: NodeId,
        /// Initializer expression, or `NodeId::NONE`.
        initializer: NodeId,
    },
    ExprStmt {
        expr: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        /// `NodeId::NONE` when there is no `else`.
        else_branch: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        /// Each of these may be `NodeId::NONE`.
        initializer: NodeId,
        condition: NodeId,
        incrementor: NodeId,
        body: NodeId,
    },
    Return {
        /// `NodeId::NONE` for a bare `return;`.
        expr: NodeId,
    },
    Break,
    Continue,
    Throw {
        expr: NodeId,
    },
    Try {
        block: NodeId,
        /// `Atom::NONE` when the catch clause has no binding.
        catch_name: Atom,
        /// `NodeId::NONE` when there is no catch clause.
        catch_block: NodeId,
        /// `NodeId::NONE` when there is no finally clause.
        finally_block: NodeId,
    },
    FuncDecl {
        name: Atom,
        params: Vec<ParamDecl>,
        /// `NodeId::NONE` to infer the return type.
        return_annotation: NodeId,
        /// `Some` when the function is a user-defined type guard.
        predicate: Option<PredicateAnn>,
        body: NodeId,
    },
    InterfaceDecl {
        name: Atom,
        members: Vec<MemberAnn>,
    },
    TypeAliasDecl {
        name: Atom,
        annotation: NodeId,
    },
    EnumDecl {
        name: Atom,
        members: Vec<EnumMemberDecl>,
    },

    // ---- Type annotations ----
    /// Reference to an intrinsic or declared type name.
    TypeName {
        name: Atom,
    },
    TypeStringLit {
        value: Atom,
    },
    TypeNumberLit {
        value: f64,
    },
    TypeBoolLit {
        value: bool,
    },
    TypeUnion {
        members: Vec<NodeId>,
    },
    TypeObject {
        members: Vec<MemberAnn>,
    },
    TypeFunc {
        params: Vec<ParamAnn>,
        return_annotation: NodeId,
    },
    /// Constructor type; `new (...) => instance`. The declared type of a
    /// value usable on the right of `instanceof`.
    TypeCtor {
        params: Vec<ParamAnn>,
        instance: NodeId,
    },
}

impl NodeKind {
    pub fn is_type_annotation(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeName { .. }
                | NodeKind::TypeStringLit { .. }
                | NodeKind::TypeNumberLit { .. }
                | NodeKind::TypeBoolLit { .. }
                | NodeKind::TypeUnion { .. }
                | NodeKind::TypeObject { .. }
                | NodeKind::TypeFunc { .. }
                | NodeKind::TypeCtor { .. }
        )
    }
}
