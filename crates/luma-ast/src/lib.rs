//! AST node definitions and arena for the Luma type checker.
//!
//! Nodes live in a flat [`NodeArena`] and refer to each other by [`NodeId`],
//! so the binder and checker can attach side tables (symbols, flow nodes,
//! types) keyed by id without touching the nodes themselves. The arena
//! exposes `add_*` builders; a front end (or a test) constructs programs by
//! calling them bottom-up.

pub mod arena;
pub mod node;

pub use arena::NodeArena;
pub use node::{
    BinaryOp, EnumMemberDecl, LogicalOp, MemberAnn, Node, NodeId, NodeKind, ObjectProperty,
    ParamAnn, ParamDecl, PredicateAnn, UnaryOp, VarDeclKind,
};
