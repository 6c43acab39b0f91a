//! Binder for the Luma type checker.
//!
//! The binder walks a file's AST once, producing symbol tables, a mapping
//! from reference nodes to symbols, and the backward control-flow graph the
//! narrowing engine consumes. It reports name-resolution errors (unknown
//! names, duplicate declarations); all type errors are the checker's job.

pub mod flow;
pub mod state;
pub mod symbols;

pub use flow::{FlowNode, FlowNodeArena, FlowNodeId, flow_flags};
pub use state::{BindResult, BinderState};
pub use symbols::{Symbol, SymbolArena, SymbolId, SymbolTable, symbol_flags};
