//! Flow-sensitive type checker.
//!
//! The checker sits between the binder and the solver: it walks bound
//! statements and expressions, lowers annotations and declarations into
//! solver types, runs flow analysis over the binder's graph to narrow
//! symbol reads, and reports diagnostics.
//!
//! Checking one file is single threaded; a [`Program`] checks its files in
//! parallel against shared concurrent tables.

mod context;
mod expr;
mod flow_analysis;
mod guards;
mod lower;
mod program;
mod statements;

pub use context::CheckerState;
pub use program::{CheckedFile, Program, SourceFile};
