//! Common types and utilities for the Luma type checker.
//!
//! This crate provides foundational types used across all luma crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics (`Diagnostic`, diagnostic codes and message templates)
//! - Centralized limits and thresholds
//! - Cooperative cancellation (`CancellationToken`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics produced by the binder and checker
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

// Centralized limits and thresholds
pub mod limits;

// Cooperative cancellation
pub mod cancellation;
pub use cancellation::CancellationToken;
