//! Bibliographic domain model.
//!
//! # Responsibility
//! - Define the canonical reference record persisted by core.
//! - Enumerate the fixed citation field catalogue once, in schema order.
//!
//! # Invariants
//! - Every reference is identified by its citekey.
//! - Field names are the `REFERENCE` column names verbatim.

pub mod reference;
