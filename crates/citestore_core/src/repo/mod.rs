//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the reference data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes validate the citekey before any SQL mutation.
//! - "Nothing found" is a neutral result (`None`, empty list), never an error.

pub mod reference_repo;
