//! Persistence core for bibliographic references.
//! Owns the `REFERENCE` schema and the citekey identity rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::reference::{
    FieldMap, Reference, ReferenceField, ReferenceFields, ReferenceValidationError,
};
pub use repo::reference_repo::{
    ReferenceRepository, RepoError, RepoResult, SqliteReferenceRepository,
};
pub use service::reference_service::{ReferenceService, ServiceError};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
