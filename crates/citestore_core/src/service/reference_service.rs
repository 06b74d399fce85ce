//! Reference use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for the reference manager.
//! - Delegate persistence to a `ReferenceRepository` implementation.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::reference::{Reference, ReferenceFields};
use crate::repo::reference_repo::{ReferenceRepository, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for checked reference creation.
#[derive(Debug)]
pub enum ServiceError {
    /// Citekey already belongs to a stored reference.
    CitekeyTaken(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CitekeyTaken(citekey) => write!(f, "citekey already in use: `{citekey}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CitekeyTaken(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConstraintViolation { citekey } => Self::CitekeyTaken(citekey),
            other => Self::Repo(other),
        }
    }
}

/// Use-case wrapper over a reference repository.
pub struct ReferenceService<R: ReferenceRepository> {
    repo: R,
}

impl<R: ReferenceRepository> ReferenceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a reference after checking that its citekey is free.
    ///
    /// # Contract
    /// - Returns `CitekeyTaken` instead of a raw storage error on duplicates.
    /// - Returns the stored citekey on success.
    pub fn create_reference(&self, reference: &Reference) -> Result<String, ServiceError> {
        if !self.repo.citekey_is_available(&reference.citekey)? {
            return Err(ServiceError::CitekeyTaken(reference.citekey.clone()));
        }
        self.repo.add_reference(reference)?;
        Ok(reference.citekey.clone())
    }

    pub fn list_references(&self) -> RepoResult<Vec<Reference>> {
        self.repo.get_all()
    }

    pub fn get_reference(&self, citekey: &str) -> RepoResult<Option<Reference>> {
        self.repo.fetch_selected_references_data_fields(citekey)
    }

    /// Replaces a stored reference; `None` when nothing matched.
    pub fn update_reference(&self, reference: &Reference) -> RepoResult<Option<Reference>> {
        self.repo.update_selected_reference(reference)
    }

    pub fn delete_reference(&self, citekey: &str) -> RepoResult<Option<String>> {
        self.repo.delete_selected_reference(citekey)
    }

    pub fn search(&self, query: &str) -> RepoResult<Vec<Reference>> {
        self.repo.fetch_matching_references(query)
    }

    /// Imports parsed candidates, skipping citekeys already stored.
    pub fn import<T: ReferenceFields + Clone>(&self, candidates: &[T]) -> RepoResult<Vec<T>> {
        self.repo.add_references_from_bib_file(candidates)
    }

    pub fn clear(&self) -> RepoResult<()> {
        self.repo.delete_all()
    }
}
