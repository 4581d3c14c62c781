//! Errors reported by [`Binder`](super::Binder) operations.
//!
//! Every failed call leaves the binder exactly as it was before the call:
//! same notes, same order, same block. Callers can retry or propagate.

use std::collections::TryReserveError;

use thiserror::Error;

/// The error type for binder operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BinderError {
    /// A note with the inserted key is already present.
    #[error("key already exists")]
    DuplicateKey,

    /// The referenced key (removal, lookup or insertion anchor) is absent.
    #[error("key not found")]
    KeyNotFound,

    /// `remove_front` was called on a binder holding no notes.
    #[error("binder is empty")]
    EmptyContainer,

    /// Reserving storage for a clone or a new note failed.
    ///
    /// Tests cannot exhaust the allocator on demand, so the strong guarantee
    /// on this path is exercised through panicking `Clone` impls that fail
    /// at the same points.
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

impl BinderError {
    /// Returns `true` if this error was caused by a missing key.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }
}

/// A specialized `Result` for binder operations.
pub type Result<T> = std::result::Result<T, BinderError>;
