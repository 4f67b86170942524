//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::CompanyId;

/// Which input set a malformed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Travel,
    Company,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Travel => write!(f, "travel"),
            RecordKind::Company => write!(f, "company"),
        }
    }
}

/// Domain errors represent violations of the forest invariants.
/// Every variant aborts the whole input batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed {kind} record at index {index}: {message}")]
    MalformedRecord {
        kind: RecordKind,
        index: usize,
        message: String,
    },

    #[error("company {child} references unknown parent {parent}")]
    DanglingParent { child: CompanyId, parent: CompanyId },

    #[error("cycle detected in company ancestry at: {0}")]
    CyclicAncestry(CompanyId),

    #[error("duplicate company id: {0}")]
    DuplicateCompany(CompanyId),

    #[error("travel expenses reference unknown company: {0}")]
    UnknownCompany(CompanyId),

    #[error("cost overflow while aggregating company: {0}")]
    CostOverflow(CompanyId),

    #[error("node not found in forest")]
    NodeNotFound,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
