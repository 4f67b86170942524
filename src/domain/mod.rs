//! Domain layer: company forest and cost aggregation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod expense;
pub mod view;

pub use arena::{CompanyNode, CostState, Forest};
pub use builder::ForestBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult, RecordKind};
pub use expense::{group_by_company_id, parse_price, ExpenseTotals};
pub use view::CompanyView;
