//! costtree: company forests with aggregated travel cost
//!
//! Flat travel and company records go in; root companies come out, each
//! carrying its subtree and an effective cost that folds in every descendant.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
