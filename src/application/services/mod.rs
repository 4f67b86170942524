//! Application services

pub mod company_tree;

pub use company_tree::{CompanyTreeOutput, CompanyTreeService, TreeOptions};
