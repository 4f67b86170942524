//! Domain entities: input records as the core receives them

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a company, unique across one input set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(String);

impl CompanyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CompanyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One travel expense.
///
/// The price is kept as the number-like text it arrived as; it only becomes a
/// decimal inside the expense aggregation, which owns the parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelRecord {
    pub company_id: CompanyId,
    pub price: String,
}

impl TravelRecord {
    pub fn new(company_id: impl Into<CompanyId>, price: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            price: price.into(),
        }
    }
}

/// One company as delivered by the input, before it is placed in a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: CompanyId,
    /// Passed through unchanged
    pub created_at: String,
    /// Passed through unchanged
    pub name: String,
    /// `None` marks a forest root
    pub parent_id: Option<CompanyId>,
}

impl CompanyRecord {
    pub fn new(
        id: impl Into<CompanyId>,
        created_at: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<CompanyId>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            name: name.into(),
            parent_id,
        }
    }

    /// A root company: one without a parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_company_without_parent_when_checking_then_is_root() {
        let company = CompanyRecord::new("1", "2020-01-01", "Webprovise Corp", None);
        assert!(company.is_root());
    }

    #[test]
    fn given_company_with_parent_when_checking_then_is_not_root() {
        let company = CompanyRecord::new("2", "2020-01-02", "Stamm LLC", Some("1".into()));
        assert!(!company.is_root());
    }

    #[test]
    fn given_company_id_when_serialized_then_is_plain_string() {
        let json = serde_json::to_string(&CompanyId::new("uuid-1")).unwrap();
        assert_eq!(json, "\"uuid-1\"");
    }
}
