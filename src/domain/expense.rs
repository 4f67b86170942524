//! Expense aggregation: per-company sums of travel prices

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult, RecordKind};
use crate::domain::{CompanyId, TravelRecord};

/// Direct expense per company. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseTotals {
    totals: HashMap<CompanyId, Decimal>,
}

impl ExpenseTotals {
    /// Total for `company_id`; companies without travels cost nothing.
    pub fn get(&self, company_id: &CompanyId) -> Decimal {
        self.totals
            .get(company_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, company_id: &CompanyId) -> bool {
        self.totals.contains_key(company_id)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompanyId, &Decimal)> {
        self.totals.iter()
    }

    /// Sum of all direct expenses.
    pub fn grand_total(&self) -> Decimal {
        self.totals.values().copied().sum()
    }
}

/// Parse a number-like price. Accepts plain and scientific notation.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Group travel records by company and sum their prices.
///
/// Fails on the first record whose price is not a number; skipping it would
/// undercount the company.
#[instrument(level = "debug", skip(records), fields(records = records.len()))]
pub fn group_by_company_id(records: &[TravelRecord]) -> DomainResult<ExpenseTotals> {
    let mut totals: HashMap<CompanyId, Decimal> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let price = parse_price(&record.price).ok_or_else(|| DomainError::MalformedRecord {
            kind: RecordKind::Travel,
            index,
            message: format!("price is not a number: {:?}", record.price),
        })?;

        let total = totals.entry(record.company_id.clone()).or_default();
        *total = total
            .checked_add(price)
            .ok_or_else(|| DomainError::CostOverflow(record.company_id.clone()))?;
    }

    debug!("grouped travels into {} companies", totals.len());
    Ok(ExpenseTotals { totals })
}
