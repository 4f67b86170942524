//! JSON ingestion of raw travel and company records
//!
//! Input documents are JSON arrays of objects. Only the fields the forest
//! needs are read; everything else on a record is ignored.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{CompanyId, CompanyRecord, DomainError, RecordKind, TravelRecord};

/// Parse a JSON array of travels (`companyId`, `price`).
#[instrument(level = "debug", skip(content))]
pub fn parse_travels(content: &str) -> ApplicationResult<Vec<TravelRecord>> {
    let items = parse_array(content, "travels")?;
    let travels = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            travel_from_value(item).map_err(|message| malformed(RecordKind::Travel, index, message))
        })
        .collect::<ApplicationResult<Vec<_>>>()?;
    debug!("parsed {} travels", travels.len());
    Ok(travels)
}

/// Parse a JSON array of companies (`id`, `createdAt`, `name`, optional `parentId`).
///
/// A `parentId` equal to one of `root_markers` is read as "no parent".
#[instrument(level = "debug", skip(content))]
pub fn parse_companies(
    content: &str,
    root_markers: &[String],
) -> ApplicationResult<Vec<CompanyRecord>> {
    let items = parse_array(content, "companies")?;
    let companies = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            company_from_value(item, root_markers)
                .map_err(|message| malformed(RecordKind::Company, index, message))
        })
        .collect::<ApplicationResult<Vec<_>>>()?;
    debug!("parsed {} companies", companies.len());
    Ok(companies)
}

fn parse_array(content: &str, context: &str) -> ApplicationResult<Vec<Value>> {
    serde_json::from_str(content).map_err(|source| ApplicationError::Json {
        context: context.to_string(),
        source,
    })
}

fn malformed(kind: RecordKind, index: usize, message: String) -> ApplicationError {
    DomainError::MalformedRecord {
        kind,
        index,
        message,
    }
    .into()
}

fn travel_from_value(item: &Value) -> Result<TravelRecord, String> {
    let object = as_object(item)?;
    let company_id = id_field(object, "companyId")?;
    let price = match required(object, "price")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(format!("price is not number-like: {other}")),
    };
    Ok(TravelRecord { company_id, price })
}

fn company_from_value(item: &Value, root_markers: &[String]) -> Result<CompanyRecord, String> {
    let object = as_object(item)?;
    let id = id_field(object, "id")?;
    let created_at = opaque_field(object, "createdAt")?;
    let name = opaque_field(object, "name")?;
    let parent_id = match object.get("parentId") {
        None | Some(Value::Null) => None,
        Some(value) => Some(to_id(value).ok_or_else(|| format!("invalid parentId: {value}"))?),
    }
    .filter(|parent: &CompanyId| !root_markers.iter().any(|m| m == parent.as_str()));

    Ok(CompanyRecord {
        id,
        created_at,
        name,
        parent_id,
    })
}

fn as_object(item: &Value) -> Result<&Map<String, Value>, String> {
    item.as_object()
        .ok_or_else(|| format!("expected an object, found {item}"))
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value, String> {
    match object.get(field) {
        None | Some(Value::Null) => Err(format!("missing field `{field}`")),
        Some(value) => Ok(value),
    }
}

fn id_field(object: &Map<String, Value>, field: &str) -> Result<CompanyId, String> {
    let value = required(object, field)?;
    to_id(value).ok_or_else(|| format!("invalid {field}: {value}"))
}

/// Ids arrive as strings or integers.
fn to_id(value: &Value) -> Option<CompanyId> {
    match value {
        Value::String(s) => Some(CompanyId::new(s.as_str())),
        Value::Number(n) => Some(CompanyId::new(n.to_string())),
        _ => None,
    }
}

/// Descriptive fields are carried through as text.
fn opaque_field(object: &Map<String, Value>, field: &str) -> Result<String, String> {
    Ok(match required(object, field)? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
