//! HTTP handlers for the cat and owner resources.

pub mod cats;
pub mod owners;

use crate::error::AppError;
use crate::store::Page;
use std::collections::HashMap;

/// Ids that are not integers cannot match a row.
fn parse_id(kind: &str, id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("{} {}", kind, id_str)))
}

/// `limit` / `offset` from the query string; unparseable values are ignored.
fn page_from_query(params: &HashMap<String, String>) -> Page {
    let limit = params.get("limit").and_then(|v| v.parse().ok());
    let offset = params.get("offset").and_then(|v| v.parse().ok());
    Page::new(limit, offset)
}
