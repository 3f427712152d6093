//! Owner handlers. Owners are read-only here.

use super::{page_from_query, parse_id};
use crate::error::AppError;
use crate::representation::OwnerRecord;
use crate::response;
use crate::state::AppState;
use crate::store::CatRepository;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let page = page_from_query(&params);
    let owners = state.store.list_owners(page).await?;
    let records: Vec<OwnerRecord> = owners.iter().map(OwnerRecord::from).collect();
    Ok(response::list(records))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("owner", &id_str)?;
    let detail = state
        .store
        .get_owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("owner {}", id)))?;
    Ok(response::ok(OwnerRecord::from(&detail)))
}
