//! Cat handlers: list, create, read, full and partial update, delete.

use super::{page_from_query, parse_id};
use crate::error::AppError;
use crate::representation::{cat, CatRecord};
use crate::response;
use crate::state::AppState;
use crate::store::CatRepository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Re-read after a write so the record carries linked achievements.
async fn load_record(state: &AppState, id: i64) -> Result<CatRecord, AppError> {
    let detail = state
        .store
        .get_cat(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cat {}", id)))?;
    Ok(CatRecord::now(&detail))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let page = page_from_query(&params);
    let cats = state.store.list_cats(page).await?;
    let records: Vec<CatRecord> = cats.iter().map(CatRecord::now).collect();
    Ok(response::list(records))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let created = cat::create(&state.store, &body).await?;
    let record = load_record(&state, created.id).await?;
    Ok(response::created(record))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("cat", &id_str)?;
    Ok(response::ok(load_record(&state, id).await?))
}

async fn apply_update(state: AppState, id_str: String, body: Value, partial: bool) -> Result<CatRecord, AppError> {
    let id = parse_id("cat", &id_str)?;
    if state.store.get_cat(id).await?.is_none() {
        return Err(AppError::NotFound(format!("cat {}", id)));
    }
    cat::update(&state.store, id, &body, partial)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cat {}", id)))?;
    load_record(&state, id).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(apply_update(state, id_str, body, false).await?))
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(apply_update(state, id_str, body, true).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("cat", &id_str)?;
    if !state.store.delete_cat(id).await? {
        return Err(AppError::NotFound(format!("cat {}", id)));
    }
    tracing::info!(cat_id = id, "cat deleted");
    Ok(StatusCode::NO_CONTENT)
}
