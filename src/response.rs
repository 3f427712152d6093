//! Success responses carry the bare record, or a bare JSON array for lists.
//! Only errors are enveloped (see [`crate::error::ErrorBody`]).

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub fn ok<T: Serialize>(record: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(record))
}

pub fn created<T: Serialize>(record: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(record))
}

pub fn list<T: Serialize>(records: Vec<T>) -> (StatusCode, Json<Vec<T>>) {
    (StatusCode::OK, Json(records))
}
