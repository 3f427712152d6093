//! Resource routing table: `/cats/`, `/owners/` and the API root.

use crate::handlers::{cats, owners};
use crate::state::AppState;
use axum::{routing::get, Json, Router};

async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "cats": "/cats/",
        "owners": "/owners/"
    }))
}

/// Cats support full CRUD; owners are list/retrieve only. Achievements have
/// no standalone resource.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_root))
        .route("/cats/", get(cats::list).post(cats::create))
        .route(
            "/cats/:id/",
            get(cats::read)
                .put(cats::update)
                .patch(cats::partial_update)
                .delete(cats::delete),
        )
        .route("/owners/", get(owners::list))
        .route("/owners/:id/", get(owners::read))
        .with_state(state)
}
