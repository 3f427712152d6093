//! Router assembly.

mod api;
mod common;

pub use api::api_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Full application router. `auth` is the externally supplied
/// user/session/token router, mounted under `/auth` when present.
pub fn app(state: AppState, auth: Option<Router>, max_body_bytes: usize) -> Router {
    let mut router = Router::new()
        .merge(common_routes(state.clone()))
        .merge(api_routes(state));
    if let Some(auth) = auth {
        router = router.nest("/auth", auth);
    }
    router
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
