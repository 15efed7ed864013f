use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, home, metrics};
use crate::state::AppState;

/// Creates the application router.
///
/// Routes:
/// - `GET /` chat page
/// - `GET /metrics` Prometheus scrape endpoint
/// - `POST /get` chat message → answer
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/metrics", get(metrics::metrics))
        .route("/get", post(chat::get_response))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
