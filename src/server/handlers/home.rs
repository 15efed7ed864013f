use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../../templates/index.html");

pub async fn index(State(state): State<Arc<AppState>>) -> Html<&'static str> {
    state.metrics.record_request();
    Html(INDEX_HTML)
}
