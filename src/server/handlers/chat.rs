use std::sync::Arc;

use axum::extract::State;
use axum::Form;
use serde::Deserialize;

use crate::chain::ChainInput;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub msg: Option<String>,
}

/// Answers one chat message with the retrieval chain.
///
/// Every request uses the configured session id, so all clients share one
/// conversation history.
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChatForm>,
) -> Result<String, ApiError> {
    let msg = validate_message(form.msg, state.config.chat.max_input_length)?;

    let output = state
        .chain
        .invoke(ChainInput::new(msg, state.config.chat.session_id.as_str()))
        .await?;

    state.metrics.record_prediction();
    Ok(output.answer)
}

fn validate_message(msg: Option<String>, max_len: usize) -> Result<String, ApiError> {
    let Some(msg) = msg else {
        return Err(ApiError::BadRequest("missing form field 'msg'".to_string()));
    };
    if msg.trim().is_empty() {
        return Err(ApiError::BadRequest("'msg' cannot be empty".to_string()));
    }
    if msg.chars().count() > max_len {
        return Err(ApiError::BadRequest(format!(
            "'msg' exceeds {} characters",
            max_len
        )));
    }
    Ok(msg)
}
