use crate::core::errors::ApiError;

use super::types::AppConfig;

pub fn validate_config(config: &AppConfig) -> Result<(), ApiError> {
    validate_required_string("server.host", &config.server.host)?;
    validate_range("server.port", config.server.port as u64, 1, 65_535)?;

    validate_required_string(
        "data.csv_path",
        &config.data.csv_path.to_string_lossy(),
    )?;
    validate_required_string(
        "data.vector_db",
        &config.data.vector_db.to_string_lossy(),
    )?;
    validate_range(
        "data.embedding_batch_size",
        config.data.embedding_batch_size as u64,
        1,
        2_048,
    )?;

    validate_required_string("embedding.base_url", &config.embedding.base_url)?;
    validate_required_string("embedding.model", &config.embedding.model)?;

    validate_required_string("llm.base_url", &config.llm.base_url)?;
    validate_required_string("llm.model", &config.llm.model)?;
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(ApiError::BadRequest(
            "Invalid config at 'llm.temperature': must be between 0 and 2".to_string(),
        ));
    }
    if let Some(max_tokens) = config.llm.max_tokens {
        validate_range("llm.max_tokens", max_tokens as u64, 1, 1_000_000)?;
    }

    validate_range("retrieval.top_k", config.retrieval.top_k as u64, 1, 100)?;
    validate_range(
        "retrieval.max_context_length",
        config.retrieval.max_context_length as u64,
        1,
        10_000_000,
    )?;
    validate_range(
        "retrieval.max_history_messages",
        config.retrieval.max_history_messages as u64,
        0,
        10_000,
    )?;

    validate_required_string("chat.session_id", &config.chat.session_id)?;
    validate_range(
        "chat.max_input_length",
        config.chat.max_input_length as u64,
        1,
        10_000_000,
    )?;

    Ok(())
}

fn validate_range(path: &str, value: u64, min: u64, max: u64) -> Result<(), ApiError> {
    if value < min || value > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string(path: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}
