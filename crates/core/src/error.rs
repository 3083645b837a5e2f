#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upload exceeds the {limit_bytes} byte limit")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("Required tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Frame extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
