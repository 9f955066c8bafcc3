use async_trait::async_trait;

/// Stateless prompt-in, reply-out language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String, ChatModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatModelError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("request timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
