use thiserror::Error;

/// Failures owned by the adapter itself. Application errors never show up here: the router
/// renders them into responses.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("invalid platform event: {0}")]
    InvalidEvent(String),
    #[error("invalid request descriptor: {0}")]
    InvalidRequest(String),
    #[error("failed to read response body: {0}")]
    Body(#[source] anyhow::Error),
}

impl InvocationError {
    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        InvocationError::InvalidRequest(message.into())
    }

    /// Short identifier reported to the platform as the diagnostic's `errorType`.
    pub fn error_type(&self) -> &'static str {
        match self {
            InvocationError::InvalidEvent(_) => "InvalidEvent",
            InvocationError::InvalidRequest(_) => "InvalidRequest",
            InvocationError::Body(_) => "ResponseBody",
        }
    }
}

impl From<serde_json::Error> for InvocationError {
    fn from(err: serde_json::Error) -> Self {
        InvocationError::InvalidEvent(err.to_string())
    }
}
