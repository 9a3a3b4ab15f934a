use anyhow::Error as AnyError;
use serde_json::json;
use thiserror::Error;

use crate::body::Body;
use crate::http::{header::CONTENT_TYPE, HeaderValue, Method, Response, StatusCode};
use crate::response::{response_with_body, IntoResponse};

/// Error raised while serving a request. Every variant maps onto an HTTP status so the router
/// can always turn a failure into a response.
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("{message}")]
    BadRequest { message: String },
    #[error("no route matched path: {path}")]
    NotFound { path: String },
    #[error("method {method} not allowed; allowed: {allowed}")]
    MethodNotAllowed { method: Method, allowed: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("internal error: {source}")]
    Internal {
        #[from]
        source: AnyError,
    },
}

impl ShimError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ShimError::BadRequest {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ShimError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        ShimError::NotFound { path: path.into() }
    }

    pub fn method_not_allowed(method: &Method, allowed: &[Method]) -> Self {
        let mut names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        names.sort_unstable();
        let allowed = if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        };
        ShimError::MethodNotAllowed {
            method: method.clone(),
            allowed,
        }
    }

    pub fn internal<E>(error: E) -> Self
    where
        E: Into<AnyError>,
    {
        ShimError::Internal {
            source: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ShimError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ShimError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ShimError::NotFound { .. } => StatusCode::NOT_FOUND,
            ShimError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ShimError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human readable message, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.message(),
            }
        });

        let body = Body::json(&payload).unwrap_or_else(|_| Body::text("internal error"));
        let mut response = response_with_body(status, body);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let ShimError::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(allowed) {
                response.headers_mut().insert(http::header::ALLOW, value);
            }
        }
        response
    }
}
