use axum::body::Body as AxumBody;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Response, StatusCode};
use tracing::error;

use funcshim_core::http::Response as CoreResponse;

/// Convert a core response into one Axum can serve.
///
/// Core bodies are not `Send`, so streams are drained here before the response leaves the
/// router's thread. A stream failing midway becomes a plain-text 500.
pub async fn into_axum_response(response: CoreResponse) -> Response<AxumBody> {
    let (parts, body) = response.into_parts();
    match body.collect().await {
        Ok(bytes) => Response::from_parts(parts, AxumBody::from(bytes)),
        Err(err) => {
            error!("streaming response error: {err}");
            let mut response = Response::new(AxumBody::from("streaming response error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            response
        }
    }
}
