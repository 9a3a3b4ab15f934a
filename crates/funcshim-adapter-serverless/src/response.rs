use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use funcshim_core::http::Response;

use crate::error::InvocationError;
use crate::event::{HeaderField, InvocationResponse};

const BASE64_ENCODING: &str = "base64";

/// Convert the application's response into the platform's response shape. Streaming bodies
/// are collected first; a stream that fails mid-flight is an adapter error.
pub async fn from_core_response(response: Response) -> Result<InvocationResponse, InvocationError> {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.map_err(InvocationError::Body)?;

    let mut headers: BTreeMap<String, HeaderField> = BTreeMap::new();
    for name in parts.headers.keys() {
        let mut values = parts
            .headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>();
        let field = if values.len() == 1 {
            HeaderField::One(values.remove(0))
        } else {
            HeaderField::Many(values)
        };
        headers.insert(name.as_str().to_string(), field);
    }

    let (body, encoding) = match std::str::from_utf8(&bytes) {
        Ok(text) => (text.to_string(), None),
        Err(_) => (STANDARD.encode(&bytes), Some(BASE64_ENCODING.to_string())),
    };

    Ok(InvocationResponse {
        status_code: parts.status.as_u16(),
        headers,
        body,
        encoding,
    })
}
