use std::net::SocketAddr;

use axum::body::Body as AxumBody;
use axum::extract::connect_info::ConnectInfo;
use axum::http::Request;
use funcshim_core::body::Body;
use funcshim_core::error::ShimError;
use funcshim_core::http::Request as CoreRequest;
use http::header::CONTENT_TYPE;
use http::HeaderValue;

use crate::context::AxumRequestContext;

/// Convert an Axum request into a core request. JSON and form payloads are buffered so
/// handlers can parse them; everything else stays a stream.
pub async fn into_core_request(request: Request<AxumBody>) -> Result<CoreRequest, ShimError> {
    let (mut parts, body) = request.into_parts();

    let buffer = parts
        .headers
        .get(CONTENT_TYPE)
        .is_some_and(is_buffered_content_type);
    let body = if buffer {
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|err| ShimError::bad_request(format!("failed to read request body: {err}")))?;
        Body::from_bytes(bytes)
    } else {
        Body::from_stream(body.into_data_stream())
    };

    let remote_addr = parts
        .extensions
        .remove::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr);

    let mut core_request = CoreRequest::from_parts(parts, body);
    if remote_addr.is_some() {
        AxumRequestContext::insert(&mut core_request, AxumRequestContext { remote_addr });
    }
    Ok(core_request)
}

fn is_buffered_content_type(value: &HeaderValue) -> bool {
    let Ok(raw) = value.to_str() else {
        return false;
    };
    let media_type = raw.split(';').next().map(str::trim).unwrap_or("");
    if media_type.eq_ignore_ascii_case("application/json")
        || media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded")
    {
        return true;
    }

    let Some((ty, subtype)) = media_type.split_once('/') else {
        return false;
    };
    ty.eq_ignore_ascii_case("application")
        && subtype.len() > 5
        && subtype[subtype.len() - 5..].eq_ignore_ascii_case("+json")
}
