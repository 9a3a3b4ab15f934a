use std::collections::BTreeMap;

use bytes::Bytes;
use funcshim_core::body::Body;
use funcshim_core::context::RequestContext;
use funcshim_core::error::ShimError;
use funcshim_core::http::{response_builder, Response, StatusCode};
use funcshim_core::response::{Json, Text};
use futures::{stream as chunks, StreamExt};
use serde::{Deserialize, Serialize};

const FORWARDED_HEADERS: [&str; 4] = ["host", "x-forwarded-for", "x-forwarded-proto", "x-real-ip"];

#[derive(Deserialize)]
pub(crate) struct EchoParams {
    pub(crate) name: String,
}

#[derive(Deserialize)]
pub(crate) struct EchoBody {
    pub(crate) name: String,
}

#[derive(Serialize)]
pub(crate) struct Health {
    status: &'static str,
}

/// What the application saw of the incoming request.
#[derive(Serialize)]
pub(crate) struct RequestSummary {
    method: String,
    path: String,
    query: Option<String>,
    headers: BTreeMap<String, String>,
    body_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    environ: Option<BTreeMap<String, String>>,
}

pub(crate) async fn root(_ctx: RequestContext) -> Result<Text<&'static str>, ShimError> {
    Ok(Text::new("FuncShim Demo App"))
}

pub(crate) async fn health(_ctx: RequestContext) -> Result<Json<Health>, ShimError> {
    Ok(Json(Health { status: "ok" }))
}

pub(crate) async fn echo(ctx: RequestContext) -> Result<Text<String>, ShimError> {
    let params: EchoParams = ctx.path()?;
    Ok(Text::new(format!("Hello, {}!", params.name)))
}

pub(crate) async fn echo_json(ctx: RequestContext) -> Result<Text<String>, ShimError> {
    let body: EchoBody = ctx.json()?;
    if body.name.trim().is_empty() {
        return Err(ShimError::validation("name must not be empty"));
    }
    Ok(Text::new(format!("Hello, {}!", body.name)))
}

pub(crate) async fn headers(ctx: RequestContext) -> Result<Text<String>, ShimError> {
    let ua = ctx.header("user-agent").unwrap_or("(unknown)");
    Ok(Text::new(format!("ua={}", ua)))
}

pub(crate) async fn request_summary(
    ctx: RequestContext,
) -> Result<Json<RequestSummary>, ShimError> {
    let request = ctx.request();
    let headers = FORWARDED_HEADERS
        .iter()
        .filter_map(|name| ctx.header(name).map(|value| (name.to_string(), value.to_string())))
        .collect();

    Ok(Json(RequestSummary {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers,
        body_bytes: request.body().buffered().map_or(0, |bytes| bytes.len()),
        environ: ctx.environ().map(|vars| vars.as_map().clone()),
    }))
}

pub(crate) async fn stream(_ctx: RequestContext) -> Result<Response, ShimError> {
    let body =
        Body::stream(chunks::iter(0..5).map(|index| Bytes::from(format!("chunk {}\n", index))));

    response_builder()
        .status(StatusCode::OK)
        .header("content-type", "text/plain; charset=utf-8")
        .body(body)
        .map_err(ShimError::internal)
}
