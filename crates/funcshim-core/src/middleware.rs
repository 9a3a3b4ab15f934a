use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::ShimError;
use crate::handler::DynHandler;
use crate::http::Response;

pub type BoxMiddleware = Arc<dyn Middleware>;

#[async_trait(?Send)]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, ctx: RequestContext, next: Next<'_>) -> Result<Response, ShimError>;
}

/// Remaining middleware chain followed by the matched handler.
pub struct Next<'a> {
    middlewares: &'a [BoxMiddleware],
    handler: &'a dyn DynHandler,
}

impl<'a> Next<'a> {
    pub fn new(middlewares: &'a [BoxMiddleware], handler: &'a dyn DynHandler) -> Self {
        Self {
            middlewares,
            handler,
        }
    }

    pub async fn run(self, ctx: RequestContext) -> Result<Response, ShimError> {
        match self.middlewares.split_first() {
            Some((head, tail)) => head.handle(ctx, Next::new(tail, self.handler)).await,
            None => self.handler.call(ctx).await,
        }
    }
}

/// Emits one `funcshim::request` event per dispatched request, carrying the method, path,
/// final status and latency as fields. Handler errors are logged at error level before the
/// router renders them.
pub struct RequestLogger;

#[async_trait(?Send)]
impl Middleware for RequestLogger {
    async fn handle(&self, ctx: RequestContext, next: Next<'_>) -> Result<Response, ShimError> {
        let method = ctx.request().method().clone();
        let path = ctx.request().uri().path().to_string();
        let started = Instant::now();

        let result = next.run(ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => tracing::info!(
                target: "funcshim::request",
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed_ms,
                "handled"
            ),
            Err(err) => tracing::error!(
                target: "funcshim::request",
                method = %method,
                path = %path,
                status = err.status().as_u16(),
                elapsed_ms,
                error = %err,
                "failed"
            ),
        }
        result
    }
}
