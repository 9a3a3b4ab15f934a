use std::sync::Arc;

use funcshim_core::app::App;
use funcshim_core::http::{HeaderMap, StatusCode};
use log::debug;

use crate::environ::Environ;
use crate::error::InvocationError;
use crate::event::{InvocationContext, InvocationRequest, InvocationResponse, PlatformEvent};
use crate::request::into_core_request;
use crate::response::from_core_response;

type ResponseStartObserver = Arc<dyn Fn(StatusCode, &HeaderMap) + Send + Sync>;

/// Adapter function bound to one application. Cheap to build per invocation.
#[derive(Clone)]
pub struct FunctionHandler<'a> {
    app: &'a App,
    on_response_start: Option<ResponseStartObserver>,
}

impl<'a> FunctionHandler<'a> {
    pub fn new(app: &'a App) -> Self {
        Self {
            app,
            on_response_start: None,
        }
    }

    /// Observe status and headers once the application has produced them, before the body
    /// is converted.
    pub fn on_response_start<F>(mut self, observer: F) -> Self
    where
        F: Fn(StatusCode, &HeaderMap) + Send + Sync + 'static,
    {
        self.on_response_start = Some(Arc::new(observer));
        self
    }

    pub fn app(&self) -> &App {
        self.app
    }

    /// Handle one request descriptor. `context` is logged and otherwise ignored.
    pub async fn call(
        &self,
        request: InvocationRequest,
        context: &InvocationContext,
    ) -> Result<InvocationResponse, InvocationError> {
        let environ = Environ::from_invocation(request)?;
        debug!(
            "invocation {} -> {} {} {}",
            context.request_id,
            environ.method,
            environ.request_uri(),
            self.app.name()
        );

        let core_request = into_core_request(environ)?;
        let response = self.app.handle(core_request).await;
        if let Some(observer) = &self.on_response_start {
            observer(response.status(), response.headers());
        }
        from_core_response(response).await
    }

    /// Parse a raw platform payload and handle it.
    pub async fn call_event(
        &self,
        payload: &[u8],
        context: &InvocationContext,
    ) -> Result<InvocationResponse, InvocationError> {
        let request = PlatformEvent::from_slice(payload)?.into_request()?;
        self.call(request, context).await
    }
}

/// The adapter function: run `request` through `app` and return what it produced.
pub async fn handle(
    app: &App,
    request: InvocationRequest,
    context: &InvocationContext,
) -> Result<InvocationResponse, InvocationError> {
    FunctionHandler::new(app).call(request, context).await
}

pub async fn dispatch_event(
    app: &App,
    payload: &[u8],
    context: &InvocationContext,
) -> Result<InvocationResponse, InvocationError> {
    FunctionHandler::new(app).call_event(payload, context).await
}
