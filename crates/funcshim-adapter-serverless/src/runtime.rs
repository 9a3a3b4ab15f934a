//! Function runtime entry point built on `lambda_runtime`.
//!
//! `lambda_runtime` owns the runtime API: it polls for invocations, posts each result or error
//! report, and keeps polling after a failed invocation. This module only turns a
//! `LambdaEvent` into a call on [`FunctionHandler`] and maps adapter failures to the
//! diagnostics the platform records.

use std::sync::Arc;

use anyhow::Context as _;
use funcshim_core::app::{App, Hooks};
use funcshim_core::manifest::ManifestLoader;
use lambda_runtime::{service_fn, Context, Diagnostic, LambdaEvent};
use log::{error, info};
use serde_json::Value;
use tokio::runtime::Builder as RuntimeBuilder;

use crate::error::InvocationError;
use crate::event::{InvocationContext, InvocationResponse, PlatformEvent};
use crate::handler::FunctionHandler;
use crate::LOGGING_SECTION;

/// Set by the platform in every function process.
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

impl From<&Context> for InvocationContext {
    fn from(context: &Context) -> Self {
        let present = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Self {
            request_id: context.request_id.clone(),
            deadline_ms: (context.deadline > 0).then_some(context.deadline),
            invoked_function_arn: present(context.invoked_function_arn.as_str()),
            trace_id: context.xray_trace_id.as_deref().and_then(present),
        }
    }
}

impl From<InvocationError> for Diagnostic {
    fn from(err: InvocationError) -> Self {
        Diagnostic {
            error_type: err.error_type().to_string(),
            error_message: err.to_string(),
        }
    }
}

/// Handle one event delivered by `lambda_runtime`.
pub async fn handle_lambda_event(
    handler: &FunctionHandler<'_>,
    event: LambdaEvent<Value>,
) -> Result<InvocationResponse, InvocationError> {
    let (payload, context) = event.into_parts();
    let context = InvocationContext::from(&context);

    let outcome = match PlatformEvent::from_value(payload).and_then(PlatformEvent::into_request) {
        Ok(request) => handler.call(request, &context).await,
        Err(err) => Err(err),
    };
    match &outcome {
        Ok(response) => info!(
            "invocation {} completed with status {}",
            context.request_id, response.status_code
        ),
        Err(err) => error!("invocation {} failed: {}", context.request_id, err),
    }
    outcome
}

/// Serve platform invocations for `app` until the runtime API goes away.
pub async fn serve(app: Arc<App>) -> Result<(), lambda_runtime::Error> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let app = Arc::clone(&app);
        async move { handle_lambda_event(&FunctionHandler::new(&app), event).await }
    }))
    .await
}

/// Resolve the manifest, build `A` and serve platform invocations until the process is
/// stopped. Invocations run one at a time on a current-thread runtime because application
/// futures are not `Send`.
pub fn run_app<A: Hooks>(manifest_src: &str) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let loader = ManifestLoader::resolve(&cwd, manifest_src).context("failed to load manifest")?;
    let manifest = loader.manifest();
    manifest.logging_or_default(LOGGING_SECTION).init_logger();

    let runtime = RuntimeBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let app = Arc::new(A::build_app());
    info!(
        "starting {} as function {}",
        app.name(),
        manifest.function.name.as_deref().unwrap_or("(unnamed)")
    );
    runtime
        .block_on(serve(app))
        .map_err(|err| anyhow::anyhow!(err))
        .context("function runtime stopped")
}
