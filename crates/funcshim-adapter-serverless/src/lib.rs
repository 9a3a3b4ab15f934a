//! Platform adapter: turns one serverless function invocation into a call against a FuncShim
//! application and hands the application's response back to the platform.
//!
//! The invocation path is `PlatformEvent` -> `InvocationRequest` -> [`Environ`] -> core
//! request -> `App::handle` -> core response -> `InvocationResponse`. Status and headers are
//! carried through unchanged, so nothing the application reports is dropped on the way out.

mod context;
mod environ;
mod error;
mod event;
mod handler;
mod request;
mod response;
pub mod runtime;

pub use context::ServerlessRequestContext;
pub use environ::Environ;
pub use error::InvocationError;
pub use event::{
    HeaderField, InvocationContext, InvocationRequest, InvocationResponse, PlatformEvent,
};
pub use handler::{dispatch_event, handle, FunctionHandler};
pub use request::into_core_request;
pub use response::from_core_response;
pub use runtime::{handle_lambda_event, run_app, serve, RUNTIME_API_ENV};

/// Manifest `[logging.<name>]` table read by the function runtime.
pub const LOGGING_SECTION: &str = "serverless";
