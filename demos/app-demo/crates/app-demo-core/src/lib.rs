mod app;
mod generate;
mod handlers;

pub use app::{build_router, DemoApp};
pub use generate::{generate_copy, GenerateReply, GenerateRequest, MAX_TOOLS, MIN_TOOLS};
