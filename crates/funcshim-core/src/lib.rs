//! Core primitives shared by the FuncShim deployment adapters: the application object, its
//! router, and the request/response types every adapter converts to and from.

pub mod app;
pub mod body;
pub mod context;
pub mod error;
pub mod handler;
pub mod http;
pub mod manifest;
pub mod middleware;
pub mod params;
pub mod response;
pub mod router;
