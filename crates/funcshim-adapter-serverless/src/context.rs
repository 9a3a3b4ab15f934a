use std::net::IpAddr;

use funcshim_core::http::Request;

/// Connection details recovered from the platform's request descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerlessRequestContext {
    pub remote_addr: Option<IpAddr>,
    pub scheme: String,
    pub server_name: String,
    pub server_port: u16,
}

impl ServerlessRequestContext {
    pub fn insert(request: &mut Request, context: ServerlessRequestContext) {
        request.extensions_mut().insert(context);
    }

    pub fn get(request: &Request) -> Option<&ServerlessRequestContext> {
        request.extensions().get::<ServerlessRequestContext>()
    }
}
