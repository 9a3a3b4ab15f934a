use std::net::SocketAddr;

use funcshim_core::http::Request;

/// Connection details the dev server attaches to each request.
#[derive(Clone, Debug)]
pub struct AxumRequestContext {
    pub remote_addr: Option<SocketAddr>,
}

impl AxumRequestContext {
    pub fn insert(request: &mut Request, context: AxumRequestContext) {
        request.extensions_mut().insert(context);
    }

    pub fn get(request: &Request) -> Option<&AxumRequestContext> {
        request.extensions().get::<AxumRequestContext>()
    }
}
