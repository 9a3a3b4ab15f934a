use funcshim_core::body::Body;
use funcshim_core::http::{request_builder, HeaderValue, Request, Uri};
use http::header::HOST;

use crate::context::ServerlessRequestContext;
use crate::environ::{default_port, Environ};
use crate::error::InvocationError;

/// Build the framework request the application sees. The body is always buffered: the
/// platform delivers it whole.
pub fn into_core_request(environ: Environ) -> Result<Request, InvocationError> {
    let vars = environ.vars();
    let Environ {
        method,
        path_info,
        query_string,
        mut headers,
        server_name,
        server_port,
        url_scheme,
        remote_addr,
        body,
    } = environ;

    let target = if query_string.is_empty() {
        path_info
    } else {
        format!("{path_info}?{query_string}")
    };
    let uri: Uri = target
        .parse()
        .map_err(|err| InvocationError::invalid_request(format!("invalid uri `{target}`: {err}")))?;

    if !headers.contains_key(HOST) {
        let authority = if server_port == default_port(&url_scheme) {
            server_name.clone()
        } else if server_name.contains(':') {
            format!("[{server_name}]:{server_port}")
        } else {
            format!("{server_name}:{server_port}")
        };
        let value = HeaderValue::from_str(&authority)
            .map_err(|_| InvocationError::invalid_request(format!("invalid host `{authority}`")))?;
        headers.insert(HOST, value);
    }

    let mut request = request_builder()
        .method(method)
        .uri(uri)
        .body(Body::from_bytes(body))
        .map_err(|err| InvocationError::invalid_request(err.to_string()))?;
    *request.headers_mut() = headers;
    request.extensions_mut().insert(vars);

    ServerlessRequestContext::insert(
        &mut request,
        ServerlessRequestContext {
            remote_addr,
            scheme: url_scheme,
            server_name,
            server_port,
        },
    );
    Ok(request)
}
