use std::collections::BTreeMap;
use std::net::IpAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use funcshim_core::context::EnvironVars;
use funcshim_core::http::{HeaderMap, HeaderName, HeaderValue, Method};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};

use crate::error::InvocationError;
use crate::event::InvocationRequest;

const DEFAULT_SCHEME: &str = "https";
const DEFAULT_SERVER_NAME: &str = "localhost";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Everything the application needs to know about one request, derived from the platform's
/// request descriptor.
#[derive(Clone, Debug)]
pub struct Environ {
    pub method: Method,
    pub path_info: String,
    pub query_string: String,
    pub headers: HeaderMap,
    pub server_name: String,
    pub server_port: u16,
    pub url_scheme: String,
    pub remote_addr: Option<IpAddr>,
    pub body: Bytes,
}

impl Environ {
    pub fn from_invocation(request: InvocationRequest) -> Result<Self, InvocationError> {
        let method_name = request.method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| {
            InvocationError::invalid_request(format!("invalid method `{}`", request.method))
        })?;

        let (path_info, query_string) = match request.path.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (request.path.clone(), String::new()),
        };
        let path_info = if path_info.is_empty() {
            "/".to_string()
        } else if !path_info.starts_with('/') {
            return Err(InvocationError::invalid_request(format!(
                "path `{}` must start with `/`",
                request.path
            )));
        } else {
            path_info
        };

        let mut headers = HeaderMap::new();
        for (name, field) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                InvocationError::invalid_request(format!("invalid header name `{name}`"))
            })?;
            for value in field.values() {
                let header_value = HeaderValue::from_str(value).map_err(|_| {
                    InvocationError::invalid_request(format!("invalid value for header `{name}`"))
                })?;
                headers.append(header_name.clone(), header_value);
            }
        }

        let url_scheme = header_str(&headers, FORWARDED_PROTO)
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

        let host = request
            .host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .or_else(|| header_str(&headers, HOST.as_str()))
            .unwrap_or(DEFAULT_SERVER_NAME);
        let (server_name, server_port) = split_host(host, default_port(&url_scheme))?;

        let remote_addr = header_str(&headers, REAL_IP)
            .or_else(|| header_str(&headers, FORWARDED_FOR).and_then(|v| v.split(',').next()))
            .and_then(|value| value.trim().parse::<IpAddr>().ok());

        let body = decode_body(request.body, request.encoding.as_deref())?;

        Ok(Self {
            method,
            path_info,
            query_string,
            headers,
            server_name,
            server_port,
            url_scheme,
            remote_addr,
            body,
        })
    }

    pub fn content_type(&self) -> Option<&str> {
        header_str(&self.headers, CONTENT_TYPE.as_str())
    }

    /// Path plus query string, as it appeared on the request line.
    pub fn request_uri(&self) -> String {
        if self.query_string.is_empty() {
            self.path_info.clone()
        } else {
            format!("{}?{}", self.path_info, self.query_string)
        }
    }

    /// CGI-style flat view of the request. `into_core_request` stores it in the request
    /// extensions as [`EnvironVars`], where handlers read it through `RequestContext::environ`.
    pub fn vars(&self) -> EnvironVars {
        let mut vars = BTreeMap::new();
        vars.insert("REQUEST_METHOD".into(), self.method.to_string());
        vars.insert("SCRIPT_NAME".into(), String::new());
        vars.insert("PATH_INFO".into(), self.path_info.clone());
        vars.insert("QUERY_STRING".into(), self.query_string.clone());
        vars.insert("SERVER_NAME".into(), self.server_name.clone());
        vars.insert("SERVER_PORT".into(), self.server_port.to_string());
        vars.insert("SERVER_PROTOCOL".into(), "HTTP/1.1".into());
        vars.insert("URL_SCHEME".into(), self.url_scheme.clone());
        vars.insert(
            "HTTPS".into(),
            if self.url_scheme == "https" { "on" } else { "off" }.into(),
        );
        if let Some(addr) = self.remote_addr {
            vars.insert("REMOTE_ADDR".into(), addr.to_string());
        }
        if let Some(content_type) = self.content_type() {
            vars.insert("CONTENT_TYPE".into(), content_type.to_string());
        }
        vars.insert("CONTENT_LENGTH".into(), self.body.len().to_string());

        for name in self.headers.keys() {
            if name == CONTENT_TYPE || name == CONTENT_LENGTH {
                continue;
            }
            let joined = self
                .headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect::<Vec<_>>()
                .join(",");
            let key = format!("HTTP_{}", name.as_str().to_ascii_uppercase().replace('-', "_"));
            vars.insert(key, joined);
        }
        EnvironVars::from(vars)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Port implied by `scheme` when the host carries none.
pub(crate) fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" => 80,
        _ => 443,
    }
}

fn split_host(host: &str, fallback_port: u16) -> Result<(String, u16), InvocationError> {
    let host = host.trim();
    let invalid = || InvocationError::invalid_request(format!("invalid host `{host}`"));

    if let Some(rest) = host.strip_prefix('[') {
        let (name, tail) = rest.split_once(']').ok_or_else(invalid)?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().map_err(|_| invalid())?,
            None if tail.is_empty() => fallback_port,
            None => return Err(invalid()),
        };
        return Ok((name.to_string(), port));
    }

    match host.rsplit_once(':') {
        // More than one colon without brackets is a bare IPv6 literal.
        Some((name, _)) if name.contains(':') => Ok((host.to_string(), fallback_port)),
        Some((name, port)) => Ok((name.to_string(), port.parse().map_err(|_| invalid())?)),
        None if host.is_empty() => Err(invalid()),
        None => Ok((host.to_string(), fallback_port)),
    }
}

fn decode_body(body: Option<String>, encoding: Option<&str>) -> Result<Bytes, InvocationError> {
    let Some(body) = body else {
        return Ok(Bytes::new());
    };
    match encoding {
        None => Ok(Bytes::from(body)),
        Some(encoding) if encoding.eq_ignore_ascii_case("base64") => STANDARD
            .decode(body.as_bytes())
            .map(Bytes::from)
            .map_err(|err| InvocationError::invalid_request(format!("invalid base64 body: {err}"))),
        Some(other) => Err(InvocationError::invalid_request(format!(
            "unsupported body encoding `{other}`"
        ))),
    }
}
