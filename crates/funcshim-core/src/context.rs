use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::error::ShimError;
use crate::http::Request;
use crate::params::PathParams;

/// Gateway-style variables (`REQUEST_METHOD`, `PATH_INFO`, `HTTP_*`, ...) describing the
/// request as the hosting platform delivered it. Adapters that receive requests as an
/// environment mapping store one in the request extensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironVars(BTreeMap<String, String>);

impl EnvironVars {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl From<BTreeMap<String, String>> for EnvironVars {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Self(vars)
    }
}

/// Request plus routing data handed to handlers and middleware.
pub struct RequestContext {
    request: Request,
    path_params: PathParams,
}

impl RequestContext {
    pub fn new(request: Request, path_params: PathParams) -> Self {
        Self {
            request,
            path_params,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// First value of `name` when it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// Platform variables for this request. `None` under adapters that receive plain HTTP.
    pub fn environ(&self) -> Option<&EnvironVars> {
        self.request.extensions().get::<EnvironVars>()
    }

    pub fn path<T>(&self) -> Result<T, ShimError>
    where
        T: DeserializeOwned,
    {
        self.path_params
            .deserialize()
            .map_err(|err| ShimError::bad_request(format!("invalid path parameters: {}", err)))
    }

    /// Decode the buffered body as JSON. Streaming bodies are rejected.
    pub fn json<T>(&self) -> Result<T, ShimError>
    where
        T: DeserializeOwned,
    {
        let body: &Body = self.request.body();
        body.to_json()
            .map_err(|err| ShimError::bad_request(format!("invalid JSON payload: {}", err)))
    }
}
