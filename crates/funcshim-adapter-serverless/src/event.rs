use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InvocationError;

const INVOKE_ACTION: &str = "Invoke";

/// A header as the platform encodes it: a single string or a list for repeated headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderField {
    One(String),
    Many(Vec<String>),
}

impl HeaderField {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderField::One(value) => std::slice::from_ref(value),
            HeaderField::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.values().next()
    }
}

impl From<&str> for HeaderField {
    fn from(value: &str) -> Self {
        HeaderField::One(value.to_string())
    }
}

/// Request descriptor delivered by the platform for one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub method: String,
    /// Request target: path plus optional `?query`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// `"base64"` when `body` carries base64-encoded bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl InvocationRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        let field = match self.headers.remove(&name) {
            None => HeaderField::from(value),
            Some(HeaderField::One(existing)) => {
                HeaderField::Many(vec![existing, value.to_string()])
            }
            Some(HeaderField::Many(mut existing)) => {
                existing.push(value.to_string());
                HeaderField::Many(existing)
            }
        };
        self.headers.insert(name, field);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.encoding = None;
        self
    }

    pub fn with_base64_body(mut self, encoded: impl Into<String>) -> Self {
        self.body = Some(encoded.into());
        self.encoding = Some("base64".to_string());
        self
    }
}

/// Payload of one platform invocation: either the platform envelope
/// `{"Action": "Invoke", "body": "<request json>"}` or a bare request descriptor.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PlatformEvent {
    Envelope {
        #[serde(rename = "Action")]
        action: String,
        body: String,
    },
    Direct(InvocationRequest),
}

impl PlatformEvent {
    pub fn from_slice(payload: &[u8]) -> Result<Self, InvocationError> {
        serde_json::from_slice(payload).map_err(|err| {
            InvocationError::InvalidEvent(format!("payload is not a recognised event: {err}"))
        })
    }

    /// Same as [`Self::from_slice`] for a payload the runtime has already decoded.
    pub fn from_value(payload: serde_json::Value) -> Result<Self, InvocationError> {
        serde_json::from_value(payload).map_err(|err| {
            InvocationError::InvalidEvent(format!("payload is not a recognised event: {err}"))
        })
    }

    pub fn into_request(self) -> Result<InvocationRequest, InvocationError> {
        match self {
            PlatformEvent::Direct(request) => Ok(request),
            PlatformEvent::Envelope { action, body } if action == INVOKE_ACTION => {
                Ok(serde_json::from_str(&body)?)
            }
            PlatformEvent::Envelope { action, .. } => Err(InvocationError::InvalidEvent(format!(
                "unsupported action `{action}`"
            ))),
        }
    }
}

/// Response handed back to the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderField>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl InvocationResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(HeaderField::first)
    }
}

/// Platform metadata about the invocation. Logged for correlation; it never influences how
/// the request is handled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub deadline_ms: Option<u64>,
    pub invoked_function_arn: Option<String>,
    pub trace_id: Option<String>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }
}
