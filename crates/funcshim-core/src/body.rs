use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{LocalBoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub type BodyStream = LocalBoxStream<'static, Result<Bytes, anyhow::Error>>;

/// Request or response payload. Platform invocations always arrive buffered; the dev server
/// hands non-JSON uploads through as a stream so large bodies are not copied twice.
pub enum Body {
    Buffered(Bytes),
    Streaming(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Self::Buffered(Bytes::new())
    }

    pub fn from_bytes<B>(bytes: B) -> Self
    where
        B: Into<Bytes>,
    {
        Self::Buffered(bytes.into())
    }

    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + 'static,
        anyhow::Error: From<E>,
    {
        Self::Streaming(
            stream
                .map(|chunk| chunk.map_err(anyhow::Error::from))
                .boxed_local(),
        )
    }

    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Bytes> + 'static,
    {
        Self::Streaming(stream.map(Ok::<Bytes, anyhow::Error>).boxed_local())
    }

    pub fn text<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_bytes(text.into().into_bytes())
    }

    pub fn json<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        serde_json::to_vec(value).map(Self::from_bytes)
    }

    /// In-memory bytes, or `None` for a streaming body.
    pub fn buffered(&self) -> Option<&Bytes> {
        match self {
            Body::Buffered(bytes) => Some(bytes),
            Body::Streaming(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Streaming(_))
    }

    pub fn into_stream(self) -> Option<BodyStream> {
        match self {
            Body::Buffered(_) => None,
            Body::Streaming(stream) => Some(stream),
        }
    }

    /// Drain the body into a single buffer. Stops at the first failing chunk.
    pub async fn collect(self) -> Result<Bytes, anyhow::Error> {
        match self {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Streaming(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    pub fn to_json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        match self {
            Body::Buffered(bytes) => serde_json::from_slice(bytes.as_ref()),
            Body::Streaming(_) => Err(serde_json::Error::io(io::Error::other(
                "streaming body cannot be read as JSON",
            ))),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Buffered(bytes) => f
                .debug_struct("Body::Buffered")
                .field("len", &bytes.len())
                .finish(),
            Body::Streaming(_) => f.debug_tuple("Body::Streaming").finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Buffered(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::from_bytes(value)
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::from_bytes(Bytes::copy_from_slice(value))
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::text(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures_util::stream;

    #[test]
    fn collect_joins_stream_chunks() {
        let body = Body::stream(stream::iter(vec![
            Bytes::from_static(b"con"),
            Bytes::from_static(b"cat"),
        ]));
        assert!(body.is_stream());
        let bytes = block_on(body.collect()).expect("collected");
        assert_eq!(bytes.as_ref(), b"concat");
    }

    #[test]
    fn collect_returns_buffered_bytes_unchanged() {
        let bytes = block_on(Body::from("payload").collect()).expect("collected");
        assert_eq!(bytes.as_ref(), b"payload");
    }

    #[test]
    fn collect_surfaces_stream_errors() {
        let body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(io::Error::other("socket closed")),
        ]));
        let err = block_on(body.collect()).expect_err("stream error");
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn buffered_is_none_for_streams() {
        let body = Body::stream(stream::iter(vec![Bytes::from_static(b"x")]));
        assert!(body.buffered().is_none());
        assert_eq!(
            Body::from("x").buffered().map(|b| b.as_ref()),
            Some(&b"x"[..])
        );
    }

    #[test]
    fn to_json_rejects_streaming_body() {
        let body = Body::stream(stream::iter(vec![Bytes::from_static(b"{}")]));
        assert!(body.to_json::<serde_json::Value>().is_err());
    }

    #[test]
    fn json_round_trips_through_buffered_body() {
        let body = Body::json(&serde_json::json!({"name": "demo"})).expect("json");
        let value: serde_json::Value = body.to_json().expect("parse");
        assert_eq!(value["name"], "demo");
    }

    #[test]
    fn default_body_is_empty_and_debug_reports_length() {
        let body = Body::default();
        assert_eq!(body.buffered().map(|b| b.len()), Some(0));
        assert!(format!("{:?}", Body::from("abc")).contains("len: 3"));
        let stream = Body::stream(stream::iter(Vec::<Bytes>::new()));
        assert!(format!("{:?}", stream).contains("Body::Streaming"));
    }
}
