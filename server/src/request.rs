//! Request type handed to handlers

use std::borrow::Cow;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use trellis_core::Params;

use crate::error::TrellisResult;

/// An HTTP request with its collected body and route parameters
///
/// Owns everything it exposes, so it can move freely between tasks.
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    body: Bytes,
    params: Params<'static>,
}

impl Request {
    pub fn new(parts: Parts, body: Bytes, params: Params<'static>) -> Self {
        Self {
            parts,
            body,
            params,
        }
    }

    /// Wrap a request that went through no routing (no parameters)
    pub fn from_http(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, Params::new())
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Raw (undecoded) request path
    #[inline]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Raw query string, without the `?`
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Path and query exactly as requested
    pub fn request_target(&self) -> &str {
        self.parts
            .uri
            .path_and_query()
            .map_or_else(|| self.path(), |pq| pq.as_str())
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get header by name; non-text values are skipped
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name)?.to_str().ok()
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get body as UTF-8 text
    pub fn body_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> TrellisResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Percent-decoded route parameter
    #[inline]
    pub fn param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.params.get(name)
    }

    /// Route parameter names in positional order
    #[inline]
    pub fn param_names(&self) -> &[String] {
        self.params.names()
    }

    /// Decoded route parameter values in positional order
    #[inline]
    pub fn param_values(&self) -> Vec<Cow<'_, str>> {
        self.params.values()
    }

    #[inline]
    pub fn params(&self) -> &Params<'static> {
        &self.params
    }
}
