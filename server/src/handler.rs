//! Handler traits and implementations for Trellis

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use http_body_util::Full;

use crate::request::Request;
use crate::response::Reply;

/// Future returned by a [`Handler`]
pub type HandlerFuture = Pin<Box<dyn Future<Output = Reply> + Send + 'static>>;

/// Handler trait for request processing
pub trait Handler: Send + Sync + 'static {
    /// Handle the request and produce a reply
    fn call(&self, req: Request) -> HandlerFuture;
}

/// Any `async fn(Request) -> impl Into<Reply>` style closure is a handler
impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Into<Reply>,
{
    fn call(&self, req: Request) -> HandlerFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.into() })
    }
}

/// Type alias for shared handlers
pub type BoxedHandler = Arc<dyn Handler>;

/// Handler answering every request with the same configured response
///
/// `{name}` in the body is replaced by the decoded route parameter `name`.
#[derive(Debug, Clone)]
pub struct FixedResponse {
    status: StatusCode,
    body: String,
    content_type: HeaderValue,
}

impl FixedResponse {
    pub fn new(status: StatusCode, body: impl Into<String>, content_type: HeaderValue) -> Self {
        Self {
            status,
            body: body.into(),
            content_type,
        }
    }

    fn render(&self, req: &Request) -> String {
        if req.params().is_empty() || !self.body.contains('{') {
            return self.body.clone();
        }
        req.params()
            .iter()
            .fold(self.body.clone(), |body, (name, value)| {
                body.replace(&format!("{{{name}}}"), &value)
            })
    }
}

impl Handler for FixedResponse {
    fn call(&self, req: Request) -> HandlerFuture {
        let mut response = Response::new(Full::from(self.render(&req)));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, self.content_type.clone());
        Box::pin(async move { Reply::Custom(response) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::BodyExt;

    fn request() -> Request {
        Request::from_http(http::Request::new(Bytes::new()))
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let handler: BoxedHandler = Arc::new(|_req: Request| async { "hello" });
        let reply = handler.call(request()).await;
        assert!(matches!(reply, Reply::Text(ref text) if text == "hello"));
    }

    #[tokio::test]
    async fn test_fixed_response() {
        let handler = FixedResponse::new(
            StatusCode::CREATED,
            "created",
            HeaderValue::from_static("text/plain"),
        );
        let response = handler.call(request()).await.into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "created");
    }
}
