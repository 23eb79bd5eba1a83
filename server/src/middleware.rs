//! Middleware: handler decorators applied at registration time

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;

/// Wraps a handler into another handler
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// Middleware defined by a plain function
pub struct MiddlewareFn<F>(F);

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.0)(next)
    }
}

/// Build a middleware from `Fn(next) -> handler`
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(MiddlewareFn(f))
}

/// Wrap `handler` so the first middleware is the outermost
pub fn chain(handler: BoxedHandler, middlewares: &[Arc<dyn Middleware>]) -> BoxedHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}

/// Emits one `tracing` event per request
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let method = req.method().clone();
                let path = req.path().to_string();
                let start = Instant::now();

                let reply = next.call(req).await;

                info!(
                    %method,
                    %path,
                    status = reply.status().as_u16(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "request"
                );
                reply
            }
        })
    }
}
