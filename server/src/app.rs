//! Application router: registration, middleware, fallbacks and dispatch
//!
//! [`App`] owns the single route table. A [`Scope`] created by [`App::sub`]
//! only remembers a path prefix and extra middleware; everything it
//! registers or dispatches goes through the owning app.

use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::header::HeaderValue;
use http::{Response, StatusCode};
use http_body_util::Full;
use tracing::{debug, info};
use trellis_core::{Lookup, Params, Route, Router, RouterError};

use crate::config::{RouteConfig, ServerConfig, TrellisConfig};
use crate::error::{TrellisError, TrellisResult};
use crate::handler::{BoxedHandler, FixedResponse, Handler};
use crate::middleware::{chain, Middleware, RequestLogger};
use crate::request::Request;
use crate::response::Reply;

/// A registered route as stored in the route table
pub struct Endpoint {
    /// Method as registered, `""` for any method
    pub method: String,
    /// Path pattern as registered, scope prefixes included
    pub pattern: String,
    handler: BoxedHandler,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Fallback handlers after middleware wrapping
struct Fallbacks {
    not_found: BoxedHandler,
    method_not_allowed: BoxedHandler,
    trailing_slash_redirect: BoxedHandler,
}

/// Routing decision for a method and request target, without running a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched {
        method: String,
        pattern: String,
        params: Vec<(String, String)>,
    },
    Redirect {
        location: String,
    },
    MethodNotAllowed,
    NotFound,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Matched {
                method,
                pattern,
                params,
            } => {
                let method = if method.is_empty() { "*" } else { method.as_str() };
                write!(f, "200 {method} {pattern}")?;
                for (name, value) in params {
                    write!(f, "\n  {name} = {value}")?;
                }
                Ok(())
            }
            Resolution::Redirect { location } => write!(f, "301 -> {location}"),
            Resolution::MethodNotAllowed => f.write_str("405 Method Not Allowed"),
            Resolution::NotFound => f.write_str("404 Not Found"),
        }
    }
}

/// Route registration shared by [`App`] and [`Scope`]
pub trait Routes {
    /// Register `handler` for `method` (`""` for any) at `path`
    ///
    /// `middlewares` wrap the handler inside any middleware already attached
    /// to the receiver; the first one is the outermost.
    fn handle<H: Handler>(
        &mut self,
        method: &str,
        path: &str,
        handler: H,
        middlewares: &[Arc<dyn Middleware>],
    ) -> TrellisResult<()>;

    fn get<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("GET", path, handler, &[])
    }

    fn post<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("POST", path, handler, &[])
    }

    fn put<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("PUT", path, handler, &[])
    }

    fn patch<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("PATCH", path, handler, &[])
    }

    fn delete<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("DELETE", path, handler, &[])
    }

    fn head<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("HEAD", path, handler, &[])
    }

    fn options<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("OPTIONS", path, handler, &[])
    }

    /// Register for every method without a route of its own at `path`
    fn any<H: Handler>(&mut self, path: &str, handler: H) -> TrellisResult<()> {
        self.handle("", path, handler, &[])
    }
}

/// Trellis application: route table, middleware and fallbacks
pub struct App {
    config: ServerConfig,
    router: Router<Endpoint>,
    middlewares: Vec<Arc<dyn Middleware>>,
    not_found: Option<BoxedHandler>,
    method_not_allowed: Option<BoxedHandler>,
    trailing_slash_redirect: Option<BoxedHandler>,
    /// Wrapped fallbacks, rebuilt after middleware or fallback changes
    fallbacks: OnceLock<Fallbacks>,
}

impl App {
    /// Create a new app with default server settings
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            middlewares: Vec::new(),
            not_found: None,
            method_not_allowed: None,
            trailing_slash_redirect: None,
            fallbacks: OnceLock::new(),
        }
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the server hostname
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.config.hostname = hostname.into();
        self
    }

    /// Set maximum request body size
    pub fn max_request_body_size(mut self, size: usize) -> Self {
        self.config.max_request_body_size = size;
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Append a middleware
    ///
    /// Applies to fallbacks and to routes registered from now on.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self.fallbacks = OnceLock::new();
        self
    }

    /// Routes registered under `prefix`, wrapped by `middlewares`
    pub fn sub(&mut self, prefix: &str, middlewares: &[Arc<dyn Middleware>]) -> Scope<'_> {
        Scope {
            app: self,
            prefix: prefix.to_string(),
            middlewares: middlewares.to_vec(),
        }
    }

    pub fn set_not_found<H: Handler>(&mut self, handler: H) {
        self.not_found = Some(Arc::new(handler));
        self.fallbacks = OnceLock::new();
    }

    pub fn set_method_not_allowed<H: Handler>(&mut self, handler: H) {
        self.method_not_allowed = Some(Arc::new(handler));
        self.fallbacks = OnceLock::new();
    }

    pub fn set_trailing_slash_redirect<H: Handler>(&mut self, handler: H) {
        self.trailing_slash_redirect = Some(Arc::new(handler));
        self.fallbacks = OnceLock::new();
    }

    fn fallbacks(&self) -> &Fallbacks {
        self.fallbacks.get_or_init(|| {
            let pick = |custom: &Option<BoxedHandler>, default: BoxedHandler| {
                chain(custom.clone().unwrap_or(default), &self.middlewares)
            };
            Fallbacks {
                not_found: pick(&self.not_found, Arc::new(not_found)),
                method_not_allowed: pick(&self.method_not_allowed, Arc::new(method_not_allowed)),
                trailing_slash_redirect: pick(
                    &self.trailing_slash_redirect,
                    Arc::new(trailing_slash_redirect),
                ),
            }
        })
    }

    /// Route `req` and run the matching handler or fallback
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();

        let (handler, params) = {
            let fallbacks = self.fallbacks();
            match self.router.at(parts.method.as_str(), parts.uri.path()) {
                Lookup::Matched(found) => match found.route {
                    Route::Handler(endpoint) => {
                        (Arc::clone(&endpoint.handler), found.params.into_owned())
                    }
                    Route::TrailingSlashRedirect => {
                        (Arc::clone(&fallbacks.trailing_slash_redirect), Params::new())
                    }
                },
                Lookup::MethodNotAllowed => {
                    (Arc::clone(&fallbacks.method_not_allowed), Params::new())
                }
                Lookup::NotFound => (Arc::clone(&fallbacks.not_found), Params::new()),
            }
        };

        handler
            .call(Request::new(parts, body, params))
            .await
            .into_response()
    }

    /// Routing decision for `method` and `target` (path plus optional query)
    pub fn resolve(&self, method: &str, target: &str) -> Resolution {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        match self.router.at(method, path) {
            Lookup::Matched(found) => match found.route {
                Route::Handler(endpoint) => Resolution::Matched {
                    method: endpoint.method.clone(),
                    pattern: endpoint.pattern.clone(),
                    params: found
                        .params
                        .iter()
                        .map(|(name, value)| (name.to_string(), value.into_owned()))
                        .collect(),
                },
                Route::TrailingSlashRedirect => Resolution::Redirect {
                    location: redirect_location(path, query),
                },
            },
            Lookup::MethodNotAllowed => Resolution::MethodNotAllowed,
            Lookup::NotFound => Resolution::NotFound,
        }
    }

    /// Get router reference for testing
    pub fn router(&self) -> &Router<Endpoint> {
        &self.router
    }

    /// Get config reference for testing
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build an app from a configuration file
    pub fn from_config(config: &TrellisConfig) -> TrellisResult<Self> {
        info!("🔧 Building Trellis app from configuration");

        let mut app = Self::with_config(config.server_config());

        if config.middleware.enable_logging {
            info!("✓ Logging middleware enabled");
            app.use_middleware(RequestLogger);
        }

        for route in &config.routes {
            register_configured(&mut app, route)?;
        }

        for group in &config.groups {
            let mut scope = app.sub(&group.prefix, &[]);
            for route in &group.routes {
                register_configured(&mut scope, route)?;
            }
            info!(prefix = %group.prefix, routes = group.routes.len(), "✓ Route group");
        }

        info!("✅ App configured with {} routes", app.router.len());
        Ok(app)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl Routes for App {
    fn handle<H: Handler>(
        &mut self,
        method: &str,
        path: &str,
        handler: H,
        middlewares: &[Arc<dyn Middleware>],
    ) -> TrellisResult<()> {
        let handler = chain(chain(Arc::new(handler), middlewares), &self.middlewares);
        self.router.insert(
            method,
            path,
            Endpoint {
                method: method.to_string(),
                pattern: path.to_string(),
                handler,
            },
        )?;
        debug!(method, path, "route added");
        Ok(())
    }
}

/// Prefix-and-middleware view over an [`App`]
pub struct Scope<'a> {
    app: &'a mut App,
    prefix: String,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Scope<'_> {
    /// Path prefix applied to every registration
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Nested scope: prefixes concatenate, middlewares append
    pub fn sub(&mut self, prefix: &str, middlewares: &[Arc<dyn Middleware>]) -> Scope<'_> {
        let mut combined = self.middlewares.clone();
        combined.extend_from_slice(middlewares);
        Scope {
            app: &mut *self.app,
            prefix: format!("{}{}", self.prefix, prefix),
            middlewares: combined,
        }
    }

    /// Dispatch through the owning app's route table
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response<Full<Bytes>> {
        self.app.dispatch(req).await
    }
}

impl Routes for Scope<'_> {
    fn handle<H: Handler>(
        &mut self,
        method: &str,
        path: &str,
        handler: H,
        middlewares: &[Arc<dyn Middleware>],
    ) -> TrellisResult<()> {
        let mut combined = self.middlewares.clone();
        combined.extend_from_slice(middlewares);
        let path = format!("{}{}", self.prefix, path);
        self.app.handle(method, &path, handler, &combined)
    }
}

fn register_configured<R: Routes>(target: &mut R, route: &RouteConfig) -> TrellisResult<()> {
    let response = route
        .response
        .as_ref()
        .ok_or_else(|| RouterError::MissingHandler(route.path.clone()))?;

    let status = StatusCode::from_u16(response.status).map_err(|e| {
        TrellisError::Config(format!("Invalid status for route {}: {}", route.path, e))
    })?;
    let content_type = HeaderValue::from_str(&response.content_type).map_err(|e| {
        TrellisError::Config(format!("Invalid content type for route {}: {}", route.path, e))
    })?;

    target.handle(
        &route.method,
        &route.path,
        FixedResponse::new(status, response.body.clone(), content_type),
        &[],
    )?;
    debug!(method = %route.method, path = %route.path, "✓ Registered configured route");
    Ok(())
}

/// `Location` for the trailing-slash redirect: the path with `/` appended
///
/// A leading run of `/` is reduced to one, so the location can never be read
/// as a network-path reference (`//host/...`).
pub fn redirect_location(path: &str, query: Option<&str>) -> String {
    let mut location = match path.trim_start_matches('/') {
        "" => "/".to_string(),
        rest => format!("/{rest}/"),
    };
    if let Some(query) = query {
        location.push('?');
        location.push_str(query);
    }
    location
}

async fn not_found(_req: Request) -> Reply {
    Reply::status_text(StatusCode::NOT_FOUND)
}

async fn method_not_allowed(_req: Request) -> Reply {
    Reply::status_text(StatusCode::METHOD_NOT_ALLOWED)
}

async fn trailing_slash_redirect(req: Request) -> Reply {
    Reply::Redirect(
        StatusCode::MOVED_PERMANENTLY,
        redirect_location(req.path(), req.query()),
    )
}
