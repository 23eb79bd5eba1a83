//! # Trellis core
//!
//! Radix-tree HTTP route matching.
//!
//! ## Features
//! - Compressed prefix tree with static, `:param` and trailing `*` nodes
//! - Backtracking lookup: static beats param beats wildcard, whatever the
//!   registration order
//! - Method-not-allowed detection and an automatic trailing-slash redirect
//!   for `<prefix>/*` routes
//! - Pooled parameter buffers, values decoded only when read
//!
//! ## Example
//! ```rust
//! use trellis_core::{Lookup, Router};
//!
//! let mut router = Router::new();
//! router.insert("GET", "/users/:id", "get_user").unwrap();
//! router.insert("POST", "/users", "create_user").unwrap();
//!
//! let Lookup::Matched(found) = router.at("GET", "/users/123") else {
//!     panic!("route not found");
//! };
//! assert_eq!(found.route.handler(), Some(&"get_user"));
//! assert_eq!(found.params.get("id").as_deref(), Some("123"));
//! ```

use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, trace};

pub mod error;
pub mod matcher;
pub mod method;
pub mod params;
pub mod path;
pub mod pool;
pub mod tree;

pub use error::RouterError;
pub use matcher::{Lookup, Match};
pub use method::{Method, MethodTable, RouteMethod};
pub use params::{ParamError, Params, ParamsIter};
pub use path::{clean_path, WILDCARD_NAME};
pub use pool::{ParamPool, PoolStats, Slots};
pub use tree::Route;

use path::Pattern;
use tree::RadixTree;

/// Who holds a route name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    User,
    /// Trailing-slash redirect, yields to a user route for any method
    Redirect,
}

/// A registered user route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Registration method, `""` for any method
    pub method: String,
    /// Normalized pattern, parameter names included
    pub path: String,
}

/// Route table: one radix tree shared by all methods
///
/// Build with [`Router::insert`], then share immutably; [`Router::at`] takes
/// `&self` and keeps all search state on the caller's stack.
#[derive(Debug)]
pub struct Router<T> {
    tree: RadixTree<T>,
    /// Route names (`METHOD` + name-erased key) already taken
    claims: AHashMap<String, Claim>,
    routes: Vec<RouteInfo>,
    pool: ParamPool,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            tree: RadixTree::new(),
            claims: AHashMap::new(),
            routes: Vec::new(),
            pool: ParamPool::new(),
        }
    }

    /// Register `handler` for `method` and `pattern`
    ///
    /// `method` is an HTTP method name or `""` for any method. `pattern`
    /// holds literal bytes, `:name` segments and an optional trailing `*`.
    ///
    /// # Errors
    /// Any malformed pattern or method, and a second registration of the same
    /// method and pattern (parameter names do not distinguish patterns).
    pub fn insert(&mut self, method: &str, pattern: &str, handler: T) -> Result<(), RouterError> {
        let route_method = RouteMethod::parse(method)?;
        let pattern = Pattern::parse(pattern)?;

        let name = format!("{}{}", route_method.as_str(), pattern.key);
        if self.claims.get(&name) == Some(&Claim::User) {
            return Err(RouterError::DuplicateRoute {
                method: route_method.to_string(),
                path: pattern.path,
            });
        }

        if let Some(redirect_key) = pattern.redirect_key.as_deref() {
            if !self.claims.contains_key(redirect_key) {
                self.claims.insert(redirect_key.to_string(), Claim::Redirect);
                self.tree.insert(
                    redirect_key,
                    None,
                    Some((&RouteMethod::Any, Route::TrailingSlashRedirect)),
                );
                debug!(path = redirect_key, "registered trailing slash redirect");
            }
        }

        let mut handler = Some(handler);
        for step in &pattern.steps {
            let names: Option<Arc<[String]>> =
                (step.names > 0).then(|| pattern.names[..step.names].into());
            let entry = if step.terminal {
                handler.take().map(|h| (&route_method, Route::Handler(h)))
            } else {
                None
            };
            self.tree
                .insert(&pattern.key[..step.key_len], names.as_ref(), entry);
        }

        self.claims.insert(name, Claim::User);
        self.pool.grow(pattern.names.len());
        debug!(
            method = %route_method,
            path = %pattern.path,
            params = pattern.names.len(),
            "registered route"
        );
        self.routes.push(RouteInfo {
            method: route_method.as_str().to_string(),
            path: pattern.path,
        });
        Ok(())
    }

    /// Find the route for `method` and the raw request `path`
    ///
    /// `path` is matched undecoded; a run of `/` counts as one separator.
    pub fn at<'r, 'p>(&'r self, method: &str, path: &'p str) -> Lookup<'r, 'p, T> {
        let lookup = matcher::find(&self.tree, &self.pool, method, path);
        trace!(method, path, outcome = lookup.outcome(), "route lookup");
        lookup
    }

    /// Number of user routes
    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered user routes in registration order
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Largest parameter count of any registered route
    #[inline]
    pub fn max_params(&self) -> usize {
        self.pool.width()
    }

    /// Pool the parameter buffers come from
    #[inline]
    pub fn pool(&self) -> &ParamPool {
        &self.pool
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
