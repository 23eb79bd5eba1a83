//! HTTP methods and the per-node handler dispatch table

use std::fmt;

use crate::error::RouterError;

/// Well-known HTTP methods with a dedicated dispatch slot
///
/// Discriminants double as indexes into [`MethodTable`]; most common methods
/// (GET, POST) come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Method {
    GET = 0,
    POST = 1,
    PUT = 2,
    DELETE = 3,
    PATCH = 4,
    HEAD = 5,
    OPTIONS = 6,
    CONNECT = 7,
    TRACE = 8,
}

impl Method {
    /// Number of well-known methods
    pub const COUNT: usize = 9;

    /// Parse a well-known method from its exact (case-sensitive) bytes
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"PATCH" => Some(Method::PATCH),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"CONNECT" => Some(Method::CONNECT),
            b"TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    /// Get method as static string slice (zero allocation)
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }

    /// Slot index in a [`MethodTable`]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

}

impl fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Method a route is registered for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMethod {
    /// Empty method string: any method, lowest priority at its node
    Any,
    Known(Method),
    /// Extension method such as `PURGE` or `PROPFIND`
    Other(String),
}

impl RouteMethod {
    /// Parse a registration method name
    ///
    /// The empty string means [`RouteMethod::Any`]. Any other name must be
    /// ASCII alphanumeric.
    pub fn parse(method: &str) -> Result<Self, RouterError> {
        if method.is_empty() {
            return Ok(RouteMethod::Any);
        }
        if let Some(known) = Method::from_bytes(method.as_bytes()) {
            return Ok(RouteMethod::Known(known));
        }
        if !method.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(RouterError::InvalidMethod(method.to_string()));
        }
        Ok(RouteMethod::Other(method.to_string()))
    }

    /// The method name as registered ("" for [`RouteMethod::Any`])
    pub fn as_str(&self) -> &str {
        match self {
            RouteMethod::Any => "",
            RouteMethod::Known(method) => method.as_str(),
            RouteMethod::Other(name) => name,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::Any => f.write_str("*"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Handler slots of one route node
///
/// Well-known methods resolve through a fixed array, extension methods through
/// a short association list, and `any` catches whatever has no exact entry.
#[derive(Debug, Clone)]
pub struct MethodTable<T> {
    known: [Option<T>; Method::COUNT],
    other: Vec<(Box<str>, T)>,
    any: Option<T>,
}

impl<T> MethodTable<T> {
    pub fn new() -> Self {
        Self {
            known: std::array::from_fn(|_| None),
            other: Vec::new(),
            any: None,
        }
    }

    /// Store `value` for `method`, returning the previous entry
    pub fn insert(&mut self, method: &RouteMethod, value: T) -> Option<T> {
        match method {
            RouteMethod::Any => self.any.replace(value),
            RouteMethod::Known(known) => self.known[known.index()].replace(value),
            RouteMethod::Other(name) => {
                if let Some(slot) = self.other.iter_mut().find(|(n, _)| **n == **name) {
                    return Some(std::mem::replace(&mut slot.1, value));
                }
                self.other.push((name.as_str().into(), value));
                None
            }
        }
    }

    /// Entry for the request `method`, falling back to the `any` slot
    #[inline]
    pub fn get(&self, method: &str) -> Option<&T> {
        let exact = match Method::from_bytes(method.as_bytes()) {
            Some(known) => self.known[known.index()].as_ref(),
            None => self
                .other
                .iter()
                .find(|(name, _)| &**name == method)
                .map(|(_, value)| value),
        };
        exact.or(self.any.as_ref())
    }

    /// True when no method has an entry
    pub fn is_empty(&self) -> bool {
        self.any.is_none() && self.other.is_empty() && self.known.iter().all(Option::is_none)
    }
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
