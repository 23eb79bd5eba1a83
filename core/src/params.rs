//! Route parameters extracted by a lookup
//!
//! Values are stored as spans into the request path and decoded only when
//! read. Names come from the matched node and are shared, not copied.

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use crate::pool::Slots;

/// Parameters of one matched request
///
/// Holds a pooled span buffer; dropping the value returns the buffer.
#[derive(Debug, Default)]
pub struct Params<'p> {
    path: Cow<'p, str>,
    names: Option<Arc<[String]>>,
    slots: Option<Slots>,
}

impl<'p> Params<'p> {
    /// Parameters of a route without parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_match(
        path: &'p str,
        names: Option<Arc<[String]>>,
        slots: Option<Slots>,
    ) -> Self {
        Self {
            path: Cow::Borrowed(path),
            names,
            slots,
        }
    }

    /// Number of parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.names().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter names in positional order (`*` for a wildcard)
    #[inline]
    pub fn names(&self) -> &[String] {
        self.names.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }

    /// Undecoded value at `index`
    pub fn raw_at(&self, index: usize) -> Option<&str> {
        if index >= self.len() {
            return None;
        }
        let (start, end) = self.slots.as_ref()?.get(index)?;
        self.path.get(start..end)
    }

    /// Undecoded value of `name`, exactly as it appeared in the request path
    pub fn raw(&self, name: &str) -> Option<&str> {
        let index = self.names().iter().position(|n| n == name)?;
        self.raw_at(index)
    }

    /// Percent-decoded value of `name`
    ///
    /// A value that does not decode to UTF-8 is returned undecoded.
    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.raw(name).map(decode)
    }

    /// Decoded values in positional order
    pub fn values(&self) -> Vec<Cow<'_, str>> {
        (0..self.len())
            .map(|i| self.raw_at(i).map(decode).unwrap_or_default())
            .collect()
    }

    /// `(name, decoded value)` pairs in positional order
    #[inline]
    pub fn iter(&self) -> ParamsIter<'_, 'p> {
        ParamsIter {
            params: self,
            index: 0,
        }
    }

    /// Parse parameter as specific type
    pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))?;
        value.parse::<T>().map_err(|e| ParamError::ParseError {
            name: name.to_string(),
            value: value.to_string(),
            error: e.to_string(),
        })
    }

    /// Get parameter as u64 (common case)
    #[inline]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.parse(name).ok()
    }

    /// Detach from the request path, keeping the pooled buffer
    pub fn into_owned(self) -> Params<'static> {
        Params {
            path: Cow::Owned(self.path.into_owned()),
            names: self.names,
            slots: self.slots,
        }
    }
}

#[inline]
fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Iterator over route parameters
pub struct ParamsIter<'a, 'p> {
    params: &'a Params<'p>,
    index: usize,
}

impl<'a, 'p> Iterator for ParamsIter<'a, 'p> {
    type Item = (&'a str, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.params.names().get(self.index)?;
        let value = self.params.raw_at(self.index).map(decode).unwrap_or_default();
        self.index += 1;
        Some((name.as_str(), value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.params.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, 'p> ExactSizeIterator for ParamsIter<'a, 'p> {}

impl<'a, 'p> IntoIterator for &'a Params<'p> {
    type Item = (&'a str, Cow<'a, str>);
    type IntoIter = ParamsIter<'a, 'p>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parameter parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// Parameter not found
    #[error("parameter '{0}' not found")]
    Missing(String),
    /// Parameter parsing failed
    #[error("failed to parse parameter '{name}' with value '{value}': {error}")]
    ParseError {
        name: String,
        value: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ParamPool;

    fn params<'p>(pool: &ParamPool, path: &'p str, pairs: &[(&str, (usize, usize))]) -> Params<'p> {
        let names: Arc<[String]> = pairs.iter().map(|(n, _)| n.to_string()).collect();
        let mut slots = pool.acquire(pairs.len());
        for (i, (_, span)) in pairs.iter().enumerate() {
            slots.set(i, *span);
        }
        Params::from_match(path, Some(names), Some(slots))
    }

    #[test]
    fn test_params_basic_operations() {
        let pool = ParamPool::new();
        let params = params(&pool, "/users/123/test", &[("id", (7, 10)), ("name", (11, 15))]);

        assert_eq!(params.get("id").as_deref(), Some("123"));
        assert_eq!(params.get("name").as_deref(), Some("test"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
        assert!(!params.is_empty());
        assert!(params.contains("id"));
        assert_eq!(params.names(), &["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_params_parsing() {
        let pool = ParamPool::new();
        let params = params(&pool, "/123/abc", &[("id", (1, 4)), ("invalid", (5, 8))]);

        assert_eq!(params.parse::<u64>("id").unwrap(), 123);
        assert_eq!(params.get_u64("id"), Some(123));
        assert!(matches!(
            params.parse::<u64>("invalid"),
            Err(ParamError::ParseError { .. })
        ));
        assert_eq!(
            params.parse::<u64>("missing"),
            Err(ParamError::Missing("missing".to_string()))
        );
    }

    #[test]
    fn test_values_are_decoded_on_read() {
        let pool = ParamPool::new();
        let params = params(&pool, "/hello%20world/%FF", &[("a", (1, 14)), ("b", (15, 18))]);

        assert_eq!(params.raw("a"), Some("hello%20world"));
        assert_eq!(params.get("a").as_deref(), Some("hello world"));
        assert_eq!(params.get("b").as_deref(), Some("%FF"));
    }

    #[test]
    fn test_iteration_is_positional() {
        let pool = ParamPool::new();
        let params = params(&pool, "/x/y", &[("b", (1, 2)), ("a", (3, 4))]);

        let collected: Vec<(&str, String)> =
            params.iter().map(|(n, v)| (n, v.into_owned())).collect();
        assert_eq!(
            collected,
            vec![("b", "x".to_string()), ("a", "y".to_string())]
        );
        assert_eq!(params.values(), vec!["x", "y"]);
        assert_eq!(params.iter().len(), 2);
    }

    #[test]
    fn test_into_owned_returns_buffer_on_drop() {
        let pool = ParamPool::new();
        let owned = {
            let path = String::from("/42");
            params(&pool, &path, &[("id", (1, 3))]).into_owned()
        };
        assert_eq!(owned.get("id").as_deref(), Some("42"));
        assert_eq!(pool.stats().idle, 0);
        drop(owned);
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_empty_params() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.get("id"), None);
        assert_eq!(params.iter().count(), 0);
    }
}
