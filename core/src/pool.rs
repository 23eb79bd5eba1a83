//! Reusable parameter value buffers
//!
//! The matcher records each parameter value as a byte span into the request
//! path. Span buffers come from a [`ParamPool`] shared by every lookup on a
//! router, so steady-state matching allocates nothing for parameter values.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Byte range `(start, end)` of a parameter value within the request path
pub type Span = (usize, usize);

/// Default number of idle buffers kept for reuse
pub const DEFAULT_MAX_IDLE: usize = 1024;

#[derive(Debug)]
struct PoolInner {
    free: Mutex<Vec<Vec<Span>>>,
    width: AtomicUsize,
    max_idle: usize,
}

/// Pool of span buffers sized to the widest registered route
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Debug, Clone)]
pub struct ParamPool {
    inner: Arc<PoolInner>,
}

/// Point-in-time pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers waiting for reuse
    pub idle: usize,
    /// Slot count of newly handed out buffers
    pub width: usize,
}

impl ParamPool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Create a pool that keeps at most `max_idle` released buffers
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(Vec::new()),
                width: AtomicUsize::new(0),
                max_idle,
            }),
        }
    }

    /// Current buffer width
    #[inline]
    pub fn width(&self) -> usize {
        self.inner.width.load(Ordering::Acquire)
    }

    /// Widen future buffers to hold at least `params` values
    pub fn grow(&self, params: usize) {
        self.inner.width.fetch_max(params, Ordering::AcqRel);
    }

    /// Take a buffer with at least `max(width, hint)` slots
    ///
    /// The buffer goes back to the pool when the returned [`Slots`] is dropped.
    pub fn acquire(&self, hint: usize) -> Slots {
        let len = self.width().max(hint);
        let reused = match self.inner.free.lock() {
            Ok(mut free) => free.pop(),
            Err(_) => None,
        };

        let mut spans = reused.unwrap_or_default();
        spans.clear();
        spans.resize(len, (0, 0));

        Slots {
            spans,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Return a buffer to the pool
    ///
    /// Equivalent to dropping `slots`.
    #[inline]
    pub fn release(&self, slots: Slots) {
        drop(slots);
    }

    pub fn stats(&self) -> PoolStats {
        let idle = self.inner.free.lock().map(|free| free.len()).unwrap_or(0);
        PoolStats {
            idle,
            width: self.width(),
        }
    }
}

impl Default for ParamPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Span buffer on loan from a [`ParamPool`]
#[derive(Debug)]
pub struct Slots {
    spans: Vec<Span>,
    pool: Arc<PoolInner>,
}

impl Slots {
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Record a value, growing the buffer when a route outgrew the pool width
    #[inline]
    pub(crate) fn set(&mut self, index: usize, span: Span) {
        if index >= self.spans.len() {
            self.spans.resize(index + 1, (0, 0));
        }
        self.spans[index] = span;
    }
}

impl Drop for Slots {
    fn drop(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        if spans.capacity() == 0 {
            return;
        }
        if let Ok(mut free) = self.pool.free.lock() {
            if free.len() < self.pool.max_idle {
                free.push(spans);
            }
        }
    }
}
