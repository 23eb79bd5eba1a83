//! Request-time route matching
//!
//! Depth-first search over the route tree in strict static, param, wildcard
//! order. The walk is an explicit loop: every node on the current branch has
//! a [`Frame`] recording where its children start in the request path and
//! which child kind to try next, so leaving a node through its parent link
//! restores the unmatched suffix exactly. All search state is local to one
//! call; the tree is only read.

use memchr::memchr;
use smallvec::SmallVec;

use crate::params::Params;
use crate::pool::{ParamPool, Slots};
use crate::tree::{NodeId, RadixTree, Route, ROOT};

/// Result of a route lookup
#[derive(Debug)]
pub enum Lookup<'r, 'p, T> {
    /// A route answers this method and path
    Matched(Match<'r, 'p, T>),
    /// The path has routes, none for this method
    MethodNotAllowed,
    NotFound,
}

/// A matched route and the parameter values it extracted
#[derive(Debug)]
pub struct Match<'r, 'p, T> {
    pub route: &'r Route<T>,
    pub params: Params<'p>,
}

impl<'r, 'p, T> Lookup<'r, 'p, T> {
    /// Short outcome label for logs
    pub fn outcome(&self) -> &'static str {
        match self {
            Lookup::Matched(m) if m.route.is_redirect() => "redirect",
            Lookup::Matched(_) => "matched",
            Lookup::MethodNotAllowed => "method_not_allowed",
            Lookup::NotFound => "not_found",
        }
    }

    #[inline]
    pub fn is_matched(&self) -> bool {
        matches!(self, Lookup::Matched(_))
    }

    pub fn into_match(self) -> Option<Match<'r, 'p, T>> {
        match self {
            Lookup::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Next child kind to try at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Static,
    Param,
    Wildcard,
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Offset in the path where this node's children begin
    pos: usize,
    stage: Stage,
}

/// Match `prefix` at `pos`, treating a run of `/` in the path as one `/`
#[inline]
fn consume_static(prefix: &[u8], path: &[u8], mut pos: usize) -> Option<usize> {
    for &expected in prefix {
        if path.get(pos) != Some(&expected) {
            return None;
        }
        pos += 1;
        if expected == b'/' {
            while path.get(pos) == Some(&b'/') {
                pos += 1;
            }
        }
    }
    Some(pos)
}

pub(crate) fn find<'r, 'p, T>(
    tree: &'r RadixTree<T>,
    pool: &ParamPool,
    method: &str,
    path: &'p str,
) -> Lookup<'r, 'p, T> {
    let bytes = path.as_bytes();
    let len = bytes.len();
    if bytes.first() != Some(&b'/') || tree.is_empty() {
        return Lookup::NotFound;
    }

    let Some(start) = consume_static(&tree.node(ROOT).prefix, bytes, 0) else {
        return Lookup::NotFound;
    };

    let mut slots: Option<Slots> = None;
    let mut stack: SmallVec<[Frame; 16]> = SmallVec::new();
    stack.push(Frame {
        pos: start,
        stage: Stage::Static,
    });
    let mut current: NodeId = ROOT;

    while let Some(frame) = stack.last_mut() {
        let node = tree.node(current);
        let pos = frame.pos;

        if pos == len && frame.stage == Stage::Static {
            if !node.handlers.is_empty() {
                return match node.handlers.get(method) {
                    Some(route) => {
                        let slots = node.names.as_ref().and(slots);
                        Lookup::Matched(Match {
                            route,
                            params: Params::from_match(path, node.names.clone(), slots),
                        })
                    }
                    None => Lookup::MethodNotAllowed,
                };
            }
            frame.stage = Stage::Param;
        }

        match frame.stage {
            Stage::Static => {
                frame.stage = Stage::Param;
                let next = bytes
                    .get(pos)
                    .and_then(|&label| node.static_child(label))
                    .and_then(|child| {
                        consume_static(&tree.node(child).prefix, bytes, pos)
                            .map(|end| (child, end))
                    });
                if let Some((child, end)) = next {
                    stack.push(Frame {
                        pos: end,
                        stage: Stage::Static,
                    });
                    current = child;
                }
            }
            Stage::Param => {
                frame.stage = Stage::Wildcard;
                if let Some(child) = node.param_child {
                    let end = memchr(b'/', &bytes[pos..]).map_or(len, |i| pos + i);
                    let depth = tree.node(child).depth;
                    slots
                        .get_or_insert_with(|| pool.acquire(depth))
                        .set(depth - 1, (pos, end));
                    stack.push(Frame {
                        pos: end,
                        stage: Stage::Static,
                    });
                    current = child;
                }
            }
            Stage::Wildcard => {
                frame.stage = Stage::Exhausted;
                if let Some(child) = node.wildcard_child {
                    let depth = tree.node(child).depth;
                    slots
                        .get_or_insert_with(|| pool.acquire(depth))
                        .set(depth - 1, (pos, len));
                    stack.push(Frame {
                        pos: len,
                        stage: Stage::Static,
                    });
                    current = child;
                }
            }
            Stage::Exhausted => {
                stack.pop();
                if let Some(parent) = node.parent {
                    current = parent;
                }
            }
        }
    }

    Lookup::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_static_collapses_slashes() {
        assert_eq!(consume_static(b"/foo", b"/foo", 0), Some(4));
        assert_eq!(consume_static(b"/foo", b"///foo", 0), Some(6));
        assert_eq!(consume_static(b"/foo/", b"/foo//bar", 0), Some(6));
        assert_eq!(consume_static(b"bar", b"/foo//bar", 6), Some(9));
        assert_eq!(consume_static(b"/foo", b"/fo", 0), None);
        assert_eq!(consume_static(b"foo", b"/foo", 0), None);
    }

    #[test]
    fn test_slashes_inside_static_prefix_are_not_collapsed_after_other_bytes() {
        assert_eq!(consume_static(b"/foobar", b"/foobar//", 0), Some(7));
    }
}
