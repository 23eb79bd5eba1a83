//! Compressed radix tree of route nodes
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; the parent
//! link is a plain index used by the matcher, never an ownership edge.

use std::sync::Arc;

use crate::method::{MethodTable, RouteMethod};

/// Index of a node in the tree arena
pub type NodeId = usize;

/// The root is always the first arena slot
pub const ROOT: NodeId = 0;

/// How a node consumes request bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal prefix
    Static,
    /// `:name`, one path segment
    Param,
    /// Trailing `*`, the rest of the path
    Wildcard,
}

impl NodeKind {
    fn of(prefix: &[u8]) -> Self {
        match prefix.first() {
            Some(b':') => NodeKind::Param,
            Some(b'*') => NodeKind::Wildcard,
            _ => NodeKind::Static,
        }
    }
}

/// What a registered route resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<T> {
    /// User handler
    Handler(T),
    /// Auto-registered `<static>` shortcut of a `<static>/*` route
    TrailingSlashRedirect,
}

impl<T> Route<T> {
    #[inline]
    pub fn handler(&self) -> Option<&T> {
        match self {
            Route::Handler(handler) => Some(handler),
            Route::TrailingSlashRedirect => None,
        }
    }

    #[inline]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Route::TrailingSlashRedirect)
    }
}

/// Tree node
#[derive(Debug)]
pub(crate) struct Node<T> {
    /// Raw key bytes; a split may fall inside a multi-byte character
    pub prefix: Vec<u8>,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Static children keyed by the first byte of their prefix
    pub static_children: Vec<(u8, NodeId)>,
    pub param_child: Option<NodeId>,
    pub wildcard_child: Option<NodeId>,
    /// Parameter names from the root down to this node, fixed on first set
    pub names: Option<Arc<[String]>>,
    pub handlers: MethodTable<Route<T>>,
    /// Parameter and wildcard nodes from the root to here, inclusive
    pub depth: usize,
}

impl<T> Node<T> {
    fn new(prefix: Vec<u8>, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            kind: NodeKind::of(&prefix),
            prefix,
            parent,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
            names: None,
            handlers: MethodTable::new(),
            depth,
        }
    }

    #[inline]
    pub fn static_child(&self, label: u8) -> Option<NodeId> {
        self.static_children
            .iter()
            .find(|(first, _)| *first == label)
            .map(|(_, id)| *id)
    }

    /// Child reached by the first byte of the remaining key
    fn child_for(&self, label: u8) -> Option<NodeId> {
        match label {
            b':' => self.param_child,
            b'*' => self.wildcard_child,
            _ => self.static_child(label),
        }
    }

    fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.static_children
            .iter()
            .map(|(_, id)| *id)
            .chain(self.param_child)
            .chain(self.wildcard_child)
    }

    /// Attach names if this node has none yet
    fn adopt_names(&mut self, names: Option<&Arc<[String]>>) {
        if self.names.is_none() {
            self.names = names.cloned();
        }
    }

    fn attach(&mut self, entry: Option<(&RouteMethod, Route<T>)>, names: Option<&Arc<[String]>>) {
        self.adopt_names(names);
        if let Some((method, route)) = entry {
            self.handlers.insert(method, route);
        }
    }
}

/// Route tree built by repeated [`RadixTree::insert`] calls
#[derive(Debug)]
pub(crate) struct RadixTree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> RadixTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Vec::new(), None, 0)],
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id]
    }

    /// True until the first key is inserted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT].prefix.is_empty()
    }

    /// Insert `key`, splitting nodes where it diverges from existing prefixes
    ///
    /// Without `entry` the insertion is structural: the node for `key` exists
    /// afterwards but owns no handler. Returns the node representing `key`.
    pub fn insert(
        &mut self,
        key: &str,
        names: Option<&Arc<[String]>>,
        entry: Option<(&RouteMethod, Route<T>)>,
    ) -> NodeId {
        let mut current = ROOT;
        let mut search = key.as_bytes();

        loop {
            let prefix = self.nodes[current].prefix.as_slice();
            if prefix.is_empty() {
                let node = &mut self.nodes[current];
                node.prefix = search.to_vec();
                node.kind = NodeKind::of(search);
                node.attach(entry, names);
                return current;
            }

            let lcp = longest_common_prefix(prefix, search);
            let prefix_len = prefix.len();

            if lcp < prefix_len {
                self.split(current, lcp);
                if lcp == search.len() {
                    self.nodes[current].attach(entry, names);
                    return current;
                }
                return self.add_child(current, &search[lcp..], names, entry);
            }

            if lcp < search.len() {
                search = &search[lcp..];
                match self.nodes[current].child_for(search[0]) {
                    Some(child) => {
                        current = child;
                        continue;
                    }
                    None => return self.add_child(current, search, names, entry),
                }
            }

            self.nodes[current].attach(entry, names);
            return current;
        }
    }

    /// Shorten `id` to its first `at` bytes, moving the rest into a new child
    fn split(&mut self, id: NodeId, at: usize) {
        let moved_id = self.nodes.len();
        let node = &mut self.nodes[id];

        let suffix = node.prefix.split_off(at);
        let mut moved = Node::new(suffix, Some(id), node.depth);
        moved.kind = node.kind;
        moved.static_children = std::mem::take(&mut node.static_children);
        moved.param_child = node.param_child.take();
        moved.wildcard_child = node.wildcard_child.take();
        moved.names = node.names.take();
        moved.handlers = std::mem::take(&mut node.handlers);

        let label = moved.prefix[0];
        node.kind = NodeKind::Static;
        node.static_children.push((label, moved_id));

        let children: Vec<NodeId> = moved.children().collect();
        self.nodes.push(moved);
        for child in children {
            self.nodes[child].parent = Some(moved_id);
        }
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        prefix: &[u8],
        names: Option<&Arc<[String]>>,
        entry: Option<(&RouteMethod, Route<T>)>,
    ) -> NodeId {
        let id = self.nodes.len();
        let parent_depth = self.nodes[parent].depth;
        let mut child = Node::new(prefix.to_vec(), Some(parent), parent_depth);
        if child.kind != NodeKind::Static {
            child.depth += 1;
        }
        child.attach(entry, names);

        let kind = child.kind;
        let label = prefix[0];
        self.nodes.push(child);

        let parent = &mut self.nodes[parent];
        match kind {
            NodeKind::Static => parent.static_children.push((label, id)),
            NodeKind::Param => parent.param_child = Some(id),
            NodeKind::Wildcard => parent.wildcard_child = Some(id),
        }
        id
    }
}

#[inline]
fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn get() -> RouteMethod {
        RouteMethod::Known(Method::GET)
    }

    fn names(list: &[&str]) -> Arc<[String]> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_adopts_first_key() {
        let mut tree = RadixTree::new();
        assert!(tree.is_empty());

        let id = tree.insert("/users", None, Some((&get(), Route::Handler(1))));
        assert_eq!(id, ROOT);
        assert_eq!(tree.node(ROOT).prefix, b"/users");
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_split_moves_handlers_and_children() {
        let mut tree = RadixTree::new();
        tree.insert("/users", None, Some((&get(), Route::Handler(1))));
        tree.insert("/users/list", None, Some((&get(), Route::Handler(2))));
        let posts = tree.insert("/posts", None, Some((&get(), Route::Handler(3))));

        let root = tree.node(ROOT);
        assert_eq!(root.prefix, b"/");
        assert!(root.handlers.is_empty());
        assert_eq!(root.static_children.len(), 2);

        let users = root.static_child(b'u').unwrap();
        let users_node = tree.node(users);
        assert_eq!(users_node.prefix, b"users");
        assert_eq!(users_node.parent, Some(ROOT));
        assert_eq!(
            users_node.handlers.get("GET").and_then(Route::handler),
            Some(&1)
        );

        let list = users_node.static_child(b'/').unwrap();
        assert_eq!(tree.node(list).parent, Some(users));
        assert_eq!(tree.node(posts).prefix, b"posts");
    }

    #[test]
    fn test_handler_at_split_point() {
        let mut tree = RadixTree::new();
        tree.insert("/foobar", None, Some((&get(), Route::Handler(1))));
        let foo = tree.insert("/foo", None, Some((&get(), Route::Handler(2))));

        assert_eq!(foo, ROOT);
        assert_eq!(tree.node(ROOT).prefix, b"/foo");
        let bar = tree.node(ROOT).static_child(b'b').unwrap();
        assert_eq!(tree.node(bar).prefix, b"bar");
        assert_eq!(
            tree.node(bar).handlers.get("GET").and_then(Route::handler),
            Some(&1)
        );
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        let mut tree = RadixTree::new();
        let e_acute = tree.insert("/café", None, Some((&get(), Route::Handler(1))));
        let e_grave = tree.insert("/cafè", None, Some((&get(), Route::Handler(2))));

        assert_eq!(tree.node(ROOT).prefix, b"/caf\xc3");
        assert_eq!(tree.node(ROOT).static_child(0xa9), Some(e_acute));
        assert_eq!(tree.node(ROOT).static_child(0xa8), Some(e_grave));
        assert_eq!(tree.node(e_acute).parent, Some(ROOT));
    }

    #[test]
    fn test_param_and_wildcard_children() {
        let mut tree = RadixTree::new();
        tree.insert("/users/", None, None);
        let param = tree.insert("/users/:", Some(&names(&["id"])), None);
        let wildcard = tree.insert("/users/*", Some(&names(&["*"])), Some((&get(), Route::Handler(1))));

        let users = tree.node(ROOT);
        assert_eq!(users.param_child, Some(param));
        assert_eq!(users.wildcard_child, Some(wildcard));
        assert_eq!(tree.node(param).kind, NodeKind::Param);
        assert_eq!(tree.node(param).depth, 1);
        assert_eq!(tree.node(wildcard).kind, NodeKind::Wildcard);
        assert_eq!(tree.node(wildcard).depth, 1);
        assert!(users.static_children.is_empty());
    }

    #[test]
    fn test_names_fixed_by_first_registration() {
        let mut tree = RadixTree::<u8>::new();
        tree.insert("/", None, None);
        let first = tree.insert("/:", Some(&names(&["id"])), None);
        let again = tree.insert("/:", Some(&names(&["name"])), Some((&get(), Route::Handler(1))));

        assert_eq!(first, again);
        assert_eq!(tree.node(first).names.as_deref(), Some(&names(&["id"])[..]));
    }

    #[test]
    fn test_depth_counts_params_on_path() {
        let mut tree = RadixTree::<u8>::new();
        tree.insert("/a/", None, None);
        tree.insert("/a/:", Some(&names(&["x"])), None);
        tree.insert("/a/:/b/", None, None);
        let leaf = tree.insert("/a/:/b/:", Some(&names(&["x", "y"])), Some((&get(), Route::Handler(1))));
        let static_leaf = tree.insert("/a/:/b/c", Some(&names(&["x"])), Some((&get(), Route::Handler(2))));

        assert_eq!(tree.node(leaf).depth, 2);
        assert_eq!(tree.node(static_leaf).depth, 1);
    }
}
