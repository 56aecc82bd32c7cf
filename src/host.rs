//! Explicit model of the host application's element tree.
//!
//! The orchestrator never sees a live DOM; the embedding application mirrors
//! the parts it cares about into a [`HostTree`] and keeps it current as the
//! host churns. Handles are generational: a [`NodeId`] held across a removal
//! goes stale instead of aliasing whatever reuses the slot, which is exactly
//! the "live reference may become invalid" tolerance the arbitration rules
//! depend on.

use slab::Slab;
use std::cmp::Ordering;

use crate::geometry::{Rect, Size};

/// Generational handle to a node in a [`HostTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

/// Structural role of a host node, as far as the orchestrator cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// A routed view container; torn down by the host on navigation.
    View,
    /// A host panel; only dashboard panels may show the overlay.
    Panel { dashboard: bool },
    /// A modal dialog. `open` suppresses rendering while set.
    Dialog,
    /// A drawer / sidebar. `open` suppresses rendering while set.
    Drawer,
    /// Any other element (widget roots, route buttons, ...).
    Element,
    /// A portal overlay element owned by the orchestrator.
    Overlay,
}

#[derive(Debug)]
struct HostNode {
    generation: u64,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    id_attr: Option<String>,
    open: bool,
    rect: Option<Rect>,
}

/// Arena-backed element tree plus the page-level facts the orchestrator
/// reads each pass (viewport size, current navigation path).
#[derive(Debug)]
pub struct HostTree {
    nodes: Slab<HostNode>,
    next_generation: u64,
    root: NodeId,
    viewport: Size,
    current_path: String,
}

impl HostTree {
    pub fn new(viewport: Size) -> Self {
        let mut nodes = Slab::new();
        let index = nodes.insert(HostNode {
            generation: 0,
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            id_attr: None,
            open: false,
            rect: None,
        });
        Self {
            nodes,
            next_generation: 1,
            root: NodeId {
                index,
                generation: 0,
            },
            viewport,
            current_path: String::from("/"),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn set_current_path(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
    }

    fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes
            .get(id.index)
            .filter(|node| node.generation == id.generation)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut HostNode> {
        self.nodes
            .get_mut(id.index)
            .filter(|node| node.generation == id.generation)
    }

    /// True while the handle still refers to a live slot (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Insert a new child under `parent`, appended in document order.
    ///
    /// Returns `None` when the parent handle is stale.
    pub fn insert(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.node(parent)?;
        let generation = self.next_generation;
        self.next_generation += 1;
        let index = self.nodes.insert(HostNode {
            generation,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            id_attr: None,
            open: false,
            rect: None,
        });
        let id = NodeId { index, generation };
        if let Some(node) = self.node_mut(parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Remove `id` and its whole subtree. Handles into the subtree go stale.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        if id == self.root {
            return;
        }
        let parent = node.parent;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.node(current) {
                pending.extend(node.children.iter().copied());
                self.nodes.remove(current.index);
            }
        }
        if let Some(parent) = parent
            && let Some(parent_node) = self.node_mut(parent)
        {
            parent_node.children.retain(|child| *child != id);
        }
    }

    /// True when the node is still connected to the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.node(current) else {
                return false;
            };
            match node.parent {
                None => return current == self.root,
                Some(parent) => current = parent,
            }
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|node| node.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn set_id_attr(&mut self, id: NodeId, attr: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.id_attr = Some(attr.into());
        }
    }

    pub fn id_attr(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|node| node.id_attr.as_deref())
    }

    pub fn set_open(&mut self, id: NodeId, open: bool) {
        if let Some(node) = self.node_mut(id) {
            node.open = open;
        }
    }

    pub fn is_open(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.open)
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(node) = self.node_mut(id) {
            node.rect = Some(rect);
        }
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.node(id).and_then(|node| node.rect)
    }

    /// Path of child indices from the root. `None` for detached nodes.
    fn index_path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        loop {
            let node = self.node(current)?;
            let Some(parent) = node.parent else {
                break (current == self.root).then(|| {
                    path.reverse();
                    path
                });
            };
            let parent_node = self.node(parent)?;
            let position = parent_node
                .children
                .iter()
                .position(|child| *child == current)?;
            path.push(position);
            current = parent;
        }
    }

    /// Pre-order document comparison. `None` when either node is detached —
    /// callers fall back to their own tie-break rather than erroring.
    pub fn compare_document_order(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        let path_a = self.index_path(a)?;
        let path_b = self.index_path(b)?;
        Some(path_a.cmp(&path_b))
    }

    /// Stable structural fallback identifier, e.g. `node:0/2/1`.
    pub fn structural_path(&self, id: NodeId) -> Option<String> {
        let path = self.index_path(id)?;
        let joined = path
            .iter()
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join("/");
        Some(format!("node:{joined}"))
    }

    /// Nearest ancestor (including `id` itself) that is a panel.
    pub fn enclosing_panel(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if matches!(node.kind, NodeKind::Panel { .. }) {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    /// Depth-capped walk looking for any open dialog within the subtree.
    ///
    /// The cap guards against pathological host trees; the original system
    /// crossed nested shadow boundaries the same way.
    pub fn dialog_open_within(&self, id: NodeId, max_depth: usize) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.kind == NodeKind::Dialog && node.open {
            return true;
        }
        if max_depth == 0 {
            return false;
        }
        node.children
            .iter()
            .any(|child| self.dialog_open_within(*child, max_depth - 1))
    }

    /// True when any attached drawer is open anywhere in the tree.
    pub fn drawer_open(&self) -> bool {
        self.nodes
            .iter()
            .any(|(_, node)| node.kind == NodeKind::Drawer && node.open)
    }
}
