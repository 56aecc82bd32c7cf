//! View-layer management: one portal overlay per live container.
//!
//! Layers survive provider churn — the widget that declared a configuration
//! may be torn down while its overlay stays up. What does not survive is a
//! detached element: a layer whose container or overlay node left the tree
//! is purged on the next evaluation pass and rebuilt from scratch when a
//! provider still wants that container.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::autohide::Autohide;
use crate::host::{HostTree, NodeId, NodeKind};
use crate::popup::PopupAnchor;
use crate::registry::{ContainerScope, ContainerTarget, ProviderKey};
use crate::render::RenderedOverlay;

/// Ephemeral expanded-stack state. Lives on the layer, never on the stack
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStack {
    pub stack_id: String,
    /// Invoking element's rectangle captured at open time.
    pub anchor: PopupAnchor,
    /// Set between insertion and the deferred layout read; the popup's
    /// final rect is only computed once a measurement arrives.
    pub awaiting_measure: bool,
    pub popup_rect: Option<crate::geometry::Rect>,
}

/// Per-container bookkeeping plus the portal overlay element.
#[derive(Debug)]
pub struct ViewLayer {
    pub container: NodeId,
    pub container_key: String,
    pub scope: ContainerScope,
    pub overlay: NodeId,
    pub active_provider: Option<ProviderKey>,
    pub open_stack: Option<OpenStack>,
    pub hover_close_deadline: Option<Instant>,
    pub media_expanded: bool,
    pub autohide: Option<Autohide>,
    pub rendered: Option<RenderedOverlay>,
}

impl ViewLayer {
    /// Clear rendered content while keeping the layer alive (suppression,
    /// or no provider passing its conditions).
    pub fn clear_content(&mut self) {
        self.rendered = None;
        self.open_stack = None;
        self.hover_close_deadline = None;
    }
}

#[derive(Debug, Default)]
pub struct LayerManager {
    layers: BTreeMap<String, ViewLayer>,
    /// Single portal root for `Global` containers; persists across view
    /// navigation because per-view containers are destroyed by the host.
    global_root: Option<NodeId>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable identifier for a container, derived once: explicit id
    /// attribute when present, structural path otherwise.
    pub fn container_key(tree: &HostTree, target: ContainerTarget) -> String {
        match target.scope {
            ContainerScope::Global => String::from("global"),
            ContainerScope::View => {
                if let Some(attr) = tree.id_attr(target.node) {
                    return format!("id:{attr}");
                }
                tree.structural_path(target.node)
                    .unwrap_or_else(|| String::from("node:detached"))
            }
        }
    }

    pub fn get(&self, container_key: &str) -> Option<&ViewLayer> {
        self.layers.get(container_key)
    }

    pub fn get_mut(&mut self, container_key: &str) -> Option<&mut ViewLayer> {
        self.layers.get_mut(container_key)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewLayer> {
        self.layers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn global_root(&mut self, tree: &mut HostTree) -> Option<NodeId> {
        if let Some(root) = self.global_root
            && tree.is_attached(root)
        {
            return Some(root);
        }
        let root = tree.insert(tree.root(), NodeKind::Overlay)?;
        tree.set_id_attr(root, "nav-overlay-root");
        self.global_root = Some(root);
        Some(root)
    }

    /// Return the layer for a container, allocating or re-allocating its
    /// overlay element when missing or detached.
    pub fn ensure_layer(
        &mut self,
        tree: &mut HostTree,
        target: ContainerTarget,
        container_key: &str,
    ) -> Option<&mut ViewLayer> {
        let reusable = self
            .layers
            .get(container_key)
            .is_some_and(|layer| tree.is_attached(layer.overlay));
        if !reusable {
            let parent = match target.scope {
                ContainerScope::Global => self.global_root(tree)?,
                ContainerScope::View => target.node,
            };
            let overlay = tree.insert(parent, NodeKind::Overlay)?;
            debug!(container = %container_key, "allocating view layer");
            self.layers.insert(
                container_key.to_string(),
                ViewLayer {
                    container: target.node,
                    container_key: container_key.to_string(),
                    scope: target.scope,
                    overlay,
                    active_provider: None,
                    open_stack: None,
                    hover_close_deadline: None,
                    media_expanded: false,
                    autohide: None,
                    rendered: None,
                },
            );
        }
        self.layers.get_mut(container_key)
    }

    /// Tear down every layer whose container or overlay element is no
    /// longer attached. Returns the purged container keys so the caller
    /// can drop dependent state (gesture entries, pointer tracking).
    pub fn collect_garbage(&mut self, tree: &mut HostTree) -> Vec<String> {
        let doomed: Vec<String> = self
            .layers
            .values()
            .filter(|layer| {
                !tree.is_attached(layer.container) || !tree.is_attached(layer.overlay)
            })
            .map(|layer| layer.container_key.clone())
            .collect();
        for key in &doomed {
            if let Some(layer) = self.layers.remove(key) {
                tree.remove(layer.overlay);
                debug!(container = %key, "purged view layer");
            }
        }
        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn tree() -> HostTree {
        HostTree::new(Size::new(1024.0, 768.0))
    }

    #[test]
    fn ensure_layer_reuses_attached_overlay() {
        let mut t = tree();
        let view = t.insert(t.root(), NodeKind::View).unwrap();
        let target = ContainerTarget {
            node: view,
            scope: ContainerScope::View,
        };
        let key = LayerManager::container_key(&t, target);
        let mut layers = LayerManager::new();
        let overlay = layers.ensure_layer(&mut t, target, &key).unwrap().overlay;
        let again = layers.ensure_layer(&mut t, target, &key).unwrap().overlay;
        assert_eq!(overlay, again);
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn detached_overlay_is_recreated() {
        let mut t = tree();
        let view = t.insert(t.root(), NodeKind::View).unwrap();
        let target = ContainerTarget {
            node: view,
            scope: ContainerScope::View,
        };
        let key = LayerManager::container_key(&t, target);
        let mut layers = LayerManager::new();
        let overlay = layers.ensure_layer(&mut t, target, &key).unwrap().overlay;
        // host churn rips the portal element out
        t.remove(overlay);
        let rebuilt = layers.ensure_layer(&mut t, target, &key).unwrap().overlay;
        assert_ne!(overlay, rebuilt);
        assert!(t.is_attached(rebuilt));
    }

    #[test]
    fn global_layers_parent_to_persistent_root() {
        let mut t = tree();
        let view = t.insert(t.root(), NodeKind::View).unwrap();
        let target = ContainerTarget {
            node: t.root(),
            scope: ContainerScope::Global,
        };
        let key = LayerManager::container_key(&t, target);
        assert_eq!(key, "global");
        let mut layers = LayerManager::new();
        let overlay = layers.ensure_layer(&mut t, target, &key).unwrap().overlay;
        // navigating away destroys the view but not the portal
        t.remove(view);
        assert!(t.is_attached(overlay));
    }

    #[test]
    fn garbage_collection_purges_dead_containers() {
        let mut t = tree();
        let view = t.insert(t.root(), NodeKind::View).unwrap();
        let target = ContainerTarget {
            node: view,
            scope: ContainerScope::View,
        };
        let key = LayerManager::container_key(&t, target);
        let mut layers = LayerManager::new();
        layers.ensure_layer(&mut t, target, &key);
        t.remove(view);
        let purged = layers.collect_garbage(&mut t);
        assert_eq!(purged, vec![key]);
        assert!(layers.is_empty());
    }

    #[test]
    fn container_key_prefers_id_attribute() {
        let mut t = tree();
        let view = t.insert(t.root(), NodeKind::View).unwrap();
        t.set_id_attr(view, "main-dashboard");
        let target = ContainerTarget {
            node: view,
            scope: ContainerScope::View,
        };
        assert_eq!(
            LayerManager::container_key(&t, target),
            "id:main-dashboard"
        );
    }
}
