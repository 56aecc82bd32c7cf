//! Render dispatching: effective configuration to resolved overlay tree.
//!
//! Rendering is a pure rebuild — every dynamic field is resolved fresh, so
//! unregistering and re-registering an identical configuration yields an
//! identical tree. The dispatcher never paints while the host is in a state
//! where the overlay must not show; suppression clears content but keeps
//! the layer alive.

use tracing::debug;

use crate::breakpoint::{Breakpoint, DeviceClass};
use crate::conditions::ConditionEvaluator;
use crate::config::{
    DynamicField, EdgePosition, LayoutMode, OpenMode, Orientation, OverlayConfig, RouteConfig,
};
use crate::constants;
use crate::geometry::Rect;
use crate::gesture::{GestureActions, GestureKey};
use crate::host::{HostTree, NodeId, NodeKind};
use crate::layer::OpenStack;
use crate::registry::ProviderEntry;
use crate::template::{TemplateResolver, resolve_or_fallback};

/// Why rendering is currently suppressed for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    NonDashboardPanel,
    DialogOpen,
    DrawerOpen,
}

/// Check the host for states that must blank the overlay.
pub fn suppression_reason(tree: &HostTree, container: NodeId) -> Option<SuppressReason> {
    if let Some(panel) = tree.enclosing_panel(container)
        && matches!(tree.kind(panel), Some(NodeKind::Panel { dashboard: false }))
    {
        return Some(SuppressReason::NonDashboardPanel);
    }
    if tree.dialog_open_within(tree.root(), constants::DIALOG_SCAN_MAX_DEPTH) {
        return Some(SuppressReason::DialogOpen);
    }
    if tree.drawer_open() {
        return Some(SuppressReason::DrawerOpen);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderedItemKind {
    Route,
    StackToggle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBadge {
    pub count: i64,
    pub color: Option<String>,
}

/// One interactive element of the overlay card (or of an open popup).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedItem {
    pub id: String,
    pub kind: RenderedItemKind,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub label: Option<String>,
    pub selected: bool,
    pub badge: Option<RenderedBadge>,
    pub gesture: GestureKey,
    pub actions: GestureActions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMedia {
    pub entity: String,
    pub expanded: bool,
}

/// Secondary-route popup, rendered as a sibling of the card.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPopup {
    pub stack_id: String,
    pub items: Vec<RenderedItem>,
    pub orientation: Orientation,
    /// Full-viewport invisible backdrop beneath the popup; present in
    /// click open-mode, where closing requires an explicit outside click.
    pub backdrop: bool,
    /// Final placement; `None` while the deferred measurement is pending.
    pub rect: Option<Rect>,
}

/// The fully resolved overlay for one container and one render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOverlay {
    pub owner: String,
    pub provider: String,
    pub style: Option<String>,
    pub layout: LayoutMode,
    pub position: EdgePosition,
    pub device: DeviceClass,
    pub items: Vec<RenderedItem>,
    pub media: Option<RenderedMedia>,
    pub popup: Option<RenderedPopup>,
    pub autohidden: bool,
}

/// Shared read-only dependencies of a render pass.
pub struct RenderContext<'a> {
    pub tree: &'a HostTree,
    pub breakpoint: &'a Breakpoint,
    pub conditions: &'a dyn ConditionEvaluator,
    pub resolver: &'a dyn TemplateResolver,
}

impl RenderContext<'_> {
    /// Build the rendered tree for the active provider of a container.
    ///
    /// `effective` is the layered configuration produced by
    /// [`crate::config::resolve_layers`]; the caller computes it once per
    /// cycle because it
    /// also drives action lookup and autohide eligibility.
    pub fn render(
        &self,
        entry: &ProviderEntry,
        effective: &OverlayConfig,
        open_stack: Option<&OpenStack>,
        media_expanded: bool,
        autohidden: bool,
    ) -> RenderedOverlay {
        let device = self
            .breakpoint
            .device_class(self.tree.viewport().width);
        let items = self.render_items(entry, effective);
        let popup = open_stack.and_then(|open| self.render_popup(entry, effective, open));
        debug!(
            owner = %entry.key.owner,
            provider = %entry.key.provider,
            items = items.len(),
            "rendered overlay"
        );
        RenderedOverlay {
            owner: entry.key.owner.clone(),
            provider: entry.key.provider.clone(),
            style: effective.style.clone(),
            layout: effective.layout.unwrap_or_default(),
            position: effective.position.unwrap_or_default(),
            device,
            items,
            media: effective.media.as_ref().map(|media| RenderedMedia {
                entity: media.entity.clone(),
                expanded: media_expanded || media.start_expanded,
            }),
            popup,
            autohidden,
        }
    }

    fn render_items(&self, entry: &ProviderEntry, effective: &OverlayConfig) -> Vec<RenderedItem> {
        let mut items = Vec::new();
        for route in &effective.routes {
            if let Some(item) =
                self.render_route(entry, route, RenderedItemKind::Route, route.id.clone())
            {
                items.push(item);
            }
        }
        for stack in &effective.stacks {
            let gesture = GestureKey::new(
                entry.key.owner.clone(),
                entry.key.provider.clone(),
                format!("stack:{}", stack.id),
            );
            items.push(RenderedItem {
                id: stack.id.clone(),
                kind: RenderedItemKind::StackToggle,
                icon: stack
                    .icon
                    .as_ref()
                    .map(|field| self.resolve_text(field, &entry.context)),
                image: None,
                label: None,
                selected: false,
                badge: None,
                gesture,
                actions: GestureActions::default(),
            });
        }
        items
    }

    fn render_popup(
        &self,
        entry: &ProviderEntry,
        effective: &OverlayConfig,
        open: &OpenStack,
    ) -> Option<RenderedPopup> {
        let stack = effective
            .stacks
            .iter()
            .find(|stack| stack.id == open.stack_id)?;
        let items = stack
            .routes
            .iter()
            .filter_map(|route| {
                self.render_route(
                    entry,
                    route,
                    RenderedItemKind::Route,
                    format!("{}/{}", stack.id, route.id),
                )
            })
            .collect();
        Some(RenderedPopup {
            stack_id: stack.id.clone(),
            items,
            orientation: stack.orientation,
            backdrop: stack.open_mode == OpenMode::Click,
            rect: open.popup_rect,
        })
    }

    fn render_route(
        &self,
        entry: &ProviderEntry,
        route: &RouteConfig,
        kind: RenderedItemKind,
        gesture_route: String,
    ) -> Option<RenderedItem> {
        if let Some(hidden) = route.hidden.as_ref()
            && resolve_or_fallback(self.resolver, hidden, &entry.context).truthy()
        {
            return None;
        }
        let selected = match route.selected.as_ref() {
            Some(predicate) => {
                resolve_or_fallback(self.resolver, predicate, &entry.context).truthy()
            }
            None => route
                .url
                .as_deref()
                .is_some_and(|url| self.conditions.current_path_matches(url)),
        };
        let badge = route.badge.as_ref().and_then(|badge| {
            let count = resolve_or_fallback(self.resolver, &badge.count, &entry.context)
                .as_count()
                .filter(|count| *count > 0)?;
            Some(RenderedBadge {
                count,
                color: badge
                    .color
                    .as_ref()
                    .map(|color| self.resolve_text(color, &entry.context)),
            })
        });
        Some(RenderedItem {
            id: route.id.clone(),
            kind,
            icon: route
                .icon
                .as_ref()
                .map(|field| self.resolve_text(field, &entry.context)),
            image: route
                .image
                .as_ref()
                .map(|field| self.resolve_text(field, &entry.context)),
            label: route
                .label
                .as_ref()
                .map(|field| self.resolve_text(field, &entry.context)),
            selected,
            badge,
            gesture: GestureKey::new(
                entry.key.owner.clone(),
                entry.key.provider.clone(),
                gesture_route,
            ),
            actions: GestureActions {
                has_hold: route.hold_action.as_ref().is_some_and(|a| !a.is_none()),
                has_double_tap: route
                    .double_tap_action
                    .as_ref()
                    .is_some_and(|a| !a.is_none()),
            },
        })
    }

    fn resolve_text(&self, field: &DynamicField, context: &serde_json::Value) -> String {
        resolve_or_fallback(self.resolver, field, context).as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::AlwaysPass;
    use crate::config::{BadgeConfig, StackConfig};
    use crate::geometry::Size;
    use crate::registry::{ContainerScope, ContainerTarget, ProviderKey};
    use crate::template::LiteralResolver;

    fn entry(config: OverlayConfig) -> ProviderEntry {
        ProviderEntry {
            key: ProviderKey::new("widget", "nav"),
            target: ContainerTarget {
                node: HostTree::new(Size::new(1.0, 1.0)).root(),
                scope: ContainerScope::Global,
            },
            container_key: "global".into(),
            config,
            context: serde_json::Value::Null,
            element: None,
            seq: 0,
        }
    }

    fn context<'a>(tree: &'a HostTree, breakpoint: &'a Breakpoint) -> RenderContext<'a> {
        RenderContext {
            tree,
            breakpoint,
            conditions: &AlwaysPass,
            resolver: &LiteralResolver,
        }
    }

    #[test]
    fn suppressed_inside_non_dashboard_panel() {
        let mut tree = HostTree::new(Size::new(1024.0, 768.0));
        let panel = tree
            .insert(tree.root(), NodeKind::Panel { dashboard: false })
            .unwrap();
        let container = tree.insert(panel, NodeKind::Element).unwrap();
        assert_eq!(
            suppression_reason(&tree, container),
            Some(SuppressReason::NonDashboardPanel)
        );
    }

    #[test]
    fn open_dialog_anywhere_suppresses() {
        let mut tree = HostTree::new(Size::new(1024.0, 768.0));
        let view = tree.insert(tree.root(), NodeKind::View).unwrap();
        let dialog = tree.insert(view, NodeKind::Dialog).unwrap();
        let container = tree.insert(tree.root(), NodeKind::View).unwrap();
        assert_eq!(suppression_reason(&tree, container), None);
        tree.set_open(dialog, true);
        assert_eq!(
            suppression_reason(&tree, container),
            Some(SuppressReason::DialogOpen)
        );
    }

    #[test]
    fn hidden_route_is_dropped_badge_requires_positive_count() {
        let tree = HostTree::new(Size::new(1024.0, 768.0));
        let breakpoint = Breakpoint::default();
        let ctx = context(&tree, &breakpoint);
        let config = OverlayConfig {
            routes: vec![
                RouteConfig {
                    hidden: Some(DynamicField::Literal("true".into())),
                    ..RouteConfig::new("secret")
                },
                RouteConfig {
                    badge: Some(BadgeConfig {
                        count: DynamicField::Literal("3".into()),
                        color: None,
                    }),
                    ..RouteConfig::new("mail")
                },
                RouteConfig {
                    badge: Some(BadgeConfig {
                        count: DynamicField::Literal("0".into()),
                        color: None,
                    }),
                    ..RouteConfig::new("calm")
                },
            ],
            ..Default::default()
        };
        let rendered = ctx.render(&entry(config.clone()), &config, None, false, false);
        assert_eq!(rendered.items.len(), 2);
        assert_eq!(rendered.items[0].id, "mail");
        assert_eq!(rendered.items[0].badge.as_ref().unwrap().count, 3);
        assert!(rendered.items[1].badge.is_none());
    }

    #[test]
    fn stack_popup_renders_with_backdrop_in_click_mode() {
        let tree = HostTree::new(Size::new(1024.0, 768.0));
        let breakpoint = Breakpoint::default();
        let ctx = context(&tree, &breakpoint);
        let config = OverlayConfig {
            stacks: vec![StackConfig {
                id: "more".into(),
                icon: None,
                routes: vec![RouteConfig::new("settings"), RouteConfig::new("about")],
                open_mode: OpenMode::Click,
                orientation: Orientation::Vertical,
            }],
            ..Default::default()
        };
        let open = OpenStack {
            stack_id: "more".into(),
            anchor: crate::popup::PopupAnchor {
                invoker: Rect::new(100.0, 500.0, 40.0, 40.0),
                edge: EdgePosition::Bottom,
            },
            awaiting_measure: true,
            popup_rect: None,
        };
        let rendered = ctx.render(&entry(config.clone()), &config, Some(&open), false, false);
        let popup = rendered.popup.expect("popup should render");
        assert!(popup.backdrop);
        assert_eq!(popup.items.len(), 2);
        assert_eq!(popup.items[0].gesture.route, "more/settings");
        assert!(popup.rect.is_none());
    }

    #[test]
    fn identical_config_renders_identically() {
        let tree = HostTree::new(Size::new(1024.0, 768.0));
        let breakpoint = Breakpoint::default();
        let ctx = context(&tree, &breakpoint);
        let config = OverlayConfig {
            style: Some("glass".into()),
            routes: vec![RouteConfig::new("home"), RouteConfig::new("mail")],
            ..Default::default()
        };
        let first = ctx.render(&entry(config.clone()), &config, None, false, false);
        let second = ctx.render(&entry(config.clone()), &config, None, false, false);
        assert_eq!(first, second);
    }
}
