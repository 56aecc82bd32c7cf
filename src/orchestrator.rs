//! The owned orchestrator handle.
//!
//! Everything mutable lives here or in one of the subsystem tables this
//! struct owns; widgets and the embedding event loop hold an explicit
//! handle instead of reaching for module-level globals. The embedder:
//!
//! 1. mirrors host churn into the [`HostTree`] it owns,
//! 2. forwards registrations, pointer events and navigation/resize/host
//!    mutation signals,
//! 3. pumps [`Orchestrator::tick`] and sleeps until
//!    [`Orchestrator::next_deadline`],
//! 4. paints each layer's [`RenderedOverlay`] snapshot and drains
//!    [`Orchestrator::take_notifications`].
//!
//! Single-threaded by design: all table mutation happens synchronously
//! inside these calls. A re-evaluation requested while a pass is running
//! is deferred to the next debounce cycle instead of re-entering.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::actions::{
    ActionConfig, ActionDispatcher, DispatchContext, GestureKind, HapticPolicy,
    validate_external_url,
};
use crate::autohide::{Autohide, PointerListener};
use crate::breakpoint::{Breakpoint, DeviceClass};
use crate::conditions::ConditionEvaluator;
use crate::config::{OpenMode, OverlayConfig, Timings, resolve_layers};
use crate::geometry::{Point, Rect, Size};
use crate::gesture::{GestureKey, GestureOutcome, GestureRecognizer, PointerPhase};
use crate::host::{HostTree, NodeId};
use crate::layer::{LayerManager, OpenStack};
use crate::media::{MediaSource, MediaWatcher};
use crate::popup::{self, PopupAnchor};
use crate::registry::{ContainerTarget, ProviderEntry, ProviderKey, ProviderRegistry};
use crate::render::{RenderContext, RenderedOverlay, suppression_reason};
use crate::template::TemplateResolver;

/// Transient configuration substitution for a provider being edited live.
#[derive(Debug, Clone)]
pub struct PreviewOverride {
    pub config: OverlayConfig,
    pub context: Option<serde_json::Value>,
    pub updated_at: Instant,
}

/// Transient user-visible failure, drained by the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

/// External collaborators, injected at construction.
pub struct Collaborators {
    pub conditions: Box<dyn ConditionEvaluator>,
    pub dispatcher: Box<dyn ActionDispatcher>,
    pub resolver: Box<dyn TemplateResolver>,
    pub media_source: Box<dyn MediaSource>,
}

pub struct Orchestrator {
    registry: ProviderRegistry,
    layers: LayerManager,
    gestures: GestureRecognizer,
    media: MediaWatcher,
    pointer_listener: PointerListener,
    /// Preview overrides keyed by provider id; an override never grants
    /// registry membership to an unregistered provider.
    previews: BTreeMap<String, PreviewOverride>,
    /// Named shared-default templates referenced by provider configs.
    templates: BTreeMap<String, OverlayConfig>,
    conditions: Box<dyn ConditionEvaluator>,
    dispatcher: Box<dyn ActionDispatcher>,
    resolver: Box<dyn TemplateResolver>,
    media_source: Box<dyn MediaSource>,
    breakpoint: Breakpoint,
    timings: Timings,
    haptics: HapticPolicy,
    pending_eval: Option<Instant>,
    in_pass: bool,
    deferred_schedule: bool,
    notifications: Vec<Notification>,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        let timings = Timings::default();
        Self {
            registry: ProviderRegistry::new(),
            layers: LayerManager::new(),
            gestures: GestureRecognizer::new(timings),
            media: MediaWatcher::new(timings.media_poll_interval),
            pointer_listener: PointerListener::default(),
            previews: BTreeMap::new(),
            templates: BTreeMap::new(),
            conditions: collaborators.conditions,
            dispatcher: collaborators.dispatcher,
            resolver: collaborators.resolver,
            media_source: collaborators.media_source,
            breakpoint: Breakpoint::default(),
            timings,
            haptics: HapticPolicy::default(),
            pending_eval: None,
            in_pass: false,
            deferred_schedule: false,
            notifications: Vec::new(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self.gestures = GestureRecognizer::new(timings);
        self.media = MediaWatcher::new(timings.media_poll_interval);
        self
    }

    pub fn with_breakpoint(mut self, breakpoint: Breakpoint) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    pub fn with_haptics(mut self, haptics: HapticPolicy) -> Self {
        self.haptics = haptics;
        self
    }

    /// Register a named template of shared defaults.
    pub fn define_template(&mut self, name: impl Into<String>, config: OverlayConfig) {
        self.templates.insert(name.into(), config);
    }

    pub fn provider_count(&self) -> usize {
        self.registry.len()
    }

    /// Rendered snapshot for a container, if any.
    pub fn rendered(&self, container_key: &str) -> Option<&RenderedOverlay> {
        self.layers.get(container_key)?.rendered.as_ref()
    }

    pub fn active_provider(&self, container_key: &str) -> Option<&ProviderKey> {
        self.layers.get(container_key)?.active_provider.as_ref()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether the embedder should keep its global pointer-move hook
    /// installed.
    pub fn pointer_tracking_active(&self) -> bool {
        self.pointer_listener.active()
    }

    pub fn media_watch_active(&self) -> bool {
        self.media.active()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ---- registration API -------------------------------------------------

    /// Idempotent registration; also the lifecycle entry point. Widgets
    /// reissue this on every reactive update.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        tree: &HostTree,
        owner: impl Into<String>,
        provider: impl Into<String>,
        config: OverlayConfig,
        context: serde_json::Value,
        target: ContainerTarget,
        element: Option<NodeId>,
        now: Instant,
    ) {
        let key = ProviderKey::new(owner, provider);
        let container_key = LayerManager::container_key(tree, target);
        self.registry
            .register(key, target, container_key, config, context, element);
        self.schedule_evaluation(now, self.timings.evaluation_debounce);
    }

    pub fn unregister(
        &mut self,
        owner: impl Into<String>,
        provider: impl Into<String>,
        now: Instant,
    ) {
        let key = ProviderKey::new(owner, provider);
        if self.registry.unregister(&key).is_some() {
            // a preview with no remaining registration would never clear
            if !self.registry.keys().any(|k| k.provider == key.provider) {
                self.previews.remove(&key.provider);
            }
            self.schedule_evaluation(now, self.timings.evaluation_debounce);
        }
    }

    /// Broadcast-delivered preview update: supersedes the registered
    /// configuration for rendering only, while the editing session keeps
    /// refreshing it.
    pub fn preview_update(
        &mut self,
        provider: impl Into<String>,
        config: OverlayConfig,
        context: Option<serde_json::Value>,
        now: Instant,
    ) {
        self.previews.insert(
            provider.into(),
            PreviewOverride {
                config,
                context,
                updated_at: now,
            },
        );
        self.schedule_evaluation(now, self.timings.evaluation_debounce);
    }

    pub fn preview_clear(&mut self, provider: &str, now: Instant) {
        if self.previews.remove(provider).is_some() {
            self.schedule_evaluation(now, self.timings.evaluation_debounce);
        }
    }

    // ---- external signals -------------------------------------------------

    pub fn on_navigation(&mut self, now: Instant) {
        self.schedule_evaluation(now, self.timings.evaluation_debounce);
    }

    pub fn on_resize(&mut self, now: Instant) {
        self.schedule_evaluation(now, self.timings.render_debounce);
    }

    /// Observed mutation of the host's dialog/drawer population.
    pub fn on_host_mutation(&mut self, now: Instant) {
        self.schedule_evaluation(now, self.timings.render_debounce);
    }

    // ---- pointer input ----------------------------------------------------

    /// Pointer phase on an interactive overlay element. The embedder passes
    /// the gesture key it attached to the rendered item.
    pub fn pointer_gesture(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        gesture: &GestureKey,
        phase: PointerPhase,
        now: Instant,
    ) {
        let Some(actions) = self.layers.get(container_key).and_then(|layer| {
            let rendered = layer.rendered.as_ref()?;
            rendered
                .items
                .iter()
                .chain(rendered.popup.iter().flat_map(|popup| popup.items.iter()))
                .find(|item| &item.gesture == gesture)
                .map(|item| item.actions)
        }) else {
            return;
        };
        if let Some(outcome) = self.gestures.on_pointer(gesture, phase, actions, now) {
            self.dispatch_outcome(tree, container_key, gesture, outcome, now);
        }
    }

    /// Shared pointer-move listener; routed to every auto-hiding layer.
    pub fn pointer_moved(&mut self, tree: &mut HostTree, position: Point, now: Instant) {
        if !self.pointer_listener.active() {
            return;
        }
        let viewport = tree.viewport();
        let mut changed: Vec<String> = Vec::new();
        for layer in self.layers.iter_mut() {
            let Some(autohide) = layer.autohide.as_mut() else {
                continue;
            };
            let edge = layer
                .rendered
                .as_ref()
                .map(|rendered| rendered.position)
                .unwrap_or_default();
            let overlay_rect = tree.rect(layer.overlay);
            if autohide
                .on_pointer_move(position, overlay_rect, viewport, edge, now)
                .is_some()
            {
                changed.push(layer.container_key.clone());
            }
        }
        for container_key in changed {
            self.render_layer(tree, &container_key, now);
        }
    }

    // ---- stacks and popups ------------------------------------------------

    /// Open a stack popup, capturing the invoking element's rectangle.
    /// Placement stays provisional until [`Orchestrator::popup_measured`]
    /// delivers the inserted popup's size.
    pub fn open_stack(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        stack_id: &str,
        invoker: Rect,
        now: Instant,
    ) {
        let Some(layer) = self.layers.get_mut(container_key) else {
            return;
        };
        let edge = layer
            .rendered
            .as_ref()
            .map(|rendered| rendered.position)
            .unwrap_or_default();
        layer.open_stack = Some(OpenStack {
            stack_id: stack_id.to_string(),
            anchor: PopupAnchor { invoker, edge },
            awaiting_measure: true,
            popup_rect: None,
        });
        layer.hover_close_deadline = None;
        debug!(container = %container_key, stack = %stack_id, "stack opened");
        self.render_layer(tree, container_key, now);
    }

    /// Second phase of popup placement: the embedder measured the inserted
    /// popup and reports its size.
    pub fn popup_measured(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        measured: Size,
        now: Instant,
    ) {
        let viewport = tree.viewport();
        let Some(layer) = self.layers.get_mut(container_key) else {
            return;
        };
        let Some(open) = layer.open_stack.as_mut() else {
            return;
        };
        if !open.awaiting_measure {
            return;
        }
        open.popup_rect = Some(popup::finalize(
            popup::provisional(open.anchor),
            measured,
            viewport,
        ));
        open.awaiting_measure = false;
        self.render_layer(tree, container_key, now);
    }

    pub fn close_stack(&mut self, tree: &mut HostTree, container_key: &str, now: Instant) {
        let Some(layer) = self.layers.get_mut(container_key) else {
            return;
        };
        if layer.open_stack.take().is_some() {
            layer.hover_close_deadline = None;
            self.render_layer(tree, container_key, now);
        }
    }

    /// Outside click on the full-viewport backdrop beneath a click-mode
    /// popup.
    pub fn backdrop_clicked(&mut self, tree: &mut HostTree, container_key: &str, now: Instant) {
        self.close_stack(tree, container_key, now);
    }

    /// Hover transition over a hover-mode stack invoker or its popup.
    /// Leaving starts the grace timer instead of closing immediately, so
    /// the pointer can travel from the invoker to the popup.
    pub fn stack_hover(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        stack_id: &str,
        entering: bool,
        invoker: Rect,
        now: Instant,
    ) {
        let device = self.breakpoint.device_class(tree.viewport().width);
        let open_mode = self
            .active_entry(container_key)
            .map(|entry| self.effective_for(entry, device))
            .and_then(|effective| {
                effective
                    .stacks
                    .iter()
                    .find(|stack| stack.id == stack_id)
                    .map(|stack| stack.open_mode)
            });
        if open_mode != Some(OpenMode::Hover) {
            return;
        }
        if entering {
            let already_open = self
                .layers
                .get(container_key)
                .and_then(|layer| layer.open_stack.as_ref())
                .is_some_and(|open| open.stack_id == stack_id);
            if already_open {
                if let Some(layer) = self.layers.get_mut(container_key) {
                    layer.hover_close_deadline = None;
                }
            } else {
                self.open_stack(tree, container_key, stack_id, invoker, now);
            }
        } else if let Some(layer) = self.layers.get_mut(container_key)
            && layer
                .open_stack
                .as_ref()
                .is_some_and(|open| open.stack_id == stack_id)
        {
            layer.hover_close_deadline = Some(now + self.timings.hover_close_grace);
        }
    }

    pub fn set_media_expanded(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        expanded: bool,
        now: Instant,
    ) {
        if let Some(layer) = self.layers.get_mut(container_key) {
            layer.media_expanded = expanded;
            self.render_layer(tree, container_key, now);
        }
    }

    // ---- pump -------------------------------------------------------------

    /// Drive all pending deadlines. Call on every event-loop iteration.
    pub fn tick(&mut self, tree: &mut HostTree, now: Instant) {
        if self.pending_eval.is_some_and(|deadline| now >= deadline) {
            self.evaluate_all(tree, now);
        }

        for (gesture, outcome) in self.gestures.tick(now) {
            if let Some(container_key) = self.container_for_gesture(&gesture) {
                self.dispatch_outcome(tree, &container_key, &gesture, outcome, now);
            }
        }

        let mut rerender: Vec<String> = Vec::new();
        for layer in self.layers.iter_mut() {
            if let Some(autohide) = layer.autohide.as_mut()
                && autohide.tick(now).is_some()
            {
                rerender.push(layer.container_key.clone());
            }
            if layer
                .hover_close_deadline
                .is_some_and(|deadline| now >= deadline)
            {
                layer.hover_close_deadline = None;
                layer.open_stack = None;
                rerender.push(layer.container_key.clone());
            }
        }
        for container_key in rerender {
            self.render_layer(tree, &container_key, now);
        }

        // media movement repaints every container out of band
        if self.media.tick(self.media_source.as_ref(), now) {
            self.evaluate_all(tree, now);
        }
    }

    /// Earliest instant at which [`Orchestrator::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let mut deadlines: Vec<Instant> = Vec::new();
        deadlines.extend(self.pending_eval);
        deadlines.extend(self.gestures.next_deadline());
        deadlines.extend(self.media.next_deadline());
        for key in self.registry.container_keys() {
            if let Some(layer) = self.layers.get(&key) {
                deadlines.extend(layer.hover_close_deadline);
                if let Some(autohide) = layer.autohide.as_ref() {
                    deadlines.extend(autohide.next_deadline());
                }
            }
        }
        deadlines.into_iter().min()
    }

    /// Force an immediate evaluation, bypassing the debounce. For embedders
    /// that just mutated the tree synchronously and need the result now.
    pub fn evaluate_now(&mut self, tree: &mut HostTree, now: Instant) {
        self.evaluate_all(tree, now);
    }

    // ---- internals --------------------------------------------------------

    fn schedule_evaluation(&mut self, now: Instant, delay: Duration) {
        if self.in_pass {
            self.deferred_schedule = true;
            return;
        }
        // coalescing keeps the earliest pending deadline
        let candidate = now + delay;
        self.pending_eval = Some(match self.pending_eval {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
    }

    fn evaluate_all(&mut self, tree: &mut HostTree, now: Instant) {
        self.pending_eval = None;
        self.in_pass = true;

        let purged = self.layers.collect_garbage(tree);
        if !purged.is_empty() {
            debug!(count = purged.len(), "garbage-collected layers");
        }

        let container_keys = self.registry.container_keys();
        for container_key in &container_keys {
            self.evaluate_container(tree, container_key, now);
        }

        // containers that lost their last provider keep their layer, but
        // the overlay is cleared
        for layer in self.layers.iter_mut() {
            if !container_keys.contains(&layer.container_key) {
                debug!(container = %layer.container_key, "no providers left, overlay cleared");
                layer.active_provider = None;
                layer.autohide = None;
                layer.media_expanded = false;
                layer.clear_content();
            }
        }

        self.media.set_tracked(self.registry.media_entities(), now);

        let autohide_consumers = container_keys
            .iter()
            .filter(|key| {
                self.layers
                    .get(key)
                    .is_some_and(|layer| layer.autohide.is_some())
            })
            .count();
        self.pointer_listener.set_consumers(autohide_consumers);

        // gesture state survives only for elements that are still rendered
        let live = self.rendered_gesture_keys();
        self.gestures.retain_elements(|key| live.contains(key));

        self.in_pass = false;
        if std::mem::take(&mut self.deferred_schedule) {
            self.schedule_evaluation(now, self.timings.evaluation_debounce);
        }
    }

    fn rendered_gesture_keys(&self) -> Vec<GestureKey> {
        let mut keys = Vec::new();
        for container_key in self.registry.container_keys() {
            if let Some(rendered) = self.rendered(&container_key) {
                keys.extend(rendered.items.iter().map(|item| item.gesture.clone()));
                if let Some(popup) = rendered.popup.as_ref() {
                    keys.extend(popup.items.iter().map(|item| item.gesture.clone()));
                }
            }
        }
        keys
    }

    fn evaluate_container(&mut self, tree: &mut HostTree, container_key: &str, now: Instant) {
        let selected = self
            .registry
            .select_active(
                container_key,
                tree,
                &self.breakpoint,
                self.conditions.as_ref(),
            )
            .map(|entry| (entry.key.clone(), entry.target));

        let Some((active_key, target)) = selected else {
            // no passing provider: cleared, not destroyed
            if let Some(layer) = self.layers.get_mut(container_key) {
                layer.active_provider = None;
                layer.autohide = None;
                layer.clear_content();
            }
            return;
        };

        let Some(layer) = self.layers.ensure_layer(tree, target, container_key) else {
            warn!(container = %container_key, "container detached, skipping");
            return;
        };
        if layer.active_provider.as_ref() != Some(&active_key) {
            debug!(
                container = %container_key,
                owner = %active_key.owner,
                provider = %active_key.provider,
                "active provider changed"
            );
            layer.open_stack = None;
            layer.hover_close_deadline = None;
            layer.media_expanded = false;
            layer.autohide = None;
            layer.active_provider = Some(active_key);
        }
        self.render_layer(tree, container_key, now);
    }

    fn active_entry(&self, container_key: &str) -> Option<&ProviderEntry> {
        let key = self.layers.get(container_key)?.active_provider.as_ref()?;
        self.registry.get(key)
    }

    /// Layered configuration for an entry: template, device patches,
    /// provider config and any live preview override.
    fn effective_for(&self, entry: &ProviderEntry, device: DeviceClass) -> OverlayConfig {
        let template = entry
            .config
            .template
            .as_ref()
            .and_then(|name| self.templates.get(name));
        let preview = self
            .previews
            .get(&entry.key.provider)
            .map(|preview| &preview.config);
        resolve_layers(template, &entry.config, device, preview)
    }

    /// Rebuild one layer's rendered snapshot from current state.
    fn render_layer(&mut self, tree: &mut HostTree, container_key: &str, now: Instant) {
        let Some(entry) = self.active_entry(container_key).cloned() else {
            return;
        };
        let container = match self.layers.get(container_key) {
            Some(layer) => layer.container,
            None => return,
        };
        if let Some(reason) = suppression_reason(tree, container) {
            debug!(container = %container_key, reason = ?reason, "render suppressed");
            if let Some(layer) = self.layers.get_mut(container_key) {
                layer.clear_content();
            }
            return;
        }

        let device = self.breakpoint.device_class(tree.viewport().width);
        let effective = self.effective_for(&entry, device);

        // autohide follows the effective configuration
        let wants_autohide = effective.autohide.unwrap_or(false);
        let Some(layer) = self.layers.get_mut(container_key) else {
            return;
        };
        if wants_autohide {
            if layer.autohide.is_none() {
                layer.autohide = Some(Autohide::new(self.timings.autohide_idle_delay, now));
            }
        } else {
            layer.autohide = None;
        }
        let autohidden = layer
            .autohide
            .as_ref()
            .is_some_and(|autohide| autohide.is_hidden());
        let open_stack = layer.open_stack.clone();
        let media_expanded = layer.media_expanded;

        let render_ctx = RenderContext {
            tree,
            breakpoint: &self.breakpoint,
            conditions: self.conditions.as_ref(),
            resolver: self.resolver.as_ref(),
        };
        let rendered = render_ctx.render(
            &entry,
            &effective,
            open_stack.as_ref(),
            media_expanded,
            autohidden,
        );
        if let Some(layer) = self.layers.get_mut(container_key) {
            layer.rendered = Some(rendered);
        }
    }

    fn container_for_gesture(&self, gesture: &GestureKey) -> Option<String> {
        self.registry.container_keys().into_iter().find(|key| {
            self.rendered(key).is_some_and(|rendered| {
                rendered.items.iter().any(|item| &item.gesture == gesture)
                    || rendered.popup.as_ref().is_some_and(|popup| {
                        popup.items.iter().any(|item| &item.gesture == gesture)
                    })
            })
        })
    }

    fn dispatch_outcome(
        &mut self,
        tree: &mut HostTree,
        container_key: &str,
        gesture: &GestureKey,
        outcome: GestureOutcome,
        now: Instant,
    ) {
        let Some(entry) = self.active_entry(container_key).cloned() else {
            return;
        };
        // a gesture from a previous provider's elements is stale
        if entry.key.owner != gesture.owner || entry.key.provider != gesture.provider {
            return;
        }

        // stack toggles open their popup on tap instead of dispatching;
        // the overlay rect stands in for the invoker until the embedder
        // reopens with a measured one
        if let Some(stack_id) = gesture.route.strip_prefix("stack:") {
            if outcome == GestureOutcome::Tap {
                let invoker = self
                    .layers
                    .get(container_key)
                    .and_then(|layer| tree.rect(layer.overlay))
                    .unwrap_or_default();
                self.open_stack(tree, container_key, stack_id, invoker, now);
            }
            return;
        }

        let device = self.breakpoint.device_class(tree.viewport().width);
        let effective = self.effective_for(&entry, device);
        let Some(action) = find_route_action(&effective, &gesture.route, outcome) else {
            return;
        };
        // bad external targets are stopped here, not at the host boundary
        if let ActionConfig::OpenUrl { url } = &action
            && let Err(err) = validate_external_url(url)
        {
            warn!(element = %gesture, error = %err, "rejected external url");
            self.notifications.push(Notification {
                message: format!("action failed: {err}"),
            });
            return;
        }
        let kind = match outcome {
            GestureOutcome::Tap => GestureKind::Tap,
            GestureOutcome::Hold => GestureKind::Hold,
            GestureOutcome::DoubleTap => GestureKind::DoubleTap,
        };
        let context = self
            .previews
            .get(&entry.key.provider)
            .and_then(|preview| preview.context.clone())
            .unwrap_or_else(|| entry.context.clone());
        let dispatch_ctx = DispatchContext {
            provider_context: &context,
            provider_config: &effective,
            gesture: kind,
            haptic: self.haptics.enabled_for(kind),
        };
        if let Err(err) = self.dispatcher.dispatch(&action, dispatch_ctx) {
            warn!(element = %gesture, error = %err, "action dispatch failed");
            self.notifications.push(Notification {
                message: format!("action failed: {err}"),
            });
        }
    }
}

/// Look up the action configured for a gesture outcome on a route. Stack
/// children are addressed as `stack_id/route_id`.
fn find_route_action(
    effective: &OverlayConfig,
    gesture_route: &str,
    outcome: GestureOutcome,
) -> Option<ActionConfig> {
    let route = if let Some((stack_id, route_id)) = gesture_route.split_once('/') {
        effective
            .stacks
            .iter()
            .find(|stack| stack.id == stack_id)?
            .routes
            .iter()
            .find(|route| route.id == route_id)?
    } else {
        effective
            .routes
            .iter()
            .find(|route| route.id == gesture_route)?
    };
    let action = match outcome {
        GestureOutcome::Tap => route.tap_action.as_ref(),
        GestureOutcome::Hold => route.hold_action.as_ref(),
        GestureOutcome::DoubleTap => route.double_tap_action.as_ref(),
    }?;
    if action.is_none() {
        return None;
    }
    Some(action.clone())
}
