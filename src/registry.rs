//! Provider registry and priority evaluation.
//!
//! Widgets re-register on every reactive update, so `register` is
//! idempotent: an existing entry is updated in place and keeps its original
//! registration sequence number, which is the ordering tie-break when
//! document-position comparison is unavailable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::breakpoint::{Breakpoint, DeviceClass};
use crate::conditions::{CombineMode, ConditionEvaluator};
use crate::config::OverlayConfig;
use crate::host::{HostTree, NodeId};

/// Identity of one registration: the owning widget plus its declared
/// provider id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderKey {
    pub owner: String,
    pub provider: String,
}

impl ProviderKey {
    pub fn new(owner: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            provider: provider.into(),
        }
    }
}

/// Whether a container's overlay is parented to the container itself or to
/// the single global portal root that survives view navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerScope {
    View,
    Global,
}

/// The host region a provider targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerTarget {
    pub node: NodeId,
    pub scope: ContainerScope,
}

#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub key: ProviderKey,
    pub target: ContainerTarget,
    /// Stable container identifier derived once at first registration.
    pub container_key: String,
    pub config: OverlayConfig,
    /// Opaque live context forwarded to template resolution and dispatch.
    pub context: serde_json::Value,
    /// The declaring widget's element; may go stale while the widget's
    /// page is not visible. Never invalidating, only deprioritizing.
    pub element: Option<NodeId>,
    /// Monotonic registration order, kept across in-place updates.
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderKey, ProviderEntry>,
    next_seq: u64,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert or update a registration. Returns true when the entry is new.
    pub fn register(
        &mut self,
        key: ProviderKey,
        target: ContainerTarget,
        container_key: String,
        config: OverlayConfig,
        context: serde_json::Value,
        element: Option<NodeId>,
    ) -> bool {
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.target = target;
                existing.container_key = container_key;
                existing.config = config;
                existing.context = context;
                existing.element = element;
                false
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                debug!(owner = %key.owner, provider = %key.provider, seq, "provider registered");
                self.entries.insert(
                    key.clone(),
                    ProviderEntry {
                        key,
                        target,
                        container_key,
                        config,
                        context,
                        element,
                        seq,
                    },
                );
                true
            }
        }
    }

    pub fn unregister(&mut self, key: &ProviderKey) -> Option<ProviderEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            debug!(owner = %key.owner, provider = %key.provider, "provider unregistered");
        }
        removed
    }

    pub fn get(&self, key: &ProviderKey) -> Option<&ProviderEntry> {
        self.entries.get(key)
    }

    /// All container keys that currently have at least one registration.
    pub fn container_keys(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .map(|entry| entry.container_key.clone())
            .collect()
    }

    /// Entity ids of every registered media integration; drives the media
    /// watcher's tracked set.
    pub fn media_entities(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .filter_map(|entry| entry.config.media.as_ref())
            .map(|media| media.entity.clone())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ProviderKey> {
        self.entries.keys()
    }

    /// Providers targeting `container_key`, in priority order: an attached
    /// live element outranks a disconnected one, document order decides
    /// between two attached elements, and registration sequence breaks the
    /// remaining ties. A momentarily disconnected element is never invalid,
    /// only deprioritized.
    pub fn sorted_for_container(&self, container_key: &str, tree: &HostTree) -> Vec<&ProviderEntry> {
        let mut providers: Vec<&ProviderEntry> = self
            .entries
            .values()
            .filter(|entry| entry.container_key == container_key)
            .collect();
        providers.sort_by(|a, b| {
            let el_a = a.element.filter(|el| tree.is_attached(*el));
            let el_b = b.element.filter(|el| tree.is_attached(*el));
            match (el_a, el_b) {
                (Some(el_a), Some(el_b)) => tree
                    .compare_document_order(el_a, el_b)
                    .unwrap_or_else(|| a.seq.cmp(&b.seq)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.seq.cmp(&b.seq),
            }
        });
        providers
    }

    /// Resolve the single active provider for a container, or `None` when
    /// no candidate passes — never two.
    pub fn select_active<'a>(
        &'a self,
        container_key: &str,
        tree: &HostTree,
        breakpoint: &Breakpoint,
        conditions: &dyn ConditionEvaluator,
    ) -> Option<&'a ProviderEntry> {
        let viewport_width = tree.viewport().width;
        let device = breakpoint.device_class(viewport_width);
        self.sorted_for_container(container_key, tree)
            .into_iter()
            .find(|entry| {
                if entry.config.excluded_device_classes.contains(&device) {
                    return false;
                }
                if entry
                    .config
                    .min_width
                    .is_some_and(|min_width| viewport_width < min_width)
                {
                    return false;
                }
                conditions_pass(entry, device, conditions)
            })
    }
}

fn conditions_pass(
    entry: &ProviderEntry,
    _device: DeviceClass,
    conditions: &dyn ConditionEvaluator,
) -> bool {
    let Some(display) = entry.config.display.as_ref() else {
        return true;
    };
    if display.mode == CombineMode::Always {
        return true;
    }
    match conditions.evaluate(&display.conditions, display.mode) {
        Ok(pass) => pass,
        Err(err) => {
            warn!(
                owner = %entry.key.owner,
                provider = %entry.key.provider,
                error = %err,
                "condition evaluation failed, treating as not passing"
            );
            false
        }
    }
}
