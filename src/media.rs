//! Media state watcher.
//!
//! A provider's own live reference to media state goes stale once its
//! originating widget stops being the visible one, and the freshest source
//! cannot signal change on its own. This watcher is the deliberate
//! compatibility shim: one shared bounded-rate poll (1s) that compares a
//! single version field per tracked entity and forces an out-of-band
//! re-render when any of them moved. It runs only while at least one
//! registered provider declares a media integration.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Freshest available media state, keyed by entity.
pub trait MediaSource {
    /// Version field for the entity; `None` while the entity is absent.
    fn entity_version(&self, entity: &str) -> Option<String>;
}

#[derive(Debug)]
pub struct MediaWatcher {
    tracked: BTreeMap<String, Option<String>>,
    next_poll: Option<Instant>,
    interval: Duration,
}

impl MediaWatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            tracked: BTreeMap::new(),
            next_poll: None,
            interval,
        }
    }

    pub fn active(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Replace the tracked entity set. Starts the poll on the first entity
    /// and stops it immediately when the set empties.
    pub fn set_tracked<I>(&mut self, entities: I, now: Instant)
    where
        I: IntoIterator<Item = String>,
    {
        let mut next = BTreeMap::new();
        for entity in entities {
            let known = self.tracked.get(&entity).cloned().unwrap_or_default();
            next.insert(entity, known);
        }
        let was_active = self.active();
        self.tracked = next;
        if self.tracked.is_empty() {
            self.next_poll = None;
            if was_active {
                debug!("media watcher stopped");
            }
        } else if !was_active {
            self.next_poll = Some(now + self.interval);
            debug!(entities = self.tracked.len(), "media watcher started");
        }
    }

    /// Poll when due. Returns true when any tracked version changed, which
    /// forces a re-render of all containers.
    pub fn tick(&mut self, source: &dyn MediaSource, now: Instant) -> bool {
        let Some(due) = self.next_poll else {
            return false;
        };
        if now < due {
            return false;
        }
        self.next_poll = Some(now + self.interval);
        let mut changed = false;
        for (entity, known) in self.tracked.iter_mut() {
            let current = source.entity_version(entity);
            if current != *known {
                debug!(entity = %entity, "media version changed");
                *known = current;
                changed = true;
            }
        }
        changed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_poll
    }
}
