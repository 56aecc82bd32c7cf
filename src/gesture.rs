//! Per-element tap / hold / double-tap recognition.
//!
//! One explicit state machine per synthetic element key replaces the nested
//! timers and boolean flags of the source system. A key is stable across
//! renders (owner + provider + route), so in-flight gestures survive a
//! re-render as long as the element ids do.
//!
//! The ordering rules encoded here: a tap must never also register as a
//! hold, and the first half of a double tap must not prematurely commit the
//! single-tap action. Consequently every tap on an element with a double-tap
//! action waits out the detection window before it fires.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::config::Timings;

/// Synthetic stable identity of one interactive element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GestureKey {
    pub owner: String,
    pub provider: String,
    pub route: String,
}

impl GestureKey {
    pub fn new(
        owner: impl Into<String>,
        provider: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            provider: provider.into(),
            route: route.into(),
        }
    }
}

impl std::fmt::Display for GestureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.owner, self.provider, self.route)
    }
}

/// Which optional gesture actions the element declares. Timers only start
/// for gestures that can actually fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureActions {
    pub has_hold: bool,
    pub has_double_tap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Up,
    /// Cancels only the hold timer; touch devices fire leave immediately
    /// after release, so a pending click must survive it.
    Leave,
    /// Clears all timers and state unconditionally.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Tap,
    Hold,
    DoubleTap,
}

#[derive(Debug, Clone, Copy)]
enum Fsm {
    Down {
        hold_deadline: Option<Instant>,
        click_count: u32,
    },
    Holding,
    PendingClick {
        resolve_deadline: Instant,
        click_count: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct GestureEntry {
    fsm: Fsm,
    actions: GestureActions,
    last_release: Option<Instant>,
}

/// Recognizer table for all interactive elements of all layers.
///
/// Idle is represented by absence: an entry exists only while a gesture is
/// in flight, and every resolution path removes it, so stable element ids
/// cannot leak state across renders.
#[derive(Debug)]
pub struct GestureRecognizer {
    entries: BTreeMap<GestureKey, GestureEntry>,
    timings: Timings,
}

impl GestureRecognizer {
    pub fn new(timings: Timings) -> Self {
        Self {
            entries: BTreeMap::new(),
            timings,
        }
    }

    /// Feed one pointer event. Returns an outcome when the event itself
    /// resolves the gesture (double-tap commits on the second release).
    pub fn on_pointer(
        &mut self,
        key: &GestureKey,
        phase: PointerPhase,
        actions: GestureActions,
        now: Instant,
    ) -> Option<GestureOutcome> {
        match phase {
            PointerPhase::Down => {
                let carried_clicks = match self.entries.get(key) {
                    Some(GestureEntry {
                        fsm: Fsm::PendingClick { click_count, .. },
                        ..
                    }) => *click_count,
                    _ => 0,
                };
                let last_release = self.entries.get(key).and_then(|entry| entry.last_release);
                let hold_deadline = actions.has_hold.then(|| now + self.timings.hold_delay);
                self.entries.insert(
                    key.clone(),
                    GestureEntry {
                        fsm: Fsm::Down {
                            hold_deadline,
                            click_count: carried_clicks,
                        },
                        actions,
                        last_release,
                    },
                );
                None
            }
            PointerPhase::Up => {
                let entry = self.entries.get_mut(key)?;
                match entry.fsm {
                    Fsm::Down { click_count, .. } => {
                        let within_double = entry.actions.has_double_tap
                            && entry.last_release.is_some_and(|previous| {
                                now.duration_since(previous) < self.timings.double_tap_window
                            });
                        let click_count = if within_double { click_count + 1 } else { 1 };
                        entry.last_release = Some(now);
                        if click_count >= 2 && entry.actions.has_double_tap {
                            self.entries.remove(key);
                            debug!(element = %key, "double tap");
                            return Some(GestureOutcome::DoubleTap);
                        }
                        entry.fsm = Fsm::PendingClick {
                            resolve_deadline: now + self.timings.click_resolve_delay,
                            click_count,
                        };
                        None
                    }
                    // Hold already fired; the release just ends the gesture.
                    Fsm::Holding => {
                        self.entries.remove(key);
                        None
                    }
                    Fsm::PendingClick { .. } => None,
                }
            }
            PointerPhase::Leave => {
                if let Some(entry) = self.entries.get_mut(key)
                    && let Fsm::Down { click_count, .. } = entry.fsm
                {
                    entry.fsm = Fsm::Down {
                        hold_deadline: None,
                        click_count,
                    };
                }
                None
            }
            PointerPhase::Cancel => {
                self.entries.remove(key);
                None
            }
        }
    }

    /// Fire any expired hold or click-resolution timers.
    pub fn tick(&mut self, now: Instant) -> Vec<(GestureKey, GestureOutcome)> {
        let mut fired = Vec::new();
        let mut resolved = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            match entry.fsm {
                Fsm::Down {
                    hold_deadline: Some(deadline),
                    ..
                } if now >= deadline => {
                    entry.fsm = Fsm::Holding;
                    debug!(element = %key, "hold fired");
                    fired.push((key.clone(), GestureOutcome::Hold));
                }
                Fsm::PendingClick {
                    resolve_deadline, ..
                } if now >= resolve_deadline => {
                    debug!(element = %key, "tap committed");
                    fired.push((key.clone(), GestureOutcome::Tap));
                    resolved.push(key.clone());
                }
                _ => {}
            }
        }
        for key in resolved {
            self.entries.remove(&key);
        }
        fired
    }

    /// Earliest pending timer, for precise event-loop sleeping.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .filter_map(|entry| match entry.fsm {
                Fsm::Down { hold_deadline, .. } => hold_deadline,
                Fsm::PendingClick {
                    resolve_deadline, ..
                } => Some(resolve_deadline),
                Fsm::Holding => None,
            })
            .min()
    }

    /// Drop all state for elements not in the retained set; called when a
    /// render replaces the element population.
    pub fn retain_elements<F>(&mut self, mut keep: F)
    where
        F: FnMut(&GestureKey) -> bool,
    {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    fn in_flight(&self, key: &GestureKey) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key() -> GestureKey {
        GestureKey::new("widget-1", "prov-a", "home")
    }

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(Timings::default())
    }

    fn ms(base: Instant, offset: u64) -> Instant {
        base + Duration::from_millis(offset)
    }

    #[test]
    fn plain_tap_fires_once_after_resolve_delay() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions::default();
        assert!(g.on_pointer(&key(), PointerPhase::Down, actions, t0).is_none());
        assert!(
            g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 50))
                .is_none()
        );
        assert!(g.tick(ms(t0, 200)).is_empty());
        let fired = g.tick(ms(t0, 301));
        assert_eq!(fired, vec![(key(), GestureOutcome::Tap)]);
        assert!(!g.in_flight(&key()));
        assert!(g.tick(ms(t0, 600)).is_empty());
    }

    #[test]
    fn hold_fires_and_suppresses_tap_even_on_late_release() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: true,
            has_double_tap: false,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        let fired = g.tick(ms(t0, 500));
        assert_eq!(fired, vec![(key(), GestureOutcome::Hold)]);
        // released just after the hold fired: no tap, state cleared
        assert!(
            g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 501))
                .is_none()
        );
        assert!(!g.in_flight(&key()));
        assert!(g.tick(ms(t0, 1000)).is_empty());
    }

    #[test]
    fn release_before_hold_deadline_prevents_hold() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: true,
            has_double_tap: false,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 100));
        let fired = g.tick(ms(t0, 600));
        assert_eq!(fired, vec![(key(), GestureOutcome::Tap)]);
    }

    #[test]
    fn double_tap_fires_on_second_release_and_suppresses_taps() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: false,
            has_double_tap: true,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 40));
        g.on_pointer(&key(), PointerPhase::Down, actions, ms(t0, 120));
        let outcome = g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 180));
        assert_eq!(outcome, Some(GestureOutcome::DoubleTap));
        assert!(!g.in_flight(&key()));
        // neither pending single tap survives
        assert!(g.tick(ms(t0, 1000)).is_empty());
    }

    #[test]
    fn slow_second_tap_counts_as_two_singles() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: false,
            has_double_tap: true,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 40));
        let first = g.tick(ms(t0, 291));
        assert_eq!(first, vec![(key(), GestureOutcome::Tap)]);
        // second press arrives well outside the 300ms window
        g.on_pointer(&key(), PointerPhase::Down, actions, ms(t0, 700));
        let outcome = g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 740));
        assert!(outcome.is_none());
        let second = g.tick(ms(t0, 991));
        assert_eq!(second, vec![(key(), GestureOutcome::Tap)]);
    }

    #[test]
    fn leave_cancels_hold_but_not_pending_click() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: true,
            has_double_tap: false,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        g.on_pointer(&key(), PointerPhase::Leave, actions, ms(t0, 100));
        // hold deadline is gone
        assert!(g.tick(ms(t0, 600)).is_empty());
        // touch-style: release still resolves into a tap
        g.on_pointer(&key(), PointerPhase::Up, actions, ms(t0, 620));
        let fired = g.tick(ms(t0, 871));
        assert_eq!(fired, vec![(key(), GestureOutcome::Tap)]);
    }

    #[test]
    fn cancel_clears_everything() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let actions = GestureActions {
            has_hold: true,
            has_double_tap: true,
        };
        g.on_pointer(&key(), PointerPhase::Down, actions, t0);
        g.on_pointer(&key(), PointerPhase::Cancel, actions, ms(t0, 10));
        assert!(!g.in_flight(&key()));
        assert!(g.tick(ms(t0, 2000)).is_empty());
    }

    #[test]
    fn next_deadline_tracks_earliest_timer() {
        let mut g = recognizer();
        let t0 = Instant::now();
        let hold = GestureActions {
            has_hold: true,
            has_double_tap: false,
        };
        g.on_pointer(&key(), PointerPhase::Down, hold, t0);
        assert_eq!(g.next_deadline(), Some(t0 + Duration::from_millis(500)));
        let other = GestureKey::new("widget-1", "prov-a", "settings");
        g.on_pointer(&other, PointerPhase::Down, GestureActions::default(), t0);
        g.on_pointer(&other, PointerPhase::Up, GestureActions::default(), ms(t0, 10));
        assert_eq!(g.next_deadline(), Some(t0 + Duration::from_millis(260)));
    }
}
