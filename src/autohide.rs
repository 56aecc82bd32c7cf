//! Idle-timeout / edge-proximity visibility for auto-hiding overlays.
//!
//! One machine per view layer: `Visible` hides after the idle delay passes
//! with no pointer activity over the overlay; `Hidden` reveals when the
//! pointer enters the edge zone of the overlay's docked edge or re-enters
//! the overlay's last known bounding box.
//!
//! Pointer movement arrives through a single shared listener; see
//! [`PointerListener`] for the reference counting that keeps exactly one
//! installed while any layer needs it.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::EdgePosition;
use crate::constants;
use crate::geometry::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Hidden,
    Revealed,
}

#[derive(Debug, Clone, Copy)]
pub struct Autohide {
    hidden: bool,
    idle_deadline: Option<Instant>,
    idle_delay: Duration,
    edge_zone: f64,
}

impl Autohide {
    pub fn new(idle_delay: Duration, now: Instant) -> Self {
        Self {
            hidden: false,
            idle_deadline: Some(now + idle_delay),
            idle_delay,
            edge_zone: constants::AUTOHIDE_EDGE_ZONE,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Feed a pointer position. `overlay` is the overlay's last captured
    /// bounding box, when one is known.
    pub fn on_pointer_move(
        &mut self,
        position: Point,
        overlay: Option<Rect>,
        viewport: Size,
        edge: EdgePosition,
        now: Instant,
    ) -> Option<VisibilityChange> {
        if self.hidden {
            let in_edge_zone = match edge {
                EdgePosition::Top => position.y <= self.edge_zone,
                EdgePosition::Bottom => position.y >= viewport.height - self.edge_zone,
                EdgePosition::Left => position.x <= self.edge_zone,
                EdgePosition::Right => position.x >= viewport.width - self.edge_zone,
            };
            // the reveal target is padded by the edge zone so a pointer
            // skimming past the hidden overlay still wakes it
            let near_overlay =
                overlay.is_some_and(|rect| rect.inflate(self.edge_zone).contains(position));
            if in_edge_zone || near_overlay {
                self.hidden = false;
                self.idle_deadline = Some(now + self.idle_delay);
                debug!("autohide revealed");
                return Some(VisibilityChange::Revealed);
            }
            None
        } else {
            // activity over the overlay keeps it awake; movement elsewhere
            // lets the idle timer run out
            if overlay.is_some_and(|rect| rect.contains(position)) {
                self.idle_deadline = Some(now + self.idle_delay);
            }
            None
        }
    }

    /// Hide when the idle deadline has elapsed. Fires at most once per
    /// visible period.
    pub fn tick(&mut self, now: Instant) -> Option<VisibilityChange> {
        if self.hidden {
            return None;
        }
        let deadline = self.idle_deadline?;
        if now >= deadline {
            self.hidden = true;
            self.idle_deadline = None;
            debug!("autohide hidden");
            return Some(VisibilityChange::Hidden);
        }
        None
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.hidden { None } else { self.idle_deadline }
    }
}

/// Reference count for the one global pointer-move listener.
///
/// The embedding layer installs its hook when `acquire` crosses zero and
/// removes it when `release` returns to zero; the orchestrator reports the
/// desired state via [`PointerListener::active`].
#[derive(Debug, Default)]
pub struct PointerListener {
    consumers: usize,
}

impl PointerListener {
    pub fn set_consumers(&mut self, consumers: usize) -> Option<bool> {
        let was_active = self.consumers > 0;
        self.consumers = consumers;
        let active = self.consumers > 0;
        (active != was_active).then(|| {
            debug!(active, "pointer listener state changed");
            active
        })
    }

    pub fn active(&self) -> bool {
        self.consumers > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Size {
        Size::new(1280.0, 800.0)
    }

    fn overlay_rect() -> Rect {
        Rect::new(340.0, 720.0, 600.0, 64.0)
    }

    #[test]
    fn hides_exactly_once_after_idle_delay() {
        let t0 = Instant::now();
        let mut a = Autohide::new(Duration::from_millis(3000), t0);
        assert!(a.tick(t0 + Duration::from_millis(2999)).is_none());
        assert_eq!(
            a.tick(t0 + Duration::from_millis(3000)),
            Some(VisibilityChange::Hidden)
        );
        assert!(a.tick(t0 + Duration::from_millis(9000)).is_none());
        assert!(a.is_hidden());
    }

    #[test]
    fn pointer_over_overlay_restarts_idle_timer() {
        let t0 = Instant::now();
        let mut a = Autohide::new(Duration::from_millis(3000), t0);
        let over = Point::new(400.0, 740.0);
        a.on_pointer_move(
            over,
            Some(overlay_rect()),
            viewport(),
            EdgePosition::Bottom,
            t0 + Duration::from_millis(2000),
        );
        assert!(a.tick(t0 + Duration::from_millis(4000)).is_none());
        assert_eq!(
            a.tick(t0 + Duration::from_millis(5000)),
            Some(VisibilityChange::Hidden)
        );
    }

    #[test]
    fn movement_away_from_overlay_does_not_keep_it_awake() {
        let t0 = Instant::now();
        let mut a = Autohide::new(Duration::from_millis(3000), t0);
        a.on_pointer_move(
            Point::new(10.0, 10.0),
            Some(overlay_rect()),
            viewport(),
            EdgePosition::Bottom,
            t0 + Duration::from_millis(2000),
        );
        assert_eq!(
            a.tick(t0 + Duration::from_millis(3000)),
            Some(VisibilityChange::Hidden)
        );
    }

    #[test]
    fn edge_zone_reveals_and_restarts() {
        let t0 = Instant::now();
        let mut a = Autohide::new(Duration::from_millis(3000), t0);
        a.tick(t0 + Duration::from_millis(3000));
        assert!(a.is_hidden());
        // 8px zone above the bottom edge
        let change = a.on_pointer_move(
            Point::new(600.0, 793.0),
            None,
            viewport(),
            EdgePosition::Bottom,
            t0 + Duration::from_millis(4000),
        );
        assert_eq!(change, Some(VisibilityChange::Revealed));
        assert_eq!(
            a.next_deadline(),
            Some(t0 + Duration::from_millis(7000))
        );
    }

    #[test]
    fn pointer_near_hidden_overlay_reveals() {
        let t0 = Instant::now();
        let mut a = Autohide::new(Duration::from_millis(3000), t0);
        a.tick(t0 + Duration::from_millis(3000));
        assert!(a.is_hidden());
        // just outside the overlay box, inside its padded reveal zone
        let change = a.on_pointer_move(
            Point::new(335.0, 730.0),
            Some(overlay_rect()),
            viewport(),
            EdgePosition::Bottom,
            t0 + Duration::from_millis(4000),
        );
        assert_eq!(change, Some(VisibilityChange::Revealed));
    }

    #[test]
    fn pointer_listener_reports_transitions_only() {
        let mut listener = PointerListener::default();
        assert_eq!(listener.set_consumers(2), Some(true));
        assert_eq!(listener.set_consumers(1), None);
        assert_eq!(listener.set_consumers(0), Some(false));
        assert!(!listener.active());
    }
}
