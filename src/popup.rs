//! Stack popup placement.
//!
//! The popup renders as a sibling of the overlay card so no scrollable
//! ancestor can clip it; its position is computed from the invoking
//! element's rectangle captured at open time. Placement is two-phase: the
//! provisional pass positions from the anchor alone, then the popup's real
//! size (measured after insertion, since a same-pass measurement reads
//! stale layout) finalizes and clamps it into the viewport.

use crate::config::EdgePosition;
use crate::constants;
use crate::geometry::{Rect, Size};

/// Anchor captured when a stack opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupAnchor {
    pub invoker: Rect,
    pub edge: EdgePosition,
}

/// Placement before the popup's size is known: a reference point plus the
/// growth direction away from the docked edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvisionalPlacement {
    pub anchor: PopupAnchor,
    pub gap: f64,
}

pub fn provisional(anchor: PopupAnchor) -> ProvisionalPlacement {
    ProvisionalPlacement {
        anchor,
        gap: constants::POPUP_GAP,
    }
}

/// Finalize against the measured popup size.
///
/// A bottom-docked overlay opens upward: the popup is centered on the
/// invoker and its bottom edge sits `gap` above the invoker's top. The
/// other edges mirror. The result is clamped into the viewport.
pub fn finalize(placement: ProvisionalPlacement, measured: Size, viewport: Size) -> Rect {
    let invoker = placement.anchor.invoker;
    let gap = placement.gap;
    let (x, y) = match placement.anchor.edge {
        EdgePosition::Bottom => (
            invoker.center_x() - measured.width / 2.0,
            invoker.y - gap - measured.height,
        ),
        EdgePosition::Top => (
            invoker.center_x() - measured.width / 2.0,
            invoker.bottom() + gap,
        ),
        EdgePosition::Left => (
            invoker.right() + gap,
            invoker.center_y() - measured.height / 2.0,
        ),
        EdgePosition::Right => (
            invoker.x - gap - measured.width,
            invoker.center_y() - measured.height / 2.0,
        ),
    };
    let x = x.clamp(0.0, (viewport.width - measured.width).max(0.0));
    let y = y.clamp(0.0, (viewport.height - measured.height).max(0.0));
    Rect::new(x, y, measured.width, measured.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Size {
        Size::new(1280.0, 800.0)
    }

    #[test]
    fn bottom_docked_popup_opens_upward_centered() {
        let placement = provisional(PopupAnchor {
            invoker: Rect::new(100.0, 500.0, 40.0, 40.0),
            edge: EdgePosition::Bottom,
        });
        let rect = finalize(placement, Size::new(200.0, 160.0), viewport());
        assert_eq!(rect.center_x(), 120.0);
        assert_eq!(rect.bottom(), 500.0 - constants::POPUP_GAP);
    }

    #[test]
    fn left_docked_popup_opens_rightward() {
        let placement = provisional(PopupAnchor {
            invoker: Rect::new(0.0, 300.0, 56.0, 56.0),
            edge: EdgePosition::Left,
        });
        let rect = finalize(placement, Size::new(180.0, 240.0), viewport());
        assert_eq!(rect.x, 56.0 + constants::POPUP_GAP);
        assert_eq!(rect.center_y(), 328.0);
    }

    #[test]
    fn finalize_clamps_into_viewport() {
        let placement = provisional(PopupAnchor {
            invoker: Rect::new(10.0, 30.0, 40.0, 40.0),
            edge: EdgePosition::Bottom,
        });
        // taller than the space above the invoker
        let rect = finalize(placement, Size::new(400.0, 200.0), viewport());
        assert_eq!(rect.y, 0.0);
        assert_eq!(rect.x, 0.0);
    }
}
