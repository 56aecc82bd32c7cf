//! Shared crate-wide tuning constants.
//!
//! Every interval here was tuned empirically in the source system. They are
//! defaults for the corresponding [`crate::config::Timings`] fields, not hard
//! invariants; embedders may override them per orchestrator.

use std::time::Duration;

/// Coalescing window for the global re-evaluation debounce.
///
/// Registration bursts during live editing (a widget re-registers on every
/// reactive update) collapse into a single evaluation pass at the end of
/// this window.
pub const EVALUATION_DEBOUNCE: Duration = Duration::from_millis(10);

/// Debounce applied to render triggers that arrive at high frequency
/// (viewport resize, observed host mutations).
pub const RENDER_DEBOUNCE: Duration = Duration::from_millis(150);

/// Press duration after which a configured hold action fires.
pub const HOLD_DELAY: Duration = Duration::from_millis(500);

/// Maximum gap between two releases for them to count as a double tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Delay before an unsuperseded single tap is committed.
///
/// A tap on an element with a double-tap action cannot fire immediately;
/// it must wait out the detection window in case a second tap follows.
pub const CLICK_RESOLVE_DELAY: Duration = Duration::from_millis(250);

/// Grace period before a hover-opened stack popup closes, so the pointer can
/// travel from the invoking icon to the popup body.
pub const HOVER_CLOSE_GRACE: Duration = Duration::from_millis(300);

/// Poll interval for the media state watcher.
pub const MEDIA_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Pointer idle time over the overlay before an auto-hiding layer hides.
pub const AUTOHIDE_IDLE_DELAY: Duration = Duration::from_millis(3000);

/// Distance (px) from the relevant screen edge within which pointer movement
/// reveals a hidden auto-hiding overlay.
pub const AUTOHIDE_EDGE_ZONE: f64 = 8.0;

/// Viewport width (px) below which the device class is `Mobile`.
pub const DEVICE_WIDTH_THRESHOLD: f64 = 768.0;

/// Fixed gap (px) between a stack popup and its invoking element.
pub const POPUP_GAP: f64 = 8.0;

/// Depth cap for the open-dialog walk over the host subtree.
pub const DIALOG_SCAN_MAX_DEPTH: usize = 20;
