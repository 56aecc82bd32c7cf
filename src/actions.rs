//! Action descriptors and the dispatch contract.
//!
//! Dispatch is performed by the host application; the orchestrator hands it
//! the descriptor plus the owning provider's live context and catches any
//! failure at the boundary so it never reaches the render path.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DispatchError;

/// Declarative action attached to a route gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionConfig {
    Navigate {
        path: String,
    },
    OpenUrl {
        url: String,
    },
    OpenDialog {
        dialog: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    CallService {
        service: String,
        #[serde(default)]
        data: serde_json::Value,
    },
    None,
}

impl ActionConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, ActionConfig::None)
    }
}

/// Which gesture produced a dispatch; drives haptic policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    Hold,
    DoubleTap,
    Navigation,
}

/// Per-gesture haptic feedback switches, owned by the dispatch side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticPolicy {
    pub tap: bool,
    pub hold: bool,
    pub double_tap: bool,
    pub navigation: bool,
}

impl Default for HapticPolicy {
    fn default() -> Self {
        Self {
            tap: true,
            hold: true,
            double_tap: true,
            navigation: false,
        }
    }
}

impl HapticPolicy {
    pub fn enabled_for(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Tap => self.tap,
            GestureKind::Hold => self.hold,
            GestureKind::DoubleTap => self.double_tap,
            GestureKind::Navigation => self.navigation,
        }
    }
}

/// Everything a dispatcher gets to see for one action.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    /// Live context of the provider that declared the action.
    pub provider_context: &'a serde_json::Value,
    /// The effective provider configuration, for dispatchers that read
    /// provider-level dispatch options.
    pub provider_config: &'a crate::config::OverlayConfig,
    pub gesture: GestureKind,
    /// Whether the orchestrator's haptic policy wants feedback for this
    /// gesture; the host fires the actual vibration.
    pub haptic: bool,
}

/// Host-side action backend: navigation, URLs, dialogs, service calls.
pub trait ActionDispatcher {
    fn dispatch(
        &mut self,
        action: &ActionConfig,
        context: DispatchContext<'_>,
    ) -> Result<(), DispatchError>;
}

/// Validate an external-URL action target before handing it to the host.
pub fn validate_external_url(raw: &str) -> Result<Url, DispatchError> {
    let url = Url::parse(raw)?;
    Ok(url)
}
