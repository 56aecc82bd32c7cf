//! Declarative overlay configuration schema and layered resolution.
//!
//! Configurations are authored by independent widgets and delivered as data;
//! everything here is serde-serializable and treated as read-only by the
//! orchestrator. The only mutation path is the layered merge, which builds a
//! fresh effective configuration each render cycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::actions::ActionConfig;
use crate::breakpoint::DeviceClass;
use crate::conditions::{CombineMode, Condition};
use crate::constants;

/// One dynamic field of the configuration, resolved fresh every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicField {
    /// Verbatim value.
    Literal(String),
    /// Lookup against live state, optionally narrowed to one attribute.
    StateLookup {
        entity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
    /// Inline expression evaluated by the external template resolver.
    Expression(String),
}

impl DynamicField {
    /// Raw literal fallback used when resolution fails: the overlay shows
    /// the unresolved source text rather than disappearing.
    pub fn fallback_literal(&self) -> String {
        match self {
            DynamicField::Literal(value) => value.clone(),
            DynamicField::StateLookup { entity, attribute } => match attribute {
                Some(attribute) => format!("{entity}.{attribute}"),
                None => entity.clone(),
            },
            DynamicField::Expression(source) => source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeConfig {
    pub count: DynamicField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<DynamicField>,
}

/// A primary route button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<DynamicField>,
    /// Navigation target; also drives default "selected" matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_tap_action: Option<ActionConfig>,
    /// Explicit selection predicate; falls back to URL matching when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeConfig>,
}

impl RouteConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            icon: None,
            image: None,
            label: None,
            url: None,
            tap_action: None,
            hold_action: None,
            double_tap_action: None,
            selected: None,
            hidden: None,
            badge: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    #[default]
    Click,
    Hover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// A group of secondary routes collapsed behind one icon.
///
/// Open/closed state lives on the view layer, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<DynamicField>,
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub open_mode: OpenMode,
    #[serde(default)]
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// External entity whose version field the media watcher tracks.
    pub entity: String,
    #[serde(default)]
    pub start_expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConditions {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub mode: CombineMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Docked,
    Floating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// A provider's declared overlay configuration.
///
/// Also the shape of shared-default templates, per-device patches, and
/// preview overrides; [`resolve_layers`] folds them in precedence order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Name of a shared-defaults template to merge beneath this config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Cosmetic style catalog name; opaque to the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<EdgePosition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<StackConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autohide: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_device_classes: Vec<DeviceClass>,
    /// Per-provider minimum viewport width; below it the provider is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    /// Patches applied when the named device class is current.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub device_overrides: BTreeMap<DeviceClass, Box<OverlayConfig>>,
}

/// Fold configuration layers in fixed precedence order, lowest first:
/// shared-defaults template, the template's patch for the current device
/// class, the provider configuration, the provider's own device patch, then
/// any preview override.
///
/// Scalar `Some` fields win; non-empty collections replace wholesale.
pub fn resolve_layers(
    template: Option<&OverlayConfig>,
    provider: &OverlayConfig,
    device: DeviceClass,
    preview: Option<&OverlayConfig>,
) -> OverlayConfig {
    let mut effective = template.cloned().unwrap_or_default();
    if let Some(patch) = template.and_then(|layer| layer.device_overrides.get(&device)) {
        overlay_in_place(&mut effective, patch);
    }
    overlay_in_place(&mut effective, provider);
    if let Some(patch) = provider.device_overrides.get(&device) {
        overlay_in_place(&mut effective, patch);
    }
    if let Some(preview) = preview {
        overlay_in_place(&mut effective, preview);
    }
    effective.template = None;
    effective.device_overrides.clear();
    effective
}

fn overlay_in_place(base: &mut OverlayConfig, layer: &OverlayConfig) {
    if layer.style.is_some() {
        base.style = layer.style.clone();
    }
    if layer.layout.is_some() {
        base.layout = layer.layout;
    }
    if layer.position.is_some() {
        base.position = layer.position;
    }
    if !layer.routes.is_empty() {
        base.routes = layer.routes.clone();
    }
    if !layer.stacks.is_empty() {
        base.stacks = layer.stacks.clone();
    }
    if layer.media.is_some() {
        base.media = layer.media.clone();
    }
    if layer.display.is_some() {
        base.display = layer.display.clone();
    }
    if layer.autohide.is_some() {
        base.autohide = layer.autohide;
    }
    if !layer.excluded_device_classes.is_empty() {
        base.excluded_device_classes = layer.excluded_device_classes.clone();
    }
    if layer.min_width.is_some() {
        base.min_width = layer.min_width;
    }
}

/// Every empirically tuned interval, overridable per orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub evaluation_debounce: Duration,
    pub render_debounce: Duration,
    pub hold_delay: Duration,
    pub double_tap_window: Duration,
    pub click_resolve_delay: Duration,
    pub hover_close_grace: Duration,
    pub media_poll_interval: Duration,
    pub autohide_idle_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            evaluation_debounce: constants::EVALUATION_DEBOUNCE,
            render_debounce: constants::RENDER_DEBOUNCE,
            hold_delay: constants::HOLD_DELAY,
            double_tap_window: constants::DOUBLE_TAP_WINDOW,
            click_resolve_delay: constants::CLICK_RESOLVE_DELAY,
            hover_close_grace: constants::HOVER_CLOSE_GRACE,
            media_poll_interval: constants::MEDIA_POLL_INTERVAL,
            autohide_idle_delay: constants::AUTOHIDE_IDLE_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str) -> RouteConfig {
        RouteConfig::new(id)
    }

    #[test]
    fn provider_overrides_template_scalars() {
        let template = OverlayConfig {
            style: Some("glass".into()),
            position: Some(EdgePosition::Bottom),
            routes: vec![route("home")],
            ..Default::default()
        };
        let provider = OverlayConfig {
            position: Some(EdgePosition::Left),
            ..Default::default()
        };
        let effective = resolve_layers(Some(&template), &provider, DeviceClass::Desktop, None);
        assert_eq!(effective.style.as_deref(), Some("glass"));
        assert_eq!(effective.position, Some(EdgePosition::Left));
        assert_eq!(effective.routes.len(), 1);
    }

    #[test]
    fn device_patch_sits_between_template_and_provider() {
        let provider = OverlayConfig {
            layout: Some(LayoutMode::Docked),
            device_overrides: BTreeMap::from([(
                DeviceClass::Mobile,
                Box::new(OverlayConfig {
                    layout: Some(LayoutMode::Floating),
                    ..Default::default()
                }),
            )]),
            ..Default::default()
        };
        let mobile = resolve_layers(None, &provider, DeviceClass::Mobile, None);
        assert_eq!(mobile.layout, Some(LayoutMode::Floating));
        let desktop = resolve_layers(None, &provider, DeviceClass::Desktop, None);
        assert_eq!(desktop.layout, Some(LayoutMode::Docked));
    }

    #[test]
    fn template_device_patch_sits_below_provider() {
        let template = OverlayConfig {
            style: Some("base".into()),
            device_overrides: BTreeMap::from([(
                DeviceClass::Mobile,
                Box::new(OverlayConfig {
                    style: Some("patched".into()),
                    ..Default::default()
                }),
            )]),
            ..Default::default()
        };
        let silent = OverlayConfig::default();
        let effective = resolve_layers(Some(&template), &silent, DeviceClass::Mobile, None);
        assert_eq!(effective.style.as_deref(), Some("patched"));
        // a provider scalar beats the template's device patch
        let provider = OverlayConfig {
            style: Some("mine".into()),
            ..Default::default()
        };
        let effective = resolve_layers(Some(&template), &provider, DeviceClass::Mobile, None);
        assert_eq!(effective.style.as_deref(), Some("mine"));
    }

    #[test]
    fn preview_wins_over_everything() {
        let provider = OverlayConfig {
            routes: vec![route("a"), route("b")],
            ..Default::default()
        };
        let preview = OverlayConfig {
            routes: vec![route("edited")],
            ..Default::default()
        };
        let effective = resolve_layers(None, &provider, DeviceClass::Desktop, Some(&preview));
        assert_eq!(effective.routes.len(), 1);
        assert_eq!(effective.routes[0].id, "edited");
    }

    #[test]
    fn schema_round_trips_through_json() {
        let config = OverlayConfig {
            style: Some("slim".into()),
            routes: vec![RouteConfig {
                label: Some(DynamicField::StateLookup {
                    entity: "sensor.unread".into(),
                    attribute: None,
                }),
                ..RouteConfig::new("mail")
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: OverlayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
