//! Arbitration and portal-rendering orchestrator for dashboard navigation
//! overlays.
//!
//! Multiple widgets on a dashboard may each declare an overlay configuration
//! for the same region of the host view. This crate decides which single
//! declaration wins per region, renders it into a portal layer that outlives
//! the declaring widget, and runs the interactive machinery around it:
//! tap / hold / double-tap recognition, auto-hide, anchored stack popups and
//! media-state watching.
//!
//! The embedding layer owns a [`host::HostTree`] mirror of its view
//! hierarchy and an [`orchestrator::Orchestrator`], forwards events into
//! both, pumps [`orchestrator::Orchestrator::tick`], and paints whatever
//! [`render::RenderedOverlay`] snapshots come out. All timing is explicit:
//! every entry point takes `Instant` and the embedder sleeps until
//! [`orchestrator::Orchestrator::next_deadline`].

pub mod actions;
pub mod autohide;
pub mod breakpoint;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod layer;
pub mod logging;
pub mod media;
pub mod orchestrator;
pub mod popup;
pub mod registry;
pub mod render;
pub mod template;

pub use actions::{ActionConfig, ActionDispatcher, DispatchContext, GestureKind, HapticPolicy};
pub use breakpoint::{Breakpoint, DeviceClass};
pub use conditions::{CombineMode, Condition, ConditionEvaluator};
pub use config::{OverlayConfig, RouteConfig, StackConfig, Timings};
pub use error::{DispatchError, EvalError, TemplateError};
pub use geometry::{Point, Rect, Size};
pub use gesture::{GestureKey, GestureOutcome, PointerPhase};
pub use host::{HostTree, NodeId, NodeKind};
pub use media::MediaSource;
pub use orchestrator::{Collaborators, Notification, Orchestrator};
pub use registry::{ContainerScope, ContainerTarget, ProviderKey};
pub use render::RenderedOverlay;
pub use template::{ResolvedValue, TemplateResolver};
