//! Coarse device classification from viewport width.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

/// Width threshold separating the device classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub threshold: f64,
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self {
            threshold: constants::DEVICE_WIDTH_THRESHOLD,
        }
    }
}

impl Breakpoint {
    pub fn device_class(&self, viewport_width: f64) -> DeviceClass {
        if viewport_width < self.threshold {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}
