//! Per-object, per-frame tracking record.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{EllipseFeatures, ShapeDescriptors};

/// One tracked object in one frame.
///
/// `head` and `tail` orientations are expressed in the same reference frame
/// as `body`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    pub head: EllipseFeatures,
    pub tail: EllipseFeatures,
    pub body: EllipseFeatures,
    pub shape: ShapeDescriptors,
    pub frame_index: u64,
    pub track_id: u64,
}

impl Detection {
    pub fn new(
        head: EllipseFeatures,
        tail: EllipseFeatures,
        body: EllipseFeatures,
        shape: ShapeDescriptors,
    ) -> Self {
        Self {
            head,
            tail,
            body,
            shape,
            frame_index: 0,
            track_id: 0,
        }
    }

    /// Ellipse used as distance and angle anchor during assignment.
    #[inline]
    pub fn spot(&self, spot: ReferenceSpot) -> &EllipseFeatures {
        match spot {
            ReferenceSpot::Head => &self.head,
            ReferenceSpot::Tail => &self.tail,
            ReferenceSpot::Body => &self.body,
        }
    }
}

/// Which part of a detection anchors the assignment cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSpot {
    #[default]
    Head,
    Tail,
    Body,
}

impl FromStr for ReferenceSpot {
    type Err = String;

    /// Accepts the role names as well as the numeric roles `0`, `1`, `2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "head" | "0" => Ok(Self::Head),
            "tail" | "1" => Ok(Self::Tail),
            "body" | "2" => Ok(Self::Body),
            other => Err(format!("expected head, tail or body, got `{other}`")),
        }
    }
}
