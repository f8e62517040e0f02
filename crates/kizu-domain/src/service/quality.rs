//! Photo-quality scoring contract
//!
//! A captured photo is pre-screened before it is accepted into a slot. The
//! scoring strategy is pluggable; the acceptance math here is the fixed
//! contract every scorer is judged against.

use std::path::Path;

use serde::{Deserialize, Serialize};

use kizu_types::{CameraSlot, Result};

/// Minimum total score for a photo to be accepted
pub const ACCEPT_THRESHOLD: u8 = 65;

/// Points available to each sub-check
pub const SUBCHECK_BUDGET: u8 = 25;

/// Sub-scores below this count as a failed sub-check when picking a hint
pub const SUBCHECK_PASS: u8 = 15;

/// Per-photo quality sub-scores
///
/// Angle is a pass/fail gate worth the full 25 points; framing, lighting and
/// sharpness score 0-25 each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub angle_ok: bool,
    pub framing: u8,
    pub lighting: u8,
    pub sharpness: u8,
}

impl QualityBreakdown {
    /// Total score in [0, 100]
    pub fn total(&self) -> u8 {
        let angle = if self.angle_ok { SUBCHECK_BUDGET } else { 0 };
        angle
            + self.framing.min(SUBCHECK_BUDGET)
            + self.lighting.min(SUBCHECK_BUDGET)
            + self.sharpness.min(SUBCHECK_BUDGET)
    }

    /// Whether the photo is accepted into its slot.
    ///
    /// An angle mismatch rejects outright; otherwise the total must reach
    /// the acceptance bar.
    pub fn accepted(&self) -> bool {
        self.angle_ok && self.total() >= ACCEPT_THRESHOLD
    }

    /// Guidance for the first failing sub-check, in priority order
    /// framing, then lighting, then quality. Angle mismatches gate
    /// acceptance but carry no retake hint of their own.
    pub fn hint(&self) -> Option<&'static str> {
        if self.framing < SUBCHECK_PASS {
            Some("Move back and keep the whole vehicle inside the frame.")
        } else if self.lighting < SUBCHECK_PASS {
            Some("Retake in better light; avoid deep shadows and glare.")
        } else if self.sharpness < SUBCHECK_PASS {
            Some("Hold the camera steady and refocus before shooting.")
        } else {
            None
        }
    }
}

/// Pluggable photo-quality scoring strategy
///
/// The shipped implementation is a pixel heuristic; a real vision backend
/// can be substituted without changing the surrounding contract.
pub trait QualityScorer {
    fn score(&self, image_path: &Path, expected: CameraSlot) -> Result<QualityBreakdown>;
}
