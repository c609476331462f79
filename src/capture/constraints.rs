//! Capture constraints
//!
//! The fixed constraint set requested from a capture source: cursor drawn,
//! 12 fps, width bounded between an ideal of 1280 px and a max of 1920 px,
//! 16:9-ish aspect, audio included.

use serde::{Deserialize, Serialize};

/// Cursor rendering behavior for display capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Cursor is always drawn into the captured frames
    Always,
    /// Cursor is never drawn
    Never,
}

/// Width bounds for the captured video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidthRange {
    pub ideal: u32,
    pub max: u32,
}

/// Constraint set passed to a capture source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    /// Cursor rendering mode
    pub cursor: CursorMode,

    /// Target frame rate
    pub frame_rate: u32,

    /// Width bounds
    pub width: WidthRange,

    /// Target aspect ratio (width / height)
    pub aspect_ratio: f64,

    /// Whether to capture audio alongside video
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            cursor: CursorMode::Always,
            frame_rate: 12,
            width: WidthRange {
                ideal: 1280,
                max: 1920,
            },
            aspect_ratio: 1.78,
            audio: true,
        }
    }
}

impl CaptureConstraints {
    /// Resolve the constraint set to concrete output dimensions.
    ///
    /// Width is the ideal clamped to the max; height follows from the aspect
    /// ratio, rounded down to even (encoders reject odd dimensions).
    pub fn target_size(&self) -> (u32, u32) {
        let width = self.width.ideal.min(self.width.max);
        let height = (width as f64 / self.aspect_ratio).round() as u32;
        (width & !1, height & !1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_requested_capture_profile() {
        let c = CaptureConstraints::default();
        assert_eq!(c.cursor, CursorMode::Always);
        assert_eq!(c.frame_rate, 12);
        assert_eq!(c.width.ideal, 1280);
        assert_eq!(c.width.max, 1920);
        assert!((c.aspect_ratio - 1.78).abs() < f64::EPSILON);
        assert!(c.audio);
    }

    #[test]
    fn target_size_is_even_and_aspect_bound() {
        let c = CaptureConstraints::default();
        let (w, h) = c.target_size();
        assert_eq!(w, 1280);
        assert_eq!(h % 2, 0);
        assert!((w as f64 / h as f64 - 1.78).abs() < 0.01);
    }

    #[test]
    fn ideal_width_is_clamped_to_max() {
        let c = CaptureConstraints {
            width: WidthRange {
                ideal: 2560,
                max: 1920,
            },
            ..Default::default()
        };
        assert_eq!(c.target_size().0, 1920);
    }
}
