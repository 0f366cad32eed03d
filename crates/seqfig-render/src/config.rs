//! Figure constants. Every field has a default matching the published figure, and every struct
//! is `#[serde(default)]` so a JSON override only needs the keys it changes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Points per inch. SVG user units are points throughout.
pub const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramConfig {
    /// Canvas size in inches (single ACM column).
    pub width_in: f64,
    pub height_in: f64,
    /// Raster resolution.
    pub dpi: f64,
    /// Padding around the cropped content, in inches.
    pub crop_pad_in: f64,

    /// Visible data range.
    pub x_min: f64,
    pub x_max: f64,
    /// Extra data units above `y_start` and below `y_end`.
    pub y_margin: f64,

    /// Vertical center of the actor boxes; also the top of the time axis.
    pub y_start: f64,
    /// Bottom of the lifelines.
    pub y_end: f64,
    /// Cursor advance after a call.
    pub call_step: f64,
    /// Cursor advance after a return.
    pub return_step: f64,
    /// Extra offset applied by a group gap step.
    pub group_gap: f64,

    pub actor_box: ActorBoxConfig,
    /// Gap between the bottom of an actor box and the top of its lifeline.
    pub lifeline_gap: f64,
    /// Prompt annotation top edge, below the bottom of the actor boxes.
    pub prompt_offset: f64,
    /// Cursor drop after the prompt annotation.
    pub prompt_advance: f64,
    /// Distance from the final cursor to the continuation marker.
    pub continuation_offset: f64,

    pub label_offsets: LabelOffsets,
    /// Arrowhead size multiplier (head length is `0.4 * head_scale` points).
    pub head_scale: f64,

    pub font_family: String,
    pub fonts: FontSizes,
    pub strokes: Strokes,
    pub palette: Palette,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        let call_step = 0.35;
        Self {
            width_in: 3.5,
            height_in: 6.0,
            dpi: 300.0,
            crop_pad_in: 0.1,
            x_min: -0.1,
            x_max: 3.1,
            y_margin: 0.5,
            y_start: 9.5,
            y_end: 0.5,
            call_step,
            return_step: 0.15,
            group_gap: call_step * 0.3,
            actor_box: ActorBoxConfig::default(),
            lifeline_gap: 0.1,
            prompt_offset: 0.3,
            prompt_advance: call_step * 1.5,
            continuation_offset: 0.3,
            label_offsets: LabelOffsets::default(),
            head_scale: 8.0,
            font_family: "DejaVu Sans, Arial, sans-serif".to_string(),
            fonts: FontSizes::default(),
            strokes: Strokes::default(),
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActorBoxConfig {
    pub width: f64,
    pub height: f64,
    /// Rounding pad; the drawn box grows by this much on each side.
    pub pad: f64,
}

impl Default for ActorBoxConfig {
    fn default() -> Self {
        Self {
            width: 0.8,
            height: 0.35,
            pad: 0.05,
        }
    }
}

/// Label placement relative to the arrow, in data units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelOffsets {
    /// Bold first line of a two-line call label (bottom edge).
    pub primary: f64,
    /// Second line of a two-line call label (bottom edge).
    pub secondary: f64,
    /// Single-line call label (bottom edge).
    pub call: f64,
    /// Return label, below the arrow (top edge).
    pub reply: f64,
}

impl Default for LabelOffsets {
    fn default() -> Self {
        Self {
            primary: 0.12,
            secondary: 0.02,
            call: 0.06,
            reply: 0.08,
        }
    }
}

/// Font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSizes {
    pub actor: f64,
    pub prompt: f64,
    pub message: f64,
    pub detail: f64,
    pub continuation: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            actor: 8.0,
            prompt: 8.0,
            message: 6.5,
            detail: 6.0,
            continuation: 16.0,
        }
    }
}

/// Line widths in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Strokes {
    pub actor_box: f64,
    pub lifeline: f64,
    pub call: f64,
    pub reply: f64,
    pub prompt_frame: f64,
}

impl Default for Strokes {
    fn default() -> Self {
        Self {
            actor_box: 1.5,
            lifeline: 1.0,
            call: 1.0,
            reply: 0.8,
            prompt_frame: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    pub call: String,
    pub reply: String,
    pub lifeline: String,
    pub actor_fill: String,
    pub text: String,
    pub prompt_fill: String,
    pub prompt_stroke: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            call: "#2C3E50".to_string(),
            reply: "#7F8C8D".to_string(),
            lifeline: "#BDC3C7".to_string(),
            actor_fill: "#ECF0F1".to_string(),
            text: "#000000".to_string(),
            prompt_fill: "#FFFFFF".to_string(),
            prompt_stroke: "#808080".to_string(),
        }
    }
}

impl DiagramConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values that would break the downward-only cursor or produce an empty canvas.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig {
                    message: format!("{name} must be a positive number (got {v})"),
                })
            }
        }

        positive("callStep", self.call_step)?;
        positive("returnStep", self.return_step)?;
        positive("widthIn", self.width_in)?;
        positive("heightIn", self.height_in)?;
        positive("dpi", self.dpi)?;
        positive("headScale", self.head_scale)?;
        if !(self.group_gap.is_finite() && self.group_gap >= 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("groupGap must not be negative (got {})", self.group_gap),
            });
        }
        if !(self.prompt_advance.is_finite() && self.prompt_advance >= 0.0) {
            return Err(Error::InvalidConfig {
                message: format!(
                    "promptAdvance must not be negative (got {})",
                    self.prompt_advance
                ),
            });
        }
        if !(self.x_max > self.x_min) {
            return Err(Error::InvalidConfig {
                message: "xMax must be greater than xMin".to_string(),
            });
        }
        if !(self.y_start > self.y_end) {
            return Err(Error::InvalidConfig {
                message: "yStart must be greater than yEnd".to_string(),
            });
        }
        // A negative margin may eat into the time axis but must leave a visible range.
        if !(self.y_margin.is_finite() && self.y_max() > self.y_min()) {
            return Err(Error::InvalidConfig {
                message: format!(
                    "yMargin leaves an empty vertical range (got {})",
                    self.y_margin
                ),
            });
        }
        if !(self.crop_pad_in.is_finite() && self.crop_pad_in >= 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("cropPadIn must not be negative (got {})", self.crop_pad_in),
            });
        }
        Ok(())
    }

    pub fn y_min(&self) -> f64 {
        self.y_end - self.y_margin
    }

    pub fn y_max(&self) -> f64 {
        self.y_start + self.y_margin
    }

    pub fn width_pt(&self) -> f64 {
        self.width_in * POINTS_PER_INCH
    }

    pub fn height_pt(&self) -> f64 {
        self.height_in * POINTS_PER_INCH
    }

    /// Raster pixels per SVG user unit.
    pub fn raster_scale(&self) -> f64 {
        self.dpi / POINTS_PER_INCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_figure() {
        let cfg = DiagramConfig::default();
        assert_eq!(cfg.call_step, 0.35);
        assert_eq!(cfg.return_step, 0.15);
        assert!(cfg.return_step < cfg.call_step);
        assert!((cfg.group_gap - 0.105).abs() < 1e-12);
        assert!((cfg.prompt_advance - 0.525).abs() < 1e-12);
        assert_eq!(cfg.width_pt(), 252.0);
        assert_eq!(cfg.height_pt(), 432.0);
        assert_eq!((cfg.y_min(), cfg.y_max()), (0.0, 10.0));
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_overrides_keep_other_defaults() {
        let cfg =
            DiagramConfig::from_json_str(r##"{"returnStep": 0.2, "palette": {"call": "#000"}}"##)
                .unwrap();
        assert_eq!(cfg.return_step, 0.2);
        assert_eq!(cfg.call_step, 0.35);
        assert_eq!(cfg.palette.call, "#000");
        assert_eq!(cfg.palette.reply, "#7F8C8D");
    }

    #[test]
    fn non_positive_steps_are_rejected() {
        let err = DiagramConfig::from_json_str(r#"{"callStep": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let cfg = DiagramConfig {
            return_step: -0.1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn collapsed_vertical_range_is_rejected() {
        let err = DiagramConfig::from_json_str(r#"{"yMargin": -4.5}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { message } if message.contains("yMargin")));

        // Shrinking the margin is fine as long as something remains visible.
        DiagramConfig::from_json_str(r#"{"yMargin": -0.2}"#).unwrap();

        let cfg = DiagramConfig {
            y_margin: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn crop_pad_must_be_finite_and_non_negative() {
        for pad in [-0.1, f64::INFINITY, f64::NAN] {
            let cfg = DiagramConfig {
                crop_pad_in: pad,
                ..Default::default()
            };
            assert!(
                matches!(cfg.validate(), Err(Error::InvalidConfig { .. })),
                "crop pad {pad} accepted"
            );
        }
        let cfg = DiagramConfig {
            crop_pad_in: 0.0,
            ..Default::default()
        };
        cfg.validate().unwrap();
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = DiagramConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
