use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points.
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;

    /// Distance between baselines of stacked lines, in points.
    fn line_height(&self, style: &TextStyle) -> f64 {
        style.font_size.max(1.0) * 1.2
    }
}

/// Font-free measurer: every cell is a fixed fraction of the font size.
///
/// Good enough for cropping the canvas and spotting labels that overflow their lane span; real
/// glyph advances only matter once the SVG is rasterized.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    pub fn normalized_text_lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    fn char_width_factor(&self) -> f64 {
        if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        }
    }

    fn line_height_factor(&self) -> f64 {
        if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let lines = Self::normalized_text_lines(text);
        let font_size = style.font_size.max(1.0);
        let weight_factor = match style.font_weight {
            FontWeight::Bold => 1.08,
            FontWeight::Normal => 1.0,
        };

        let mut max_cells = 0usize;
        for line in &lines {
            let cells = line
                .chars()
                .map(|ch| ch.width().unwrap_or(0))
                .sum::<usize>();
            max_cells = max_cells.max(cells);
        }

        let width = max_cells as f64 * font_size * self.char_width_factor() * weight_factor;
        let height = lines.len() as f64 * self.line_height(style);
        TextMetrics {
            width,
            height,
            line_count: lines.len(),
        }
    }

    fn line_height(&self, style: &TextStyle) -> f64 {
        style.font_size.max(1.0) * self.line_height_factor()
    }
}
