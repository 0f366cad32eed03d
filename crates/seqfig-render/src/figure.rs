use crate::model::MessageKind;
use crate::text::TextStyle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.include(x, y);
        }
        Some(b)
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&mut self, other: &Bounds) {
        self.include(other.min_x, other.min_y);
        self.include(other.max_x, other.max_y);
    }

    pub fn pad(&self, pad: f64) -> Self {
        Self {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadStyle {
    Filled,
    Hollow,
}

/// Which end of the drawn segment carries the arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadEnd {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextRole {
    ActorLabel,
    Prompt,
    MessageLabel,
    MessageDetail,
    ReturnLabel,
    Continuation,
}

impl TextRole {
    pub fn class(self) -> &'static str {
        match self {
            Self::ActorLabel => "actor-label",
            Self::Prompt => "prompt",
            Self::MessageLabel => "message-label",
            Self::MessageDetail => "message-detail",
            Self::ReturnLabel => "return-label",
            Self::Continuation => "continuation",
        }
    }
}

/// Rounded box drawn around the actor names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorBox {
    pub actor: String,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub pad: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifeline {
    pub actor: String,
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub kind: MessageKind,
    pub start: Point,
    pub end: Point,
    pub head_end: HeadEnd,
    pub head: HeadStyle,
    pub line: LineStyle,
    pub color: String,
    pub width: f64,
    pub head_scale: f64,
}

impl Arrow {
    /// Where the arrowhead points.
    pub fn tip(&self) -> Point {
        match self.head_end {
            HeadEnd::Start => self.start,
            HeadEnd::End => self.end,
        }
    }

    /// The other end of the arrow.
    pub fn tail(&self) -> Point {
        match self.head_end {
            HeadEnd::Start => self.end,
            HeadEnd::End => self.start,
        }
    }
}

/// Rounded frame drawn behind a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    /// Padding in points.
    pub pad: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

/// Horizontally centered text block. `width`/`height` are measured extents in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub role: TextRole,
    pub anchor: Point,
    pub v_align: VAlign,
    pub text: String,
    pub style: TextStyle,
    pub color: String,
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
    pub frame: Option<TextFrame>,
}

impl Text {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// One drawn message and the primitives it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedMessage {
    pub index: usize,
    pub kind: MessageKind,
    pub from: String,
    pub to: String,
    pub y: f64,
    pub next_y: f64,
    /// Index into [`Figure::arrows`].
    pub arrow: usize,
    /// Indices into [`Figure::texts`].
    pub labels: Vec<usize>,
}

/// Positioned primitives in data coordinates, plus the canvas mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub width_pt: f64,
    pub height_pt: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub crop_pad_pt: f64,
    pub font_family: String,

    pub actor_boxes: Vec<ActorBox>,
    pub lifelines: Vec<Lifeline>,
    pub arrows: Vec<Arrow>,
    pub texts: Vec<Text>,
    pub messages: Vec<PlacedMessage>,
    /// Cursor after the last step, before the continuation marker.
    pub final_cursor: f64,
}

impl Figure {
    /// Points per data unit along x.
    pub fn scale_x(&self) -> f64 {
        self.width_pt / (self.x_range.1 - self.x_range.0)
    }

    /// Points per data unit along y.
    pub fn scale_y(&self) -> f64 {
        self.height_pt / (self.y_range.1 - self.y_range.0)
    }

    /// Maps data coordinates onto the canvas (points, y pointing down).
    pub fn to_canvas(&self, p: Point) -> (f64, f64) {
        (
            (p.x - self.x_range.0) * self.scale_x(),
            (self.y_range.1 - p.y) * self.scale_y(),
        )
    }

    pub fn continuation(&self) -> Option<&Text> {
        self.texts.iter().find(|t| t.role == TextRole::Continuation)
    }

    pub fn message_labels(&self, message: &PlacedMessage) -> impl Iterator<Item = &Text> {
        message.labels.iter().filter_map(|&i| self.texts.get(i))
    }

    /// Canvas extent of a text block, frame included.
    pub fn text_box(&self, text: &Text) -> Bounds {
        let (cx, ay) = self.to_canvas(text.anchor);
        let top = match text.v_align {
            VAlign::Top => ay,
            VAlign::Center => ay - text.height / 2.0,
            VAlign::Bottom => ay - text.height,
        };
        let pad = text.frame.as_ref().map(|f| f.pad).unwrap_or(0.0);
        Bounds {
            min_x: cx - text.width / 2.0,
            min_y: top,
            max_x: cx + text.width / 2.0,
            max_y: top + text.height,
        }
        .pad(pad)
    }

    /// Extent of everything drawn, in canvas points (strokes included).
    pub fn content_bounds(&self) -> Option<Bounds> {
        let mut parts: Vec<Bounds> = Vec::new();
        let mut add = |b: Bounds| parts.push(b);

        for b in &self.actor_boxes {
            let (x0, y0) = self.to_canvas(Point::new(
                b.center.x - b.width / 2.0 - b.pad,
                b.center.y + b.height / 2.0 + b.pad,
            ));
            let (x1, y1) = self.to_canvas(Point::new(
                b.center.x + b.width / 2.0 + b.pad,
                b.center.y - b.height / 2.0 - b.pad,
            ));
            add(Bounds {
                min_x: x0,
                min_y: y0,
                max_x: x1,
                max_y: y1,
            }
            .pad(b.stroke_width / 2.0));
        }
        for l in &self.lifelines {
            let (x, y0) = self.to_canvas(Point::new(l.x, l.top));
            let (_, y1) = self.to_canvas(Point::new(l.x, l.bottom));
            add(Bounds {
                min_x: x,
                min_y: y0,
                max_x: x,
                max_y: y1,
            }
            .pad(l.width / 2.0));
        }
        for a in &self.arrows {
            let (x0, y0) = self.to_canvas(a.start);
            let (x1, y1) = self.to_canvas(a.end);
            let head_half_width = 0.2 * a.head_scale;
            let Some(b) = Bounds::from_points([(x0, y0), (x1, y1)]) else {
                continue;
            };
            add(b.pad(head_half_width.max(a.width / 2.0)));
        }
        for t in &self.texts {
            add(self.text_box(t));
        }

        let mut it = parts.into_iter();
        let mut out = it.next()?;
        for b in it {
            out.union(&b);
        }
        Some(out)
    }

    /// The exported canvas: content bounds grown by the crop pad.
    ///
    /// Falls back to the full figure when nothing was drawn.
    pub fn canvas_bounds(&self) -> Bounds {
        self.content_bounds()
            .map(|b| b.pad(self.crop_pad_pt))
            .unwrap_or(Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: self.width_pt,
                max_y: self.height_pt,
            })
    }
}
