//! Serializes a [`Figure`] into a standalone SVG document.
//!
//! User units are typographic points: the root `width`/`height` equal the cropped canvas in
//! points, so a rasterizer scales by `dpi / 72` and a PDF converter at 72 dpi keeps the physical
//! size.

use crate::figure::{Arrow, Figure, HeadEnd, HeadStyle, LineStyle, Point, Text, VAlign};
use crate::text::{FontStyle, FontWeight};
use indexmap::IndexSet;
use std::fmt::Write as _;

/// Dash pattern of a dashed line, in multiples of its width.
const DASH_PATTERN: [f64; 2] = [3.7, 1.6];

#[derive(Debug, Clone, Default)]
pub struct SvgRenderOptions {
    /// Root `id`; also prefixes marker ids so several figures can share one page.
    pub diagram_id: Option<String>,
    /// CSS color painted behind the figure. Transparent when unset.
    pub background: Option<String>,
}

pub fn render_figure_svg(figure: &Figure, options: &SvgRenderOptions) -> String {
    let diagram_id = options.diagram_id.as_deref().unwrap_or("seqfig");
    let canvas = figure.canvas_bounds();
    let w = canvas.width().max(1.0);
    let h = canvas.height().max(1.0);

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" width="{}" height="{}" viewBox="{} {} {} {}" font-family="{}">"#,
        escape_xml(diagram_id),
        fmt(w),
        fmt(h),
        fmt(canvas.min_x),
        fmt(canvas.min_y),
        fmt(w),
        fmt(h),
        escape_xml(&figure.font_family),
    );

    let markers = collect_markers(&figure.arrows);
    out.push_str("<defs>");
    for (idx, (head, color)) in markers.iter().enumerate() {
        render_marker(&mut out, diagram_id, idx, *head, color, figure);
    }
    out.push_str("</defs>\n");

    if let Some(bg) = options.background.as_deref() {
        let _ = writeln!(
            &mut out,
            r#"<rect class="background" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            fmt(canvas.min_x),
            fmt(canvas.min_y),
            fmt(w),
            fmt(h),
            escape_xml(bg),
        );
    }

    out.push_str(r#"<g class="actors">"#);
    for b in &figure.actor_boxes {
        let (x0, y0) = figure.to_canvas(Point::new(
            b.center.x - b.width / 2.0 - b.pad,
            b.center.y + b.height / 2.0 + b.pad,
        ));
        let (x1, y1) = figure.to_canvas(Point::new(
            b.center.x + b.width / 2.0 + b.pad,
            b.center.y - b.height / 2.0 - b.pad,
        ));
        let _ = write!(
            &mut out,
            r#"<rect class="actor-box" data-actor="{}" x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            escape_xml(&b.actor),
            fmt(x0),
            fmt(y0),
            fmt(x1 - x0),
            fmt(y1 - y0),
            fmt(b.pad * figure.scale_x()),
            fmt(b.pad * figure.scale_y()),
            escape_xml(&b.fill),
            escape_xml(&b.stroke),
            fmt(b.stroke_width),
        );
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="lifelines">"#);
    for l in &figure.lifelines {
        let (x, y0) = figure.to_canvas(Point::new(l.x, l.top));
        let (_, y1) = figure.to_canvas(Point::new(l.x, l.bottom));
        let _ = write!(
            &mut out,
            r#"<line class="lifeline" data-actor="{}" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-dasharray="{}"/>"#,
            escape_xml(&l.actor),
            fmt(x),
            fmt(y0),
            fmt(x),
            fmt(y1),
            escape_xml(&l.color),
            fmt(l.width),
            dasharray(l.width),
        );
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="messages">"#);
    for (idx, a) in figure.arrows.iter().enumerate() {
        render_arrow(&mut out, figure, &markers, diagram_id, idx, a);
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="labels">"#);
    for t in &figure.texts {
        render_text(&mut out, figure, t);
    }
    out.push_str("</g>\n");

    out.push_str("</svg>\n");
    out
}

fn collect_markers(arrows: &[Arrow]) -> IndexSet<(HeadStyle, String)> {
    arrows.iter().map(|a| (a.head, a.color.clone())).collect()
}

fn marker_id(diagram_id: &str, idx: usize) -> String {
    format!("{diagram_id}-head-{idx}")
}

fn render_marker(
    out: &mut String,
    diagram_id: &str,
    idx: usize,
    head: HeadStyle,
    color: &str,
    figure: &Figure,
) {
    let scale = figure
        .arrows
        .iter()
        .find(|a| a.head == head && a.color == color)
        .map(|a| a.head_scale)
        .unwrap_or(8.0);
    let len = 0.4 * scale;
    let half = 0.2 * scale;
    let (fill, stroke_width) = match head {
        HeadStyle::Filled => (color, 0.0),
        HeadStyle::Hollow => ("#FFFFFF", 0.8),
    };
    let _ = write!(
        out,
        r#"<marker id="{}" class="head-{}" markerUnits="userSpaceOnUse" refX="{}" refY="{}" markerWidth="{}" markerHeight="{}" orient="auto-start-reverse" overflow="visible"><path d="M 0 0 L {} {} L 0 {} z" fill="{}" stroke="{}" stroke-width="{}"/></marker>"#,
        escape_xml(&marker_id(diagram_id, idx)),
        match head {
            HeadStyle::Filled => "filled",
            HeadStyle::Hollow => "hollow",
        },
        fmt(len),
        fmt(half),
        fmt(len),
        fmt(half * 2.0),
        fmt(len),
        fmt(half),
        fmt(half * 2.0),
        escape_xml(fill),
        escape_xml(color),
        fmt(stroke_width),
    );
}

fn render_arrow(
    out: &mut String,
    figure: &Figure,
    markers: &IndexSet<(HeadStyle, String)>,
    diagram_id: &str,
    idx: usize,
    a: &Arrow,
) {
    let (x1, y1) = figure.to_canvas(a.start);
    let (x2, y2) = figure.to_canvas(a.end);
    let marker = markers
        .get_index_of(&(a.head, a.color.clone()))
        .map(|i| marker_id(diagram_id, i))
        .unwrap_or_default();
    let marker_attr = match a.head_end {
        HeadEnd::Start => "marker-start",
        HeadEnd::End => "marker-end",
    };

    let _ = write!(
        out,
        r#"<line class="message {}" data-index="{}" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}""#,
        a.kind.as_str(),
        idx,
        fmt(x1),
        fmt(y1),
        fmt(x2),
        fmt(y2),
        escape_xml(&a.color),
        fmt(a.width),
    );
    if a.line == LineStyle::Dashed {
        let _ = write!(out, r#" stroke-dasharray="{}""#, dasharray(a.width));
    }
    let _ = write!(
        out,
        r#" {}="url(#{})"/>"#,
        marker_attr,
        escape_xml(&marker)
    );
}

fn render_text(out: &mut String, figure: &Figure, t: &Text) {
    let (cx, ay) = figure.to_canvas(t.anchor);
    let top = match t.v_align {
        VAlign::Top => ay,
        VAlign::Center => ay - t.height / 2.0,
        VAlign::Bottom => ay - t.height,
    };

    if let Some(frame) = &t.frame {
        let _ = write!(
            out,
            r#"<rect class="{}-frame" x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            t.role.class(),
            fmt(cx - t.width / 2.0 - frame.pad),
            fmt(top - frame.pad),
            fmt(t.width + frame.pad * 2.0),
            fmt(t.height + frame.pad * 2.0),
            fmt(frame.pad),
            escape_xml(&frame.fill),
            escape_xml(&frame.stroke),
            fmt(frame.stroke_width),
        );
    }

    let _ = write!(
        out,
        r#"<text class="{}" text-anchor="middle" dominant-baseline="central" font-size="{}""#,
        t.role.class(),
        fmt(t.style.font_size),
    );
    if t.style.font_weight == FontWeight::Bold {
        out.push_str(r#" font-weight="bold""#);
    }
    if t.style.font_style == FontStyle::Italic {
        out.push_str(r#" font-style="italic""#);
    }
    let _ = write!(out, r#" fill="{}">"#, escape_xml(&t.color));
    for (i, line) in t.lines().enumerate() {
        let y = top + (i as f64 + 0.5) * t.line_height;
        let _ = write!(out, r#"<tspan x="{}" y="{}">"#, fmt(cx), fmt(y));
        escape_xml_into(out, line);
        out.push_str("</tspan>");
    }
    out.push_str("</text>");
}

fn dasharray(width: f64) -> String {
    format!(
        "{},{}",
        fmt(DASH_PATTERN[0] * width),
        fmt(DASH_PATTERN[1] * width)
    )
}

/// Formats a coordinate with at most three decimals and no trailing zeros.
pub(crate) fn fmt(v: f64) -> String {
    let mut out = String::new();
    fmt_into(&mut out, v);
    out
}

pub(crate) fn fmt_into(out: &mut String, v: f64) {
    if !v.is_finite() {
        out.push('0');
        return;
    }
    let k = (v * 1000.0).round() as i64;
    if k == 0 {
        out.push('0');
        return;
    }

    let abs = k.unsigned_abs();
    if k < 0 {
        out.push('-');
    }
    let _ = write!(out, "{}", abs / 1000);
    let frac = abs % 1000;
    if frac == 0 {
        return;
    }
    let start = out.len();
    let _ = write!(out, ".{frac:03}");
    while out.len() > start && out.ends_with('0') {
        out.pop();
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + 1;
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}
