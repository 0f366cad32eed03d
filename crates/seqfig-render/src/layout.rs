use crate::config::{DiagramConfig, POINTS_PER_INCH};
use crate::figure::{
    ActorBox, Arrow, Figure, HeadEnd, HeadStyle, Lifeline, LineStyle, PlacedMessage, Point, Text,
    TextFrame, TextRole, VAlign,
};
use crate::model::{Actor, MessageKind, Scenario, Step, index_actors};
use crate::text::{FontStyle, FontWeight, TextMeasurer, TextStyle};
use crate::{Error, LayoutOptions, Result};
use indexmap::IndexMap;

const CONTINUATION_MARK: &str = "\u{22ee}";

/// Draws onto a [`Figure`] top to bottom.
///
/// The renderer never tracks the cursor itself: every drawing call takes the current vertical
/// position and returns the next one, so the caller owns the only piece of mutable layout state.
pub struct Renderer<'a> {
    config: &'a DiagramConfig,
    measurer: &'a dyn TextMeasurer,
    actors: IndexMap<&'a str, &'a Actor>,
    figure: Figure,
}

impl<'a> Renderer<'a> {
    pub fn new(
        actors: &'a [Actor],
        config: &'a DiagramConfig,
        measurer: &'a dyn TextMeasurer,
    ) -> Result<Self> {
        config.validate()?;
        let actors = index_actors(actors)?;
        let figure = Figure {
            width_pt: config.width_pt(),
            height_pt: config.height_pt(),
            x_range: (config.x_min, config.x_max),
            y_range: (config.y_min(), config.y_max()),
            crop_pad_pt: config.crop_pad_in * POINTS_PER_INCH,
            font_family: config.font_family.clone(),
            actor_boxes: Vec::new(),
            lifelines: Vec::new(),
            arrows: Vec::new(),
            texts: Vec::new(),
            messages: Vec::new(),
            final_cursor: config.y_start,
        };
        Ok(Self {
            config,
            measurer,
            actors,
            figure,
        })
    }

    pub fn actor_x(&self, id: &str) -> Result<f64> {
        self.actors
            .get(id)
            .map(|a| a.x)
            .ok_or_else(|| Error::UnknownActor {
                actor: id.to_string(),
            })
    }

    fn actor_box_bottom(&self) -> f64 {
        self.config.y_start - self.config.actor_box.height / 2.0
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        role: TextRole,
        anchor: Point,
        v_align: VAlign,
        text: &str,
        style: TextStyle,
        color: &str,
        frame: Option<TextFrame>,
    ) -> usize {
        let metrics = self.measurer.measure(text, &style);
        let line_height = self.measurer.line_height(&style);
        self.figure.texts.push(Text {
            role,
            anchor,
            v_align,
            text: text.to_string(),
            style,
            color: color.to_string(),
            width: metrics.width,
            height: metrics.height,
            line_height,
            frame,
        });
        self.figure.texts.len() - 1
    }

    /// Actor boxes with their labels, and a dashed lifeline under each.
    pub fn draw_actors(&mut self) {
        let cfg = self.config;
        let lifeline_top = self.actor_box_bottom() - cfg.lifeline_gap;
        let actors: Vec<&Actor> = self.actors.values().copied().collect();

        for actor in &actors {
            let center = Point::new(actor.x, cfg.y_start);
            self.figure.actor_boxes.push(ActorBox {
                actor: actor.id.clone(),
                center,
                width: cfg.actor_box.width,
                height: cfg.actor_box.height,
                pad: cfg.actor_box.pad,
                fill: cfg.palette.actor_fill.clone(),
                stroke: cfg.palette.call.clone(),
                stroke_width: cfg.strokes.actor_box,
            });
            self.push_text(
                TextRole::ActorLabel,
                center,
                VAlign::Center,
                &actor.label,
                TextStyle {
                    font_size: cfg.fonts.actor,
                    font_weight: FontWeight::Bold,
                    font_style: FontStyle::Normal,
                },
                &cfg.palette.text,
                None,
            );
        }

        for actor in &actors {
            self.figure.lifelines.push(Lifeline {
                actor: actor.id.clone(),
                x: actor.x,
                top: lifeline_top,
                bottom: cfg.y_end,
                color: cfg.palette.lifeline.clone(),
                width: cfg.strokes.lifeline,
            });
        }
    }

    /// Places the prompt annotation under the focus actor and returns the cursor for the first
    /// message. The cursor drop is applied even without a prompt so layouts stay comparable.
    pub fn draw_prompt(&mut self, focus: &str, prompt: Option<&str>) -> Result<f64> {
        let cfg = self.config;
        let x = self.actor_x(focus)?;
        let y = self.actor_box_bottom() - cfg.prompt_offset;

        if let Some(prompt) = prompt {
            self.push_text(
                TextRole::Prompt,
                Point::new(x, y),
                VAlign::Top,
                prompt,
                TextStyle {
                    font_size: cfg.fonts.prompt,
                    font_weight: FontWeight::Normal,
                    font_style: FontStyle::Italic,
                },
                &cfg.palette.text,
                Some(TextFrame {
                    pad: 0.3 * cfg.fonts.prompt,
                    fill: cfg.palette.prompt_fill.clone(),
                    stroke: cfg.palette.prompt_stroke.clone(),
                    stroke_width: cfg.strokes.prompt_frame,
                }),
            );
        }

        Ok(y - cfg.prompt_advance)
    }

    /// Draws one horizontal message at `cursor_y` and returns the cursor for the next one.
    ///
    /// Calls are solid with a filled head on `to`. Returns are dashed and drawn reverse-style:
    /// the segment runs from `to` back to `from` with a hollow head on its start, so the tip
    /// still lands on `to`. Only calls show `detail`, as a second label line.
    pub fn draw_message(
        &mut self,
        cursor_y: f64,
        from: &str,
        to: &str,
        label: &str,
        detail: Option<&str>,
        kind: MessageKind,
    ) -> Result<f64> {
        let cfg = self.config;
        let x1 = self.actor_x(from)?;
        let x2 = self.actor_x(to)?;
        let y = cursor_y;
        let is_return = kind.is_return();

        let arrow = if is_return {
            Arrow {
                kind,
                start: Point::new(x2, y),
                end: Point::new(x1, y),
                head_end: HeadEnd::Start,
                head: HeadStyle::Hollow,
                line: LineStyle::Dashed,
                color: cfg.palette.reply.clone(),
                width: cfg.strokes.reply,
                head_scale: cfg.head_scale,
            }
        } else {
            Arrow {
                kind,
                start: Point::new(x1, y),
                end: Point::new(x2, y),
                head_end: HeadEnd::End,
                head: HeadStyle::Filled,
                line: LineStyle::Solid,
                color: cfg.palette.call.clone(),
                width: cfg.strokes.call,
                head_scale: cfg.head_scale,
            }
        };
        self.figure.arrows.push(arrow);
        let arrow = self.figure.arrows.len() - 1;

        let mid_x = (x1 + x2) / 2.0;
        let offsets = &cfg.label_offsets;
        let text_color = cfg.palette.text.clone();
        let mut labels = Vec::with_capacity(2);

        match detail.filter(|d| !is_return && !d.is_empty()) {
            Some(detail) => {
                labels.push(self.push_text(
                    TextRole::MessageLabel,
                    Point::new(mid_x, y + offsets.primary),
                    VAlign::Bottom,
                    label,
                    TextStyle {
                        font_size: cfg.fonts.message,
                        font_weight: FontWeight::Bold,
                        font_style: FontStyle::Normal,
                    },
                    &text_color,
                    None,
                ));
                labels.push(self.push_text(
                    TextRole::MessageDetail,
                    Point::new(mid_x, y + offsets.secondary),
                    VAlign::Bottom,
                    detail,
                    TextStyle {
                        font_size: cfg.fonts.detail,
                        ..Default::default()
                    },
                    &text_color,
                    None,
                ));
            }
            None if is_return => {
                labels.push(self.push_text(
                    TextRole::ReturnLabel,
                    Point::new(mid_x, y - offsets.reply),
                    VAlign::Top,
                    label,
                    TextStyle {
                        font_size: cfg.fonts.message,
                        font_weight: FontWeight::Normal,
                        font_style: FontStyle::Italic,
                    },
                    &text_color,
                    None,
                ));
            }
            None => {
                labels.push(self.push_text(
                    TextRole::MessageLabel,
                    Point::new(mid_x, y + offsets.call),
                    VAlign::Bottom,
                    label,
                    TextStyle {
                        font_size: cfg.fonts.message,
                        ..Default::default()
                    },
                    &text_color,
                    None,
                ));
            }
        }

        // Labels may overhang the span between the lanes; the reference figure relies on it.
        let span_pt = (x2 - x1).abs() * self.figure.scale_x();
        for &i in &labels {
            let text = &self.figure.texts[i];
            if text.width > span_pt {
                tracing::debug!(
                    label = %text.text,
                    width_pt = text.width,
                    span_pt,
                    from,
                    to,
                    "message label is wider than the span between its actors"
                );
            }
        }

        let next_y = if is_return {
            y - cfg.return_step
        } else {
            y - cfg.call_step
        };
        let index = self.figure.messages.len();
        tracing::debug!(
            index,
            kind = kind.as_str(),
            from,
            to,
            y,
            next_y,
            "drew message"
        );
        self.figure.messages.push(PlacedMessage {
            index,
            kind,
            from: from.to_string(),
            to: to.to_string(),
            y,
            next_y,
            arrow,
            labels,
        });
        Ok(next_y)
    }

    /// Vertical ellipsis under the focus lane, below the last message.
    pub fn draw_continuation(&mut self, focus: &str, cursor_y: f64) -> Result<()> {
        let cfg = self.config;
        let x = self.actor_x(focus)?;
        self.push_text(
            TextRole::Continuation,
            Point::new(x, cursor_y - cfg.continuation_offset),
            VAlign::Center,
            CONTINUATION_MARK,
            TextStyle {
                font_size: cfg.fonts.continuation,
                ..Default::default()
            },
            &cfg.palette.text,
            None,
        );
        Ok(())
    }

    pub fn finish(mut self, final_cursor: f64) -> Figure {
        self.figure.final_cursor = final_cursor;
        self.figure
    }
}

/// Lays out a whole scenario: actors and lifelines, the prompt, every step in order, then the
/// continuation marker.
pub fn layout_scenario(
    scenario: &Scenario,
    config: &DiagramConfig,
    options: &LayoutOptions,
) -> Result<Figure> {
    let mut renderer = Renderer::new(&scenario.actors, config, options.text_measurer.as_ref())?;
    renderer.draw_actors();

    let mut y = renderer.draw_prompt(&scenario.focus, scenario.prompt.as_deref())?;
    for step in &scenario.steps {
        y = match step {
            Step::Message(m) => {
                renderer.draw_message(y, &m.from, &m.to, &m.label, m.detail.as_deref(), m.kind)?
            }
            Step::GroupGap => y - config.group_gap,
        };
    }

    if scenario.continuation {
        renderer.draw_continuation(&scenario.focus, y)?;
    }
    Ok(renderer.finish(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;

    fn lanes() -> Vec<Actor> {
        vec![
            Actor::new("javadoc", 0.4, "Javadoc\nMCP"),
            Actor::new("researcher", 1.5, "Researcher"),
        ]
    }

    #[test]
    fn call_advances_by_call_step_and_return_by_return_step() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();

        let y0 = 8.0;
        let y1 = r
            .draw_message(y0, "researcher", "javadoc", "ask", Some("x"), MessageKind::Call)
            .unwrap();
        let y2 = r
            .draw_message(y1, "javadoc", "researcher", "answer", None, MessageKind::Return)
            .unwrap();

        assert!((y0 - y1 - 0.35).abs() < 1e-12);
        assert!((y1 - y2 - 0.15).abs() < 1e-12);
        assert!(y0 - y1 > y1 - y2);
    }

    #[test]
    fn two_line_call_label_and_single_line_return_label() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();

        let y = r
            .draw_message(8.0, "researcher", "javadoc", "list_classes", Some("pkg"), MessageKind::Call)
            .unwrap();
        // A detail on a return is dropped.
        r.draw_message(y, "javadoc", "researcher", "classes", Some("ignored"), MessageKind::Return)
            .unwrap();
        let f = r.finish(0.0);

        let call: Vec<_> = f.message_labels(&f.messages[0]).collect();
        assert_eq!(call.len(), 2);
        assert_eq!(call[0].style.font_weight, FontWeight::Bold);
        assert_eq!(call[1].style.font_weight, FontWeight::Normal);
        assert!(call[0].anchor.y > call[1].anchor.y);
        assert!(call.iter().all(|t| t.anchor.y > 8.0 && t.v_align == VAlign::Bottom));

        let ret: Vec<_> = f.message_labels(&f.messages[1]).collect();
        assert_eq!(ret.len(), 1);
        assert_eq!(ret[0].text, "classes");
        assert_eq!(ret[0].style.font_style, FontStyle::Italic);
        assert_eq!(ret[0].v_align, VAlign::Top);
        assert!(ret[0].anchor.y < f.messages[1].y);
    }

    #[test]
    fn call_without_detail_gets_one_upright_line_above_the_arrow() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();
        r.draw_message(8.0, "researcher", "javadoc", "ping", None, MessageKind::Call)
            .unwrap();
        let f = r.finish(0.0);

        let labels: Vec<_> = f.message_labels(&f.messages[0]).collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].style.font_style, FontStyle::Normal);
        assert!((labels[0].anchor.y - 8.06).abs() < 1e-12);
    }

    #[test]
    fn empty_detail_counts_as_absent() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();
        r.draw_message(8.0, "researcher", "javadoc", "call", Some(""), MessageKind::Call)
            .unwrap();
        let f = r.finish(0.0);

        let labels: Vec<_> = f.message_labels(&f.messages[0]).collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].role, TextRole::MessageLabel);
        assert!((labels[0].anchor.y - 8.06).abs() < 1e-12);
    }

    #[test]
    fn return_arrow_is_reversed_relative_to_its_call() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();
        let y = r
            .draw_message(8.0, "researcher", "javadoc", "q", Some("d"), MessageKind::Call)
            .unwrap();
        r.draw_message(y, "javadoc", "researcher", "a", None, MessageKind::Return)
            .unwrap();
        let f = r.finish(0.0);

        let call = &f.arrows[0];
        let ret = &f.arrows[1];
        assert_eq!((call.tail().x, call.tip().x), (1.5, 0.4));
        assert_eq!((ret.tail().x, ret.tip().x), (0.4, 1.5));
        assert_eq!((call.head, call.line), (HeadStyle::Filled, LineStyle::Solid));
        assert_eq!((ret.head, ret.line), (HeadStyle::Hollow, LineStyle::Dashed));
        assert_eq!(ret.head_end, HeadEnd::Start);
        assert_eq!(ret.start.x, 1.5);
        assert!(ret.width < call.width);
    }

    #[test]
    fn label_is_centered_between_lanes() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();
        r.draw_message(8.0, "javadoc", "researcher", "a", None, MessageKind::Return)
            .unwrap();
        let f = r.finish(0.0);
        assert!((f.texts.last().unwrap().anchor.x - 0.95).abs() < 1e-12);
    }

    #[test]
    fn unknown_actor_is_an_error() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();

        let err = r
            .draw_message(8.0, "researcher", "codecontext", "q", None, MessageKind::Call)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownActor { actor } if actor == "codecontext"));

        let err = r.draw_prompt("nobody", Some("hi")).unwrap_err();
        assert!(matches!(err, Error::UnknownActor { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let actors = lanes();
        let cfg = DiagramConfig {
            call_step: 0.0,
            ..Default::default()
        };
        let m = DeterministicTextMeasurer::default();
        assert!(matches!(
            Renderer::new(&actors, &cfg, &m),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn actor_boxes_and_lifelines_follow_declaration_order() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();
        let mut r = Renderer::new(&actors, &cfg, &m).unwrap();
        r.draw_actors();
        let f = r.finish(cfg.y_start);

        let ids: Vec<_> = f.lifelines.iter().map(|l| l.actor.as_str()).collect();
        assert_eq!(ids, ["javadoc", "researcher"]);
        assert_eq!(f.actor_boxes.len(), 2);
        for l in &f.lifelines {
            assert!((l.top - (9.5 - 0.175 - 0.1)).abs() < 1e-12);
            assert_eq!(l.bottom, 0.5);
        }
        let label = &f.texts[0];
        assert_eq!(label.role, TextRole::ActorLabel);
        assert_eq!(label.lines().count(), 2);
    }

    #[test]
    fn prompt_drops_the_cursor_even_when_absent() {
        let actors = lanes();
        let cfg = DiagramConfig::default();
        let m = DeterministicTextMeasurer::default();

        let mut with = Renderer::new(&actors, &cfg, &m).unwrap();
        let a = with.draw_prompt("researcher", Some("Initial prompt")).unwrap();
        let mut without = Renderer::new(&actors, &cfg, &m).unwrap();
        let b = without.draw_prompt("researcher", None).unwrap();

        assert_eq!(a, b);
        assert!((a - (9.5 - 0.175 - 0.3 - 0.525)).abs() < 1e-12);
        assert_eq!(with.finish(a).texts.len(), 1);
        assert!(without.finish(b).texts.is_empty());
    }
}
