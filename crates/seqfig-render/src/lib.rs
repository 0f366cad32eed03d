#![forbid(unsafe_code)]

//! Layout and SVG rendering for the research-phase sequence figure.
//!
//! The pipeline has two stages:
//! - [`layout_scenario`] walks a [`Scenario`] top to bottom with a single vertical cursor and
//!   produces a [`Figure`] of positioned primitives (data coordinates).
//! - [`svg::render_figure_svg`] serializes the figure into a cropped SVG document whose user
//!   units are typographic points.

pub mod config;
pub mod figure;
pub mod layout;
pub mod model;
pub mod svg;
pub mod text;

pub use crate::config::DiagramConfig;
pub use crate::figure::Figure;
pub use crate::layout::{Renderer, layout_scenario};
pub use crate::model::{Actor, Message, MessageKind, Scenario, Step};

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("message references unknown actor: {actor}")]
    UnknownActor { actor: String },
    #[error("actor declared more than once: {actor}")]
    DuplicateActor { actor: String },
    #[error("invalid diagram config: {message}")]
    InvalidConfig { message: String },
    #[error("scenario/config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}
