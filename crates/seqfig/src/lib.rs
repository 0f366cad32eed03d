#![forbid(unsafe_code)]

//! `seqfig` renders the research-phase sequence figure headlessly: a Researcher agent calling two
//! MCP documentation servers, laid out as a single-column publication figure.
//!
//! # Features
//!
//! - `raster`: enable PNG/JPG/PDF output and file export via pure-Rust SVG
//!   rasterization/conversion (`seqfig::render::raster`)

pub use seqfig_render::config::{
    ActorBoxConfig, DiagramConfig, FontSizes, LabelOffsets, POINTS_PER_INCH, Palette, Strokes,
};
pub use seqfig_render::figure::Figure;
pub use seqfig_render::model::{Actor, Message, MessageKind, Scenario, Step};
pub use seqfig_render::{Error, Result};

pub mod render {
    pub use seqfig_render::svg::SvgRenderOptions;
    pub use seqfig_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use seqfig_render::{LayoutOptions, Renderer, layout_scenario};

    use seqfig_render::{DiagramConfig, Figure, Scenario};
    use std::path::Path;

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Render(#[from] seqfig_render::Error),
        #[error("failed to write {path}: {source}")]
        Write {
            path: String,
            #[source]
            source: std::io::Error,
        },
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Writes `bytes` to `path`, replacing any existing file.
    pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(path, bytes).map_err(|source| HeadlessError::Write {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote figure");
        Ok(())
    }

    /// Lays out a scenario and serializes it in one step.
    pub fn render_svg_sync(
        scenario: &Scenario,
        config: &DiagramConfig,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<String> {
        let figure = layout_scenario(scenario, config, layout_options)?;
        Ok(seqfig_render::svg::render_figure_svg(&figure, svg_options))
    }

    /// Bundles the figure constants with layout and SVG options so callers render with a single
    /// argument. All work is CPU-bound; only the `write_*` helpers touch the filesystem.
    #[derive(Clone, Default)]
    pub struct HeadlessRenderer {
        pub config: DiagramConfig,
        pub layout: LayoutOptions,
        pub svg: SvgRenderOptions,
    }

    impl HeadlessRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_config(mut self, config: DiagramConfig) -> Self {
            self.config = config;
            self
        }

        pub fn with_background(mut self, background: impl Into<String>) -> Self {
            self.svg.background = Some(background.into());
            self
        }

        pub fn with_diagram_id(mut self, diagram_id: impl Into<String>) -> Self {
            self.svg.diagram_id = Some(diagram_id.into());
            self
        }

        pub fn layout_sync(&self, scenario: &Scenario) -> Result<Figure> {
            Ok(layout_scenario(scenario, &self.config, &self.layout)?)
        }

        pub fn render_svg_sync(&self, scenario: &Scenario) -> Result<String> {
            render_svg_sync(scenario, &self.config, &self.layout, &self.svg)
        }

        pub fn write_svg_sync(&self, scenario: &Scenario, path: &Path) -> Result<()> {
            write_file(path, self.render_svg_sync(scenario)?.as_bytes())
        }

        #[cfg(feature = "raster")]
        pub fn render_png_sync(
            &self,
            scenario: &Scenario,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            raster::svg_to_png(&self.render_svg_sync(scenario)?, raster)
        }

        #[cfg(feature = "raster")]
        pub fn render_jpeg_sync(
            &self,
            scenario: &Scenario,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            raster::svg_to_jpeg(&self.render_svg_sync(scenario)?, raster)
        }

        #[cfg(feature = "raster")]
        pub fn render_pdf_sync(
            &self,
            scenario: &Scenario,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            raster::svg_to_pdf(&self.render_svg_sync(scenario)?, raster)
        }

        /// Raster options matching this renderer's dpi and background.
        #[cfg(feature = "raster")]
        pub fn raster_options(&self) -> raster::RasterOptions {
            let mut options = raster::RasterOptions {
                scale: self.config.raster_scale() as f32,
                ..Default::default()
            };
            if let Some(bg) = &self.svg.background {
                options.background = Some(bg.clone());
            }
            options
        }
    }

}
