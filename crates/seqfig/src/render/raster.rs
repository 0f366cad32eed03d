#![forbid(unsafe_code)]

use crate::render::{HeadlessError, HeadlessRenderer, write_file};
use seqfig_render::Scenario;
use seqfig_render::config::POINTS_PER_INCH;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Headless(#[from] HeadlessError),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color: {value}")]
    Background { value: String },
    #[error("JPG rendering requires an opaque background color (e.g. white)")]
    JpegOpaqueBackgroundRequired,
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown output format `{other}` (expected svg, png, jpg or pdf)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Pixels per SVG user unit (point).
    pub scale: f32,
    /// Fill behind the figure. Transparent when unset; JPG requires an opaque color.
    pub background: Option<String>,
    pub jpeg_quality: u8,
    /// Fallback family for text without a resolvable `font-family`.
    pub font_family: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::at_dpi(300.0)
    }
}

impl RasterOptions {
    pub fn at_dpi(dpi: f64) -> Self {
        Self {
            scale: (dpi / POINTS_PER_INCH) as f32,
            background: Some("white".to_string()),
            jpeg_quality: 90,
            font_family: "DejaVu Sans".to_string(),
        }
    }
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

pub fn svg_to_jpeg(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let bg = options.background.as_deref().unwrap_or("white");
    let color = parse_color(bg).ok_or_else(|| RasterError::Background {
        value: bg.to_string(),
    })?;
    if color.alpha() != 1.0 {
        return Err(RasterError::JpegOpaqueBackgroundRequired);
    }

    let pixmap = svg_to_pixmap(svg, options, Some(bg))?;
    let (w, h) = (pixmap.width(), pixmap.height());

    // Opaque fill underneath, so alpha is always 255 and can be dropped.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
        .map_err(|_| RasterError::JpegEncode)?;
    Ok(out)
}

/// Converts at 72 dpi so one SVG user unit stays one PDF point.
pub fn svg_to_pdf(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = options.font_family.clone();

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| RasterError::PdfConvert)
}

fn svg_to_pixmap(
    svg: &str,
    options: &RasterOptions,
    background: Option<&str>,
) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = options.font_family.clone();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;

    // The root viewBox is applied by usvg itself, including a non-zero min corner.
    let size = tree.size();
    let scale = options.scale;
    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    if let Some(bg) = background {
        let color = parse_color(bg).ok_or_else(|| RasterError::Background {
            value: bg.to_string(),
        })?;
        pixmap.fill(color);
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

/// Accepts `white`, `black`, `transparent`/`none` and `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`.
fn parse_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    let [r, g, b, a] = match s.as_str() {
        "transparent" | "none" => [0, 0, 0, 0],
        "white" => [255, 255, 255, 255],
        "black" => [0, 0, 0, 255],
        _ => {
            let hex = s.strip_prefix('#')?;
            if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            let channels: Vec<u8> = match hex.len() {
                3 | 4 => hex
                    .chars()
                    .map(|c| c.to_digit(16).map(|v| (v * 17) as u8))
                    .collect::<Option<_>>()?,
                6 | 8 => (0..hex.len())
                    .step_by(2)
                    .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
                    .collect::<Option<_>>()?,
                _ => return None,
            };
            [
                channels[0],
                channels[1],
                channels[2],
                channels.get(3).copied().unwrap_or(255),
            ]
        }
    };
    Some(tiny_skia::Color::from_rgba8(r, g, b, a))
}

/// Renders the scenario once and writes `<dir>/<stem>.<ext>` for every requested format.
///
/// The directory must already exist. Returns the written paths in request order.
pub fn write_figures(
    renderer: &HeadlessRenderer,
    scenario: &Scenario,
    raster: &RasterOptions,
    dir: &Path,
    stem: &str,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    let svg = renderer.render_svg_sync(scenario)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        let bytes = match format {
            OutputFormat::Svg => svg.as_bytes().to_vec(),
            OutputFormat::Png => svg_to_png(&svg, raster)?,
            OutputFormat::Jpeg => svg_to_jpeg(&svg, raster)?,
            OutputFormat::Pdf => svg_to_pdf(&svg, raster)?,
        };
        write_file(&path, &bytes)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10"><rect width="10" height="10" fill="black"/></svg>"#;

    #[test]
    fn svg_to_png_produces_png_signature() {
        let bytes = svg_to_png(SQUARE, &RasterOptions::default()).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn svg_to_pdf_produces_pdf_signature() {
        let bytes = svg_to_pdf(SQUARE, &RasterOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn pixmap_size_follows_dpi() {
        let pixmap = svg_to_pixmap(SQUARE, &RasterOptions::at_dpi(144.0), None).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 20));
        let pixmap = svg_to_pixmap(SQUARE, &RasterOptions::default(), None).unwrap();
        assert_eq!(pixmap.width(), 42);
    }

    #[test]
    fn jpeg_rejects_translucent_backgrounds() {
        let opts = RasterOptions {
            background: Some("#ffffff80".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svg_to_jpeg(SQUARE, &opts),
            Err(RasterError::JpegOpaqueBackgroundRequired)
        ));

        let opts = RasterOptions {
            background: Some("papayawhip".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            svg_to_png(SQUARE, &opts),
            Err(RasterError::Background { .. })
        ));
    }

    #[test]
    fn parse_color_accepts_short_and_long_hex() {
        let c = parse_color("#fff").unwrap();
        assert_eq!(c, tiny_skia::Color::from_rgba8(255, 255, 255, 255));
        let c = parse_color(" #2C3E50 ").unwrap();
        assert_eq!(c, tiny_skia::Color::from_rgba8(0x2c, 0x3e, 0x50, 255));
        let c = parse_color("#00000000").unwrap();
        assert_eq!(c.alpha(), 0.0);
        assert!(parse_color("#12345").is_none());
        assert!(parse_color("#gggggg").is_none());
        assert!(parse_color("red").is_none());
    }

    #[test]
    fn output_format_parses_common_spellings() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("jpeg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!("tiff".parse::<OutputFormat>().is_err());
    }
}
