use clap::Parser;
use seqfig::render::HeadlessRenderer;
use seqfig::render::raster::{self, OutputFormat};
use seqfig::{DiagramConfig, Scenario};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Input(#[from] seqfig::Error),
    #[error(transparent)]
    Raster(#[from] raster::RasterError),
}

/// Renders the research-phase sequence figure (Researcher agent, Javadoc MCP, CodeContext MCP).
///
/// With no arguments, writes `research-sequence.pdf` and `research-sequence.png` (300 dpi) to the
/// current directory.
#[derive(Debug, Parser)]
#[command(name = "seqfig", version, about)]
struct Cli {
    /// Directory the figures are written to. Must already exist.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// File stem shared by every output.
    #[arg(long, default_value = "research-sequence")]
    name: String,
    /// Output format; repeat for several. Defaults to pdf and png.
    #[arg(long = "format", value_name = "svg|png|jpg|pdf")]
    formats: Vec<OutputFormat>,
    /// Raster resolution; overrides the config file.
    #[arg(long)]
    dpi: Option<f64>,
    /// CSS color painted behind the figure.
    #[arg(long, default_value = "white")]
    background: String,
    /// JSON file with figure constants (camelCase keys, all optional).
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file with actors and steps replacing the built-in research phase.
    #[arg(long)]
    scenario: Option<PathBuf>,
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn requested_formats(formats: &[OutputFormat]) -> Vec<OutputFormat> {
    if formats.is_empty() {
        return vec![OutputFormat::Pdf, OutputFormat::Png];
    }
    let mut out = Vec::with_capacity(formats.len());
    for &f in formats {
        if !out.contains(&f) {
            out.push(f);
        }
    }
    out
}

/// `a`, `a and b`, `a, b and c`.
fn describe_outputs(out_dir: &Path, written: &[PathBuf]) -> String {
    let names: Vec<String> = written
        .iter()
        .map(|p| match p.strip_prefix(out_dir) {
            Ok(rel) if out_dir == Path::new(".") => rel.display().to_string(),
            _ => p.display().to_string(),
        })
        .collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => DiagramConfig::from_json_str(&read_input(path)?)?,
        None => DiagramConfig::default(),
    };
    if let Some(dpi) = cli.dpi {
        config.dpi = dpi;
    }
    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_json_str(&read_input(path)?)?,
        None => Scenario::research_phase(),
    };
    let formats = requested_formats(&cli.formats);
    tracing::debug!(?formats, out_dir = %cli.out_dir.display(), "rendering figure");

    let renderer = HeadlessRenderer::new()
        .with_config(config)
        .with_background(cli.background);
    let written = raster::write_figures(
        &renderer,
        &scenario,
        &renderer.raster_options(),
        &cli.out_dir,
        &cli.name,
        &formats,
    )?;

    println!(
        "Sequence diagram saved as {}",
        describe_outputs(&cli.out_dir, &written)
    );
    Ok(())
}

/// Used when `RUST_LOG` is unset. Font fallback notices from the SVG stack stay hidden.
const DEFAULT_LOG_FILTER: &str = "warn,usvg=error,resvg=error,svg2pdf=error,fontdb=error";

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() {
    // clap exits with status 2 on usage errors.
    let cli = Cli::parse();
    setup_logging();

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
