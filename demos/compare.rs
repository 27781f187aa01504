//! Headless comparison tool: prints geometry of SVG documents and renders their overlay
//!
//! Kept under `demos/` rather than `examples/` since the repository root `examples/`
//! directory holds third-party reference code. The target is declared explicitly in
//! `Cargo.toml`, run it with `cargo run --example compare -- a.svg b.svg`.
#![deny(warnings)]

use clap::Parser;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};
use svg_comparator::*;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug, Parser)]
#[command(version, about = "Overlay SVG documents and annotate their path geometry")]
struct Args {
    /// SVG documents, the first one is at the bottom of the overlay
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Screen pixels per document unit
    #[arg(short, long, default_value_t = DEFAULT_SCALE)]
    scale: Scalar,

    /// Print geometry report as JSON
    #[arg(long)]
    json: bool,

    /// Include endpoints and control points in the text report
    #[arg(long)]
    points: bool,

    /// JSON file with annotation style
    #[arg(long)]
    style: Option<PathBuf>,

    /// Opacity of layer rasters
    #[arg(long, default_value_t = DEFAULT_OPACITY)]
    opacity: Scalar,

    /// Overlay image, PNG or BMP depending on the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overlay width in pixels, defaults to the widest layer
    #[arg(long)]
    width: Option<usize>,

    /// Overlay height in pixels, defaults to the tallest layer
    #[arg(long)]
    height: Option<usize>,
}

fn report_text(layers: &LayerStack, points: bool, out: &mut impl Write) -> Result<(), Error> {
    for layer in layers.iter() {
        let geometry = layer.geometry();
        writeln!(out, "{}", layer.name())?;
        writeln!(
            out,
            "  view box: {} ({}x{})",
            geometry.view_box(),
            geometry.width(),
            geometry.height()
        )?;
        writeln!(out, "  commands: {}", geometry.command_counts())?;
        writeln!(
            out,
            "  end points: {} control points: {}",
            geometry.end_points().len(),
            geometry.control_points().len()
        )?;
        for diagnostic in geometry.diagnostics() {
            writeln!(
                out,
                "  skipped {} segment {} of path {}",
                diagnostic.kind, diagnostic.segment, diagnostic.path
            )?;
        }
        if points {
            for point in geometry.end_points() {
                writeln!(out, "    end {:?}", point)?;
            }
            for point in geometry.control_points() {
                let owners: Vec<_> = geometry.owners_of(point).collect();
                writeln!(out, "    control {:?} -> {:?}", point, owners)?;
            }
        }
    }
    Ok(())
}

fn report_json(layers: &LayerStack, out: &mut impl Write) -> Result<(), Error> {
    let report: Vec<_> = layers
        .iter()
        .map(|layer| serde_json::json!({ "name": layer.name(), "geometry": layer.geometry() }))
        .collect();
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut layers = LayerStack::new();
    for file in args.files.iter() {
        let id = layers.open(file)?;
        if let Some(layer) = layers.get_mut(id) {
            layer.set_opacity(args.opacity);
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report_json(&layers, &mut out)?;
    } else {
        report_text(&layers, args.points, &mut out)?;
    }

    let Some(output) = args.output else {
        return Ok(());
    };
    let style = match &args.style {
        Some(path) => Style::from_json(&std::fs::read_to_string(path)?)?,
        None => Style::default(),
    };
    let fit = layers
        .iter()
        .map(|layer| raster_size(layer.geometry(), args.scale))
        .fold(Size::new(1, 1), |acc, size| {
            Size::new(acc.width.max(size.width), acc.height.max(size.height))
        });
    let size = Size::new(args.width.unwrap_or(fit.width), args.height.unwrap_or(fit.height));
    let view = View::new(args.scale, Point::new(0.0, 0.0));

    let rasterizer = ResvgRasterizer::new();
    let image = Overlay::new(style).render(&mut layers, &view, &rasterizer, size)?;

    let _guard = tracing::debug_span!("[save]", path = %output.display()).entered();
    let mut image_file = BufWriter::new(File::create(&output)?);
    let is_bmp = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"));
    if is_bmp {
        image.write_bmp(&mut image_file)?;
    } else {
        image.write_png(&mut image_file)?;
    }
    image_file.flush()?;
    Ok(())
}
