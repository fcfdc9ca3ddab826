use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use laser_toolpath::patterns::{FindFocal, Grid, Logo, Pattern};
use laser_toolpath::svg::{SvgFactory, VectorImage};
use laser_toolpath::{Config, Point2D, init_logging, render_program};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Toolpath programs for a radial-workspace laser engraver
#[derive(Parser)]
#[command(name = "laser-toolpath")]
#[command(version)]
#[command(about = "Generate calibration patterns and SVG toolpaths", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output program file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alignment logo
    Logo,

    /// Bed grid across the workspace
    Grid,

    /// Focal length sweep
    Focal,

    /// Place SVG artwork and trace its paths
    Svg {
        /// SVG files, all placed at the same position
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Machine position of the viewBox top-left corner, as X,Y
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        point1: Point2D,

        /// Machine position of the viewBox bottom-right corner, as X,Y
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        point2: Point2D,

        /// Rotation in degrees about the middle of the placement
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotation: f64,

        /// Write a grayscale PNG preview of the placed artwork
        #[arg(long)]
        preview: Option<PathBuf>,
    },
}

fn parse_point(s: &str) -> std::result::Result<Point2D, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad X '{}': {}", x, e))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad Y '{}': {}", y, e))?;
    Ok(Point2D::new(x, y))
}

fn svg_program(
    config: &Config,
    files: &[PathBuf],
    point1: Point2D,
    point2: Point2D,
    rotation: f64,
    preview: Option<&PathBuf>,
) -> Result<String> {
    let mut factory = SvgFactory::from_config(&config.machine);

    for path in files {
        let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let mut image =
            VectorImage::new(raw).with_context(|| format!("loading {}", path.display()))?;
        image
            .set_placement(point1, point2, rotation)
            .with_context(|| format!("placing {}", path.display()))?;
        if preview.is_some() {
            let ppm = config.machine.pixel_per_mm as f64;
            let width = ((point2.x - point1.x).abs() * ppm).ceil() as u32;
            let height = ((point2.y - point1.y).abs() * ppm).ceil() as u32;
            let outline = image.render_outline(width, height)?;
            let size = outline.dimensions();
            image.set_preview(size, outline.into_raw())?;
        }
        factory.add_image(image);
    }

    let events = factory.generate_program(|p| {
        tracing::info!("Progress: {:.0}%", p * 100.0);
    })?;

    if let Some(preview) = preview {
        let png = factory.generate_preview()?;
        fs::write(preview, png).with_context(|| format!("writing {}", preview.display()))?;
        tracing::info!("Preview written to {}", preview.display());
    }

    Ok(render_program(&events))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::default(),
    };

    let program = match &cli.command {
        Commands::Logo => Logo::new(config.logo.clone()).to_program(),
        Commands::Grid => Grid::new(config.machine.radius, config.grid.clone()).to_program(),
        Commands::Focal => {
            FindFocal::new(config.focal.clone(), config.machine.object_height).to_program()
        }
        Commands::Svg {
            files,
            point1,
            point2,
            rotation,
            preview,
        } => {
            if files.is_empty() {
                bail!("no SVG files given");
            }
            svg_program(&config, files, *point1, *point2, *rotation, preview.as_ref())?
        }
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &program).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Program written to {}", path.display());
        }
        None => {
            io::stdout()
                .lock()
                .write_all(program.as_bytes())
                .context("writing program to stdout")?;
        }
    }
    Ok(())
}
