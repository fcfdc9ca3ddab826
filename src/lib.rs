//! # laser-toolpath
//!
//! Toolpath generation for a small radial-workspace laser engraver.
//!
//! ## Features
//!
//! - **Calibration patterns**: alignment logo, bed grid and focal sweep, see [`patterns`]
//! - **SVG artwork**: placed, flattened and clipped to the workspace disk, see [`svg`]
//! - **Program rendering**: toolpath events to firmware text, see [`gcode`]
//!
//! ## Example - Calibration Pattern
//!
//! ```rust,ignore
//! use laser_toolpath::patterns::{Grid, Pattern};
//!
//! let program = Grid::default().to_program();
//! std::fs::write("grid.gcode", program).unwrap();
//! ```
//!
//! ## Example - SVG Artwork
//!
//! ```rust,ignore
//! use laser_toolpath::{Point2D, render_program};
//! use laser_toolpath::svg::{SvgFactory, VectorImage};
//!
//! let mut image = VectorImage::new(std::fs::read("art.svg").unwrap()).unwrap();
//! image.set_placement(Point2D::new(-20.0, 20.0), Point2D::new(20.0, -20.0), 0.0).unwrap();
//!
//! let mut factory = SvgFactory::new(85.0);
//! factory.add_image(image);
//! let events = factory.generate_program(|p| println!("{:.0}%", p * 100.0)).unwrap();
//! std::fs::write("art.gcode", render_program(&events)).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod gcode;
pub mod ordering;
pub mod patterns;
pub mod svg;
pub mod transform;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use error::{Result, ToolpathError};
pub use gcode::{LaserEmitter, render_program};
pub use transform::PlacementTransform;
pub use types::{LaserPower, PathToken, Point2D, Segment, Toolpath, ToolpathEvent};

/// Install a `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // ignore a second initialization, e.g. from tests
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .try_init();
}
