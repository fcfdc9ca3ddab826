//! Parametric calibration patterns
//!
//! Each pattern produces a complete toolpath from configuration alone:
//!
//! - [`Logo`]: alignment logo drawn through the design-space shift
//! - [`Grid`]: two-axis chord grid across the workspace disk
//! - [`FindFocal`]: rows of test ticks at decreasing focal heights

mod focal;
mod grid;
mod logo;

use crate::gcode::render_program;
use crate::types::Toolpath;

pub use focal::{FindFocal, z_candidates};
pub use grid::{Grid, grid_chords};
pub use logo::{Logo, LogoStroke, STROKES};

/// A toolpath generator with fixed parameters
pub trait Pattern {
    /// Label written into the program header
    fn label(&self) -> &'static str;

    fn generate(&self) -> Toolpath;

    /// Render the generated toolpath as a firmware program
    fn to_program(&self) -> String {
        render_program(&self.generate())
    }
}
