//! SVG artwork to laser segments.
//!
//! The pipeline runs in four steps:
//!
//! 1. [`preprocess`] normalizes the raw document and rejects empty artwork
//! 2. [`VectorImage`] holds one normalized item with its placement
//! 3. [`flatten`] turns paths into placed, clipped point streams
//! 4. [`SegmentWalk`] pulls segments out of every item, one item at a time

pub mod flatten;
mod image;
pub mod preprocess;
mod walker;

pub use flatten::{PathCommand, PathElement, parse_elements, process};
pub use image::{Placement, VectorImage};
pub use preprocess::{Preprocessed, preprocess};
pub use walker::{PathSegments, SegmentWalk, SvgFactory, walk};
