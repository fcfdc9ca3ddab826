//! Scan ordering for chord patterns.
//!
//! Chords are grouped by their dominant axis and sorted by the coordinate
//! they sit on, so neighbouring strokes are drawn one after the other
//! instead of crossing the whole disk between them. Horizontal chords come
//! first, then vertical ones; the two groups are concatenated, not
//! interleaved.

use crate::types::Point2D;

/// Dominant direction of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Undirected stroke tagged with its axis and sort key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    pub start: Point2D,
    pub end: Point2D,
    pub axis: Axis,
    /// Fixed coordinate of the chord: y for horizontal, x for vertical
    pub key: f64,
}

impl Chord {
    pub fn horizontal(start: Point2D, end: Point2D) -> Self {
        Self {
            start,
            end,
            axis: Axis::Horizontal,
            key: end.y,
        }
    }

    pub fn vertical(start: Point2D, end: Point2D) -> Self {
        Self {
            start,
            end,
            axis: Axis::Vertical,
            key: start.x,
        }
    }
}

/// Order chords for drawing. The sort is stable: chords with equal keys keep
/// their insertion order.
pub fn order_chords(chords: Vec<Chord>) -> Vec<Chord> {
    let (mut horizontal, mut vertical): (Vec<Chord>, Vec<Chord>) = chords
        .into_iter()
        .partition(|c| c.axis == Axis::Horizontal);

    horizontal.sort_by(|a, b| a.key.total_cmp(&b.key));
    vertical.sort_by(|a, b| a.key.total_cmp(&b.key));

    horizontal.extend(vertical);
    horizontal
}
