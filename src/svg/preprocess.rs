//! SVG normalization ahead of flattening.
//!
//! The preprocessor rewrites the document so its user space is exactly the
//! viewBox: the root `width`/`height` are replaced by the viewBox size and
//! content the laser cannot draw (bitmaps, text, scripts, metadata) is
//! stripped. Artwork left without a single drawable path is rejected as
//! EMPTY.

use super::flatten::parse_elements;
use crate::error::{Result, ToolpathError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Elements removed together with their content
const STRIPPED_ELEMENTS: [&[u8]; 7] = [
    b"image",
    b"text",
    b"script",
    b"metadata",
    b"title",
    b"desc",
    b"foreignObject",
];

/// Normalized artwork ready for placement
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Non-fatal findings, e.g. stripped bitmaps
    pub warnings: Vec<String>,
    pub buf: Vec<u8>,
    pub viewbox_width: f64,
    pub viewbox_height: f64,
}

/// Parse "0 0 100 50" or "0,0,100,50"
fn parse_view_box(value: &str) -> Option<(f64, f64, f64, f64)> {
    let parts: Vec<f64> = value
        .replace(',', " ")
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();

    if parts.len() == 4 && parts[2] > 0.0 && parts[3] > 0.0 {
        Some((parts[0], parts[1], parts[2], parts[3]))
    } else {
        None
    }
}

/// Parse a length such as "100", "100mm" or "12.5px", ignoring the unit
fn parse_length(value: &str) -> Option<f64> {
    let number = value
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    number.parse().ok().filter(|n: &f64| *n > 0.0)
}

/// Rebuild the root element with its size pinned to the viewBox
fn normalize_root(e: &BytesStart) -> Result<(BytesStart<'static>, f64, f64)> {
    let mut view_box = None;
    let mut width = None;
    let mut height = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.local_name().as_ref())
            .unwrap_or("")
            .to_string();
        let value = std::str::from_utf8(&attr.value).unwrap_or("");
        match key.as_str() {
            "viewBox" => view_box = parse_view_box(value),
            "width" => width = parse_length(value),
            "height" => height = parse_length(value),
            _ => {}
        }
    }

    let (min_x, min_y, w, h) = match (view_box, width, height) {
        (Some(vb), _, _) => vb,
        (None, Some(w), Some(h)) => (0.0, 0.0, w, h),
        _ => {
            return Err(ToolpathError::malformed(
                "root element has neither a viewBox nor a width and height",
            ));
        }
    };

    let mut root = BytesStart::new("svg");
    let mut has_namespace = false;
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"xmlns" {
            has_namespace = true;
        }
        let key = attr.key.local_name();
        if matches!(key.as_ref(), b"viewBox" | b"width" | b"height") {
            continue;
        }
        root.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
    }
    if !has_namespace {
        root.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    }
    let vb = format!("{} {} {} {}", min_x, min_y, w, h);
    let (w_str, h_str) = (w.to_string(), h.to_string());
    root.push_attribute(("viewBox", vb.as_str()));
    root.push_attribute(("width", w_str.as_str()));
    root.push_attribute(("height", h_str.as_str()));

    Ok((root, w, h))
}

/// Normalize raw SVG bytes.
///
/// Fails with [`ToolpathError::EmptyArtwork`] when nothing drawable is left
/// and with [`ToolpathError::MalformedPath`] when the document cannot be read.
pub fn preprocess(raw: &[u8]) -> Result<Preprocessed> {
    let mut reader = Reader::from_reader(raw);
    let mut writer = Writer::new(Vec::with_capacity(raw.len()));
    let mut warnings: Vec<String> = Vec::new();
    let mut view_box: Option<(f64, f64)> = None;

    let mut buf = Vec::new();
    let mut skip_depth = 0usize;

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ToolpathError::malformed(format!("XML parsing error: {}", e)))?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        let out = match event {
            Event::Start(ref e) if is_stripped(e) => {
                warnings.push(stripped_warning(e));
                skip_depth = 1;
                None
            }
            Event::Empty(ref e) if is_stripped(e) => {
                warnings.push(stripped_warning(e));
                None
            }
            Event::Start(ref e) if view_box.is_none() && e.local_name().as_ref() == b"svg" => {
                let (root, w, h) = normalize_root(e)?;
                view_box = Some((w, h));
                Some(Event::Start(root))
            }
            Event::Empty(ref e) if view_box.is_none() && e.local_name().as_ref() == b"svg" => {
                // a self-closing root cannot hold any path
                return Err(ToolpathError::EmptyArtwork);
            }
            Event::Comment(_) | Event::PI(_) => None,
            Event::Eof => break,
            other => Some(other),
        };

        if let Some(out) = out {
            writer
                .write_event(out)
                .map_err(|e| ToolpathError::malformed(format!("XML writing error: {}", e)))?;
        }
    }

    let (viewbox_width, viewbox_height) =
        view_box.ok_or_else(|| ToolpathError::malformed("no <svg> root element"))?;
    let buf = writer.into_inner();

    let elements = parse_elements(&buf)?;
    if elements.is_empty() {
        tracing::debug!("Artwork rejected: no drawable path");
        return Err(ToolpathError::EmptyArtwork);
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    Ok(Preprocessed {
        warnings,
        buf,
        viewbox_width,
        viewbox_height,
    })
}

fn is_stripped(e: &BytesStart) -> bool {
    let name = e.local_name();
    STRIPPED_ELEMENTS.iter().any(|s| *s == name.as_ref())
}

fn stripped_warning(e: &BytesStart) -> String {
    format!(
        "<{}> element ignored: not drawable by the laser",
        String::from_utf8_lossy(e.local_name().as_ref())
    )
}
