//! Canonical shape projection and content hashing.
//!
//! # Closed field schema
//!
//! Every nesting level of a raw shape (shape, text component, frame, image
//! component) declares its full field set, split into *significant* (kept)
//! and *irrelevant* (stripped) keys. A field outside that union, or a
//! missing significant field, fails the shape with
//! [`CanonError::SchemaViolation`] — a schema-drift tripwire, not a soft
//! warning: a new upstream field must be classified before it can flow into
//! the hash.
//!
//! # Precision
//!
//! Geometry is stored fixed-point so canonical JSON is bit-stable and
//! sorting needs no float ordering: 3-decimal fields (frame and image
//! geometry) become integer thousandths, integer-tier fields (fold line)
//! become plain integers.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::CanonError;
use crate::labels::LabelMapper;

// ---------------------------------------------------------------------------
// Field schema, per nesting level
// ---------------------------------------------------------------------------

struct Level {
    /// Kept fields that must be present.
    required: &'static [&'static str],
    /// Kept fields that may be absent or null.
    optional: &'static [&'static str],
    /// Declared-but-stripped fields; presence is allowed, never required.
    irrelevant: &'static [&'static str],
}

const SHAPE: Level = Level {
    required: &[
        "brandId",
        "sectionId",
        "genreId",
        "shapeTypeId",
        "textComponents",
        "imageComponents",
    ],
    optional: &["foldLine"],
    irrelevant: &["brandName", "sectionName", "genreName", "shapeTypeName"],
};

const TEXT_COMPONENT: Level = Level {
    required: &["type", "firstParagraphStyle", "frames"],
    optional: &[],
    irrelevant: &["text", "wordCount", "charCount"],
};

const FRAME: Level = Level {
    required: &["x", "y", "width", "height", "wrapMode"],
    optional: &[],
    irrelevant: &["words", "chars"],
};

const IMAGE_COMPONENT: Level = Level {
    required: &["x", "y", "width", "height", "wrapMode"],
    optional: &[],
    irrelevant: &["name"],
};

// ---------------------------------------------------------------------------
// Canonical types — serde field order is the hash serialization order
// ---------------------------------------------------------------------------

/// Lowercase hex SHA-256 digest of a canonical shape's JSON bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Order-independent, precision-bounded projection of one article shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalShape {
    pub brand_id: String,
    pub section_id: String,
    pub genre_id: String,
    pub shape_type_id: String,
    pub fold_line: Option<i64>,
    pub text_components: Vec<CanonicalText>,
    pub image_components: Vec<CanonicalImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalText {
    #[serde(rename = "type")]
    pub component_type: String,
    pub first_paragraph_style: String,
    pub frames: Vec<CanonicalFrame>,
}

/// Frame geometry in integer thousandths of the source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFrame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub wrap_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalImage {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub wrap_mode: String,
}

// ---------------------------------------------------------------------------
// Canonicalize
// ---------------------------------------------------------------------------

/// Validate, strip, round, and order-normalize one raw shape.
pub fn canonicalize(raw: &Value, mapper: &dyn LabelMapper) -> Result<CanonicalShape, CanonError> {
    let shape = check_level(raw, &SHAPE, "shape")?;

    let mut text_components = Vec::new();
    for (i, component) in require_array(shape, "textComponents", "shape")?
        .iter()
        .enumerate()
    {
        let path = format!("textComponents[{i}]");
        text_components.push(canonicalize_text(component, mapper, &path)?);
    }
    text_components.sort_by(|a, b| {
        (a.component_type.as_str(), a.first_paragraph_style.as_str())
            .cmp(&(b.component_type.as_str(), b.first_paragraph_style.as_str()))
    });

    let mut image_components = Vec::new();
    for (i, component) in require_array(shape, "imageComponents", "shape")?
        .iter()
        .enumerate()
    {
        let path = format!("imageComponents[{i}]");
        let map = check_level(component, &IMAGE_COMPONENT, &path)?;
        image_components.push(CanonicalImage {
            x: milli(map, "x", &path)?,
            y: milli(map, "y", &path)?,
            width: milli(map, "width", &path)?,
            height: milli(map, "height", &path)?,
            wrap_mode: string(map, "wrapMode", &path)?,
        });
    }
    image_components.sort_by_key(|c| (c.y, c.x));

    Ok(CanonicalShape {
        brand_id: string(shape, "brandId", "shape")?,
        section_id: string(shape, "sectionId", "shape")?,
        genre_id: string(shape, "genreId", "shape")?,
        shape_type_id: string(shape, "shapeTypeId", "shape")?,
        fold_line: whole(shape, "foldLine", "shape")?,
        text_components,
        image_components,
    })
}

fn canonicalize_text(
    component: &Value,
    mapper: &dyn LabelMapper,
    path: &str,
) -> Result<CanonicalText, CanonError> {
    let map = check_level(component, &TEXT_COMPONENT, path)?;

    let raw_frames = require_array(map, "frames", path)?;
    if raw_frames.is_empty() {
        return Err(CanonError::SchemaViolation {
            path: path.to_owned(),
            detail: "text component has no frames".to_owned(),
        });
    }
    let mut frames = Vec::with_capacity(raw_frames.len());
    for (i, frame) in raw_frames.iter().enumerate() {
        let frame_path = format!("{path}.frames[{i}]");
        let map = check_level(frame, &FRAME, &frame_path)?;
        frames.push(CanonicalFrame {
            x: milli(map, "x", &frame_path)?,
            y: milli(map, "y", &frame_path)?,
            width: milli(map, "width", &frame_path)?,
            height: milli(map, "height", &frame_path)?,
            wrap_mode: string(map, "wrapMode", &frame_path)?,
        });
    }
    frames.sort_by_key(|f| (f.y, f.x));

    Ok(CanonicalText {
        component_type: mapper.normalize(&string(map, "type", path)?)?,
        first_paragraph_style: string(map, "firstParagraphStyle", path)?,
        frames,
    })
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 over the canonical JSON bytes (fixed struct field order).
pub fn hash(shape: &CanonicalShape) -> Result<ContentHash, CanonError> {
    let bytes = serde_json::to_vec(shape)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Canonicalize and hash in one step.
pub fn hash_shape(raw: &Value, mapper: &dyn LabelMapper) -> Result<ContentHash, CanonError> {
    hash(&canonicalize(raw, mapper)?)
}

// ---------------------------------------------------------------------------
// Value access with schema enforcement
// ---------------------------------------------------------------------------

fn violation(path: &str, detail: impl Into<String>) -> CanonError {
    CanonError::SchemaViolation {
        path: path.to_owned(),
        detail: detail.into(),
    }
}

/// Check the full key set of one object level against its declared schema.
fn check_level<'a>(
    value: &'a Value,
    level: &Level,
    path: &str,
) -> Result<&'a Map<String, Value>, CanonError> {
    let map = value
        .as_object()
        .ok_or_else(|| violation(path, "expected an object"))?;

    for key in map.keys() {
        let known = level.required.contains(&key.as_str())
            || level.optional.contains(&key.as_str())
            || level.irrelevant.contains(&key.as_str());
        if !known {
            return Err(violation(path, format!("unknown field '{key}'")));
        }
    }
    for key in level.required {
        if !map.contains_key(*key) {
            return Err(violation(path, format!("missing field '{key}'")));
        }
    }
    Ok(map)
}

/// A required scalar kept as a string; numeric ids are normalized to their
/// decimal form.
fn string(map: &Map<String, Value>, key: &str, path: &str) -> Result<String, CanonError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(violation(
            path,
            format!("field '{key}' must be a string, got {other}"),
        )),
        None => Err(violation(path, format!("missing field '{key}'"))),
    }
}

fn number(map: &Map<String, Value>, key: &str, path: &str) -> Result<f64, CanonError> {
    match map.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| violation(path, format!("field '{key}' is not a finite number"))),
        Some(other) => Err(violation(
            path,
            format!("field '{key}' must be a number, got {other}"),
        )),
        None => Err(violation(path, format!("missing field '{key}'"))),
    }
}

/// 3-decimal precision tier: value in integer thousandths.
fn milli(map: &Map<String, Value>, key: &str, path: &str) -> Result<i64, CanonError> {
    Ok((number(map, key, path)? * 1000.0).round() as i64)
}

/// Integer precision tier for an optional field; absent and null both map to
/// `None`.
fn whole(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<i64>, CanonError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => Ok(Some(number(map, key, path)?.round() as i64)),
    }
}

fn require_array<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Vec<Value>, CanonError> {
    map.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| violation(path, format!("field '{key}' must be an array")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
