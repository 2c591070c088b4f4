// src/gps/nmea.rs
//! NMEA sentence tokenizing and field decoding
//!
//! Decoding is tolerant: a field that does not parse decodes to zero and the
//! caller carries on. Zero doubles as "not set yet" for the fix assembler.

use super::fields::{self, Field, SentenceKind};
use std::{collections::HashMap, str::FromStr};

/// Raw column values of one recognized sentence, grouped by field name in
/// column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap<'a> {
    kind: Option<SentenceKind>,
    values: HashMap<Field, Vec<&'a str>>,
}

impl<'a> FieldMap<'a> {
    /// Sentence type the values came from, `None` for an ignored line
    pub fn kind(&self) -> Option<SentenceKind> {
        self.kind
    }

    /// Raw values collected for `field`, empty if the field was not present
    pub fn get(&self, field: Field) -> &[&'a str] {
        self.values.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct fields collected
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Split a raw line into named fields using the sentence's column layout.
///
/// Unknown sentence identifiers and lines with fewer columns than the layout
/// produce an empty map. Columns past the end of the layout are dropped.
pub fn tokenize(line: &str) -> FieldMap<'_> {
    let parts: Vec<&str> = line.trim().split(',').collect();

    let layout = match fields::lookup(parts[0]) {
        Some(layout) => layout,
        None => return FieldMap::default(),
    };

    if parts.len() < layout.fields.len() {
        return FieldMap::default();
    }

    let mut values: HashMap<Field, Vec<&str>> = HashMap::new();
    for (field, part) in layout.fields.iter().zip(parts) {
        if *field != Field::Ignored {
            values.entry(*field).or_default().push(part);
        }
    }

    FieldMap {
        kind: Some(layout.kind),
        values,
    }
}

/// Parse the first raw value as a base-10 integer, zero on failure
pub fn parse_int<T: FromStr + Default>(raw: &[&str]) -> T {
    raw.first()
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

/// Parse the first raw value as a float, zero on failure
pub fn parse_float(raw: &[&str]) -> f64 {
    raw.first()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.0)
}

/// Parse an `hhmmss[.ss]` timestamp into `hhmmss`, dropping sub-seconds
pub fn parse_time(raw: &[&str]) -> u32 {
    raw.first()
        .and_then(|value| value.split('.').next())
        .and_then(|whole| whole.parse().ok())
        .unwrap_or(0)
}

/// Decode a `DDMM.MMMM` value and its hemisphere letter into signed decimal
/// degrees rounded to 8 places. Malformed input decodes to `0.0`.
pub fn parse_coordinate(raw: &[&str]) -> f64 {
    let (value, hemisphere) = match raw {
        [value, hemisphere] if !value.is_empty() => (*value, *hemisphere),
        _ => return 0.0,
    };

    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    if whole.len() < 2 || !whole.is_char_boundary(whole.len() - 2) {
        return 0.0;
    }

    let (degrees, minutes) = whole.split_at(whole.len() - 2);
    if !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return 0.0;
    }
    // Sign comes only from the hemisphere letter
    let degrees: u32 = match degrees.parse() {
        Ok(degrees) => degrees,
        Err(_) => return 0.0,
    };
    let minutes = match fraction {
        Some(fraction) => format!("{}.{}", minutes, fraction).parse::<f64>(),
        None => minutes.parse::<f64>(),
    };
    let minutes = match minutes {
        Ok(minutes) => minutes,
        Err(_) => return 0.0,
    };

    let decimal = round(degrees as f64 + minutes / 60.0, 8);
    match hemisphere {
        "S" | "W" => -decimal,
        _ => decimal,
    }
}

/// Round half away from zero to `places` decimal places
fn round(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
