//! Canonical JSON encoding for hash input.
//!
//! The byte layout matches Python's `json.dumps(obj, sort_keys=True)`:
//!
//! - object keys in sorted order
//! - `", "` between members, `": "` between key and value
//! - every character outside printable ASCII escaped as `\uXXXX` (lowercase
//!   hex, UTF-16 surrogate pairs above the BMP)
//!
//! Digests computed over this encoding are reproducible across languages.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

use crate::hasher::HasherError;

/// Encode a value into canonical bytes.
///
/// The value is first converted into a `serde_json::Value`, whose object map
/// is ordered by key, so the output does not depend on struct field order.
pub fn to_canonical_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, HasherError> {
    let tree = serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
    let sorted = sort_keys(tree);
    let mut out = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut out, SortedAsciiFormatter);
    sorted
        .serialize(&mut ser)
        .map_err(|e| HasherError::Serialization(e.to_string()))?;
    Ok(out)
}

// Re-sorts explicitly in case `serde_json/preserve_order` is enabled elsewhere
// in the dependency graph.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

struct SortedAsciiFormatter;

impl Formatter for SortedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
