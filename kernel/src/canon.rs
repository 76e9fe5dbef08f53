//! Canonical serialization and content hashing: the single place the HIR
//! compiler turns a value into deterministic bytes and a digest.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order).
//! 2. No extraneous whitespace (compact form: `{"a":1,"b":2}`).
//! 3. Strings are JSON-escaped per RFC 8259 §7; non-ASCII passes through as
//!    UTF-8 rather than `\u`-escaping.
//! 4. Integers render as plain decimal. Doubles render with the shortest
//!    representation that round-trips, except `NaN`, `+Infinity`, and
//!    `-Infinity`, which are not valid JSON numbers and are instead written
//!    as the quoted strings `"NaN"`, `"Inf"`, `"-Inf"`.
//! 5. `null`, `true`, `false` are written literally.
//!
//! [`CanonValue`] is deliberately distinct from `serde_json::Value`: the
//! latter has no way to distinguish an integer from a double, or to carry a
//! non-finite double at all, both of which this module's hashing contract
//! depends on.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;

/// A value in the canonical hashing domain.
///
/// Unlike `serde_json::Value`, [`CanonValue::Int`] and [`CanonValue::Double`]
/// are distinct variants (so `1` and `1.0` hash differently), and
/// [`CanonValue::Double`] may hold `NaN` or infinite values.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(Vec<CanonValue>),
    Object(BTreeMap<String, CanonValue>),
}

impl CanonValue {
    #[must_use]
    pub fn object(entries: impl IntoIterator<Item = (String, CanonValue)>) -> Self {
        Self::Object(entries.into_iter().collect())
    }

    #[must_use]
    pub fn array(items: impl IntoIterator<Item = CanonValue>) -> Self {
        Self::Array(items.into_iter().collect())
    }
}

impl From<&str> for CanonValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for CanonValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for CanonValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for CanonValue {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<bool> for CanonValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Error producing canonical bytes. Currently infallible by construction,
/// kept as a type so the signature can grow without breaking callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A double's shortest representation failed to round-trip (should be
    /// unreachable; Rust's `Debug` formatter for `f64` is round-trip exact).
    DoubleDidNotRoundTrip { raw: String },
}

impl std::fmt::Display for CanonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoubleDidNotRoundTrip { raw } => {
                write!(f, "double did not round-trip through canonical form: {raw}")
            }
        }
    }
}

impl std::error::Error for CanonError {}

/// Produce canonical bytes from a [`CanonValue`].
///
/// # Errors
///
/// Returns [`CanonError`] if a double's canonical rendering does not parse
/// back to the same bit pattern (defensive; not expected to trigger).
pub fn canonical_bytes(value: &CanonValue) -> Result<Vec<u8>, CanonError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

/// Compute `hid_struct`: the lowercase-hex SHA-256 digest of `value`'s
/// canonical bytes.
///
/// # Errors
///
/// Propagates [`CanonError`] from [`canonical_bytes`].
pub fn hid_struct(value: &CanonValue) -> Result<String, CanonError> {
    let bytes = canonical_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn write_value(buf: &mut Vec<u8>, value: &CanonValue) -> Result<(), CanonError> {
    match value {
        CanonValue::Null => buf.extend_from_slice(b"null"),
        CanonValue::Bool(true) => buf.extend_from_slice(b"true"),
        CanonValue::Bool(false) => buf.extend_from_slice(b"false"),
        CanonValue::Int(i) => {
            let _ = write!(buf, "{i}");
        }
        CanonValue::Double(d) => write_double(buf, *d)?,
        CanonValue::Str(s) => write_string(buf, s),
        CanonValue::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
        }
        CanonValue::Object(map) => {
            // BTreeMap already iterates in sorted key order.
            buf.push(b'{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, key);
                buf.push(b':');
                write_value(buf, val)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

/// Non-finite doubles are not valid JSON; write them as the quoted sentinel
/// strings `"NaN"` / `"Inf"` / `"-Inf"`. Finite doubles render via the
/// shortest representation that round-trips (Rust's `Debug` for `f64`),
/// which satisfies the "17 significant digits, shortest unique" contract.
fn write_double(buf: &mut Vec<u8>, d: f64) -> Result<(), CanonError> {
    if d.is_nan() {
        write_string(buf, "NaN");
        return Ok(());
    }
    if d.is_infinite() {
        write_string(buf, if d > 0.0 { "Inf" } else { "-Inf" });
        return Ok(());
    }

    let rendered = format!("{d:?}");
    // `{:?}` on a finite f64 with no fractional digits prints without a
    // decimal point (e.g. "1"); normalize to "1.0" so it is unambiguously a
    // double and not confusable with a CanonValue::Int in canonical bytes.
    let rendered = if rendered.contains('.')
        || rendered.contains('e')
        || rendered.contains('E')
    {
        rendered
    } else {
        format!("{rendered}.0")
    };

    let roundtrip: f64 = rendered.parse().map_err(|_| CanonError::DoubleDidNotRoundTrip {
        raw: rendered.clone(),
    })?;
    if roundtrip.to_bits() != d.to_bits() {
        return Err(CanonError::DoubleDidNotRoundTrip { raw: rendered });
    }

    buf.extend_from_slice(rendered.as_bytes());
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut utf8_buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut utf8_buf);
                buf.extend_from_slice(encoded.as_bytes());
            }
        }
    }
    buf.push(b'"');
}
