//! Sentinel-aware float encoding.
//!
//! JSON has no representation for infinities, and `serde_json` silently turns
//! them into `null`. Values such as an infinite lifetime ratio are written as
//! the strings `"inf"`, `"-inf"` and `"nan"` instead and read back from either
//! form.

use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserializer, Serializer};

/// Parses a float token, accepting the `inf`/`-inf`/`nan` sentinels.
pub fn parse_sentinel_f64(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => trimmed.parse::<f64>().ok(),
    }
}

/// Formats a float for tabular export, writing sentinels for non-finite values.
pub fn format_sentinel_f64(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value}")
    }
}

/// `#[serde(with = "cav_core::floats::sentinel")]` adapter for `f64` fields.
pub mod sentinel {
    use super::*;

    /// Serializes finite values as numbers and non-finite values as strings.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&format_sentinel_f64(*value))
        }
    }

    /// Accepts numbers or sentinel strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(SentinelVisitor)
    }
}

struct SentinelVisitor;

impl<'de> Visitor<'de> for SentinelVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or one of \"inf\", \"-inf\", \"nan\"")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
        Ok(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
        parse_sentinel_f64(value).ok_or_else(|| E::invalid_value(Unexpected::Str(value), &self))
    }
}
