//! Data points appended to a chart.
//!
//! Each [`DataPoint`] carries one x value (typically the epoch or
//! iteration) and a flat metric-keyed map of measured values. A metric
//! with no value at a given x is represented by [`Sample::ABSENT`], which
//! serializes as `null` on the wire; the renderer skips, never plots, an
//! absent sample.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A single measured value, possibly absent.
///
/// JSON has no NaN, so absence travels as `null` and comes back as NaN.
/// Equality treats two absent samples as equal, so protocol payloads can
/// be compared structurally.
#[derive(Debug, Clone, Copy)]
pub struct Sample(f64);

impl Sample {
    /// The "no data for this series at this x" sentinel.
    pub const ABSENT: Sample = Sample(f64::NAN);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw value; NaN when absent.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.0.is_nan()
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        (self.is_absent() && other.is_absent()) || self.0 == other.0
    }
}

impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_absent() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or(f64::NAN)))
    }
}

/// One appended row: an x value and the metrics measured at that x.
///
/// Points are append-only; x is expected, but not enforced, to be
/// non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    /// Metric key -> measured value
    pub y: BTreeMap<String, Sample>,
}

impl DataPoint {
    /// Build a point from any iterable of `(metric key, value)` pairs.
    pub fn new<I, K>(x: f64, y: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            x,
            y: y.into_iter().map(|(key, value)| (key.into(), Sample::new(value))).collect(),
        }
    }

    /// Measured value for a metric, `None` when missing or absent.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.y.get(metric).filter(|sample| !sample.is_absent()).map(Sample::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_sample_serializes_as_null() {
        let point = DataPoint { x: 0.0, y: [("loss".to_string(), Sample::ABSENT)].into() };
        let json = serde_json::to_value(&point).unwrap();
        assert!(json["y"]["loss"].is_null());
    }

    #[test]
    fn test_null_deserializes_as_absent() {
        let point: DataPoint = serde_json::from_str(r#"{"x":1.0,"y":{"loss":null}}"#).unwrap();
        assert!(point.y["loss"].is_absent());
        assert_eq!(point.get("loss"), None);
    }

    #[test]
    fn test_present_value_round_trips() {
        let point = DataPoint::new(2.0, [("loss", 0.25)]);
        let json = serde_json::to_string(&point).unwrap();
        let back: DataPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
        assert_eq!(back.get("loss"), Some(0.25));
    }

    #[test]
    fn test_absent_samples_compare_equal() {
        assert_eq!(Sample::ABSENT, Sample::new(f64::NAN));
        assert_ne!(Sample::new(1.0), Sample::ABSENT);
        assert_eq!(Sample::new(1.0), Sample::new(1.0));
    }

    #[test]
    fn test_empty_point_is_valid() {
        let point = DataPoint::new(5.0, Vec::<(String, f64)>::new());
        assert!(point.y.is_empty());
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"x":5.0,"y":{}}"#);
    }

    #[test]
    fn test_key_order_is_deterministic() {
        let point = DataPoint::new(0.0, [("val_loss", 2.0), ("loss", 1.0)]);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"x":0.0,"y":{"loss":1.0,"val_loss":2.0}}"#);
    }
}
