use serde::{Deserialize, Serialize};

/// Linearly rescales `value` from `[min, max]` onto `[0, 1]`, flipped when `invert` is set.
///
/// The result is not clamped: values outside the range map outside `[0, 1]`.
pub fn normalize(value: f64, min: f64, max: f64, invert: bool) -> f64 {
    let norm = (value - min) / (max - min);
    if invert {
        1.0 - norm
    } else {
        norm
    }
}

/// Fixed `(min, max, invert)` triple used to normalize one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
    /// Set when a higher raw value is worse.
    pub invert: bool,
}

impl NormalizationRange {
    /// Panics when `min >= max`; ranges are fixed tables, so this is a programming error.
    pub fn new(min: f64, max: f64, invert: bool) -> Self {
        assert!(min < max, "normalization range requires min < max");
        Self { min, max, invert }
    }

    pub fn apply(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max, self.invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_midpoint() {
        assert!((normalize(50.0, 0.0, 100.0, false) - 0.5).abs() < 1e-12);
        assert!((normalize(5050.0, 100.0, 10000.0, false) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_inverted() {
        assert!((normalize(30.0, 0.0, 100.0, true) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_is_not_clamped() {
        assert!((normalize(600.0, 0.0, 500.0, true) - -0.2).abs() < 1e-12);
        assert!((normalize(150.0, 0.0, 100.0, false) - 1.5).abs() < 1e-12);
        assert!(normalize(0.0, 100.0, 10000.0, false) < 0.0);
    }

    #[test]
    fn test_range_apply_matches_free_function() {
        let range = NormalizationRange::new(20000.0, 150000.0, false);
        assert_eq!(range.apply(60000.0), normalize(60000.0, 20000.0, 150000.0, false));
    }

    #[test]
    #[should_panic(expected = "min < max")]
    fn test_empty_range_rejected() {
        let _ = NormalizationRange::new(1.0, 1.0, false);
    }
}
