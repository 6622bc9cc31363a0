//! Small numeric helpers shared by the statistics passes.

/// The standard median: middle value, or the mean of the two middle values
/// for even-length input. Empty input yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median of integer samples.
#[allow(clippy::cast_precision_loss)]
pub fn median_i64(values: &[i64]) -> f64 {
    let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    median(&values)
}

/// `numerator / denominator`, or 0 when the denominator is zero.
#[allow(clippy::cast_precision_loss)]
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Rounds to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    reason = "medians of small integers are exact in f64"
)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_count_averages_middle_values() {
        assert_eq!(median_i64(&[60, 120, 180, 240]), 150.0);
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        assert_eq!(median_i64(&[60, 120, 180]), 120.0);
        assert_eq!(median_i64(&[180, 60, 120]), 120.0);
    }

    #[test]
    fn median_of_nothing_is_zero() {
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn ratio_guards_against_zero() {
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(ratio(3, 2), 1.5);
    }
}
