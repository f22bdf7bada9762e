// src/numeric.rs

/// Tolerance used wherever a stored amount is compared against a computed one
/// (net weight, net weight x rate, paid vs total).
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// `true` when `a` and `b` differ by no more than `epsilon`.
///
/// The comparison carries a tiny slack on top of `epsilon` so that values
/// which are exactly `epsilon` apart in decimal (0.01) are not rejected
/// because of binary float representation.
pub fn approximately_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon + f64::EPSILON * a.abs().max(b.abs()).max(1.0) * 4.0
}

/// Rounds to 2 decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_within_tolerance_are_equal() {
        assert!(approximately_equal(100.0, 100.0, AMOUNT_TOLERANCE));
        assert!(approximately_equal(100.0, 100.01, AMOUNT_TOLERANCE));
        assert!(approximately_equal(2.5 * 1.1, 2.75, AMOUNT_TOLERANCE));
    }

    #[test]
    fn values_outside_tolerance_differ() {
        assert!(!approximately_equal(100.0, 100.02, AMOUNT_TOLERANCE));
        assert!(!approximately_equal(0.0, 1.0, AMOUNT_TOLERANCE));
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-1.236), -1.24);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(0.0), 0.0);
    }
}
