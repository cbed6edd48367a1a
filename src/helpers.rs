/// Small shared utilities: unit conversion and percentile math

use crate::constants::LAMPORTS_PER_SOL;

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    (lamports as f64) / (LAMPORTS_PER_SOL as f64)
}

/// Convert a signed lamports delta to SOL
pub fn lamports_delta_to_sol(lamports: i64) -> f64 {
    (lamports as f64) / (LAMPORTS_PER_SOL as f64)
}

/// Convert a raw integer token amount string scaled by 10^decimals into a real number.
/// Provider payloads carry amounts like "2500000" with decimals 6.
pub fn raw_token_amount(raw: &str, decimals: u8) -> f64 {
    let value: f64 = raw.parse().unwrap_or(0.0);
    value / (10f64).powi(decimals as i32)
}

/// Nearest-rank percentile over a pre-sorted ascending slice.
///
/// For length N, percentile p is the element at index
/// `min(N - 1, ceil(p / 100 * N) - 1)`. Returns None on an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let rank = ((p / 100.0) * (n as f64)).ceil() as usize;
    let index = rank.saturating_sub(1).min(n - 1);
    Some(sorted[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(lamports_to_sol(1_000_000_000), 1.0);
        assert_eq!(lamports_to_sol(500_000_000), 0.5);
        assert_eq!(lamports_delta_to_sol(-250_000_000), -0.25);
    }

    #[test]
    fn test_raw_token_amount() {
        assert_eq!(raw_token_amount("2500000", 6), 2.5);
        assert_eq!(raw_token_amount("1", 0), 1.0);
        assert_eq!(raw_token_amount("not-a-number", 6), 0.0);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 90.0), Some(5.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 50.0), Some(42.0));
        assert_eq!(percentile(&[42.0], 90.0), Some(42.0));
    }
}
