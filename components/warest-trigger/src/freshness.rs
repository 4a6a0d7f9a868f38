pub const TIMESTAMP_HEADER: &str = "X-WAREST-Timestamp";

/// Freshness of an epoch-millisecond timestamp header.
///
/// Missing, non-numeric, non-finite and non-positive values are never fresh.
pub fn is_fresh(header: Option<&str>, now_ms: i64, tolerance_seconds: u64) -> bool {
    match header.and_then(|raw| raw.trim().parse::<f64>().ok()) {
        Some(ts) => is_fresh_at(ts, now_ms, tolerance_seconds),
        None => false,
    }
}

pub fn is_fresh_at(timestamp_ms: f64, now_ms: i64, tolerance_seconds: u64) -> bool {
    if !timestamp_ms.is_finite() || timestamp_ms <= 0.0 {
        return false;
    }
    let tolerance_ms = tolerance_seconds as f64 * 1000.0;
    (now_ms as f64 - timestamp_ms).abs() <= tolerance_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn now_is_fresh() {
        assert!(is_fresh_at(NOW as f64, NOW, 300));
        assert!(is_fresh(Some("1700000000000"), NOW, 300));
    }

    #[test]
    fn tolerance_boundary() {
        let edge = NOW - 300 * 1000;
        assert!(is_fresh_at(edge as f64, NOW, 300));
        assert!(!is_fresh_at((edge - 1) as f64, NOW, 300));
        assert!(is_fresh_at((NOW + 300_000) as f64, NOW, 300));
        assert!(!is_fresh_at((NOW + 300_001) as f64, NOW, 300));
    }

    #[test]
    fn invalid_values_are_stale() {
        assert!(!is_fresh(None, NOW, 300));
        assert!(!is_fresh(Some("soon"), NOW, 300));
        assert!(!is_fresh(Some("0"), NOW, 300));
        assert!(!is_fresh(Some("-5"), NOW, 300));
        assert!(!is_fresh(Some("NaN"), NOW, 300));
        assert!(!is_fresh(Some("inf"), NOW, 300));
    }
}
