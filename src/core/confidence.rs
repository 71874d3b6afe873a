/// Value inferred from layout position alone (first line, first 4-digit token).
pub const INFERRED: f64 = 0.6;

/// Value read from a keyword-matched line with a parsed number.
pub const DETECTED: f64 = 0.7;

/// Field left as the unknown placeholder.
pub const UNKNOWN: f64 = 0.2;

/// Placeholder that always requires a human to look at the document.
pub const MANUAL_REVIEW: f64 = 0.1;

pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}
