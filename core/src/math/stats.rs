/// Rendered in place of a percentage that cannot be computed.
pub const PERCENTAGE_PLACEHOLDER: &str = "N/A";

pub struct StatsHelper;

impl StatsHelper {
    /// `part / whole * 100`, or `None` when the denominator is zero.
    pub fn percentage(part: u64, whole: u64) -> Option<f64> {
        if whole == 0 {
            return None;
        }
        Some(part as f64 / whole as f64 * 100.0)
    }

    /// Two-decimal percentage label, e.g. `0.70%`.
    pub fn percentage_label(part: u64, whole: u64) -> String {
        match Self::percentage(part, whole) {
            Some(value) => format!("{:.2}%", value),
            None => PERCENTAGE_PLACEHOLDER.to_string(),
        }
    }

    /// Fraction in `[0, 1]` for gauges; out-of-range server numbers are clamped.
    pub fn ratio(part: u64, whole: u64) -> f32 {
        if whole == 0 {
            return 0.0;
        }
        (part as f64 / whole as f64).clamp(0.0, 1.0) as f32
    }
}
