//! Human-readable postmortem interval formatting
//!
//! Provides consistent interval display for logs and summaries.

/// Intervals shorter than this are shown in hours only
const HOURS_ONLY_MAX: i64 = 48;

/// Format a PMI given in days
///
/// - Under 48 hours: `X.Xh`
/// - Otherwise: `Dd Hh` (hours rounded to the nearest whole hour)
///
/// # Examples
///
/// ```
/// use pmi_common::human_time::format_pmi;
///
/// assert_eq!(format_pmi(1.5), "36.0h");
/// assert_eq!(format_pmi(4.5), "4d 12h");
/// assert_eq!(format_pmi(-0.25), "-6.0h");
/// ```
pub fn format_pmi(days: f64) -> String {
    if !days.is_finite() {
        return "n/a".to_string();
    }

    let is_negative = days < 0.0;
    let hours = days.abs() * 24.0;

    let formatted = if (hours.round() as i64) < HOURS_ONLY_MAX {
        format!("{:.1}h", hours)
    } else {
        let total_hours = hours.round() as i64;
        format!("{}d {}h", total_hours / 24, total_hours % 24)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format a confidence band in days, e.g. `3.67-5.51 days`
pub fn format_interval(low_days: f64, high_days: f64) -> String {
    format!("{:.2}-{:.2} days", low_days, high_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_only_format() {
        assert_eq!(format_pmi(0.0), "0.0h");
        assert_eq!(format_pmi(0.5), "12.0h");
        assert_eq!(format_pmi(1.9), "45.6h");
    }

    #[test]
    fn test_day_format() {
        assert_eq!(format_pmi(2.0), "2d 0h");
        // 78 / 17 days = 110.1 hours
        assert_eq!(format_pmi(78.0 / 17.0), "4d 14h");
        // 263.76 hours rounds up into the next day
        assert_eq!(format_pmi(10.99), "11d 0h");
    }

    #[test]
    fn test_negative_and_non_finite() {
        assert_eq!(format_pmi(-3.0), "-3d 0h");
        assert_eq!(format_pmi(f64::NAN), "n/a");
        assert_eq!(format_pmi(f64::INFINITY), "n/a");
    }

    #[test]
    fn test_interval() {
        assert_eq!(format_interval(3.670588, 5.505882), "3.67-5.51 days");
    }
}
