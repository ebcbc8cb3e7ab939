//! Token-budget-friendly number rendering shared by summaries and deltas.

/// Compact decimal rendering: large magnitudes round to whole numbers,
/// small ones keep a single decimal with a trailing `.0` dropped.
pub fn trim_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.abs() > 50.0 {
        format!("{}", value.round() as i64)
    } else {
        let rounded = (value * 10.0).round() / 10.0;
        if rounded.fract() == 0.0 {
            format!("{}", rounded as i64)
        } else {
            format!("{:.1}", rounded)
        }
    }
}

/// As [`trim_number`], with an explicit `+` on positive values.
pub fn signed_number(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", trim_number(value))
    } else {
        trim_number(value)
    }
}
