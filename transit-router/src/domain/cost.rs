//! Generalized-cost units.
//!
//! Costs are integers in hundredths of a "weighted second" so that
//! reluctance factors such as 0.8 survive without floating point in the
//! hot path.

/// Convert weighted seconds into cost units.
///
/// # Examples
///
/// ```
/// use transit_router::domain::{cost_from_seconds, format_cost};
///
/// assert_eq!(cost_from_seconds(1.0), 100);
/// assert_eq!(cost_from_seconds(0.8 * 45.0), 3600);
/// assert_eq!(format_cost(815_400), "$8154");
/// ```
pub fn cost_from_seconds(seconds: f64) -> i32 {
    (seconds * 100.0).round() as i32
}

/// Render a cost in whole weighted seconds, e.g. "$8154".
pub fn format_cost(cost: i32) -> String {
    format!("${}", (f64::from(cost) / 100.0).round() as i64)
}
