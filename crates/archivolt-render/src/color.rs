//! Exchange-format color channels into CSS paint values.

use archivolt_core::model::Color;

/// `rgb(r, g, b)` with unset channels defaulting to 0.
pub fn css_rgb(color: &Color) -> String {
    format!(
        "rgb({},{},{})",
        color.r.unwrap_or(0),
        color.g.unwrap_or(0),
        color.b.unwrap_or(0)
    )
}

/// Exchange alpha is an opacity percentage (0..=100); fully opaque colors
/// need no opacity attribute at all.
pub fn css_opacity(color: &Color) -> Option<f64> {
    match color.a {
        Some(a) if a < 100 => Some(f64::from(a.min(100)) / 100.0),
        _ => None,
    }
}
