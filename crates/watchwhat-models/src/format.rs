//! Display helpers shared by every front end.

use chrono::{DateTime, Datelike, NaiveDate};

/// Clamp a rating to [0, 10] and render it with one decimal place.
///
/// Missing and NaN ratings render as `"0.0"`.
pub fn format_rating(rating: Option<f64>) -> String {
    let value = match rating {
        Some(r) if !r.is_nan() => r.clamp(0.0, 10.0),
        _ => 0.0,
    };
    format!("{:.1}", value)
}

/// Four-digit year of an ISO date (`YYYY-MM-DD` or RFC 3339), or `"N/A"`.
pub fn format_year(date: Option<&str>) -> String {
    let Some(raw) = date.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };

    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return format!("{:04}", d.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return format!("{:04}", dt.year());
    }
    "N/A".to_string()
}

/// Runtime in minutes as `"2h 15m"`, `"45m"`, or `"N/A"` when unknown.
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => "N/A".to_string(),
        Some(m) if m < 60 => format!("{}m", m),
        Some(m) if m % 60 == 0 => format!("{}h", m / 60),
        Some(m) => format!("{}h {}m", m / 60, m % 60),
    }
}
