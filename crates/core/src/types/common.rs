//! Time helpers shared across domain models

/// Formats seconds as H:MM:SS, always showing hours
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{}:{:02}:{:02}", hours, minutes, secs)
}
