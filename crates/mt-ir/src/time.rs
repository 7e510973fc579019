//! Transport time display.

use alloc::format;
use alloc::string::String;

/// Format seconds as `MM:SS.mmm`. Negative input clamps to zero.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = libm::floor(seconds / 60.0) as u64;
    let secs = libm::floor(seconds % 60.0) as u64;
    let ms = libm::floor((seconds % 1.0) * 1000.0) as u64;
    format!("{:02}:{:02}.{:03}", mins, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_seconds_millis() {
        assert_eq!(format_time(0.0), "00:00.000");
        assert_eq!(format_time(61.25), "01:01.250");
        assert_eq!(format_time(754.5), "12:34.500");
    }

    #[test]
    fn negative_is_zero() {
        assert_eq!(format_time(-3.0), "00:00.000");
    }
}
