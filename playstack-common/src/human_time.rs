//! Human-readable durations for stage timings
//!
//! Format is chosen by magnitude:
//! - under 100 s: `X.XXs`
//! - under 100 min: `M:SS.Xs`
//! - otherwise: `H:MM:SS`

const SHORT_FORMAT_MAX_MS: u64 = 100_000;
const MEDIUM_FORMAT_MAX_MS: u64 = 6_000_000;

/// Format a millisecond duration
///
/// ```
/// use playstack_common::human_time::format_elapsed_ms;
///
/// assert_eq!(format_elapsed_ms(4_250), "4.25s");
/// assert_eq!(format_elapsed_ms(125_400), "2:05.4s");
/// assert_eq!(format_elapsed_ms(7_261_000), "2:01:01");
/// ```
pub fn format_elapsed_ms(ms: u64) -> String {
    if ms < SHORT_FORMAT_MAX_MS {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else if ms < MEDIUM_FORMAT_MAX_MS {
        let minutes = ms / 60_000;
        let tenths = (ms % 60_000) / 100;
        format!("{}:{:02}.{}s", minutes, tenths / 10, tenths % 10)
    } else {
        let total_seconds = ms / 1000;
        format!(
            "{}:{:02}:{:02}",
            total_seconds / 3600,
            (total_seconds % 3600) / 60,
            total_seconds % 60
        )
    }
}
