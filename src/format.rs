// Human-readable sizes, counts and durations for the CLI and the server landing page.

use std::time::Duration;

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

fn scale_bytes(bytes: u64) -> (f64, usize) {
    let mut size = bytes as f64;
    let mut unit_idx = 0usize;
    while size >= 1024.0 && unit_idx < BYTE_UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }
    (size, unit_idx)
}

/// Archive or item size, e.g. "1.23 MB"
pub fn format_bytes(bytes: u64) -> String {
    match scale_bytes(bytes) {
        (_, 0) => format!("{} B", bytes),
        (size, unit_idx) => format!("{:.2} {}", size, BYTE_UNITS[unit_idx]),
    }
}

/// Column-friendly size for listings, e.g. "1.5K", "2M"
pub fn format_bytes_compact(bytes: u64) -> String {
    match scale_bytes(bytes) {
        (_, 0) => bytes.to_string(),
        (size, unit_idx) => {
            let formatted = format!("{:.1}", size);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            format!("{}{}", trimmed, &BYTE_UNITS[unit_idx][..1])
        }
    }
}

/// Integer with thousands separators (12345 -> "12,345")
pub fn format_number<T>(value: T) -> String
where
    T: std::fmt::Display,
{
    let s = value.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (idx, ch) in s.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 && ch != '-' {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Uptime style, e.g. "2d 3h 10m 5s"
pub fn format_duration_verbose(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Query timing, e.g. "850μs", "12.345ms", "1.2s"
pub fn format_duration_short(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        format!("{:.0}μs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.3}ms", secs * 1000.0)
    } else {
        format!("{:.1}s", secs)
    }
}
