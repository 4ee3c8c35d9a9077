use chrono::DateTime;

/// Compact counter: `1.2M`, `3.4K`, `999`.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Human readable size with binary units, e.g. `85.3 MB`, `512 B`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.1}", value);
    let rounded = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{} {}", rounded, UNITS[unit])
}

/// Calendar date of an RFC 3339 timestamp; anything else is returned as is.
pub fn format_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.to_string(),
    }
}
