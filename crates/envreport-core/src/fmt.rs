//! Shared formatting helpers for report units.
//!
//! All pure value formatting (sizes, durations, timestamps, hex) lives here;
//! line layout lives in [`crate::report`].

use chrono::{DateTime, Utc};

/// Sentinel byte count meaning "unbounded".
pub const NO_LIMIT: i64 = i64::MAX;

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Format byte count as human-readable size, using 1024 per unit step.
///
/// Picks the largest unit whose whole part is at least 1 and prints one
/// decimal: `"512B"`, `"1.5KB"`, `"1024.0MB"` never appears because
/// 1 GiB renders as `"1.0GB"`. [`NO_LIMIT`] renders as `"no limit"` and
/// negative (unknown) counts as `"n/a"`.
pub fn bytes(n: i64) -> String {
    if n == NO_LIMIT {
        return "no limit".to_string();
    }
    if n < 0 {
        return "n/a".to_string();
    }
    if n < 1024 {
        return format!("{}B", n);
    }

    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    // One decimal can round 1023.95 and above up to 1024.0.
    if (value * 10.0).round() >= 10240.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Format an unsigned byte count; values beyond `i64::MAX` are unbounded.
pub fn bytes_u64(n: u64) -> String {
    bytes(i64::try_from(n).unwrap_or(NO_LIMIT))
}

/// Format a KiB count (as `/proc` reports it) as human-readable size.
pub fn kib(n: u64) -> String {
    bytes_u64(n.saturating_mul(1024))
}

/// Format duration in seconds as human-readable: `"3m 5s"`, `"2h 10m"`.
pub fn duration(secs: i64) -> String {
    if secs <= 0 {
        return "0s".to_string();
    }
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format epoch seconds as `"YYYY-MM-DD HH:MM:SS UTC"`, `"n/a"` if out of range.
pub fn epoch_utc(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

/// Format bytes as uppercase two-digit hex groups separated by spaces.
pub fn hex_groups(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins items with `", "`, starting a new line after every `per_line` items.
///
/// Returns one string per output line; an empty input yields no lines.
pub fn wrapped_list<S: AsRef<str>>(items: &[S], per_line: usize) -> Vec<String> {
    items
        .chunks(per_line.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

/// Strips module paths from a type name, including inside generics:
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn simple_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_small() {
        assert_eq!(bytes(0), "0B");
        assert_eq!(bytes(1), "1B");
        assert_eq!(bytes(1023), "1023B");
    }

    #[test]
    fn test_bytes_units() {
        assert_eq!(bytes(1024), "1.0KB");
        assert_eq!(bytes(1536), "1.5KB");
        assert_eq!(bytes(1_048_576), "1.0MB");
        assert_eq!(bytes(1_000_000_000), "953.7MB");
        assert_eq!(bytes(1_073_741_824), "1.0GB");
        assert_eq!(bytes(5 * 1_099_511_627_776), "5.0TB");
    }

    #[test]
    fn test_bytes_just_below_a_unit() {
        assert_eq!(bytes(1_048_575), "1.0MB");
        assert_eq!(bytes(1_073_741_823), "1.0GB");
        assert_eq!(bytes(1_048_524), "1023.9KB");
    }

    #[test]
    fn test_bytes_sentinels() {
        assert_eq!(bytes(NO_LIMIT), "no limit");
        assert_eq!(bytes(-1), "n/a");
        assert_eq!(bytes_u64(u64::MAX), "no limit");
        assert_eq!(kib(2048), "2.0MB");
    }

    #[test]
    fn test_duration() {
        assert_eq!(duration(0), "0s");
        assert_eq!(duration(45), "45s");
        assert_eq!(duration(185), "3m 5s");
        assert_eq!(duration(7800), "2h 10m");
        assert_eq!(duration(90000), "1d 1h");
    }

    #[test]
    fn test_epoch_utc() {
        assert_eq!(epoch_utc(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(epoch_utc(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_hex_groups() {
        assert_eq!(
            hex_groups(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            "00 11 22 33 44 55"
        );
        assert_eq!(hex_groups(&[0xab, 0xcd]), "AB CD");
        assert_eq!(hex_groups(&[]), "");
    }

    #[test]
    fn test_wrapped_list() {
        let items = ["a", "b", "c", "d", "e"];
        assert_eq!(wrapped_list(&items, 2), vec!["a, b", "c, d", "e"]);
        assert_eq!(wrapped_list(&items, 5), vec!["a, b, c, d, e"]);
        assert!(wrapped_list::<&str>(&[], 3).is_empty());
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("alloc::string::String"), "String");
        assert_eq!(
            simple_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            simple_type_name("core::option::Option<(i32, std::path::PathBuf)>"),
            "Option<(i32, PathBuf)>"
        );
        assert_eq!(simple_type_name("i64"), "i64");
    }
}
