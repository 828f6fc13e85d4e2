//! Scraping of ffmpeg's human-readable stderr.
//!
//! Nothing here is a contract: ffmpeg's progress line changes between
//! releases, so every field is optional and parse failures are dropped.

use crate::domain::value_objects::Telemetry;

pub fn parse_line(line: &str) -> Telemetry {
    let mut telemetry = Telemetry::default();

    if line.to_ascii_lowercase().contains("error") {
        telemetry.error = Some(line.trim().to_string());
    }

    if line.contains("frame=") && line.contains("bitrate=") {
        telemetry.bitrate = parse_bitrate(line);
        telemetry.fps = value_after(line, "fps=")
            .and_then(|rest| leading(rest, false).parse::<u32>().ok());
        telemetry.bytes_sent = parse_size(line);
    }

    telemetry
}

/// `bitrate= 1048.6kbits/s` -> bits per second
fn parse_bitrate(line: &str) -> Option<u64> {
    let rest = value_after(line, "bitrate=")?;
    let number = leading(rest, true);
    if !rest[number.len()..].starts_with("kbits/s") {
        return None;
    }
    let kbits: f64 = number.parse().ok()?;
    Some((kbits * 1000.0).round() as u64)
}

/// `size=     512kB` (or `KiB` on newer builds) -> bytes
fn parse_size(line: &str) -> Option<u64> {
    let rest = value_after(line, "size=")?;
    let number = leading(rest, false);
    let unit = &rest[number.len()..];
    if !(unit.starts_with("kB") || unit.starts_with("KiB")) {
        return None;
    }
    number.parse::<u64>().ok()?.checked_mul(1024)
}

fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.find(key).map(|idx| line[idx + key.len()..].trim_start())
}

fn leading(s: &str, allow_dot: bool) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || (allow_dot && *c == '.')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}
