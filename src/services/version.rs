// src/services/version.rs

//! Version string normalization.
//!
//! The catalog publishes versions either as human-readable strings
//! ("2.1.4") or as packed integer version codes ("100030000"). This
//! module canonicalizes the packed form into dotted
//! `major.minor.patch`. The packing scheme is undocumented, so the
//! split is a digit-count heuristic and deliberately lossy.

/// Normalize a version string into dotted `major.minor.patch` form.
///
/// Non-numeric input passes through unchanged, which also makes the
/// function idempotent: an already-dotted result fails the all-digits
/// test on re-entry.
pub fn normalize(version: &str) -> String {
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return version.to_string();
    }

    match version.len() {
        9 => split_nine(version),
        8 => split_eight(version),
        n if n >= 6 => split_general(version).unwrap_or_else(|| version.to_string()),
        _ => split_short(version),
    }
}

/// Nine digits pack as `_MMmmppp__`: major in [1..3), minor in [3..5),
/// patch in [5..8). Example: "100030000" -> "1.3.0".
fn split_nine(v: &str) -> String {
    let major = parse_major(&v[1..3]);
    let minor = parse_u64(&v[3..5]);
    let patch = parse_u64(&v[5..8]);
    format!("{major}.{minor}.{patch}")
}

/// Eight digits: major is the first digit, or the second when the
/// first is zero; minor in [2..4), patch in [4..7).
fn split_eight(v: &str) -> String {
    let major_digit = if v.as_bytes()[0] != b'0' {
        &v[0..1]
    } else {
        &v[1..2]
    };
    let major = parse_u64(major_digit).max(1);
    let minor = parse_u64(&v[2..4]);
    let patch = parse_u64(&v[4..7]);
    format!("{major}.{minor}.{patch}")
}

/// General case for six or more digits (lengths 8 and 9 are handled by
/// the dedicated splits above). A `100` prefix signals the nine-digit
/// layout applied over however many digits are available.
fn split_general(v: &str) -> Option<String> {
    let len = v.len();
    let (major, minor, patch) = if v.starts_with("100") {
        let major = parse_major(&v[1..3]);
        let minor = if len > 4 {
            checked_parse(&v[3..5.min(len)])?
        } else {
            0
        };
        let patch = if len > 6 {
            checked_parse(&v[5..8.min(len)])?
        } else {
            0
        };
        (major, minor, patch)
    } else {
        let major = checked_parse(&v[0..1])?.max(1);
        let minor = if len > 2 {
            checked_parse(&v[1..3])?
        } else {
            0
        };
        let patch = if len > 4 {
            checked_parse(&v[3..6.min(len)])?
        } else {
            0
        };
        (major, minor, patch)
    };
    Some(format!("{major}.{minor}.{patch}"))
}

/// Fewer than six digits: zero becomes "1.0.0", anything else is the
/// integer value floored at 1, as a bare string.
fn split_short(v: &str) -> String {
    match parse_u64(v) {
        0 => "1.0.0".to_string(),
        n => n.max(1).to_string(),
    }
}

/// Parse a major component with leading zeros stripped, defaulting to
/// (and floored at) 1.
fn parse_major(digits: &str) -> u64 {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        1
    } else {
        parse_u64(stripped).max(1)
    }
}

fn parse_u64(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

fn checked_parse(digits: &str) -> Option<u64> {
    digits.parse().ok()
}
