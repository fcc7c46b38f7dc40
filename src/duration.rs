// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Duration parsing for Go-style duration strings.
//!
//! Supports parsing duration strings in Go format (e.g., "500ms", "3s", "1h30m") into
//! Rust `std::time::Duration`. Used for every interval accepted on the command line.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// A duration is a sequence of `<integer><unit>` pairs, summed together.
///
/// Supported units:
/// - `ns`, `us` (or `µs`), `ms`
/// - `s`, `m`, `h`
///
/// The bare string `"0"` is accepted and yields a zero duration.
///
/// # Examples
///
/// ```
/// use kube_adguard_ingress::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
///
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err());  // Missing unit
/// assert!(parse_duration("10x").is_err()); // Invalid unit
/// ```
///
/// # Errors
///
/// Returns an error if the format is invalid (missing unit, non-numeric value, unknown
/// unit) or if the total overflows.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let input = duration_str.trim();

    if input.is_empty() {
        bail!("Duration string cannot be empty");
    }

    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: u64 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        // Find where digits end and unit begins
        let split_pos = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(idx, _)| idx)
            .with_context(|| format!("Duration '{input}' must end with a unit (ms, s, m, h)"))?;

        let (value_str, tail) = rest.split_at(split_pos);
        if value_str.is_empty() {
            bail!("Duration '{input}' has a unit without a value");
        }

        let value: u64 = value_str
            .parse()
            .with_context(|| format!("Duration value '{value_str}' must be a positive integer"))?;

        let unit_len = tail
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map_or(tail.len(), |(idx, _)| idx);
        let (unit, remainder) = tail.split_at(unit_len);

        let multiplier = match unit {
            "ns" => 1,
            "us" | "µs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => NANOS_PER_MINUTE,
            "h" => NANOS_PER_HOUR,
            _ => bail!("Unsupported duration unit '{unit}'. Use ns, us, ms, s, m or h"),
        };

        let part = value
            .checked_mul(multiplier)
            .context("Duration value too large (overflow)")?;
        total_nanos = total_nanos
            .checked_add(part)
            .context("Duration value too large (overflow)")?;

        rest = remainder;
    }

    Ok(Duration::from_nanos(total_nanos))
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
