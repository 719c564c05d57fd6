//! Interval between two probe requests
//!
//! Intervals are written the way Go's `time.ParseDuration` reads them
//! (`10s`, `1m30s`, `1.5h`, `250ms`) and printed the way Go's
//! `Duration.String` renders them, so existing command lines and log
//! scrapers keep working.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::PollInterval;
//!
//! let interval: PollInterval = "90s".parse().expect("valid interval");
//! assert_eq!(interval.as_duration().as_secs(), 90);
//! assert_eq!(interval.to_string(), "1m30s");
//! ```

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DomainError;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;

/// Longest fraction that still fits the intermediate `u128` product
const MAX_FRACTION_DIGITS: usize = 18;

/// Non-negative wait between successive requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollInterval(Duration);

impl PollInterval {
    /// Interval used when none is configured
    pub const DEFAULT: Self = Self(Duration::from_secs(10));

    /// Largest accepted interval, matching Go's `time.Duration` range
    pub const MAX: Self = Self(Duration::from_nanos(i64::MAX.unsigned_abs()));

    /// Wrap an existing duration
    pub const fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Get the underlying duration
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Parse a Go-style duration string
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInterval` for empty input, negative
    /// values, missing or unknown units, and values beyond [`Self::MAX`].
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::invalid_interval(input, reason);

        let mut rest = input.trim();
        if let Some(unsigned) = rest.strip_prefix('+') {
            rest = unsigned;
        }
        if rest.starts_with('-') {
            return Err(invalid("negative intervals are not allowed"));
        }
        if rest == "0" {
            return Ok(Self(Duration::ZERO));
        }
        if rest.is_empty() {
            return Err(invalid("empty duration"));
        }

        let mut total: u64 = 0;
        while !rest.is_empty() {
            let int_len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (int_part, after_int) = rest.split_at(int_len);

            let (frac_part, after_number) = match after_int.strip_prefix('.') {
                Some(after_dot) => {
                    let frac_len = after_dot
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(after_dot.len());
                    after_dot.split_at(frac_len)
                },
                None => ("", after_int),
            };
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid("expected a number"));
            }

            let unit_len = after_number
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(after_number.len());
            let (unit, remaining) = after_number.split_at(unit_len);
            if unit.is_empty() {
                return Err(invalid("missing unit"));
            }
            let unit_nanos = unit_to_nanos(unit)
                .ok_or_else(|| invalid(&format!("unknown unit {unit:?}")))?;

            let whole: u64 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| invalid("value out of range"))?
            };
            let mut nanos = whole
                .checked_mul(unit_nanos)
                .ok_or_else(|| invalid("value out of range"))?;

            if !frac_part.is_empty() {
                let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
                let fraction: u128 = digits
                    .parse()
                    .map_err(|_| invalid("value out of range"))?;
                let exponent =
                    u32::try_from(digits.len()).map_err(|_| invalid("value out of range"))?;
                let scaled = fraction * u128::from(unit_nanos) / 10u128.pow(exponent);
                let fraction_nanos =
                    u64::try_from(scaled).map_err(|_| invalid("value out of range"))?;
                nanos = nanos
                    .checked_add(fraction_nanos)
                    .ok_or_else(|| invalid("value out of range"))?;
            }

            total = total
                .checked_add(nanos)
                .ok_or_else(|| invalid("value out of range"))?;
            rest = remaining;
        }

        let duration = Duration::from_nanos(total);
        if duration > Self::MAX.0 {
            return Err(invalid("value out of range"));
        }
        Ok(Self(duration))
    }
}

fn unit_to_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        // U+00B5 micro sign and U+03BC greek small mu
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Render `value / scale` with the fraction's trailing zeros removed
fn format_scaled(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let remainder = value % scale;
    if remainder == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{remainder:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }

        let sec = u128::from(NANOS_PER_SEC);
        if nanos < sec {
            let (scale, unit) = if nanos < u128::from(NANOS_PER_MICRO) {
                (1, "ns")
            } else if nanos < u128::from(NANOS_PER_MILLI) {
                (u128::from(NANOS_PER_MICRO), "\u{00b5}s")
            } else {
                (u128::from(NANOS_PER_MILLI), "ms")
            };
            return write!(f, "{}{unit}", format_scaled(nanos, scale));
        }

        let total_secs = nanos / sec;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = format_scaled((total_secs % 60) * sec + nanos % sec, sec);

        if hours > 0 {
            write!(f, "{hours}h{minutes}m{seconds}s")
        } else if minutes > 0 {
            write!(f, "{minutes}m{seconds}s")
        } else {
            write!(f, "{seconds}s")
        }
    }
}

impl FromStr for PollInterval {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<PollInterval> for Duration {
    fn from(interval: PollInterval) -> Self {
        interval.0
    }
}

impl Serialize for PollInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PollInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
