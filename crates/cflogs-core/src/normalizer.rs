//! Normalizer: turns one base64 CloudFront log payload into a [`NormalizedRecord`].
//!
//! The payload is decoded, split on tabs into [`ParsedFields`], and each
//! field is coerced per the table layout:
//!
//! | field | source | fallback |
//! |---|---|---|
//! | `visitor_ip` | field 1 | required |
//! | `timestamp` | field 0, float UNIX seconds | required, must be finite |
//! | `path` | field 3 | required |
//! | `method` | field 2 | `UNKNOWN` |
//! | `status` | field 4, leading integer | `500` |
//! | `user_agent` | field 5, percent-decoded | `UNKNOWN` |
//! | `referer` | field 6, percent-decoded | `null` when absent or `-` |
//!
//! A line missing any required field is [`Normalization::Skip`]ped, never
//! failed. Decode errors inside an otherwise complete line are
//! [`ValidationError`]s.

use std::sync::Arc;

use base64::Engine;
use chrono::{NaiveTime, TimeDelta};

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::types::{NormalizedRecord, ParsedFields, UNKNOWN};

/// Default time-to-live of a stored record.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Fallback status when the status field is missing, non-numeric or zero.
pub const FALLBACK_STATUS: i64 = 500;

/// Largest magnitude, in milliseconds from the epoch, of a valid timestamp.
const MAX_TIME_MS: f64 = 8.64e15;

const MS_PER_DAY: i64 = 86_400_000;

/// Successful outcome of normalizing one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalization {
    Record(NormalizedRecord),
    Skip(Skipped),
}

/// A line without one of the required fields. Logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Name of the first missing field.
    pub missing: &'static str,
    /// The decoded line.
    pub line: String,
}

/// Record normalizer with an injected clock for `expiration_time`.
#[derive(Clone)]
pub struct Normalizer {
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
}

impl Normalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            retention: TimeDelta::days(i64::from(DEFAULT_RETENTION_DAYS)),
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = TimeDelta::days(i64::from(days));
        self
    }

    /// Normalize a base64 payload as carried in `kinesis.data`.
    pub fn normalize(&self, data: &str) -> Result<Normalization, ValidationError> {
        let line = decode_payload(data)?;
        let expiration_time = (self.clock.now() + self.retention).timestamp();
        normalize_line(&line, expiration_time)
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

/// Decode base64 into text. Invalid UTF-8 is replaced, and one trailing line
/// terminator is dropped.
pub fn decode_payload(data: &str) -> Result<String, ValidationError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// Normalize an already decoded line.
pub fn normalize_line(line: &str, expiration_time: i64) -> Result<Normalization, ValidationError> {
    let fields = ParsedFields::split(line);

    let required = [
        ("timestamp", fields.timestamp),
        ("ip", fields.ip),
        ("uri", fields.uri),
    ];
    if let Some(&(missing, _)) = required.iter().find(|(_, v)| non_empty(*v).is_none()) {
        return Ok(Normalization::Skip(Skipped {
            missing,
            line: line.to_string(),
        }));
    }

    // Checked non-empty above.
    let timestamp = fields.timestamp.unwrap_or_default();
    let ip = fields.ip.unwrap_or_default();
    let uri = fields.uri.unwrap_or_default();

    let user_agent = match non_empty(fields.user_agent) {
        Some(ua) => percent_decode("user_agent", ua)?,
        None => UNKNOWN.to_string(),
    };
    let referer = match non_empty(fields.referer) {
        Some("-") | None => None,
        Some(referer) => Some(percent_decode("referer", referer)?),
    };

    Ok(Normalization::Record(NormalizedRecord {
        visitor_ip: ip.to_string(),
        timestamp: unix_seconds_to_iso(timestamp)?,
        path: uri.to_string(),
        method: non_empty(fields.method).unwrap_or(UNKNOWN).to_string(),
        status: parse_status(fields.status),
        user_agent,
        referer,
        expiration_time,
    }))
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|f| !f.is_empty())
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Convert fractional UNIX seconds to an ISO-8601 instant with millisecond
/// precision. Sub-millisecond digits are truncated toward zero.
pub fn unix_seconds_to_iso(raw: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidTimestamp(raw.to_string());

    let secs = parse_float_prefix(raw).ok_or_else(invalid)?;
    let millis = (secs * 1000.0).trunc();
    if !millis.is_finite() || millis.abs() > MAX_TIME_MS {
        return Err(invalid());
    }
    to_iso_string(millis as i64).ok_or_else(invalid)
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`, with a signed six-digit year outside 0..=9999.
///
/// The date comes from the day count itself, so the whole ±8.64e15 ms range
/// formats, including years `chrono` cannot represent.
fn to_iso_string(millis: i64) -> Option<String> {
    let days = millis.div_euclid(MS_PER_DAY);
    let ms_of_day = millis.rem_euclid(MS_PER_DAY);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        u32::try_from(ms_of_day / 1000).ok()?,
        u32::try_from(ms_of_day % 1000).ok()? * 1_000_000,
    )?;

    let (year, month, day) = civil_from_days(days);
    let year = if (0..=9999).contains(&year) {
        format!("{year:04}")
    } else {
        format!("{year:+07}")
    };
    Some(format!("{year}-{month:02}-{day:02}T{}Z", time.format("%H:%M:%S%.3f")))
}

/// Proleptic Gregorian `(year, month, day)` for a day count from 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    // Shift to eras of 400 years starting 0000-03-01.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month as u32, day as u32)
}

/// Parse the longest numeric prefix of `s` as a float: optional sign, digits,
/// optional fraction and exponent. Trailing garbage is ignored.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

fn parse_status(field: Option<&str>) -> i64 {
    field
        .and_then(parse_int_prefix)
        .filter(|status| *status != 0)
        .unwrap_or(FALLBACK_STATUS)
}

/// Parse the leading integer of `s`, ignoring anything after it. A `0x` or
/// `0X` prefix switches to hexadecimal.
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let len = digits
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let value = i64::from_str_radix(&digits[..len], radix).ok()?;
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Percent decoding
// ---------------------------------------------------------------------------

/// Strict URI-component decoding: every `%` must start a two-digit hex
/// escape and the decoded bytes must be valid UTF-8. `+` stays literal.
pub fn percent_decode(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let malformed = || ValidationError::MalformedPercentEncoding {
        field,
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
            let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => return Err(malformed()),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| malformed())
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
