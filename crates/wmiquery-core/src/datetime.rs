//! WMI datetime decoding.
//!
//! Canonical layout is `YYYYMMDDHHMMSS.ffffff±ZZZZ` (26 characters).
//! Two 25-character variants are accepted:
//! - a 5-digit fraction (`20230615093045.12345-0500`): a `0` is inserted
//!   between the fraction and the sign before parsing;
//! - the CIM form with a 6-digit fraction and a 3-digit offset in minutes
//!   (`20230615093045.123456-300`).

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use thiserror::Error;

const CANONICAL_LEN: usize = 26;
const SHORT_LEN: usize = 25;
const LAYOUT: &str = "%Y%m%d%H%M%S%.f%z";
const LOCAL_LAYOUT: &str = "%Y%m%d%H%M%S%.f";

/// Index of the `.` separating seconds from the fraction.
const DOT: usize = 14;

#[derive(Debug, Error, PartialEq)]
pub enum DatetimeError {
    #[error("expected 26 or 25 characters, got {0}")]
    Length(usize),

    #[error("malformed datetime layout")]
    Layout,

    #[error("offset {0} minutes is out of range")]
    Offset(i32),

    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
}

/// Parse a WMI datetime string.
pub fn parse_wmi_datetime(raw: &str) -> Result<DateTime<FixedOffset>, DatetimeError> {
    if !raw.is_ascii() {
        return Err(DatetimeError::Layout);
    }
    if raw.len() != CANONICAL_LEN && raw.len() != SHORT_LEN {
        return Err(DatetimeError::Length(raw.len()));
    }
    if raw.as_bytes()[DOT] != b'.' {
        return Err(DatetimeError::Layout);
    }
    let sign = raw
        .rfind(|c: char| c == '+' || c == '-')
        .filter(|&at| at > DOT)
        .ok_or(DatetimeError::Layout)?;

    match (raw.len(), sign) {
        (CANONICAL_LEN, 21) => Ok(DateTime::parse_from_str(raw, LAYOUT)?),
        (SHORT_LEN, 20) => {
            let mut padded = String::with_capacity(CANONICAL_LEN);
            padded.push_str(&raw[..sign]);
            padded.push('0');
            padded.push_str(&raw[sign..]);
            Ok(DateTime::parse_from_str(&padded, LAYOUT)?)
        }
        (SHORT_LEN, 21) => parse_cim_minutes(raw, sign),
        _ => Err(DatetimeError::Layout),
    }
}

fn parse_cim_minutes(raw: &str, sign: usize) -> Result<DateTime<FixedOffset>, DatetimeError> {
    let local = NaiveDateTime::parse_from_str(&raw[..sign], LOCAL_LAYOUT)?;
    let digits = &raw[sign + 1..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DatetimeError::Layout);
    }
    let minutes: i32 = digits.parse().map_err(|_| DatetimeError::Layout)?;
    let minutes = if raw.as_bytes()[sign] == b'-' {
        -minutes
    } else {
        minutes
    };
    let offset = FixedOffset::east_opt(minutes * 60).ok_or(DatetimeError::Offset(minutes))?;
    offset
        .from_local_datetime(&local)
        .single()
        .ok_or(DatetimeError::Offset(minutes))
}

/// Render a timestamp in the canonical 26-character layout.
pub fn format_wmi_datetime(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y%m%d%H%M%S%.6f%z").to_string()
}
