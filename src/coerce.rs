//! The coercion table: raw string in, typed [`Value`] out.
//!
//! | Kind | Rule |
//! |------|------|
//! | `Str` | passthrough |
//! | `Bool` | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | `Int(w)` | 64-bit signed parse, saturated to `w` |
//! | `Uint(w)` | 64-bit unsigned parse, saturated to `w` |
//! | `Float` | 64-bit parse |
//! | `Duration` | see [`parse_duration`] |
//! | `List` | comma-separated, trimmed, empty items dropped |
//! | `Text` | the type's own `FromStr` |
//!
//! Narrowing saturates: `"300"` on an `i8` field is `127`, `"-1"` on a `u8`
//! field fails the unsigned parse and becomes `0`.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;

use crate::error::StagefigError;
use crate::value::{Kind, Value};

/// Unit appended to durations written as a bare number.
const DEFAULT_DURATION_UNIT: &str = "s";

static FRACTIONAL_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").unwrap());

/// Coerce `raw` into a value of `kind`.
pub fn coerce(kind: &Kind, raw: &str) -> Result<Value, StagefigError> {
    match kind {
        Kind::Str => Ok(Value::Str(raw.to_string())),
        Kind::Bool => parse_bool(raw).map(Value::Bool),
        Kind::Int(width) => raw
            .parse::<i64>()
            .map(|v| Value::Int(width.saturate(v)))
            .map_err(|e| StagefigError::parse("int", raw, e)),
        Kind::Uint(width) => raw
            .parse::<u64>()
            .map(|v| Value::Uint(width.saturate(v)))
            .map_err(|e| StagefigError::parse("uint", raw, e)),
        Kind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| StagefigError::parse("float", raw, e)),
        Kind::Duration => parse_duration(raw).map(Value::Duration),
        Kind::List => Ok(Value::List(parse_list(raw))),
        Kind::Text(text) => text
            .parse(raw)
            .map_err(|reason| StagefigError::parse(text.type_name(), raw, reason)),
    }
}

/// The zero value of `kind`, used whenever coercion fails.
pub fn zero(kind: &Kind) -> Value {
    match kind {
        Kind::Str => Value::Str(String::new()),
        Kind::Bool => Value::Bool(false),
        Kind::Int(_) => Value::Int(0),
        Kind::Uint(_) => Value::Uint(0),
        Kind::Float => Value::Float(0.0),
        Kind::Duration => Value::Duration(TimeDelta::zero()),
        Kind::List => Value::List(Vec::new()),
        Kind::Text(text) => text.zero(),
    }
}

pub fn parse_bool(raw: &str) -> Result<bool, StagefigError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(StagefigError::parse("bool", raw, "not a boolean token")),
    }
}

/// Parse a duration, defaulting the unit to seconds.
///
/// A leading `+`/`-` is stripped before parsing and re-applied to the result.
/// A trailing digit gets the default unit, so `"5"` is five seconds while
/// `"1h2m3s"` and `"300ms"` go through the normal unit grammar.
pub fn parse_duration(raw: &str) -> Result<TimeDelta, StagefigError> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    if body.is_empty() {
        return Err(StagefigError::parse("duration", raw, "empty duration"));
    }

    let body = if body.ends_with(|c: char| c.is_ascii_digit()) {
        Cow::Owned(format!("{body}{DEFAULT_DURATION_UNIT}"))
    } else {
        Cow::Borrowed(body)
    };

    let delta = if body.contains('.') {
        parse_fractional(&body)
            .ok_or_else(|| StagefigError::parse("duration", raw, "invalid fractional duration"))?
    } else {
        let std = humantime::parse_duration(&body)
            .map_err(|e| StagefigError::parse("duration", raw, e))?;
        TimeDelta::from_std(std).map_err(|e| StagefigError::parse("duration", raw, e))?
    };
    Ok(if negative { -delta } else { delta })
}

/// `1.5h`, `0.5s300ms`: decimal numbers with units up to hours.
fn parse_fractional(body: &str) -> Option<TimeDelta> {
    let mut rest = body;
    let mut nanos = 0f64;
    while !rest.is_empty() {
        let caps = FRACTIONAL_SEGMENT.captures(rest)?;
        let number: f64 = caps[1].parse().ok()?;
        let scale = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        nanos += number * scale;
        rest = &rest[caps[0].len()..];
    }
    if !nanos.is_finite() || nanos >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::nanoseconds(nanos.round() as i64))
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
