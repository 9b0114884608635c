// src/scanners/creation_time.rs
// Pool listings rarely say when a pool was created. Use the explicit
// timestamp when one is there, otherwise guess from how the volume is
// spread over the reporting windows.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::fmt;

/// 2020-01-01T00:00:00Z. Anything earlier is a placeholder, not a launch.
pub const MIN_PLAUSIBLE_UNIX: i64 = 1_577_836_800;

pub const TIMESTAMP_FIELDS: &[&str] = &["openTime", "startTime", "createTime", "createdAt", "timestamp"];

const VERY_NEW_AGE_MINUTES: i64 = 5;
const MEDIUM_AGE_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateBasis {
    Field(&'static str),
    /// All of the day's volume happened in the last hour.
    VeryNew,
    /// Traded today, never before this week.
    MediumRecency,
}

impl fmt::Display for EstimateBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::VeryNew => write!(f, "heuristic-very-new"),
            Self::MediumRecency => write!(f, "heuristic-medium"),
        }
    }
}

pub fn estimate(raw: &Value, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    estimate_with_basis(raw, now).map(|(at, _)| at)
}

pub fn estimate_with_basis(raw: &Value, now: DateTime<Utc>) -> Option<(DateTime<Utc>, EstimateBasis)> {
    if let Some(found) = explicit_timestamp(raw, now) {
        return Some(found);
    }

    let day = window_volume(raw, &[&["day", "volume"], &["volume24h"]]).unwrap_or(0.0);
    let recent = window_volume(raw, &[&["hour", "volume"], &["recentVolume"]]);
    let week = window_volume(raw, &[&["week", "volume"], &["volume7d"]]).unwrap_or(0.0);

    if day > 0.0 && recent == Some(day) {
        return Some((now - Duration::minutes(VERY_NEW_AGE_MINUTES), EstimateBasis::VeryNew));
    }
    if day > 0.0 && week == 0.0 {
        return Some((now - Duration::hours(MEDIUM_AGE_HOURS), EstimateBasis::MediumRecency));
    }

    None
}

fn explicit_timestamp(raw: &Value, now: DateTime<Utc>) -> Option<(DateTime<Utc>, EstimateBasis)> {
    let now_secs = now.timestamp();
    TIMESTAMP_FIELDS.iter().find_map(|field| {
        let secs = as_integer(raw.get(*field)?)?;
        if secs > MIN_PLAUSIBLE_UNIX && secs < now_secs {
            let at = Utc.timestamp_opt(secs, 0).single()?;
            Some((at, EstimateBasis::Field(field)))
        } else {
            None
        }
    })
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// First path that resolves to a number wins.
fn window_volume(raw: &Value, paths: &[&[&str]]) -> Option<f64> {
    paths.iter().find_map(|path| {
        let mut node = raw;
        for key in path.iter() {
            node = node.get(*key)?;
        }
        match node {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    })
}
