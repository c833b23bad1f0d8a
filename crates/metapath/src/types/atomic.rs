use std::cmp::Ordering;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use metapath_schema::DataType;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::MetapathError;

/// A calendar date with an optional timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub value: NaiveDate,
    pub offset: Option<FixedOffset>,
}

/// A date and time of day with an optional timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub value: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

/// A time of day with an optional timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub value: NaiveTime,
    pub offset: Option<FixedOffset>,
}

/// An immutable typed scalar value.
///
/// The numeric family is integer plus decimal; there is no floating-point
/// variant. Date/time values carry their timezone explicitly, so the
/// "with timezone" and "without timezone" subtypes share a representation
/// and differ only in whether `offset` is set.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicItem {
    String(String),
    Untyped(String),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
    DayTimeDuration(TimeDelta),
    YearMonthDuration(i64),
    Uri(String),
    Base64(Vec<u8>),
}

impl AtomicItem {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicItem::String(_) => "string",
            AtomicItem::Untyped(_) => "untyped-atomic",
            AtomicItem::Boolean(_) => "boolean",
            AtomicItem::Integer(_) => "integer",
            AtomicItem::Decimal(_) => "decimal",
            AtomicItem::Date(d) => {
                if d.offset.is_some() {
                    "date-with-timezone"
                } else {
                    "date"
                }
            }
            AtomicItem::DateTime(d) => {
                if d.offset.is_some() {
                    "date-time-with-timezone"
                } else {
                    "date-time"
                }
            }
            AtomicItem::Time(t) => {
                if t.offset.is_some() {
                    "time-with-timezone"
                } else {
                    "time"
                }
            }
            AtomicItem::DayTimeDuration(_) => "day-time-duration",
            AtomicItem::YearMonthDuration(_) => "year-month-duration",
            AtomicItem::Uri(_) => "uri",
            AtomicItem::Base64(_) => "base64",
        }
    }

    /// The canonical lexical rendering of this value.
    pub fn canonical(&self) -> String {
        match self {
            AtomicItem::String(s) | AtomicItem::Untyped(s) | AtomicItem::Uri(s) => s.clone(),
            AtomicItem::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            AtomicItem::Integer(i) => i.to_string(),
            AtomicItem::Decimal(d) => d.normalize().to_string(),
            AtomicItem::Date(d) => {
                let mut out = d.value.format("%Y-%m-%d").to_string();
                if let Some(offset) = &d.offset {
                    out.push_str(&format_offset(offset));
                }
                out
            }
            AtomicItem::DateTime(d) => {
                let mut out = d.value.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
                if let Some(offset) = &d.offset {
                    out.push_str(&format_offset(offset));
                }
                out
            }
            AtomicItem::Time(t) => {
                let mut out = t.value.format("%H:%M:%S%.f").to_string();
                if let Some(offset) = &t.offset {
                    out.push_str(&format_offset(offset));
                }
                out
            }
            AtomicItem::DayTimeDuration(d) => format_day_time_duration(d),
            AtomicItem::YearMonthDuration(months) => format_year_month_duration(*months),
            AtomicItem::Base64(bytes) => BASE64.encode(bytes),
        }
    }

    /// The boolean conversion used by the effective-boolean-value rule.
    ///
    /// Only booleans, numerics, and string-shaped values have one; anything
    /// else is a type error at the sequence level.
    pub fn effective_boolean(&self) -> Result<bool, MetapathError> {
        match self {
            AtomicItem::Boolean(b) => Ok(*b),
            AtomicItem::String(s) | AtomicItem::Untyped(s) | AtomicItem::Uri(s) => {
                Ok(!s.is_empty())
            }
            AtomicItem::Integer(i) => Ok(*i != 0),
            AtomicItem::Decimal(d) => Ok(!d.is_zero()),
            other => Err(MetapathError::type_error(format!(
                "{} has no effective boolean value",
                other.type_name()
            ))),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AtomicItem::Integer(_) | AtomicItem::Decimal(_))
    }

    /// Numeric value widened to decimal, when this item is numeric.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AtomicItem::Integer(i) => Some(Decimal::from(*i)),
            AtomicItem::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AtomicItem::Integer(i) => Some(*i),
            AtomicItem::Decimal(d) => d.trunc().to_i64(),
            _ => None,
        }
    }

    /// Cast to the target type, per the atomic subtype lattice.
    pub fn cast(&self, target: DataType) -> Result<AtomicItem, MetapathError> {
        let fail = || MetapathError::InvalidCast {
            from_type: self.type_name(),
            to_type: target.as_str(),
            value: self.canonical(),
        };

        match target {
            DataType::String | DataType::Token | DataType::NcName => {
                Ok(AtomicItem::String(self.canonical()))
            }
            DataType::UntypedAtomic => Ok(AtomicItem::Untyped(self.canonical())),
            DataType::Uri | DataType::UriReference => match self {
                AtomicItem::String(s) | AtomicItem::Untyped(s) | AtomicItem::Uri(s) => {
                    Ok(AtomicItem::Uri(s.clone()))
                }
                _ => Err(fail()),
            },
            DataType::Boolean => match self {
                AtomicItem::Boolean(b) => Ok(AtomicItem::Boolean(*b)),
                AtomicItem::Integer(i) => Ok(AtomicItem::Boolean(*i != 0)),
                AtomicItem::Decimal(d) => Ok(AtomicItem::Boolean(!d.is_zero())),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => match s.trim() {
                    "true" | "1" => Ok(AtomicItem::Boolean(true)),
                    "false" | "0" => Ok(AtomicItem::Boolean(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            DataType::Integer => self.cast_integer().ok_or_else(fail),
            DataType::NonNegativeInteger => match self.cast_integer() {
                Some(AtomicItem::Integer(i)) if i >= 0 => Ok(AtomicItem::Integer(i)),
                _ => Err(fail()),
            },
            DataType::PositiveInteger => match self.cast_integer() {
                Some(AtomicItem::Integer(i)) if i > 0 => Ok(AtomicItem::Integer(i)),
                _ => Err(fail()),
            },
            DataType::Decimal => match self {
                AtomicItem::Integer(i) => Ok(AtomicItem::Decimal(Decimal::from(*i))),
                AtomicItem::Decimal(d) => Ok(AtomicItem::Decimal(*d)),
                AtomicItem::Boolean(b) => {
                    Ok(AtomicItem::Decimal(Decimal::from(u8::from(*b))))
                }
                AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                    s.trim().parse().map(AtomicItem::Decimal).map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            DataType::Date => match self {
                AtomicItem::Date(_) => Ok(self.clone()),
                AtomicItem::DateTime(dt) => Ok(AtomicItem::Date(Date {
                    value: dt.value.date(),
                    offset: dt.offset,
                })),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                    parse_date(s.trim()).map(AtomicItem::Date).map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            DataType::DateTime => match self {
                AtomicItem::DateTime(_) => Ok(self.clone()),
                AtomicItem::Date(d) => Ok(AtomicItem::DateTime(DateTime {
                    value: d.value.and_hms_opt(0, 0, 0).ok_or_else(fail)?,
                    offset: d.offset,
                })),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => parse_date_time(s.trim())
                    .map(AtomicItem::DateTime)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
            DataType::Time => match self {
                AtomicItem::Time(_) => Ok(self.clone()),
                AtomicItem::DateTime(dt) => Ok(AtomicItem::Time(Time {
                    value: dt.value.time(),
                    offset: dt.offset,
                })),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                    parse_time(s.trim()).map(AtomicItem::Time).map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            DataType::DayTimeDuration => match self {
                AtomicItem::DayTimeDuration(_) => Ok(self.clone()),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                    parse_day_time_duration(s.trim())
                        .map(AtomicItem::DayTimeDuration)
                        .map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            DataType::YearMonthDuration => match self {
                AtomicItem::YearMonthDuration(_) => Ok(self.clone()),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                    parse_year_month_duration(s.trim())
                        .map(AtomicItem::YearMonthDuration)
                        .map_err(|_| fail())
                }
                _ => Err(fail()),
            },
            DataType::Base64 => match self {
                AtomicItem::Base64(_) => Ok(self.clone()),
                AtomicItem::String(s) | AtomicItem::Untyped(s) => BASE64
                    .decode(s.trim())
                    .map(AtomicItem::Base64)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
        }
    }

    fn cast_integer(&self) -> Option<AtomicItem> {
        match self {
            AtomicItem::Integer(i) => Some(AtomicItem::Integer(*i)),
            AtomicItem::Decimal(d) => d.trunc().to_i64().map(AtomicItem::Integer),
            AtomicItem::Boolean(b) => Some(AtomicItem::Integer(i64::from(*b))),
            AtomicItem::String(s) | AtomicItem::Untyped(s) => {
                s.trim().parse().ok().map(AtomicItem::Integer)
            }
            _ => None,
        }
    }

    /// The canonical key this value indexes a map under.
    ///
    /// Numeric values collapse to a normalized decimal so `5` and `5.0`
    /// address the same entry; string-shaped values collapse to their text.
    pub fn map_key(&self) -> MapKey {
        match self {
            AtomicItem::Boolean(b) => MapKey::Boolean(*b),
            AtomicItem::Integer(i) => MapKey::Number(Decimal::from(*i).normalize()),
            AtomicItem::Decimal(d) => MapKey::Number(d.normalize()),
            AtomicItem::String(s) | AtomicItem::Untyped(s) | AtomicItem::Uri(s) => {
                MapKey::String(s.clone())
            }
            AtomicItem::Base64(bytes) => MapKey::Binary(bytes.clone()),
            AtomicItem::Date(_) | AtomicItem::DateTime(_) | AtomicItem::Time(_) => {
                MapKey::Temporal(self.canonical())
            }
            AtomicItem::DayTimeDuration(_) | AtomicItem::YearMonthDuration(_) => {
                MapKey::Duration(self.canonical())
            }
        }
    }
}

impl PartialOrd for AtomicItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (AtomicItem::String(a), AtomicItem::String(b))
            | (AtomicItem::Untyped(a), AtomicItem::Untyped(b))
            | (AtomicItem::Uri(a), AtomicItem::Uri(b)) => a.partial_cmp(b),
            (AtomicItem::Boolean(a), AtomicItem::Boolean(b)) => a.partial_cmp(b),
            (AtomicItem::DayTimeDuration(a), AtomicItem::DayTimeDuration(b)) => a.partial_cmp(b),
            (AtomicItem::YearMonthDuration(a), AtomicItem::YearMonthDuration(b)) => {
                a.partial_cmp(b)
            }
            (AtomicItem::Date(a), AtomicItem::Date(b)) => {
                resolved_date(a).partial_cmp(&resolved_date(b))
            }
            (AtomicItem::DateTime(a), AtomicItem::DateTime(b)) => {
                resolved_date_time(a).partial_cmp(&resolved_date_time(b))
            }
            (AtomicItem::Time(a), AtomicItem::Time(b)) => {
                resolved_time(a).partial_cmp(&resolved_time(b))
            }
            _ => match (self.as_decimal(), other.as_decimal()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for AtomicItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<&str> for AtomicItem {
    fn from(s: &str) -> Self {
        AtomicItem::String(s.to_string())
    }
}

impl From<String> for AtomicItem {
    fn from(s: String) -> Self {
        AtomicItem::String(s)
    }
}

impl From<bool> for AtomicItem {
    fn from(b: bool) -> Self {
        AtomicItem::Boolean(b)
    }
}

impl From<i64> for AtomicItem {
    fn from(i: i64) -> Self {
        AtomicItem::Integer(i)
    }
}

impl From<Decimal> for AtomicItem {
    fn from(d: Decimal) -> Self {
        AtomicItem::Decimal(d)
    }
}

/// Canonicalized key for map entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Boolean(bool),
    Number(Decimal),
    String(String),
    Binary(Vec<u8>),
    Temporal(String),
    Duration(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Boolean(b) => write!(f, "{}", b),
            MapKey::Number(d) => write!(f, "{}", d),
            MapKey::String(s) | MapKey::Temporal(s) | MapKey::Duration(s) => write!(f, "{}", s),
            MapKey::Binary(bytes) => write!(f, "{}", BASE64.encode(bytes)),
        }
    }
}

// Timezone-less values compare as if in UTC.
fn resolved_date(d: &Date) -> NaiveDateTime {
    let midnight = d.value.and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN);
    match d.offset {
        Some(offset) => midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc())),
        None => midnight,
    }
}

fn resolved_date_time(d: &DateTime) -> NaiveDateTime {
    match d.offset {
        Some(offset) => d.value - TimeDelta::seconds(i64::from(offset.local_minus_utc())),
        None => d.value,
    }
}

fn resolved_time(t: &Time) -> NaiveTime {
    match t.offset {
        Some(offset) => t.value - TimeDelta::seconds(i64::from(offset.local_minus_utc())),
        None => t.value,
    }
}

fn format_offset(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    if secs == 0 {
        return "Z".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Split a trailing timezone designator off a date/time lexical form.
fn split_offset(s: &str) -> Result<(&str, Option<FixedOffset>), MetapathError> {
    if let Some(rest) = s.strip_suffix('Z') {
        return Ok((rest, FixedOffset::east_opt(0)));
    }
    if s.len() > 6 && s.is_char_boundary(s.len() - 6) {
        let (head, tail) = s.split_at(s.len() - 6);
        let bytes = tail.as_bytes();
        if (bytes[0] == b'+' || bytes[0] == b'-') && bytes[3] == b':' {
            let hours: i32 = tail[1..3]
                .parse()
                .map_err(|_| MetapathError::invalid_argument(format!("bad timezone in '{s}'")))?;
            let minutes: i32 = tail[4..6]
                .parse()
                .map_err(|_| MetapathError::invalid_argument(format!("bad timezone in '{s}'")))?;
            let mut secs = hours * 3600 + minutes * 60;
            if bytes[0] == b'-' {
                secs = -secs;
            }
            let offset = FixedOffset::east_opt(secs)
                .ok_or_else(|| MetapathError::invalid_argument(format!("bad timezone in '{s}'")))?;
            return Ok((head, Some(offset)));
        }
    }
    Ok((s, None))
}

pub fn parse_date(s: &str) -> Result<Date, MetapathError> {
    let (body, offset) = split_offset(s)?;
    let value = NaiveDate::parse_from_str(body, "%Y-%m-%d")
        .map_err(|e| MetapathError::invalid_argument(format!("invalid date '{s}': {e}")))?;
    Ok(Date { value, offset })
}

pub fn parse_date_time(s: &str) -> Result<DateTime, MetapathError> {
    let (body, offset) = split_offset(s)?;
    let value = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| MetapathError::invalid_argument(format!("invalid date-time '{s}': {e}")))?;
    Ok(DateTime { value, offset })
}

pub fn parse_time(s: &str) -> Result<Time, MetapathError> {
    let (body, offset) = split_offset(s)?;
    let value = NaiveTime::parse_from_str(body, "%H:%M:%S%.f")
        .map_err(|e| MetapathError::invalid_argument(format!("invalid time '{s}': {e}")))?;
    Ok(Time { value, offset })
}

/// Parse an ISO 8601 day-time duration such as `P2DT3H30M` or `-PT0.5S`.
pub fn parse_day_time_duration(s: &str) -> Result<TimeDelta, MetapathError> {
    let bad = || MetapathError::invalid_argument(format!("invalid day-time duration '{s}'"));
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let rest = rest.strip_prefix('P').ok_or_else(bad)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return Err(bad());
    }

    let mut millis: i64 = 0;
    for (number, designator) in scan_components(date_part).ok_or_else(bad)? {
        match designator {
            'D' => {
                let days: i64 = number.parse().map_err(|_| bad())?;
                millis += days * 86_400_000;
            }
            _ => return Err(bad()),
        }
    }
    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return Err(bad());
        }
        for (number, designator) in scan_components(time_part).ok_or_else(bad)? {
            match designator {
                'H' => {
                    let hours: i64 = number.parse().map_err(|_| bad())?;
                    millis += hours * 3_600_000;
                }
                'M' => {
                    let minutes: i64 = number.parse().map_err(|_| bad())?;
                    millis += minutes * 60_000;
                }
                'S' => {
                    let seconds: Decimal = number.parse().map_err(|_| bad())?;
                    let ms = (seconds * Decimal::from(1000)).trunc().to_i64().ok_or_else(bad)?;
                    millis += ms;
                }
                _ => return Err(bad()),
            }
        }
    }
    if negative {
        millis = -millis;
    }
    Ok(TimeDelta::milliseconds(millis))
}

/// Parse an ISO 8601 year-month duration such as `P1Y6M`, returning months.
pub fn parse_year_month_duration(s: &str) -> Result<i64, MetapathError> {
    let bad = || MetapathError::invalid_argument(format!("invalid year-month duration '{s}'"));
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let rest = rest.strip_prefix('P').ok_or_else(bad)?;
    if rest.is_empty() || rest.contains('T') {
        return Err(bad());
    }

    let mut months: i64 = 0;
    for (number, designator) in scan_components(rest).ok_or_else(bad)? {
        match designator {
            'Y' => {
                let years: i64 = number.parse().map_err(|_| bad())?;
                months += years * 12;
            }
            'M' => {
                let m: i64 = number.parse().map_err(|_| bad())?;
                months += m;
            }
            _ => return Err(bad()),
        }
    }
    if negative {
        months = -months;
    }
    Ok(months)
}

/// Split `"2D"` / `"3H30M"` style runs into (number, designator) pairs.
fn scan_components(s: &str) -> Option<Vec<(String, char)>> {
    let mut out = Vec::new();
    let mut number = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else if c.is_ascii_uppercase() {
            if number.is_empty() {
                return None;
            }
            out.push((std::mem::take(&mut number), c));
        } else {
            return None;
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(out)
}

pub fn format_day_time_duration(d: &TimeDelta) -> String {
    let mut millis = d.num_milliseconds();
    if millis == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::new();
    if millis < 0 {
        out.push('-');
        millis = -millis;
    }
    out.push('P');
    let days = millis / 86_400_000;
    millis %= 86_400_000;
    let hours = millis / 3_600_000;
    millis %= 3_600_000;
    let minutes = millis / 60_000;
    millis %= 60_000;
    let seconds = millis / 1000;
    let frac = millis % 1000;

    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || frac > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if frac > 0 {
            let fraction = format!("{frac:03}");
            out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
        } else if seconds > 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

pub fn format_year_month_duration(months: i64) -> String {
    if months == 0 {
        return "P0M".to_string();
    }
    let mut out = String::new();
    let mut months = months;
    if months < 0 {
        out.push('-');
        months = -months;
    }
    out.push('P');
    let years = months / 12;
    let rem = months % 12;
    if years > 0 {
        out.push_str(&format!("{years}Y"));
    }
    if rem > 0 || years == 0 {
        out.push_str(&format!("{rem}M"));
    }
    out
}
