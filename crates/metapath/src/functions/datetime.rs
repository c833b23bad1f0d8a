use chrono::{TimeDelta, Timelike};
use metapath_schema::{DataType, QName};
use rust_decimal::Decimal;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, optional_atomic,
};
use crate::types::{AtomicItem, Date, DateTime, Item, Sequence, Time};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let temporal_ret = ArgumentSpec::new("result", ItemType::Temporal, Occurrence::One);
    let component_ret = ArgumentSpec::new("result", ItemType::Integer, Occurrence::ZeroOrOne);
    let temporal_arg = ArgumentSpec::new("arg", ItemType::Temporal, Occurrence::ZeroOrOne);

    for (name, handler) in [
        ("current-date", fn_current_date as super::BuiltinFn),
        ("current-dateTime", fn_current_date_time),
        ("current-time", fn_current_time),
    ] {
        registry.register(
            FunctionSignature::new(QName::local_only(name), 0, Some(0), vec![], temporal_ret, handler)
                .non_deterministic()
                .context_dependent(),
        );
    }

    registry.register(FunctionSignature::new(
        QName::local_only("dateTime"),
        2,
        Some(2),
        vec![
            ArgumentSpec::new("date", ItemType::Temporal, Occurrence::ZeroOrOne),
            ArgumentSpec::new("time", ItemType::Temporal, Occurrence::ZeroOrOne),
        ],
        ArgumentSpec::new("result", ItemType::Temporal, Occurrence::ZeroOrOne),
        fn_date_time,
    ));

    for (name, handler) in [
        ("year-from-date", fn_year_from_date as super::BuiltinFn),
        ("month-from-date", fn_month_from_date),
        ("day-from-date", fn_day_from_date),
        ("year-from-dateTime", fn_year_from_date_time),
        ("month-from-dateTime", fn_month_from_date_time),
        ("day-from-dateTime", fn_day_from_date_time),
        ("hours-from-dateTime", fn_hours_from_date_time),
        ("minutes-from-dateTime", fn_minutes_from_date_time),
        ("hours-from-time", fn_hours_from_time),
        ("minutes-from-time", fn_minutes_from_time),
    ] {
        registry.register(FunctionSignature::new(
            QName::local_only(name),
            1,
            Some(1),
            vec![temporal_arg],
            component_ret,
            handler,
        ));
    }
    registry.register(FunctionSignature::new(
        QName::local_only("seconds-from-dateTime"),
        1,
        Some(1),
        vec![temporal_arg],
        ArgumentSpec::new("result", ItemType::Numeric, Occurrence::ZeroOrOne),
        fn_seconds_from_date_time,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("seconds-from-time"),
        1,
        Some(1),
        vec![temporal_arg],
        ArgumentSpec::new("result", ItemType::Numeric, Occurrence::ZeroOrOne),
        fn_seconds_from_time,
    ));
    for (name, handler) in [
        ("timezone-from-date", fn_timezone_from_date as super::BuiltinFn),
        ("timezone-from-dateTime", fn_timezone_from_date_time),
        ("timezone-from-time", fn_timezone_from_time),
    ] {
        registry.register(FunctionSignature::new(
            QName::local_only(name),
            1,
            Some(1),
            vec![temporal_arg],
            ArgumentSpec::new("result", ItemType::Duration, Occurrence::ZeroOrOne),
            handler,
        ));
    }
    registry.register(
        FunctionSignature::new(
            QName::local_only("implicit-timezone"),
            0,
            Some(0),
            vec![],
            ArgumentSpec::new("result", ItemType::Duration, Occurrence::One),
            fn_implicit_timezone,
        )
        .context_dependent(),
    );
}

fn fn_current_date_time(
    _args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_atomic(AtomicItem::DateTime(
        context.current_date_time(),
    )))
}

fn fn_current_date(
    _args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let now = context.current_date_time();
    Ok(Sequence::from_atomic(AtomicItem::Date(Date {
        value: now.value.date(),
        offset: now.offset,
    })))
}

fn fn_current_time(
    _args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let now = context.current_date_time();
    Ok(Sequence::from_atomic(AtomicItem::Time(Time {
        value: now.value.time(),
        offset: now.offset,
    })))
}

/// Combine a date and a time into a dateTime. Each side may carry a
/// timezone; carrying two different ones is an error.
fn fn_date_time(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let time = optional_atomic(&args.remove(1))?;
    let date = optional_atomic(&args.remove(0))?;
    let (Some(date), Some(time)) = (date, time) else {
        return Ok(Sequence::empty());
    };

    let date = match date.cast(DataType::Date)? {
        AtomicItem::Date(d) => d,
        _ => return Err(MetapathError::type_error("expected a date")),
    };
    let time = match time.cast(DataType::Time)? {
        AtomicItem::Time(t) => t,
        _ => return Err(MetapathError::type_error("expected a time")),
    };

    let offset = match (date.offset, time.offset) {
        (Some(d), Some(t)) if d != t => {
            return Err(MetapathError::invalid_argument(
                "date and time carry different timezones",
            ));
        }
        (Some(d), _) => Some(d),
        (None, t) => t,
    };

    Ok(Sequence::from_atomic(AtomicItem::DateTime(DateTime {
        value: date.value.and_time(time.value),
        offset,
    })))
}

fn date_arg(seq: &Sequence) -> Result<Option<Date>, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(None),
        Some(atom) => match atom.cast(DataType::Date)? {
            AtomicItem::Date(d) => Ok(Some(d)),
            _ => Err(MetapathError::type_error("expected a date")),
        },
    }
}

fn date_time_arg(seq: &Sequence) -> Result<Option<DateTime>, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(None),
        Some(atom) => match atom.cast(DataType::DateTime)? {
            AtomicItem::DateTime(d) => Ok(Some(d)),
            _ => Err(MetapathError::type_error("expected a date-time")),
        },
    }
}

fn time_arg(seq: &Sequence) -> Result<Option<Time>, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(None),
        Some(atom) => match atom.cast(DataType::Time)? {
            AtomicItem::Time(t) => Ok(Some(t)),
            _ => Err(MetapathError::type_error("expected a time")),
        },
    }
}

fn component<T>(
    value: Option<T>,
    extract: impl Fn(&T) -> i64,
) -> Sequence {
    value
        .map(|v| Sequence::from_integer(extract(&v)))
        .unwrap_or_default()
}

fn fn_year_from_date(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_arg(&args[0])?, |d| i64::from(d.value.year())))
}

fn fn_month_from_date(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_arg(&args[0])?, |d| i64::from(d.value.month())))
}

fn fn_day_from_date(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_arg(&args[0])?, |d| i64::from(d.value.day())))
}

fn fn_year_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_time_arg(&args[0])?, |d| i64::from(d.value.year())))
}

fn fn_month_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_time_arg(&args[0])?, |d| i64::from(d.value.month())))
}

fn fn_day_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    use chrono::Datelike;
    Ok(component(date_time_arg(&args[0])?, |d| i64::from(d.value.day())))
}

fn fn_hours_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(component(date_time_arg(&args[0])?, |d| i64::from(d.value.hour())))
}

fn fn_minutes_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(component(date_time_arg(&args[0])?, |d| i64::from(d.value.minute())))
}

fn fn_seconds_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match date_time_arg(&args[0])? {
        Some(d) => Sequence::from_atomic(AtomicItem::Decimal(seconds_with_fraction(
            d.value.second(),
            d.value.nanosecond(),
        ))),
        None => Sequence::empty(),
    })
}

fn fn_hours_from_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(component(time_arg(&args[0])?, |t| i64::from(t.value.hour())))
}

fn fn_minutes_from_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(component(time_arg(&args[0])?, |t| i64::from(t.value.minute())))
}

fn fn_seconds_from_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match time_arg(&args[0])? {
        Some(t) => Sequence::from_atomic(AtomicItem::Decimal(seconds_with_fraction(
            t.value.second(),
            t.value.nanosecond(),
        ))),
        None => Sequence::empty(),
    })
}

fn seconds_with_fraction(seconds: u32, nanoseconds: u32) -> Decimal {
    let millis = i64::from(nanoseconds) / 1_000_000;
    (Decimal::from(seconds) + Decimal::new(millis, 3)).normalize()
}

fn timezone_duration(offset: Option<chrono::FixedOffset>) -> Sequence {
    match offset {
        Some(offset) => Sequence::from_atomic(AtomicItem::DayTimeDuration(TimeDelta::seconds(
            i64::from(offset.local_minus_utc()),
        ))),
        None => Sequence::empty(),
    }
}

fn fn_timezone_from_date(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(date_arg(&args[0])?
        .map(|d| timezone_duration(d.offset))
        .unwrap_or_default())
}

fn fn_timezone_from_date_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(date_time_arg(&args[0])?
        .map(|d| timezone_duration(d.offset))
        .unwrap_or_default())
}

fn fn_timezone_from_time(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(time_arg(&args[0])?
        .map(|t| timezone_duration(t.offset))
        .unwrap_or_default())
}

fn fn_implicit_timezone(
    _args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(timezone_duration(Some(context.implicit_timezone())))
}
