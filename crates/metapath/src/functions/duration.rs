use metapath_schema::{DataType, QName};
use rust_decimal::Decimal;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, optional_atomic,
};
use crate::types::{AtomicItem, Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let arg = ArgumentSpec::new("arg", ItemType::Duration, Occurrence::ZeroOrOne);
    let int_ret = ArgumentSpec::new("result", ItemType::Integer, Occurrence::ZeroOrOne);

    for (name, handler) in [
        ("years-from-duration", fn_years as super::BuiltinFn),
        ("months-from-duration", fn_months),
        ("days-from-duration", fn_days),
        ("hours-from-duration", fn_hours),
        ("minutes-from-duration", fn_minutes),
    ] {
        registry.register(FunctionSignature::new(
            QName::local_only(name),
            1,
            Some(1),
            vec![arg],
            int_ret,
            handler,
        ));
    }
    registry.register(FunctionSignature::new(
        QName::local_only("seconds-from-duration"),
        1,
        Some(1),
        vec![arg],
        ArgumentSpec::new("result", ItemType::Numeric, Occurrence::ZeroOrOne),
        fn_seconds,
    ));
}

/// A duration argument: either concrete duration subtype, with strings
/// parsed through the duration casts.
fn duration_arg(seq: &Sequence) -> Result<Option<AtomicItem>, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(None),
        Some(atom @ (AtomicItem::DayTimeDuration(_) | AtomicItem::YearMonthDuration(_))) => {
            Ok(Some(atom))
        }
        Some(atom @ (AtomicItem::String(_) | AtomicItem::Untyped(_))) => {
            let text = atom.canonical();
            atom.cast(DataType::YearMonthDuration)
                .or_else(|_| AtomicItem::String(text).cast(DataType::DayTimeDuration))
                .map(Some)
        }
        Some(other) => Err(MetapathError::type_error(format!(
            "expected a duration, got {}",
            other.type_name()
        ))),
    }
}

// Components of the other duration category are zero, not errors.

fn fn_years(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::YearMonthDuration(months)) => Sequence::from_integer(months / 12),
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}

fn fn_months(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::YearMonthDuration(months)) => Sequence::from_integer(months % 12),
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}

fn fn_days(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::DayTimeDuration(d)) => Sequence::from_integer(d.num_days()),
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}

fn fn_hours(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::DayTimeDuration(d)) => Sequence::from_integer(d.num_hours() % 24),
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}

fn fn_minutes(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::DayTimeDuration(d)) => Sequence::from_integer(d.num_minutes() % 60),
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}

fn fn_seconds(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(match duration_arg(&args[0])? {
        Some(AtomicItem::DayTimeDuration(d)) => {
            let millis = d.num_milliseconds() % 60_000;
            Sequence::from_atomic(AtomicItem::Decimal(Decimal::new(millis, 3).normalize()))
        }
        Some(_) => Sequence::from_integer(0),
        None => Sequence::empty(),
    })
}
