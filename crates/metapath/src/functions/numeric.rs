//! Numeric functions, including the aggregates and their promotion rule.

use chrono::TimeDelta;
use metapath_schema::QName;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, numeric_decimal,
    optional_atomic, required_atomic,
};
use crate::types::{AtomicItem, Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let numeric_ret = ArgumentSpec::new("result", ItemType::Numeric, Occurrence::ZeroOrOne);
    let atomic_ret = ArgumentSpec::new("result", ItemType::Atomic, Occurrence::ZeroOrOne);
    let arg = ArgumentSpec::new("arg", ItemType::Numeric, Occurrence::ZeroOrOne);
    let many = ArgumentSpec::new("arg", ItemType::Atomic, Occurrence::ZeroOrMore);

    for (name, handler) in [
        ("abs", fn_abs as super::BuiltinFn),
        ("ceiling", fn_ceiling),
        ("floor", fn_floor),
    ] {
        registry.register(FunctionSignature::new(
            QName::local_only(name),
            1,
            Some(1),
            vec![arg],
            numeric_ret,
            handler,
        ));
    }
    registry.register(FunctionSignature::new(
        QName::local_only("round"),
        1,
        Some(2),
        vec![
            arg,
            ArgumentSpec::new("precision", ItemType::Integer, Occurrence::One),
        ],
        numeric_ret,
        fn_round,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("round-half-to-even"),
        1,
        Some(2),
        vec![
            arg,
            ArgumentSpec::new("precision", ItemType::Integer, Occurrence::One),
        ],
        numeric_ret,
        fn_round_half_to_even,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("number"),
        0,
        Some(1),
        vec![ArgumentSpec::new("arg", ItemType::Atomic, Occurrence::ZeroOrOne)],
        ArgumentSpec::new("result", ItemType::Numeric, Occurrence::One),
        fn_number,
    ).focus_dependent());
    registry.register(FunctionSignature::new(
        QName::local_only("sum"),
        1,
        Some(2),
        vec![
            many,
            ArgumentSpec::new("zero", ItemType::Atomic, Occurrence::ZeroOrOne),
        ],
        atomic_ret,
        fn_sum,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("avg"),
        1,
        Some(1),
        vec![many],
        atomic_ret,
        fn_avg,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("min"),
        1,
        Some(1),
        vec![many],
        atomic_ret,
        fn_min,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("max"),
        1,
        Some(1),
        vec![many],
        atomic_ret,
        fn_max,
    ));
}

/// Operands of an aggregate after untyped-to-decimal coercion: exactly one
/// of the three categories, or a type error.
enum Operands {
    Empty,
    Numeric(Vec<(Decimal, AtomicItem)>),
    DayTime(Vec<TimeDelta>),
    YearMonth(Vec<i64>),
}

fn aggregate_operands(seq: &Sequence) -> Result<Operands, MetapathError> {
    let mut operands = Operands::Empty;
    for atom in seq.atomize()? {
        let atom = match atom {
            AtomicItem::Untyped(_) => atom.cast(metapath_schema::DataType::Decimal)?,
            other => other,
        };
        operands = match (operands, atom) {
            (Operands::Empty, AtomicItem::DayTimeDuration(d)) => Operands::DayTime(vec![d]),
            (Operands::Empty, AtomicItem::YearMonthDuration(m)) => Operands::YearMonth(vec![m]),
            (Operands::Empty, atom) => {
                let d = numeric_decimal(&atom)?;
                Operands::Numeric(vec![(d, atom)])
            }
            (Operands::DayTime(mut v), AtomicItem::DayTimeDuration(d)) => {
                v.push(d);
                Operands::DayTime(v)
            }
            (Operands::YearMonth(mut v), AtomicItem::YearMonthDuration(m)) => {
                v.push(m);
                Operands::YearMonth(v)
            }
            (Operands::Numeric(mut v), atom) if atom.is_numeric() => {
                let d = numeric_decimal(&atom)?;
                v.push((d, atom));
                Operands::Numeric(v)
            }
            (_, atom) => {
                return Err(MetapathError::type_error(format!(
                    "cannot aggregate {} with earlier operands",
                    atom.type_name()
                )));
            }
        };
    }
    Ok(operands)
}

fn fn_sum(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let zero = if args.len() == 2 {
        optional_atomic(&args.remove(1))?
    } else {
        None
    };
    match aggregate_operands(&args[0])? {
        Operands::Empty => Ok(match zero {
            Some(zero) => Sequence::from_atomic(zero),
            None => Sequence::from_integer(0),
        }),
        Operands::Numeric(v) => {
            let total: Decimal = v.iter().map(|(d, _)| d).sum();
            Ok(numeric_result(total, v.iter().all(|(_, a)| matches!(a, AtomicItem::Integer(_)))))
        }
        Operands::DayTime(v) => {
            let total = v.into_iter().fold(TimeDelta::zero(), |acc, d| acc + d);
            Ok(Sequence::from_atomic(AtomicItem::DayTimeDuration(total)))
        }
        Operands::YearMonth(v) => {
            let total: i64 = v.into_iter().sum();
            Ok(Sequence::from_atomic(AtomicItem::YearMonthDuration(total)))
        }
    }
}

fn fn_avg(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    match aggregate_operands(&args[0])? {
        Operands::Empty => Ok(Sequence::empty()),
        Operands::Numeric(v) => {
            let count = Decimal::from(v.len() as i64);
            let total: Decimal = v.iter().map(|(d, _)| d).sum();
            Ok(Sequence::from_atomic(AtomicItem::Decimal(
                (total / count).normalize(),
            )))
        }
        Operands::DayTime(v) => {
            let count = v.len() as i64;
            let total = v.into_iter().fold(TimeDelta::zero(), |acc, d| acc + d);
            Ok(Sequence::from_atomic(AtomicItem::DayTimeDuration(
                TimeDelta::milliseconds(total.num_milliseconds() / count),
            )))
        }
        Operands::YearMonth(v) => {
            let count = Decimal::from(v.len() as i64);
            let total = Decimal::from(v.into_iter().sum::<i64>());
            let months = (total / count)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .ok_or_else(|| MetapathError::type_error("year-month average overflows"))?;
            Ok(Sequence::from_atomic(AtomicItem::YearMonthDuration(months)))
        }
    }
}

fn fn_min(
    args: Vec<Sequence>,
    context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    extremum(args, context, focus, false)
}

fn fn_max(
    args: Vec<Sequence>,
    context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    extremum(args, context, focus, true)
}

fn extremum(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
    want_max: bool,
) -> Result<Sequence, MetapathError> {
    match aggregate_operands(&args[0])? {
        Operands::Empty => Ok(Sequence::empty()),
        Operands::Numeric(v) => {
            // keep the original concrete operand, not a widened copy
            let best = v
                .into_iter()
                .reduce(|best, candidate| {
                    let better = if want_max {
                        candidate.0 > best.0
                    } else {
                        candidate.0 < best.0
                    };
                    if better { candidate } else { best }
                })
                .map(|(_, atom)| atom);
            Ok(best.map(Sequence::from_atomic).unwrap_or_default())
        }
        Operands::DayTime(v) => {
            let best = if want_max {
                v.into_iter().max()
            } else {
                v.into_iter().min()
            };
            Ok(best
                .map(|d| Sequence::from_atomic(AtomicItem::DayTimeDuration(d)))
                .unwrap_or_default())
        }
        Operands::YearMonth(v) => {
            let best = if want_max {
                v.into_iter().max()
            } else {
                v.into_iter().min()
            };
            Ok(best
                .map(|m| Sequence::from_atomic(AtomicItem::YearMonthDuration(m)))
                .unwrap_or_default())
        }
    }
}

fn numeric_result(value: Decimal, all_integers: bool) -> Sequence {
    if all_integers && value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Sequence::from_integer(i);
        }
    }
    Sequence::from_atomic(AtomicItem::Decimal(value.normalize()))
}

fn fn_abs(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    unary_by_subtype(&args[0], |i| i.abs(), |d| d.abs())
}

fn fn_ceiling(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    unary_by_subtype(&args[0], |i| i, |d| d.ceil())
}

fn fn_floor(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    unary_by_subtype(&args[0], |i| i, |d| d.floor())
}

/// Apply per-subtype rules and cast back to the input's concrete subtype.
fn unary_by_subtype(
    seq: &Sequence,
    on_integer: impl Fn(i64) -> i64,
    on_decimal: impl Fn(Decimal) -> Decimal,
) -> Result<Sequence, MetapathError> {
    match optional_atomic(seq)? {
        None => Ok(Sequence::empty()),
        Some(atom) => {
            let coerced = match atom {
                AtomicItem::Untyped(_) => atom.cast(metapath_schema::DataType::Decimal)?,
                other => other,
            };
            match coerced {
                AtomicItem::Integer(i) => Ok(Sequence::from_integer(on_integer(i))),
                AtomicItem::Decimal(d) => {
                    Ok(Sequence::from_atomic(AtomicItem::Decimal(on_decimal(d))))
                }
                other => Err(MetapathError::type_error(format!(
                    "expected numeric, got {}",
                    other.type_name()
                ))),
            }
        }
    }
}

fn fn_round(
    args: Vec<Sequence>,
    context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    round_with(args, context, focus, RoundingStrategy::MidpointAwayFromZero)
}

fn fn_round_half_to_even(
    args: Vec<Sequence>,
    context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    round_with(args, context, focus, RoundingStrategy::MidpointNearestEven)
}

fn round_with(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
    strategy: RoundingStrategy,
) -> Result<Sequence, MetapathError> {
    let precision = if args.len() == 2 {
        super::integer_arg(&args.remove(1))?
    } else {
        0
    };
    unary_by_subtype(
        &args[0],
        |i| round_integer(i, precision, strategy),
        |d| round_decimal(d, precision, strategy),
    )
}

fn round_decimal(value: Decimal, precision: i64, strategy: RoundingStrategy) -> Decimal {
    if precision >= 0 {
        return value.round_dp_with_strategy(precision.min(28) as u32, strategy);
    }
    // negative precision rounds to tens, hundreds, ...
    let factor = Decimal::from(10_i64.pow((-precision).min(18) as u32));
    (value / factor).round_dp_with_strategy(0, strategy) * factor
}

fn round_integer(value: i64, precision: i64, strategy: RoundingStrategy) -> i64 {
    if precision >= 0 {
        return value;
    }
    round_decimal(Decimal::from(value), precision, strategy)
        .to_i64()
        .unwrap_or(value)
}

fn fn_number(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let atom = match args.first() {
        Some(seq) => required_atomic(seq)?,
        None => match focus {
            Some(item) => {
                let mut atoms = Vec::new();
                item.atomize_into(&mut atoms)?;
                Sequence::from_items(atoms.into_iter().map(Item::Atomic).collect())
                    .one()?
                    .as_atomic()
                    .cloned()
                    .ok_or(MetapathError::MissingFocus)?
            }
            None => return Err(MetapathError::MissingFocus),
        },
    };
    let value = atom
        .cast(metapath_schema::DataType::Decimal)
        .map_err(|_| MetapathError::type_error(format!("cannot convert {} to a number", atom.type_name())))?;
    Ok(Sequence::from_atomic(value))
}
