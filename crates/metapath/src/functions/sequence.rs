use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, integer_arg,
};
use crate::types::{Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let any_many = ArgumentSpec::new("arg", ItemType::Any, Occurrence::ZeroOrMore);
    let seq_ret = ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore);
    let position = ArgumentSpec::new("position", ItemType::Integer, Occurrence::One);

    registry.register(FunctionSignature::new(
        QName::local_only("count"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Integer, Occurrence::One),
        fn_count,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("empty"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
        fn_empty,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("exists"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
        fn_exists,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("head"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrOne),
        fn_head,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("tail"),
        1,
        Some(1),
        vec![any_many],
        seq_ret,
        fn_tail,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("reverse"),
        1,
        Some(1),
        vec![any_many],
        seq_ret,
        fn_reverse,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("subsequence"),
        2,
        Some(3),
        vec![
            any_many,
            ArgumentSpec::new("start", ItemType::Numeric, Occurrence::One),
            ArgumentSpec::new("length", ItemType::Numeric, Occurrence::One),
        ],
        seq_ret,
        fn_subsequence,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("distinct-values"),
        1,
        Some(1),
        vec![any_many],
        seq_ret,
        fn_distinct_values,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("insert-before"),
        3,
        Some(3),
        vec![any_many, position, any_many],
        seq_ret,
        fn_insert_before,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("remove"),
        2,
        Some(2),
        vec![any_many, position],
        seq_ret,
        fn_remove,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("index-of"),
        2,
        Some(2),
        vec![
            any_many,
            ArgumentSpec::new("search", ItemType::Atomic, Occurrence::One),
        ],
        seq_ret,
        fn_index_of,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("deep-equal"),
        2,
        Some(2),
        vec![any_many, any_many],
        ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
        fn_deep_equal,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("zero-or-one"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrOne),
        fn_zero_or_one,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("one-or-more"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::OneOrMore),
        fn_one_or_more,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("exactly-one"),
        1,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::One),
        fn_exactly_one,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("data"),
        0,
        Some(1),
        vec![any_many],
        ArgumentSpec::new("result", ItemType::Atomic, Occurrence::ZeroOrMore),
        fn_data,
    ).focus_dependent());
}

fn fn_count(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_integer(args[0].len() as i64))
}

fn fn_empty(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_bool(args[0].is_empty()))
}

fn fn_exists(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_bool(!args[0].is_empty()))
}

fn fn_head(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(args
        .remove(0)
        .into_items()
        .into_iter()
        .next()
        .map(Sequence::of)
        .unwrap_or_default())
}

fn fn_tail(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut items = args.remove(0).into_items();
    if !items.is_empty() {
        items.remove(0);
    }
    Ok(Sequence::from_items(items))
}

fn fn_reverse(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut items = args.remove(0).into_items();
    items.reverse();
    Ok(Sequence::from_items(items))
}

fn fn_subsequence(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let length = if args.len() == 3 {
        Some(integer_arg(&args.remove(2))?)
    } else {
        None
    };
    let start = integer_arg(&args.remove(1))?;
    let items = args.remove(0).into_items();

    let from = (start - 1).max(0) as usize;
    let result: Vec<Item> = match length {
        Some(length) => {
            let end = (start + length - 1).max(0) as usize;
            items
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i >= from && *i < end)
                .map(|(_, item)| item)
                .collect()
        }
        None => items.into_iter().skip(from).collect(),
    };
    Ok(Sequence::from_items(result))
}

fn fn_distinct_values(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for atom in args[0].atomize()? {
        if seen.insert(atom.map_key()) {
            out.push(Item::Atomic(atom));
        }
    }
    Ok(Sequence::from_items(out))
}

fn fn_insert_before(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let inserts = args.remove(2);
    let position = integer_arg(&args.remove(1))?;
    Ok(args.remove(0).insert_before(position, &inserts))
}

fn fn_remove(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let position = integer_arg(&args.remove(1))?;
    Ok(args.remove(0).remove(position))
}

fn fn_index_of(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let search = super::required_atomic(&args.remove(1))?;
    let key = search.map_key();
    let positions: Vec<Item> = args
        .remove(0)
        .atomize()?
        .into_iter()
        .enumerate()
        .filter(|(_, atom)| atom.map_key() == key)
        .map(|(i, _)| Item::Atomic(crate::types::AtomicItem::Integer(i as i64 + 1)))
        .collect();
    Ok(Sequence::from_items(positions))
}

fn fn_deep_equal(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_bool(deep_equal_sequences(
        &args[0], &args[1],
    )?))
}

pub(crate) fn deep_equal_sequences(a: &Sequence, b: &Sequence) -> Result<bool, MetapathError> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b.iter()) {
        if !deep_equal_items(x, y)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn deep_equal_items(a: &Item, b: &Item) -> Result<bool, MetapathError> {
    match (a, b) {
        (Item::Atomic(x), Item::Atomic(y)) => Ok(x.map_key() == y.map_key()),
        (Item::Array(x), Item::Array(y)) => {
            if x.size() != y.size() {
                return Ok(false);
            }
            for (mx, my) in x.iter().zip(y.iter()) {
                if !deep_equal_sequences(mx, my)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Item::Map(x), Item::Map(y)) => {
            if x.size() != y.size() {
                return Ok(false);
            }
            for (key, value) in x.entries() {
                match y.get(key) {
                    Some(other) if deep_equal_sequences(value, other)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Item::Node(x), Item::Node(y)) => {
            if x.name() != y.name() || x.atomized() != y.atomized() {
                return Ok(false);
            }
            let (xc, yc) = (x.model_children(), y.model_children());
            if xc.len() != yc.len() {
                return Ok(false);
            }
            for (cx, cy) in xc.iter().zip(yc.iter()) {
                if !deep_equal_items(&Item::Node(cx.clone()), &Item::Node(cy.clone()))? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn fn_zero_or_one(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let seq = args.remove(0);
    seq.zero_or_one()?;
    Ok(seq)
}

fn fn_one_or_more(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let seq = args.remove(0);
    seq.one_or_more()?;
    Ok(seq)
}

fn fn_exactly_one(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let seq = args.remove(0);
    seq.one()?;
    Ok(seq)
}

fn fn_data(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let atoms = match args.pop() {
        Some(seq) => seq.atomize()?,
        None => match focus {
            Some(item) => {
                let mut atoms = Vec::new();
                item.atomize_into(&mut atoms)?;
                atoms
            }
            None => return Err(MetapathError::MissingFocus),
        },
    };
    Ok(Sequence::from_items(atoms.into_iter().map(Item::Atomic).collect()))
}
