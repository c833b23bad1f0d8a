//! The `array:*` function family. All positions are 1-based and strict.

use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ARRAY_NS, ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, array_arg,
    integer_arg,
};
use crate::types::{ArrayItem, Item, Sequence};

fn name(local: &str) -> QName {
    QName::new(ARRAY_NS, local)
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let array_one = ArgumentSpec::new("array", ItemType::Array, Occurrence::One);
    let position = ArgumentSpec::new("position", ItemType::Integer, Occurrence::One);
    let member = ArgumentSpec::new("member", ItemType::Any, Occurrence::ZeroOrMore);
    let array_ret = ArgumentSpec::new("result", ItemType::Array, Occurrence::One);

    registry.register(FunctionSignature::new(
        name("get"),
        2,
        Some(2),
        vec![array_one, position],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore),
        array_get,
    ));
    registry.register(FunctionSignature::new(
        name("put"),
        3,
        Some(3),
        vec![array_one, position, member],
        array_ret,
        array_put,
    ));
    registry.register(FunctionSignature::new(
        name("append"),
        2,
        Some(2),
        vec![array_one, member],
        array_ret,
        array_append,
    ));
    registry.register(FunctionSignature::new(
        name("remove"),
        2,
        Some(2),
        vec![
            array_one,
            ArgumentSpec::new("positions", ItemType::Integer, Occurrence::ZeroOrMore),
        ],
        array_ret,
        array_remove,
    ));
    registry.register(FunctionSignature::new(
        name("insert-before"),
        3,
        Some(3),
        vec![array_one, position, member],
        array_ret,
        array_insert_before,
    ));
    registry.register(FunctionSignature::new(
        name("subarray"),
        2,
        Some(3),
        vec![
            array_one,
            position,
            ArgumentSpec::new("length", ItemType::Integer, Occurrence::One),
        ],
        array_ret,
        array_subarray,
    ));
    registry.register(FunctionSignature::new(
        name("head"),
        1,
        Some(1),
        vec![array_one],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore),
        array_head,
    ));
    registry.register(FunctionSignature::new(
        name("tail"),
        1,
        Some(1),
        vec![array_one],
        array_ret,
        array_tail,
    ));
    registry.register(FunctionSignature::new(
        name("reverse"),
        1,
        Some(1),
        vec![array_one],
        array_ret,
        array_reverse,
    ));
    registry.register(FunctionSignature::new(
        name("join"),
        1,
        Some(1),
        vec![ArgumentSpec::new("arrays", ItemType::Array, Occurrence::ZeroOrMore)],
        array_ret,
        array_join,
    ));
    registry.register(FunctionSignature::new(
        name("size"),
        1,
        Some(1),
        vec![array_one],
        ArgumentSpec::new("result", ItemType::Integer, Occurrence::One),
        array_size,
    ));
    registry.register(FunctionSignature::new(
        name("flatten"),
        1,
        Some(1),
        vec![ArgumentSpec::new("input", ItemType::Any, Occurrence::ZeroOrMore)],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore),
        array_flatten,
    ));
}

fn array_get(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let position = integer_arg(&args.remove(1))?;
    let array = array_arg(&args.remove(0))?;
    Ok(array.get(position)?.clone())
}

fn array_put(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let member = args.remove(2);
    let position = integer_arg(&args.remove(1))?;
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(array.put(position, member)?)))
}

fn array_append(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let member = args.remove(1);
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(array.append(member))))
}

fn array_remove(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut positions = Vec::new();
    for atom in args.remove(1).atomize()? {
        positions.push(atom.as_integer().ok_or_else(|| {
            MetapathError::type_error(format!("expected integer, got {}", atom.type_name()))
        })?);
    }
    let mut array = array_arg(&args.remove(0))?;
    // delete from the highest position down so earlier removals don't
    // shift later targets
    positions.sort_unstable();
    positions.dedup();
    for position in positions.into_iter().rev() {
        array = array.remove(position)?;
    }
    Ok(Sequence::of(Item::Array(array)))
}

fn array_insert_before(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let member = args.remove(2);
    let position = integer_arg(&args.remove(1))?;
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(
        array.insert_before(position, member)?,
    )))
}

fn array_subarray(
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
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(array.subarray(start, length)?)))
}

fn array_head(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let array = array_arg(&args.remove(0))?;
    Ok(array.head()?.clone())
}

fn array_tail(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(array.tail()?)))
}

fn array_reverse(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Array(array.reverse())))
}

fn array_join(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut arrays = Vec::new();
    for item in args.remove(0).items() {
        match item {
            Item::Array(a) => arrays.push(a.clone()),
            other => {
                return Err(MetapathError::type_error(format!(
                    "array:join expects arrays, got {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(Sequence::of(Item::Array(ArrayItem::join(&arrays))))
}

fn array_size(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let array = array_arg(&args.remove(0))?;
    Ok(Sequence::from_integer(array.size() as i64))
}

fn array_flatten(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut out = Vec::new();
    for item in args.remove(0).into_items() {
        match item {
            Item::Array(array) => out.extend(array.flatten()),
            other => out.push(other),
        }
    }
    Ok(Sequence::from_items(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array(values: &[i64]) -> Sequence {
        Sequence::of(Item::Array(ArrayItem::from_members(
            values.iter().map(|i| Sequence::from_integer(*i)).collect(),
        )))
    }

    fn call(f: super::super::BuiltinFn, args: Vec<Sequence>) -> Result<Sequence, MetapathError> {
        f(args, &DynamicContext::default(), None)
    }

    #[test]
    fn test_get_is_strict() {
        assert_eq!(
            call(array_get, vec![int_array(&[1, 2, 3]), Sequence::from_integer(2)]).unwrap(),
            Sequence::from_integer(2)
        );
        assert!(matches!(
            call(array_get, vec![int_array(&[1, 2, 3]), Sequence::from_integer(0)]),
            Err(MetapathError::IndexError { .. })
        ));
        assert!(matches!(
            call(array_get, vec![int_array(&[1, 2, 3]), Sequence::from_integer(4)]),
            Err(MetapathError::IndexError { .. })
        ));
    }

    #[test]
    fn test_put_then_get() {
        let updated = call(
            array_put,
            vec![int_array(&[1, 2, 3]), Sequence::from_integer(2), Sequence::from_integer(9)],
        )
        .unwrap();
        assert_eq!(
            call(array_get, vec![updated, Sequence::from_integer(2)]).unwrap(),
            Sequence::from_integer(9)
        );
    }

    #[test]
    fn test_subarray_matches_sequence_semantics() {
        let sub = call(
            array_subarray,
            vec![
                int_array(&[1, 2, 3, 4, 5]),
                Sequence::from_integer(2),
                Sequence::from_integer(3),
            ],
        )
        .unwrap();
        match sub.one().unwrap() {
            Item::Array(a) => {
                assert_eq!(a.size(), 3);
                assert_eq!(a.get(1).unwrap(), &Sequence::from_integer(2));
            }
            _ => panic!("expected array"),
        }

        assert!(matches!(
            call(
                array_subarray,
                vec![
                    int_array(&[1, 2, 3]),
                    Sequence::from_integer(2),
                    Sequence::from_integer(10),
                ],
            ),
            Err(MetapathError::IndexError { .. })
        ));
    }

    #[test]
    fn test_remove_multiple_positions() {
        let remaining = call(
            array_remove,
            vec![
                int_array(&[1, 2, 3, 4]),
                Sequence::from_items(vec![
                    Item::Atomic(crate::types::AtomicItem::Integer(1)),
                    Item::Atomic(crate::types::AtomicItem::Integer(3)),
                ]),
            ],
        )
        .unwrap();
        match remaining.one().unwrap() {
            Item::Array(a) => {
                assert_eq!(a.size(), 2);
                assert_eq!(a.get(1).unwrap(), &Sequence::from_integer(2));
                assert_eq!(a.get(2).unwrap(), &Sequence::from_integer(4));
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_join_and_flatten() {
        let joined = call(
            array_join,
            vec![Sequence::from_items(vec![
                int_array(&[1, 2]).into_items().remove(0),
                int_array(&[3]).into_items().remove(0),
            ])],
        )
        .unwrap();
        assert_eq!(
            call(array_size, vec![joined]).unwrap(),
            Sequence::from_integer(3)
        );

        let nested = Sequence::of(Item::Array(ArrayItem::from_members(vec![
            Sequence::from_integer(1),
            int_array(&[2, 3]),
        ])));
        let flat = call(array_flatten, vec![nested]).unwrap();
        assert_eq!(flat.len(), 3);
    }
}
