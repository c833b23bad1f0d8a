//! The `map:*` function family.

use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, MAP_NS, Occurrence, map_arg,
    required_atomic,
};
use crate::types::{DuplicatePolicy, Item, MapItem, Sequence};

fn name(local: &str) -> QName {
    QName::new(MAP_NS, local)
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let map_one = ArgumentSpec::new("map", ItemType::Map, Occurrence::One);
    let key = ArgumentSpec::new("key", ItemType::Atomic, Occurrence::One);
    let map_ret = ArgumentSpec::new("result", ItemType::Map, Occurrence::One);

    registry.register(FunctionSignature::new(
        name("get"),
        2,
        Some(2),
        vec![map_one, key],
        ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore),
        map_get,
    ));
    registry.register(FunctionSignature::new(
        name("put"),
        3,
        Some(3),
        vec![
            map_one,
            key,
            ArgumentSpec::new("value", ItemType::Any, Occurrence::ZeroOrMore),
        ],
        map_ret,
        map_put,
    ));
    registry.register(FunctionSignature::new(
        name("remove"),
        2,
        Some(2),
        vec![
            map_one,
            ArgumentSpec::new("keys", ItemType::Atomic, Occurrence::ZeroOrMore),
        ],
        map_ret,
        map_remove,
    ));
    registry.register(FunctionSignature::new(
        name("contains"),
        2,
        Some(2),
        vec![map_one, key],
        ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
        map_contains,
    ));
    registry.register(FunctionSignature::new(
        name("keys"),
        1,
        Some(1),
        vec![map_one],
        ArgumentSpec::new("result", ItemType::Atomic, Occurrence::ZeroOrMore),
        map_keys,
    ));
    registry.register(FunctionSignature::new(
        name("size"),
        1,
        Some(1),
        vec![map_one],
        ArgumentSpec::new("result", ItemType::Integer, Occurrence::One),
        map_size,
    ));
    registry.register(FunctionSignature::new(
        name("entry"),
        2,
        Some(2),
        vec![
            key,
            ArgumentSpec::new("value", ItemType::Any, Occurrence::ZeroOrMore),
        ],
        map_ret,
        map_entry,
    ));
    registry.register(
        FunctionSignature::new(
            name("merge"),
            1,
            Some(2),
            vec![
                ArgumentSpec::new("maps", ItemType::Map, Occurrence::ZeroOrMore),
                ArgumentSpec::new("options", ItemType::Map, Occurrence::One),
            ],
            map_ret,
            map_merge,
        )
        // the use-any policy draws from the context RNG
        .non_deterministic()
        .context_dependent(),
    );
    registry.register(FunctionSignature::new(
        name("find"),
        2,
        Some(2),
        vec![
            ArgumentSpec::new("input", ItemType::Any, Occurrence::ZeroOrMore),
            key,
        ],
        ArgumentSpec::new("result", ItemType::Array, Occurrence::One),
        map_find,
    ));
}

fn map_get(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let key = required_atomic(&args.remove(1))?;
    let map = map_arg(&args.remove(0))?;
    Ok(map.get(&key).cloned().unwrap_or_default())
}

fn map_put(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let value = args.remove(2);
    let key = required_atomic(&args.remove(1))?;
    let map = map_arg(&args.remove(0))?;
    Ok(Sequence::of(Item::Map(map.put(key, value))))
}

fn map_remove(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let keys = args.remove(1).atomize()?;
    let mut map = map_arg(&args.remove(0))?;
    for key in keys {
        map = map.remove(&key);
    }
    Ok(Sequence::of(Item::Map(map)))
}

fn map_contains(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let key = required_atomic(&args.remove(1))?;
    let map = map_arg(&args.remove(0))?;
    Ok(Sequence::from_bool(map.contains_key(&key)))
}

fn map_keys(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let map = map_arg(&args.remove(0))?;
    Ok(Sequence::from_items(
        map.keys().cloned().map(Item::Atomic).collect(),
    ))
}

fn map_size(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let map = map_arg(&args.remove(0))?;
    Ok(Sequence::from_integer(map.size() as i64))
}

fn map_entry(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let value = args.remove(1);
    let key = required_atomic(&args.remove(0))?;
    Ok(Sequence::of(Item::Map(MapItem::entry(key, value))))
}

fn map_merge(
    mut args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let policy = if args.len() == 2 {
        let options = map_arg(&args.remove(1))?;
        let key = crate::types::AtomicItem::String("duplicates".to_string());
        match options.get(&key) {
            Some(value) => {
                let name = required_atomic(value)?;
                DuplicatePolicy::parse(&name.canonical())?
            }
            None => DuplicatePolicy::default(),
        }
    } else {
        DuplicatePolicy::default()
    };

    let mut maps = Vec::new();
    for item in args.remove(0).items() {
        match item {
            Item::Map(m) => maps.push(m.clone()),
            other => {
                return Err(MetapathError::type_error(format!(
                    "map:merge expects maps, got {}",
                    other.type_name()
                )));
            }
        }
    }

    let mut rng = context.rng().borrow_mut();
    let merged = MapItem::merge(&maps, policy, &mut *rng)?;
    Ok(Sequence::of(Item::Map(merged)))
}

/// Deep search for `key` in maps nested anywhere under the input sequence;
/// collected values become the members of the result array.
fn map_find(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let key = required_atomic(&args.remove(1))?;
    let mut found = Vec::new();
    for item in args.remove(0).items() {
        find_in_item(item, &key, &mut found);
    }
    Ok(Sequence::of(Item::Array(crate::types::ArrayItem::from_members(found))))
}

fn find_in_item(item: &Item, key: &crate::types::AtomicItem, found: &mut Vec<Sequence>) {
    match item {
        Item::Map(map) => {
            if let Some(value) = map.get(key) {
                found.push(value.clone());
            }
            for value in map.values() {
                for nested in value.items() {
                    find_in_item(nested, key, found);
                }
            }
        }
        Item::Array(array) => {
            for member in array.members() {
                for nested in member.items() {
                    find_in_item(nested, key, found);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AtomicItem;

    fn string_key(s: &str) -> AtomicItem {
        AtomicItem::String(s.to_string())
    }

    fn simple_map(key: &str, value: i64) -> Sequence {
        Sequence::of(Item::Map(MapItem::entry(
            string_key(key),
            Sequence::from_integer(value),
        )))
    }

    fn call(f: super::super::BuiltinFn, args: Vec<Sequence>) -> Result<Sequence, MetapathError> {
        f(args, &DynamicContext::default(), None)
    }

    fn options(policy: &str) -> Sequence {
        Sequence::of(Item::Map(MapItem::entry(
            string_key("duplicates"),
            Sequence::from_string(policy),
        )))
    }

    #[test]
    fn test_get_put_contains() {
        let map = simple_map("a", 1);
        assert_eq!(
            call(map_get, vec![map.clone(), Sequence::from_string("a")]).unwrap(),
            Sequence::from_integer(1)
        );
        assert_eq!(
            call(map_get, vec![map.clone(), Sequence::from_string("b")]).unwrap(),
            Sequence::empty()
        );

        let bigger = call(
            map_put,
            vec![map.clone(), Sequence::from_string("b"), Sequence::from_integer(2)],
        )
        .unwrap();
        assert_eq!(
            call(map_size, vec![bigger]).unwrap(),
            Sequence::from_integer(2)
        );
        assert_eq!(
            call(map_contains, vec![map, Sequence::from_string("a")]).unwrap(),
            Sequence::from_bool(true)
        );
    }

    #[test]
    fn test_merge_default_uses_first() {
        let maps = Sequence::from_items(vec![
            Item::Map(MapItem::entry(string_key("a"), Sequence::from_integer(1))),
            Item::Map(MapItem::entry(string_key("a"), Sequence::from_integer(2))),
        ]);
        let merged = call(map_merge, vec![maps]).unwrap();
        let result = call(map_get, vec![merged, Sequence::from_string("a")]).unwrap();
        assert_eq!(result, Sequence::from_integer(1));
    }

    #[test]
    fn test_merge_policies_via_options() {
        let maps = Sequence::from_items(vec![
            Item::Map(MapItem::entry(string_key("a"), Sequence::from_integer(1))),
            Item::Map(MapItem::entry(string_key("a"), Sequence::from_integer(2))),
        ]);

        let last = call(map_merge, vec![maps.clone(), options("use-last")]).unwrap();
        assert_eq!(
            call(map_get, vec![last, Sequence::from_string("a")]).unwrap(),
            Sequence::from_integer(2)
        );

        let combined = call(map_merge, vec![maps.clone(), options("combine")]).unwrap();
        let values = call(map_get, vec![combined, Sequence::from_string("a")]).unwrap();
        assert_eq!(values.len(), 2);

        assert!(matches!(
            call(map_merge, vec![maps.clone(), options("reject")]),
            Err(MetapathError::InvalidArgument(_))
        ));
        assert!(matches!(
            call(map_merge, vec![maps, options("bogus")]),
            Err(MetapathError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_remove_many_keys() {
        let map = MapItem::from_entries(vec![
            (string_key("a"), Sequence::from_integer(1)),
            (string_key("b"), Sequence::from_integer(2)),
            (string_key("c"), Sequence::from_integer(3)),
        ]);
        let keys = Sequence::from_items(vec![
            Item::Atomic(string_key("a")),
            Item::Atomic(string_key("c")),
        ]);
        let remaining = call(map_remove, vec![Sequence::of(Item::Map(map)), keys]).unwrap();
        assert_eq!(
            call(map_size, vec![remaining]).unwrap(),
            Sequence::from_integer(1)
        );
    }

    #[test]
    fn test_find_searches_nested_structures() {
        let inner = MapItem::entry(string_key("target"), Sequence::from_integer(9));
        let outer = MapItem::entry(
            string_key("wrapper"),
            Sequence::of(Item::Map(inner)),
        );
        let found = call(
            map_find,
            vec![Sequence::of(Item::Map(outer)), Sequence::from_string("target")],
        )
        .unwrap();
        match found.one().unwrap() {
            Item::Array(array) => {
                assert_eq!(array.size(), 1);
                assert_eq!(array.get(1).unwrap(), &Sequence::from_integer(9));
            }
            other => panic!("expected array, got {}", other.type_name()),
        }
    }
}
