//! End-to-end checks of the value model through the function registry.

use metapath::{
    ArrayItem, AtomicItem, DynamicContext, FunctionRegistry, Item, MapItem, MetapathError, QName,
    Sequence,
};
use rust_decimal::Decimal;

fn call(name: QName, args: Vec<Sequence>) -> Result<Sequence, MetapathError> {
    let registry = FunctionRegistry::default();
    let context = DynamicContext::default();
    let signature = registry.resolve(&name, args.len())?;
    signature.execute(args, &context, None)
}

fn fn_name(local: &str) -> QName {
    QName::local_only(local)
}

fn array_ns(local: &str) -> QName {
    QName::new("array", local)
}

fn map_ns(local: &str) -> QName {
    QName::new("map", local)
}

fn int_array(values: &[i64]) -> ArrayItem {
    ArrayItem::from_members(values.iter().map(|i| Sequence::from_integer(*i)).collect())
}

fn as_array(seq: Sequence) -> ArrayItem {
    match seq.one().unwrap() {
        Item::Array(a) => a.clone(),
        other => panic!("expected array, got {}", other.type_name()),
    }
}

fn as_map(seq: Sequence) -> MapItem {
    match seq.one().unwrap() {
        Item::Map(m) => m.clone(),
        other => panic!("expected map, got {}", other.type_name()),
    }
}

#[test]
fn reverse_is_involutive() {
    let array = int_array(&[1, 2, 3, 4, 5]);
    let once = as_array(
        call(array_ns("reverse"), vec![Sequence::of(Item::Array(array.clone()))]).unwrap(),
    );
    let twice = as_array(call(array_ns("reverse"), vec![Sequence::of(Item::Array(once))]).unwrap());
    assert_eq!(twice, array);
}

#[test]
fn map_remove_after_put_equals_plain_remove() {
    let map = MapItem::from_entries(vec![
        (AtomicItem::String("a".into()), Sequence::from_integer(1)),
        (AtomicItem::String("b".into()), Sequence::from_integer(2)),
    ]);
    let key = Sequence::from_string("b");

    let put = call(
        map_ns("put"),
        vec![
            Sequence::of(Item::Map(map.clone())),
            key.clone(),
            Sequence::from_integer(9),
        ],
    )
    .unwrap();
    let left = as_map(call(map_ns("remove"), vec![put, key.clone()]).unwrap());
    let right = as_map(
        call(map_ns("remove"), vec![Sequence::of(Item::Map(map)), key]).unwrap(),
    );
    assert_eq!(left, right);
}

#[test]
fn array_put_changes_only_the_target_position() {
    let array = int_array(&[10, 20, 30]);
    let updated = as_array(
        call(
            array_ns("put"),
            vec![
                Sequence::of(Item::Array(array.clone())),
                Sequence::from_integer(2),
                Sequence::from_integer(99),
            ],
        )
        .unwrap(),
    );

    assert_eq!(
        call(
            array_ns("get"),
            vec![Sequence::of(Item::Array(updated.clone())), Sequence::from_integer(2)]
        )
        .unwrap(),
        Sequence::from_integer(99)
    );
    for p in [1, 3] {
        assert_eq!(
            updated.get(p).unwrap(),
            array.get(p).unwrap(),
            "position {p} must be unchanged"
        );
    }
}

#[test]
fn append_grows_size_by_one() {
    let array = int_array(&[1, 2, 3]);
    let appended = call(
        array_ns("append"),
        vec![Sequence::of(Item::Array(array.clone())), Sequence::from_integer(4)],
    )
    .unwrap();
    assert_eq!(
        call(array_ns("size"), vec![appended]).unwrap(),
        Sequence::from_integer(array.size() as i64 + 1)
    );
}

#[test]
fn array_get_out_of_range_is_an_index_error() {
    let array = Sequence::of(Item::Array(int_array(&[1, 2, 3])));
    for position in [0_i64, 4] {
        let result = call(
            array_ns("get"),
            vec![array.clone(), Sequence::from_integer(position)],
        );
        assert!(
            matches!(result, Err(MetapathError::IndexError { .. })),
            "get({position}) must raise an index error"
        );
    }
}

#[test]
fn effective_boolean_value_rules() {
    assert_eq!(
        call(fn_name("boolean"), vec![Sequence::empty()]).unwrap(),
        Sequence::from_bool(false)
    );
    assert_eq!(
        call(fn_name("boolean"), vec![Sequence::from_integer(0)]).unwrap(),
        Sequence::from_bool(false)
    );
    assert_eq!(
        call(fn_name("boolean"), vec![Sequence::from_string("")]).unwrap(),
        Sequence::from_bool(false)
    );

    let two_zeros = Sequence::from_items(vec![
        Item::Atomic(AtomicItem::Integer(0)),
        Item::Atomic(AtomicItem::Integer(0)),
    ]);
    assert!(matches!(
        call(fn_name("boolean"), vec![two_zeros]),
        Err(MetapathError::TypeError(_))
    ));
}

#[test]
fn substring_is_one_based() {
    assert_eq!(
        call(
            fn_name("substring"),
            vec![Sequence::from_string("metaschema"), Sequence::from_integer(5)]
        )
        .unwrap(),
        Sequence::from_string("schema")
    );
    assert_eq!(
        call(
            fn_name("substring"),
            vec![
                Sequence::from_string("metaschema"),
                Sequence::from_integer(1),
                Sequence::from_integer(4),
            ]
        )
        .unwrap(),
        Sequence::from_string("meta")
    );
}

#[test]
fn merge_duplicate_policies() {
    let maps = Sequence::from_items(vec![
        Item::Map(MapItem::entry(
            AtomicItem::String("a".into()),
            Sequence::from_integer(1),
        )),
        Item::Map(MapItem::entry(
            AtomicItem::String("a".into()),
            Sequence::from_integer(2),
        )),
    ]);
    let options = |policy: &str| {
        Sequence::of(Item::Map(MapItem::entry(
            AtomicItem::String("duplicates".into()),
            Sequence::from_string(policy),
        )))
    };
    let value_of = |merged: Sequence| {
        call(map_ns("get"), vec![merged, Sequence::from_string("a")]).unwrap()
    };

    // default is use-first
    let merged = call(map_ns("merge"), vec![maps.clone()]).unwrap();
    assert_eq!(value_of(merged), Sequence::from_integer(1));

    let last = call(map_ns("merge"), vec![maps.clone(), options("use-last")]).unwrap();
    assert_eq!(value_of(last), Sequence::from_integer(2));

    let combined = call(map_ns("merge"), vec![maps.clone(), options("combine")]).unwrap();
    let values = value_of(combined);
    assert_eq!(values.len(), 2);

    assert!(matches!(
        call(map_ns("merge"), vec![maps, options("reject")]),
        Err(MetapathError::InvalidArgument(_))
    ));
}

#[test]
fn subarray_bounds() {
    let array = as_array(
        call(
            array_ns("subarray"),
            vec![
                Sequence::of(Item::Array(int_array(&[1, 2, 3, 4, 5]))),
                Sequence::from_integer(2),
                Sequence::from_integer(3),
            ],
        )
        .unwrap(),
    );
    assert_eq!(array, int_array(&[2, 3, 4]));

    assert!(matches!(
        call(
            array_ns("subarray"),
            vec![
                Sequence::of(Item::Array(int_array(&[1, 2, 3]))),
                Sequence::from_integer(2),
                Sequence::from_integer(10),
            ],
        ),
        Err(MetapathError::IndexError { .. })
    ));
}

#[test]
fn avg_rules() {
    let numbers = Sequence::from_items(vec![
        Item::Atomic(AtomicItem::Integer(1)),
        Item::Atomic(AtomicItem::Integer(2)),
        Item::Atomic(AtomicItem::Integer(3)),
    ]);
    assert_eq!(
        call(fn_name("avg"), vec![numbers]).unwrap(),
        Sequence::from_atomic(AtomicItem::Decimal(Decimal::from(2)))
    );

    assert_eq!(
        call(fn_name("avg"), vec![Sequence::empty()]).unwrap(),
        Sequence::empty()
    );

    let mixed = Sequence::from_items(vec![
        Item::Atomic(AtomicItem::Integer(1)),
        Item::Atomic(AtomicItem::DayTimeDuration(chrono::TimeDelta::days(1))),
    ]);
    assert!(matches!(
        call(fn_name("avg"), vec![mixed]),
        Err(MetapathError::TypeError(_))
    ));
}

#[test]
fn sequence_insert_before_and_remove_are_tolerant() {
    let seq = Sequence::from_items(vec![
        Item::Atomic(AtomicItem::Integer(1)),
        Item::Atomic(AtomicItem::Integer(2)),
    ]);

    let clamped = call(
        fn_name("insert-before"),
        vec![seq.clone(), Sequence::from_integer(99), Sequence::from_integer(3)],
    )
    .unwrap();
    assert_eq!(clamped.len(), 3);

    let untouched = call(
        fn_name("remove"),
        vec![seq.clone(), Sequence::from_integer(99)],
    )
    .unwrap();
    assert_eq!(untouched, seq);
}

#[test]
fn use_any_is_reproducible_with_a_pinned_seed() {
    // non-deterministic by contract; pinning the context RNG makes the
    // pick repeatable for this test
    let registry = FunctionRegistry::default();
    let maps = Sequence::from_items(vec![
        Item::Map(MapItem::entry(
            AtomicItem::String("a".into()),
            Sequence::from_integer(1),
        )),
        Item::Map(MapItem::entry(
            AtomicItem::String("a".into()),
            Sequence::from_integer(2),
        )),
    ]);
    let options = Sequence::of(Item::Map(MapItem::entry(
        AtomicItem::String("duplicates".into()),
        Sequence::from_string("use-any"),
    )));

    let run = |seed: u64| {
        let context = DynamicContext::default().with_rng_seed(seed);
        let merge = registry.resolve(&map_ns("merge"), 2).unwrap();
        let merged = merge
            .execute(vec![maps.clone(), options.clone()], &context, None)
            .unwrap();
        as_map(merged)
            .get(&AtomicItem::String("a".into()))
            .cloned()
            .unwrap()
    };

    let first = run(42);
    assert_eq!(first, run(42));
    assert!(first == Sequence::from_integer(1) || first == Sequence::from_integer(2));
}
