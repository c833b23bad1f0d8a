use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence};
use crate::types::{Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let ret = ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One);

    registry.register(FunctionSignature::new(
        QName::local_only("true"),
        0,
        Some(0),
        vec![],
        ret,
        fn_true,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("false"),
        0,
        Some(0),
        vec![],
        ret,
        fn_false,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("not"),
        1,
        Some(1),
        vec![ArgumentSpec::new("arg", ItemType::Any, Occurrence::ZeroOrMore)],
        ret,
        fn_not,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("boolean"),
        1,
        Some(1),
        vec![ArgumentSpec::new("arg", ItemType::Any, Occurrence::ZeroOrMore)],
        ret,
        fn_boolean,
    ));
}

fn fn_true(
    _args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_bool(true))
}

fn fn_false(
    _args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_bool(false))
}

fn fn_not(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let value = args.remove(0).effective_boolean_value()?;
    Ok(Sequence::from_bool(!value))
}

fn fn_boolean(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let value = args.remove(0).effective_boolean_value()?;
    Ok(Sequence::from_bool(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AtomicItem;

    fn call(
        f: fn(Vec<Sequence>, &DynamicContext, Option<&Item>) -> Result<Sequence, MetapathError>,
        args: Vec<Sequence>,
    ) -> Result<Sequence, MetapathError> {
        f(args, &DynamicContext::default(), None)
    }

    #[test]
    fn test_boolean_of_sequences() {
        assert_eq!(
            call(fn_boolean, vec![Sequence::empty()]).unwrap(),
            Sequence::from_bool(false)
        );
        assert_eq!(
            call(fn_boolean, vec![Sequence::from_integer(0)]).unwrap(),
            Sequence::from_bool(false)
        );
        assert_eq!(
            call(fn_boolean, vec![Sequence::from_string("")]).unwrap(),
            Sequence::from_bool(false)
        );

        let multi = Sequence::from_items(vec![
            Item::Atomic(AtomicItem::Integer(0)),
            Item::Atomic(AtomicItem::Integer(0)),
        ]);
        assert!(matches!(
            call(fn_boolean, vec![multi]),
            Err(MetapathError::TypeError(_))
        ));
    }

    #[test]
    fn test_not_inverts() {
        assert_eq!(
            call(fn_not, vec![Sequence::empty()]).unwrap(),
            Sequence::from_bool(true)
        );
        assert_eq!(
            call(fn_not, vec![Sequence::from_string("x")]).unwrap(),
            Sequence::from_bool(false)
        );
    }
}
