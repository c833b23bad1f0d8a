//! Recursive path evaluation: repeatedly apply a sub-expression to each
//! result until exhausted.
//!
//! The walk is iterative and bounded by the dynamic context's depth limit,
//! so deep recursive queries fail with an error instead of exhausting the
//! host stack.

use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, string_arg,
};
use crate::types::{Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let path = ArgumentSpec::new("path", ItemType::String, Occurrence::One);
    let ret = ArgumentSpec::new("result", ItemType::Any, Occurrence::ZeroOrMore);

    registry.register(
        FunctionSignature::new(
            QName::local_only("recurse-depth"),
            1,
            Some(1),
            vec![path],
            ret,
            recurse_depth_focus,
        )
        .non_deterministic()
        .focus_dependent()
        .context_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("recurse-depth"),
            2,
            Some(2),
            vec![ArgumentSpec::new("input", ItemType::Any, Occurrence::ZeroOrMore), path],
            ret,
            recurse_depth_input,
        )
        .non_deterministic()
        .context_dependent(),
    );
}

fn recurse_depth_focus(
    mut args: Vec<Sequence>,
    context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let path = string_arg(&args.remove(0))?;
    let start = match focus {
        Some(item) => Sequence::of(item.clone()),
        None => return Err(MetapathError::MissingFocus),
    };
    recurse(start, &path, context)
}

fn recurse_depth_input(
    mut args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let path = string_arg(&args.remove(1))?;
    let start = args.remove(0);
    recurse(start, &path, context)
}

fn recurse(
    start: Sequence,
    path: &str,
    context: &DynamicContext,
) -> Result<Sequence, MetapathError> {
    if path.trim().is_empty() {
        return Err(MetapathError::RecursionConfiguration(
            "recursive path expression is empty".to_string(),
        ));
    }
    let evaluator = context.evaluator().ok_or_else(|| {
        MetapathError::RecursionConfiguration(
            "no expression evaluator is configured".to_string(),
        )
    })?;
    let compiled = evaluator
        .compile(path, context.static_context())
        .map_err(|e| MetapathError::RecursionConfiguration(e.to_string()))?;

    let mut out = Vec::new();
    let mut frontier = start.into_items();
    let mut depth = 0usize;
    while !frontier.is_empty() {
        depth += 1;
        if depth > context.depth_limit() {
            return Err(MetapathError::Expression(format!(
                "recursive path exceeded depth limit {}",
                context.depth_limit()
            )));
        }
        let mut next = Vec::new();
        for item in &frontier {
            let results = evaluator.evaluate(&compiled, item, context)?;
            next.extend(results.into_items());
        }
        out.extend(next.iter().cloned());
        frontier = next;
    }
    Ok(Sequence::from_items(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use crate::eval::{CompiledExpression, ExpressionEvaluator};
    use crate::types::AtomicItem;
    use std::rc::Rc;

    /// Evaluator stub: "dec" counts the focus integer down to zero,
    /// anything else fails to compile.
    #[derive(Debug)]
    struct Countdown;

    impl ExpressionEvaluator for Countdown {
        fn compile(
            &self,
            text: &str,
            _static_context: &StaticContext,
        ) -> Result<CompiledExpression, MetapathError> {
            if text == "dec" {
                Ok(CompiledExpression::new(text, Rc::new(())))
            } else {
                Err(MetapathError::Expression(format!("cannot parse '{text}'")))
            }
        }

        fn evaluate(
            &self,
            _expression: &CompiledExpression,
            focus: &Item,
            _context: &DynamicContext,
        ) -> Result<Sequence, MetapathError> {
            match focus {
                Item::Atomic(AtomicItem::Integer(i)) if *i > 0 => {
                    Ok(Sequence::from_integer(i - 1))
                }
                _ => Ok(Sequence::empty()),
            }
        }
    }

    fn context() -> DynamicContext {
        DynamicContext::default().with_evaluator(Rc::new(Countdown))
    }

    #[test]
    fn test_recurse_until_exhausted() {
        let start = Item::Atomic(AtomicItem::Integer(3));
        let result = recurse_depth_focus(
            vec![Sequence::from_string("dec")],
            &context(),
            Some(&start),
        )
        .unwrap();
        // 2, 1, 0 then the step from 0 yields nothing
        assert_eq!(result.len(), 3);
        assert_eq!(result.items()[0], Item::Atomic(AtomicItem::Integer(2)));
        assert_eq!(result.items()[2], Item::Atomic(AtomicItem::Integer(0)));
    }

    #[test]
    fn test_two_argument_form() {
        let result = recurse_depth_input(
            vec![Sequence::from_integer(2), Sequence::from_string("dec")],
            &context(),
            None,
        )
        .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_malformed_path_is_a_configuration_error() {
        let start = Item::Atomic(AtomicItem::Integer(1));
        for path in ["", "   ", "bogus"] {
            let result = recurse_depth_focus(
                vec![Sequence::from_string(path)],
                &context(),
                Some(&start),
            );
            assert!(
                matches!(result, Err(MetapathError::RecursionConfiguration(_))),
                "path '{path}' should fail configuration"
            );
        }
    }

    #[test]
    fn test_missing_evaluator() {
        let start = Item::Atomic(AtomicItem::Integer(1));
        let result = recurse_depth_focus(
            vec![Sequence::from_string("dec")],
            &DynamicContext::default(),
            Some(&start),
        );
        assert!(matches!(
            result,
            Err(MetapathError::RecursionConfiguration(_))
        ));
    }

    #[test]
    fn test_depth_limit_bounds_runaway_recursion() {
        let start = Item::Atomic(AtomicItem::Integer(1_000_000));
        let limited = context().with_depth_limit(10);
        let result = recurse_depth_focus(
            vec![Sequence::from_string("dec")],
            &limited,
            Some(&start),
        );
        assert!(matches!(result, Err(MetapathError::Expression(_))));
    }
}
