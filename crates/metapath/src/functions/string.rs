use metapath_schema::QName;
use regex::Regex;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, focus_or_first,
    optional_decimal, string_arg,
};
use crate::types::{AtomicItem, Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let string_ret = ArgumentSpec::new("result", ItemType::String, Occurrence::One);
    let bool_ret = ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One);
    let str_arg = ArgumentSpec::new("arg", ItemType::String, Occurrence::ZeroOrOne);

    registry.register(
        FunctionSignature::new(
            QName::local_only("string"),
            0,
            Some(1),
            vec![ArgumentSpec::new("arg", ItemType::Any, Occurrence::ZeroOrOne)],
            string_ret,
            fn_string,
        )
        .focus_dependent(),
    );
    registry.register(FunctionSignature::new(
        QName::local_only("concat"),
        2,
        None,
        vec![ArgumentSpec::new("arg", ItemType::Atomic, Occurrence::ZeroOrOne)],
        string_ret,
        fn_concat,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("substring"),
        2,
        Some(3),
        vec![
            str_arg,
            ArgumentSpec::new("start", ItemType::Numeric, Occurrence::One),
            ArgumentSpec::new("length", ItemType::Numeric, Occurrence::One),
        ],
        string_ret,
        fn_substring,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("substring-before"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        string_ret,
        fn_substring_before,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("substring-after"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        string_ret,
        fn_substring_after,
    ));
    registry.register(
        FunctionSignature::new(
            QName::local_only("string-length"),
            0,
            Some(1),
            vec![str_arg],
            ArgumentSpec::new("result", ItemType::Integer, Occurrence::One),
            fn_string_length,
        )
        .focus_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("normalize-space"),
            0,
            Some(1),
            vec![str_arg],
            string_ret,
            fn_normalize_space,
        )
        .focus_dependent(),
    );
    registry.register(FunctionSignature::new(
        QName::local_only("upper-case"),
        1,
        Some(1),
        vec![str_arg],
        string_ret,
        fn_upper_case,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("lower-case"),
        1,
        Some(1),
        vec![str_arg],
        string_ret,
        fn_lower_case,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("translate"),
        3,
        Some(3),
        vec![str_arg, str_arg, str_arg],
        string_ret,
        fn_translate,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("contains"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        bool_ret,
        fn_contains,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("starts-with"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        bool_ret,
        fn_starts_with,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("ends-with"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        bool_ret,
        fn_ends_with,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("matches"),
        2,
        Some(3),
        vec![
            str_arg,
            ArgumentSpec::new("pattern", ItemType::String, Occurrence::One),
            ArgumentSpec::new("flags", ItemType::String, Occurrence::One),
        ],
        bool_ret,
        fn_matches,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("replace"),
        3,
        Some(4),
        vec![
            str_arg,
            ArgumentSpec::new("pattern", ItemType::String, Occurrence::One),
            ArgumentSpec::new("replacement", ItemType::String, Occurrence::One),
            ArgumentSpec::new("flags", ItemType::String, Occurrence::One),
        ],
        string_ret,
        fn_replace,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("tokenize"),
        2,
        Some(3),
        vec![
            str_arg,
            ArgumentSpec::new("pattern", ItemType::String, Occurrence::One),
            ArgumentSpec::new("flags", ItemType::String, Occurrence::One),
        ],
        ArgumentSpec::new("result", ItemType::String, Occurrence::ZeroOrMore),
        fn_tokenize,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("string-join"),
        1,
        Some(2),
        vec![
            ArgumentSpec::new("arg", ItemType::Atomic, Occurrence::ZeroOrMore),
            ArgumentSpec::new("separator", ItemType::String, Occurrence::One),
        ],
        string_ret,
        fn_string_join,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("compare"),
        2,
        Some(2),
        vec![str_arg, str_arg],
        ArgumentSpec::new("result", ItemType::Integer, Occurrence::ZeroOrOne),
        fn_compare,
    ));
    registry.register(FunctionSignature::new(
        QName::local_only("encode-for-uri"),
        1,
        Some(1),
        vec![str_arg],
        string_ret,
        fn_encode_for_uri,
    ));
    registry.register(
        FunctionSignature::new(
            QName::local_only("resolve-uri"),
            1,
            Some(2),
            vec![
                ArgumentSpec::new("relative", ItemType::String, Occurrence::ZeroOrOne),
                ArgumentSpec::new("base", ItemType::String, Occurrence::One),
            ],
            ArgumentSpec::new("result", ItemType::Uri, Occurrence::ZeroOrOne),
            fn_resolve_uri,
        )
        .context_dependent(),
    );
}

fn fn_string(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let target = focus_or_first(&args, focus)?;
    Ok(Sequence::from_string(target.string_value()?))
}

fn fn_concat(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let mut out = String::new();
    for arg in &args {
        out.push_str(&string_arg(arg)?);
    }
    Ok(Sequence::from_string(out))
}

fn fn_substring(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let length = if args.len() == 3 {
        Some(rounded(&args.remove(2))?)
    } else {
        None
    };
    let start = rounded(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;

    let last = length.map(|l| start + l);
    let result: String = source
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = *i as i64 + 1;
            pos >= start && last.is_none_or(|l| pos < l)
        })
        .map(|(_, c)| c)
        .collect();
    Ok(Sequence::from_string(result))
}

fn rounded(seq: &Sequence) -> Result<i64, MetapathError> {
    let value = optional_decimal(seq)?
        .ok_or_else(|| MetapathError::cardinality("exactly one", 0))?;
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| MetapathError::type_error("position out of integer range"))
}

fn fn_substring_before(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let needle = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    let result = source.find(&needle).map(|i| &source[..i]).unwrap_or("");
    Ok(Sequence::from_string(result))
}

fn fn_substring_after(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let needle = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    let result = source
        .find(&needle)
        .map(|i| &source[i + needle.len()..])
        .unwrap_or("");
    Ok(Sequence::from_string(result))
}

fn fn_string_length(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let s = focus_or_first(&args, focus)?.string_value()?;
    Ok(Sequence::from_integer(s.chars().count() as i64))
}

fn fn_normalize_space(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let s = focus_or_first(&args, focus)?.string_value()?;
    Ok(Sequence::from_string(
        s.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}

fn fn_upper_case(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_string(string_arg(&args.remove(0))?.to_uppercase()))
}

fn fn_lower_case(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(Sequence::from_string(string_arg(&args.remove(0))?.to_lowercase()))
}

fn fn_translate(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let to: Vec<char> = string_arg(&args.remove(2))?.chars().collect();
    let from: Vec<char> = string_arg(&args.remove(1))?.chars().collect();
    let source = string_arg(&args.remove(0))?;

    let result: String = source
        .chars()
        .filter_map(|c| match from.iter().position(|f| *f == c) {
            Some(i) => to.get(i).copied(),
            None => Some(c),
        })
        .collect();
    Ok(Sequence::from_string(result))
}

fn fn_contains(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let needle = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    Ok(Sequence::from_bool(source.contains(&needle)))
}

fn fn_starts_with(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let needle = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    Ok(Sequence::from_bool(source.starts_with(&needle)))
}

fn fn_ends_with(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let needle = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    Ok(Sequence::from_bool(source.ends_with(&needle)))
}

/// Compile a pattern with XPath-style flags (`i`, `m`, `s`, `x`, `q`).
pub(crate) fn compile_pattern(pattern: &str, flags: &str) -> Result<Regex, MetapathError> {
    let mut inline = String::new();
    let mut literal = false;
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' => inline.push(flag),
            'q' => literal = true,
            other => {
                return Err(MetapathError::invalid_argument(format!(
                    "unrecognized regex flag '{other}'"
                )));
            }
        }
    }
    let body = if literal {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    let full = if inline.is_empty() {
        body
    } else {
        format!("(?{inline}){body}")
    };
    Regex::new(&full)
        .map_err(|e| MetapathError::invalid_argument(format!("invalid pattern '{pattern}': {e}")))
}

fn fn_matches(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let flags = if args.len() == 3 {
        string_arg(&args.remove(2))?
    } else {
        String::new()
    };
    let pattern = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    let re = compile_pattern(&pattern, &flags)?;
    Ok(Sequence::from_bool(re.is_match(&source)))
}

fn fn_replace(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let flags = if args.len() == 4 {
        string_arg(&args.remove(3))?
    } else {
        String::new()
    };
    let replacement = string_arg(&args.remove(2))?;
    let pattern = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    let re = compile_pattern(&pattern, &flags)?;
    Ok(Sequence::from_string(
        re.replace_all(&source, replacement.as_str()).into_owned(),
    ))
}

fn fn_tokenize(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let flags = if args.len() == 3 {
        string_arg(&args.remove(2))?
    } else {
        String::new()
    };
    let pattern = string_arg(&args.remove(1))?;
    let source = string_arg(&args.remove(0))?;
    if source.is_empty() {
        return Ok(Sequence::empty());
    }
    let re = compile_pattern(&pattern, &flags)?;
    // materialize: token lists get consumed multiple times downstream
    let tokens: Vec<Item> = re
        .split(&source)
        .map(|t| Item::Atomic(AtomicItem::String(t.to_string())))
        .collect();
    Ok(Sequence::from_items(tokens))
}

fn fn_string_join(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let separator = if args.len() == 2 {
        string_arg(&args.remove(1))?
    } else {
        String::new()
    };
    let parts: Vec<String> = args
        .remove(0)
        .atomize()?
        .into_iter()
        .map(|a| a.canonical())
        .collect();
    Ok(Sequence::from_string(parts.join(&separator)))
}

fn fn_compare(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let right = super::optional_atomic(&args.remove(1))?;
    let left = super::optional_atomic(&args.remove(0))?;
    match (left, right) {
        (Some(l), Some(r)) => {
            let ordering = l.canonical().cmp(&r.canonical());
            Ok(Sequence::from_integer(ordering as i64))
        }
        _ => Ok(Sequence::empty()),
    }
}

fn fn_encode_for_uri(
    mut args: Vec<Sequence>,
    _context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let source = string_arg(&args.remove(0))?;
    let mut out = String::with_capacity(source.len());
    for byte in source.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    Ok(Sequence::from_string(out))
}

fn fn_resolve_uri(
    mut args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let base = if args.len() == 2 {
        let base = string_arg(&args.remove(1))?;
        Some(
            url::Url::parse(&base)
                .map_err(|e| MetapathError::UriError(format!("{base}: {e}")))?,
        )
    } else {
        context.static_context().base_uri().cloned()
    };
    let relative = match super::optional_atomic(&args.remove(0))? {
        Some(atom) => atom.canonical(),
        None => return Ok(Sequence::empty()),
    };

    let resolved = match &base {
        Some(base) => base.join(&relative),
        None => url::Url::parse(&relative),
    }
    .map_err(|e| MetapathError::UriError(format!("{relative}: {e}")))?;
    Ok(Sequence::from_atomic(AtomicItem::Uri(resolved.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: super::super::BuiltinFn, args: Vec<Sequence>) -> Result<Sequence, MetapathError> {
        f(args, &DynamicContext::default(), None)
    }

    fn s(text: &str) -> Sequence {
        Sequence::from_string(text)
    }

    #[test]
    fn test_substring() {
        assert_eq!(
            call(fn_substring, vec![s("metaschema"), Sequence::from_integer(5)]).unwrap(),
            s("schema")
        );
        assert_eq!(
            call(
                fn_substring,
                vec![s("metaschema"), Sequence::from_integer(1), Sequence::from_integer(4)]
            )
            .unwrap(),
            s("meta")
        );
        // fractional positions round
        assert_eq!(
            call(
                fn_substring,
                vec![
                    s("12345"),
                    Sequence::from_atomic(AtomicItem::Decimal("1.5".parse().unwrap())),
                    Sequence::from_atomic(AtomicItem::Decimal("2.6".parse().unwrap())),
                ]
            )
            .unwrap(),
            s("234")
        );
    }

    #[test]
    fn test_substring_before_after() {
        assert_eq!(
            call(fn_substring_before, vec![s("a=b"), s("=")]).unwrap(),
            s("a")
        );
        assert_eq!(
            call(fn_substring_after, vec![s("a=b"), s("=")]).unwrap(),
            s("b")
        );
        assert_eq!(
            call(fn_substring_after, vec![s("a=b"), s("#")]).unwrap(),
            s("")
        );
    }

    #[test]
    fn test_normalize_space_and_translate() {
        assert_eq!(
            call(fn_normalize_space, vec![s("  a  b\t c ")]).unwrap(),
            s("a b c")
        );
        assert_eq!(
            call(fn_translate, vec![s("abcabc"), s("abc"), s("AB")]).unwrap(),
            s("ABAB")
        );
    }

    #[test]
    fn test_matches_and_flags() {
        assert_eq!(
            call(fn_matches, vec![s("metaschema"), s("^meta")]).unwrap(),
            Sequence::from_bool(true)
        );
        assert_eq!(
            call(fn_matches, vec![s("METASCHEMA"), s("^meta"), s("i")]).unwrap(),
            Sequence::from_bool(true)
        );
        assert!(matches!(
            call(fn_matches, vec![s("x"), s("("), s("")]),
            Err(MetapathError::InvalidArgument(_))
        ));
        assert!(matches!(
            call(fn_matches, vec![s("x"), s("x"), s("z")]),
            Err(MetapathError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_replace_and_tokenize() {
        assert_eq!(
            call(fn_replace, vec![s("banana"), s("a"), s("o")]).unwrap(),
            s("bonono")
        );
        let tokens = call(fn_tokenize, vec![s("a, b,  c"), s(",\\s*")]).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.items()[2], Item::Atomic(AtomicItem::String("c".into())));
    }

    #[test]
    fn test_concat_and_join() {
        assert_eq!(
            call(fn_concat, vec![s("a"), s("b"), s("c")]).unwrap(),
            s("abc")
        );
        let joined = call(
            fn_string_join,
            vec![
                Sequence::from_items(vec![
                    Item::Atomic(AtomicItem::String("a".into())),
                    Item::Atomic(AtomicItem::String("b".into())),
                ]),
                s("-"),
            ],
        )
        .unwrap();
        assert_eq!(joined, s("a-b"));
    }

    #[test]
    fn test_encode_for_uri() {
        assert_eq!(
            call(fn_encode_for_uri, vec![s("a b/c")]).unwrap(),
            s("a%20b%2Fc")
        );
    }

    #[test]
    fn test_resolve_uri_with_explicit_base() {
        let resolved = call(
            fn_resolve_uri,
            vec![s("doc.xml"), s("https://example.com/data/")],
        )
        .unwrap();
        assert_eq!(resolved, Sequence::from_atomic(AtomicItem::Uri(
            "https://example.com/data/doc.xml".to_string()
        )));

        assert!(matches!(
            call(fn_resolve_uri, vec![s("doc.xml"), s("::bad::")]),
            Err(MetapathError::UriError(_))
        ));
    }
}
