//! Functions over node items: names, roots, URIs, and paths.

use metapath_schema::QName;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, node_arg,
};
use crate::node::NodeItem;
use crate::types::{AtomicItem, Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let node = ArgumentSpec::new("arg", ItemType::Node, Occurrence::ZeroOrOne);
    let string_ret = ArgumentSpec::new("result", ItemType::String, Occurrence::One);

    for (local, handler) in [
        ("name", fn_name as super::BuiltinFn),
        ("local-name", fn_local_name),
        ("namespace-uri", fn_namespace_uri),
    ] {
        registry.register(
            FunctionSignature::new(
                QName::local_only(local),
                0,
                Some(1),
                vec![node],
                string_ret,
                handler,
            )
            .focus_dependent(),
        );
    }
    registry.register(
        FunctionSignature::new(
            QName::local_only("has-children"),
            0,
            Some(1),
            vec![node],
            ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
            fn_has_children,
        )
        .focus_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("root"),
            0,
            Some(1),
            vec![node],
            ArgumentSpec::new("result", ItemType::Node, Occurrence::ZeroOrOne),
            fn_root,
        )
        .focus_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("path"),
            0,
            Some(1),
            vec![node],
            ArgumentSpec::new("result", ItemType::String, Occurrence::ZeroOrOne),
            fn_path,
        )
        .focus_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("base-uri"),
            0,
            Some(1),
            vec![node],
            ArgumentSpec::new("result", ItemType::Uri, Occurrence::ZeroOrOne),
            fn_base_uri,
        )
        .focus_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("document-uri"),
            0,
            Some(1),
            vec![node],
            ArgumentSpec::new("result", ItemType::Uri, Occurrence::ZeroOrOne),
            fn_document_uri,
        )
        .focus_dependent(),
    );
}

fn fn_name(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let name = node_arg(&args, focus)?
        .and_then(NodeItem::name)
        .map(|q| q.local)
        .unwrap_or_default();
    Ok(Sequence::from_string(name))
}

fn fn_local_name(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    fn_name(args, _context, focus)
}

fn fn_namespace_uri(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let uri = node_arg(&args, focus)?
        .and_then(NodeItem::name)
        .and_then(|q| q.namespace)
        .unwrap_or_default();
    Ok(Sequence::from_string(uri))
}

fn fn_has_children(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let has = node_arg(&args, focus)?
        .map(|n| !n.model_children().is_empty())
        .unwrap_or(false);
    Ok(Sequence::from_bool(has))
}

fn fn_root(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(node_arg(&args, focus)?
        .map(|n| Sequence::from_node(n.root()))
        .unwrap_or_default())
}

fn fn_path(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let Some(node) = node_arg(&args, focus)? else {
        return Ok(Sequence::empty());
    };

    let mut chain: Vec<NodeItem> = node.ancestors();
    chain.reverse();
    chain.push(node.clone());

    let mut path = String::new();
    for step in &chain {
        if let Some(name) = step.name() {
            path.push('/');
            path.push_str(&name.local);
            path.push_str(&format!("[{}]", step.position()));
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(Sequence::from_string(path))
}

fn fn_base_uri(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(node_arg(&args, focus)?
        .and_then(|n| n.base_uri())
        .map(|u| Sequence::from_atomic(AtomicItem::Uri(u.into())))
        .unwrap_or_default())
}

fn fn_document_uri(
    args: Vec<Sequence>,
    _context: &DynamicContext,
    focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    Ok(node_arg(&args, focus)?
        .and_then(|n| n.document_uri())
        .map(|u| Sequence::from_atomic(AtomicItem::Uri(u.into())))
        .unwrap_or_default())
}
