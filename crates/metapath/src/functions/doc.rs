//! Document retrieval: `doc` and `doc-available`.

use metapath_schema::QName;
use url::Url;

use crate::context::DynamicContext;
use crate::error::MetapathError;
use crate::functions::{
    ArgumentSpec, FunctionRegistry, FunctionSignature, ItemType, Occurrence, optional_atomic,
};
use crate::node::NodeGraph;
use crate::types::{Item, Sequence};

pub(crate) fn register(registry: &mut FunctionRegistry) {
    let uri_arg = ArgumentSpec::new("uri", ItemType::String, Occurrence::ZeroOrOne);

    registry.register(
        FunctionSignature::new(
            QName::local_only("doc"),
            1,
            Some(1),
            vec![uri_arg],
            ArgumentSpec::new("result", ItemType::Node, Occurrence::ZeroOrOne),
            fn_doc,
        )
        .non_deterministic()
        .context_dependent(),
    );
    registry.register(
        FunctionSignature::new(
            QName::local_only("doc-available"),
            1,
            Some(1),
            vec![uri_arg],
            ArgumentSpec::new("result", ItemType::Boolean, Occurrence::One),
            fn_doc_available,
        )
        .non_deterministic()
        .context_dependent(),
    );
}

fn resolve_uri(seq: &Sequence, context: &DynamicContext) -> Result<Option<Url>, MetapathError> {
    let Some(atom) = optional_atomic(seq)? else {
        return Ok(None);
    };
    let reference = atom.canonical();
    context
        .static_context()
        .resolve(&reference)
        .map(Some)
        .map_err(|e| MetapathError::UriError(format!("{reference}: {e}")))
}

fn fn_doc(
    args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    let Some(uri) = resolve_uri(&args[0], context)? else {
        return Ok(Sequence::empty());
    };
    let document = context.loader().load(&uri)?;
    let root_def = document
        .module
        .root_assembly(&document.root_name)
        .map_err(MetapathError::Schema)?;
    let node = NodeGraph::document(
        document.module,
        root_def,
        document.value,
        Some(document.uri),
    );
    Ok(Sequence::from_node(node))
}

fn fn_doc_available(
    args: Vec<Sequence>,
    context: &DynamicContext,
    _focus: Option<&Item>,
) -> Result<Sequence, MetapathError> {
    // every failure maps to false, including an unparsable URI
    let available = match resolve_uri(&args[0], context) {
        Ok(Some(uri)) => context.loader().is_available(&uri),
        Ok(None) | Err(_) => false,
    };
    Ok(Sequence::from_bool(available))
}
