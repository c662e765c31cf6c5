//! Lowers a validated typed AST into the flat [`Extraction`] record callers
//! actually want: refs in source order, sources deduplicated, configs in
//! source order including duplicate keys. Infallible — every invariant this
//! stage relies on was already checked by [`crate::typecheck`].

use indexmap::IndexSet;
use serde::Serialize;

use crate::typecheck::{Kwarg, TopCall, TypedNode};

/// The metadata record extracted from a source file's template calls.
///
/// Field names match the spec's wire contract exactly: `refs`, `sources`,
/// `configs`, `python_jinja`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// One entry per `ref()` call, in source order. Each is 1 or 2 strings.
    pub refs: Vec<Vec<String>>,
    /// Distinct `(source_name, table_name)` pairs. Insertion-ordered for
    /// reproducible snapshots, even though the spec treats order as
    /// irrelevant for this field.
    pub sources: IndexSet<(String, String)>,
    /// One entry per `config()` keyword argument, in source order,
    /// duplicates preserved.
    pub configs: Vec<Kwarg>,
    /// Always `false` for this analyzer. Reserved so callers can tell an
    /// extraction produced by this strict core apart from one produced by a
    /// more permissive front-end that does understand raw Jinja/Python.
    pub python_jinja: bool,
}

/// Folds a validated [`TypedNode::Root`] into an [`Extraction`].
pub fn extract(typed: TypedNode) -> Extraction {
    let TypedNode::Root(calls) = typed;
    let mut extraction = Extraction::default();

    for call in calls {
        match call {
            TopCall::Ref { arg1, arg2 } => {
                let mut entry = vec![arg1];
                entry.extend(arg2);
                extraction.refs.push(entry);
            }
            TopCall::Source { source_name, table_name } => {
                extraction.sources.insert((source_name, table_name));
            }
            TopCall::Config(kwargs) => extraction.configs.extend(kwargs),
        }
    }

    extraction
}
