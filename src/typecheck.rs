//! Semantic validation of the concrete tree: arity, keyword rules, literal
//! shapes, and the nested-call/statement bans described in the grammar.
//!
//! [`type_check`] is the single entry point. It never panics and never
//! partially succeeds: the first rule violation it finds short-circuits the
//! whole call with a [`TypeCheckFailure`]. Two of its messages are
//! contract-stable (checked verbatim by callers); the rest are
//! implementation-chosen diagnostics.

use serde::{Serialize, Serializer};

use crate::parser::ast::{self, Arg, Value};
use crate::parser::{SyntaxNode, error_count};

/// A single `(name, value)` pair inside a `config()` call, in source order.
pub type Kwarg = (String, LiteralValue);

/// A typed literal value, recursively built from a concrete value node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Bool(bool),
    List(Vec<LiteralValue>),
    Dict(Vec<(String, LiteralValue)>),
}

impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LiteralValue::String(s) => serializer.serialize_str(s),
            LiteralValue::Bool(b) => serializer.serialize_bool(*b),
            LiteralValue::List(items) => serializer.collect_seq(items),
            LiteralValue::Dict(entries) => serializer.collect_map(entries.iter().map(|(k, v)| (k, v))),
        }
    }
}

/// One validated top-level `{{ … }}` call, ready for [`crate::extract`].
/// Externally tagged (`{"Ref": {...}}`) when serialized, the default serde
/// enum representation — a newtype variant wrapping a sequence like
/// `Config`'s can't round-trip through an internally tagged one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TopCall {
    Ref { arg1: String, arg2: Option<String> },
    Source { source_name: String, table_name: String },
    Config(Vec<Kwarg>),
}

/// The typed AST: either the validated root of top-level calls, or one of
/// its constituents reached by recursing through [`type_check`]'s helpers.
/// A successful [`type_check`] call always returns `TypedNode::Root`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypedNode {
    Root(Vec<TopCall>),
}

/// A structured failure from the type checker: a single, human-readable
/// message. Two spellings are contract-stable; see module docs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{msg}")]
pub struct TypeCheckFailure {
    pub msg: String,
}

impl TypeCheckFailure {
    fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

const FORBIDDEN_CONFIG_KEYS: [&str; 4] = ["pre_hook", "pre-hook", "post_hook", "post-hook"];

/// Validates `root` (produced by parsing `src`) and lowers it to a typed AST.
///
/// `src` is currently unused by the checker itself — every value the
/// grammar can produce is already resolved through the tree — but it is
/// threaded through the signature to match the `(src, root)` contract in
/// the spec and to leave room for future span-aware diagnostics.
pub fn type_check(_src: &str, root: SyntaxNode) -> Result<TypedNode, TypeCheckFailure> {
    if error_count(&root) > 0 {
        return Err(TypeCheckFailure::new("source contains one or more parse errors"));
    }

    let root_ast = ast::Root::cast(root).expect("parser always produces a Root node");

    if root_ast.template_stmts().next().is_some() {
        return Err(TypeCheckFailure::new(
            "jinja expressions are unsupported: {% syntax like this %}",
        ));
    }

    let mut calls = Vec::new();
    for expr in root_ast.template_exprs() {
        calls.push(check_template_expr(&expr)?);
    }
    Ok(TypedNode::Root(calls))
}

fn check_template_expr(expr: &ast::TemplateExpr) -> Result<TopCall, TypeCheckFailure> {
    let call = expr
        .call()
        .ok_or_else(|| TypeCheckFailure::new("expected a single ref(), source(), or config() call"))?;
    check_call(&call)
}

fn check_call(call: &ast::Call) -> Result<TopCall, TypeCheckFailure> {
    let name = call.name().unwrap_or_default();
    let args: Vec<Arg> = call.args().collect();
    check_arg_order(&args)?;

    match name.as_str() {
        "ref" => check_ref(&args),
        "source" => check_source(&args),
        "config" => check_config(&args),
        other => Err(TypeCheckFailure::new(format!(
            "unknown call `{other}`; expected ref, source, or config"
        ))),
    }
}

/// Keyword arguments must all trail positional ones, regardless of callee.
fn check_arg_order(args: &[Arg]) -> Result<(), TypeCheckFailure> {
    let mut seen_kwarg = false;
    for arg in args {
        match arg {
            Arg::Kwarg(_) => seen_kwarg = true,
            Arg::Positional(_) if seen_kwarg => {
                return Err(TypeCheckFailure::new("keyword arguments must all be at the end"));
            }
            Arg::Positional(_) => {}
        }
    }
    Ok(())
}

fn check_ref(args: &[Arg]) -> Result<TopCall, TypeCheckFailure> {
    if args.iter().any(|a| matches!(a, Arg::Kwarg(_))) {
        return Err(TypeCheckFailure::new("ref() accepts no keyword arguments"));
    }
    if args.is_empty() || args.len() > 2 {
        return Err(TypeCheckFailure::new("ref() expects 1 or 2 positional string arguments"));
    }

    let mut strings = Vec::with_capacity(args.len());
    for arg in args {
        let Arg::Positional(value) = arg else {
            unreachable!("kwargs were rejected above");
        };
        strings.push(expect_string(value)?);
    }
    let mut strings = strings.into_iter();
    let arg1 = strings.next().expect("checked non-empty above");
    let arg2 = strings.next();
    Ok(TopCall::Ref { arg1, arg2 })
}

fn check_source(args: &[Arg]) -> Result<TopCall, TypeCheckFailure> {
    if args.len() > 2 {
        return Err(TypeCheckFailure::new("source() takes exactly two arguments"));
    }

    let mut slots: [Option<String>; 2] = [None, None];
    let mut next_positional = 0usize;

    for arg in args {
        match arg {
            Arg::Positional(value) => {
                if next_positional >= 2 {
                    return Err(TypeCheckFailure::new("source() takes exactly two arguments"));
                }
                slots[next_positional] = Some(expect_string(value)?);
                next_positional += 1;
            }
            Arg::Kwarg(kwarg) => {
                let name = kwarg.name().unwrap_or_default();
                let idx = match name.as_str() {
                    "source_name" => 0,
                    "table_name" => 1,
                    other => {
                        return Err(TypeCheckFailure::new(format!(
                            "unexpected keyword `{other}`; source() accepts only source_name/table_name"
                        )));
                    }
                };
                if slots[idx].is_some() {
                    return Err(TypeCheckFailure::new(format!("duplicate binding for `{name}`")));
                }
                let value = kwarg
                    .value()
                    .ok_or_else(|| TypeCheckFailure::new("keyword argument missing a value"))?;
                slots[idx] = Some(expect_string(&value)?);
            }
        }
    }

    let [source_name, table_name] = slots;
    match (source_name, table_name) {
        (Some(source_name), Some(table_name)) => Ok(TopCall::Source { source_name, table_name }),
        _ => Err(TypeCheckFailure::new(
            "source() requires both source_name and table_name",
        )),
    }
}

fn check_config(args: &[Arg]) -> Result<TopCall, TypeCheckFailure> {
    let mut kwargs = Vec::with_capacity(args.len());
    for arg in args {
        let Arg::Kwarg(kwarg) = arg else {
            return Err(TypeCheckFailure::new("config() accepts only keyword arguments"));
        };
        let name = kwarg.name().unwrap_or_default();
        if FORBIDDEN_CONFIG_KEYS.contains(&name.as_str()) {
            return Err(TypeCheckFailure::new(format!("`{name}` is not allowed in config()")));
        }
        let value = kwarg
            .value()
            .ok_or_else(|| TypeCheckFailure::new("keyword argument missing a value"))?;
        kwargs.push((name, to_literal(&value)?));
    }
    Ok(TopCall::Config(kwargs))
}

fn expect_string(value: &Value) -> Result<String, TypeCheckFailure> {
    match to_literal(value)? {
        LiteralValue::String(s) => Ok(s),
        _ => Err(TypeCheckFailure::new("expected a string literal")),
    }
}

/// Recursively converts a concrete value node into a [`LiteralValue`],
/// rejecting nested calls and bare identifiers at any depth — this is what
/// makes `{{ config(x=ref('t')) }}` fail without a separate tree walk.
fn to_literal(value: &Value) -> Result<LiteralValue, TypeCheckFailure> {
    match value {
        Value::Str(s) => Ok(LiteralValue::String(s.value())),
        Value::Bool(b) => Ok(LiteralValue::Bool(b.value())),
        Value::List(list) => {
            let items = list.items().map(|v| to_literal(&v)).collect::<Result<Vec<_>, _>>()?;
            Ok(LiteralValue::List(items))
        }
        Value::Dict(dict) => {
            let mut entries = Vec::new();
            for entry in dict.entries() {
                let key = entry
                    .key()
                    .ok_or_else(|| TypeCheckFailure::new("dict entry missing a key"))?;
                let Value::Str(key_str) = key else {
                    return Err(TypeCheckFailure::new("dict keys must be strings"));
                };
                let val = entry
                    .value()
                    .ok_or_else(|| TypeCheckFailure::new("dict entry missing a value"))?;
                entries.push((key_str.value(), to_literal(&val)?));
            }
            Ok(LiteralValue::Dict(entries))
        }
        Value::Call(_) => Err(TypeCheckFailure::new("nested template calls are not allowed")),
        Value::Ident(ident) => Err(TypeCheckFailure::new(format!(
            "unexpected identifier `{}`",
            ident.text()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use indoc::indoc;

    fn check(src: &str) -> Result<TypedNode, TypeCheckFailure> {
        let parsed = Parser::new(src).parse();
        type_check(src, parsed.root)
    }

    fn ok(src: &str) -> TypedNode {
        check(src).unwrap_or_else(|e| panic!("expected {src:?} to type-check, got {e:?}"))
    }

    fn err(src: &str) -> TypeCheckFailure {
        check(src).err().unwrap_or_else(|| panic!("expected {src:?} to fail type-checking"))
    }

    // --- accept set ---

    #[test]
    fn accepts_ref_source_config() {
        ok("select * from {{ ref('my_table') }}");
        ok("{{ config(key='value') }}");
        ok("{{ source('a', 'b') }}");
    }

    #[test]
    fn accepts_multiple_expressions() {
        let TypedNode::Root(calls) = ok("{{ ref('x') }} {{ ref('y') }}");
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn accepts_deeply_nested_literals() {
        ok("{{ config(key=[{'k':['v', {'x': 'y'}]}, ['a', 'b', 'c']]) }}");
    }

    #[test]
    fn accepts_source_keyword_permutations() {
        ok("{{ source(source_name='src', table_name='table') }}");
        ok("{{ source('src', table_name='table') }}");
        ok("{{ source(table_name='table', source_name='src') }}");
    }

    #[test]
    fn accepts_ref_arities() {
        ok("{{ ref('two', 'args') }}");
        ok("{{ ref('one arg') }}");
    }

    // --- reject set ---

    #[test]
    fn rejects_unknown_callee() {
        assert!(check("{{ reff('my_table') }}").is_err());
        assert!(check("{{ REF('a','b') }}").is_err());
        assert!(check("{{ fn(key='value') }}").is_err());
    }

    #[test]
    fn rejects_positional_config() {
        assert!(check("{{ config('value') }}").is_err());
        assert!(check("{{ config(True) }}").is_err());
    }

    #[test]
    fn rejects_bad_source_keyword_name() {
        assert!(check("{{ source(source_name='src', BAD_NAME='table') }}").is_err());
    }

    #[test]
    fn rejects_bad_source_arity_or_types() {
        assert!(check("{{ source('one') }}").is_err());
        assert!(check("{{ source('a','b','c') }}").is_err());
        assert!(check("{{ source(True, False) }}").is_err());
    }

    #[test]
    fn rejects_bad_ref_shapes() {
        assert!(check("{{ ref() }}").is_err());
        assert!(check("{{ ref('a','b','c') }}").is_err());
        assert!(check("{{ ref(kwarg='x') }}").is_err());
        assert!(check("{{ ref(['list']) }}").is_err());
    }

    #[test]
    fn rejects_nested_calls() {
        assert!(check("{{ [ref('x')] }}").is_err());
        assert!(check("{{ config(x=ref('x')) }}").is_err());
    }

    #[test]
    fn rejects_hook_keywords() {
        assert!(check("{{ config(pre_hook='x') }}").is_err());
        assert!(check("{{ config(pre-hook='x') }}").is_err());
        assert!(check("{{ config(post_hook='x') }}").is_err());
        assert!(check("{{ config(post-hook='x') }}").is_err());
    }

    #[test]
    fn rejects_jinja_statements_verbatim_message() {
        assert_eq!(
            err("{% config(x='y') %}").msg,
            "jinja expressions are unsupported: {% syntax like this %}"
        );
        assert!(check("stuff {{ ref('s') }} {% tag %}").is_err());
    }

    #[test]
    fn rejects_top_level_bare_kwarg() {
        assert!(check("{{ kwarg='value' }}").is_err());
    }

    #[test]
    fn rejects_unbalanced_delimiters() {
        assert!(check("{{ ref(").is_err());
        assert!(check("{{ True").is_err());
        assert!(check("{{").is_err());
        assert!(check("{{ 'str' ").is_err());
    }

    #[test]
    fn open_question_conflict_resolves_to_ordering_rule() {
        // §9's Open Question: ordering is authoritative, so this keyword-then-
        // positional mix is rejected even though it superficially resembles an
        // accepted permutation.
        assert_eq!(
            err("{{ source(source_name='kwarg', 'positional') }}").msg,
            "keyword arguments must all be at the end"
        );
    }

    // --- end-to-end scenarios from the spec ---

    #[test]
    fn scenario_two_refs() {
        let TypedNode::Root(calls) = ok("{{ ref('my_table') }} {{ ref('other_table')}}");
        assert_eq!(
            calls,
            vec![
                TopCall::Ref { arg1: "my_table".into(), arg2: None },
                TopCall::Ref { arg1: "other_table".into(), arg2: None },
            ]
        );
    }

    #[test]
    fn refs_buried_in_surrounding_sql_are_still_found() {
        let src = indoc! {"
            with source_data as (
                select * from {{ source('raw', 'events') }}
            )
            select
                id,
                {{ config(materialized='table') }}
                user_id
            from source_data
            join {{ ref('dim_users') }} on source_data.user_id = dim_users.id
        "};
        let TypedNode::Root(calls) = ok(src);
        assert_eq!(
            calls,
            vec![
                TopCall::Source { source_name: "raw".into(), table_name: "events".into() },
                TopCall::Config(vec![("materialized".into(), LiteralValue::String("table".into()))]),
                TopCall::Ref { arg1: "dim_users".into(), arg2: None },
            ]
        );
    }

    #[test]
    fn buried_refs_ast_dump_matches_snapshot() {
        let src = indoc! {"
            with source_data as (
                select * from {{ source('raw', 'events') }}
            )
            select
                id,
                {{ config(materialized='table') }}
                user_id
            from source_data
            join {{ ref('dim_users') }} on source_data.user_id = dim_users.id
        "};
        let typed = ok(src);
        insta::assert_snapshot!(format!("{typed:#?}"), @r#"
        Root(
            [
                Source {
                    source_name: "raw",
                    table_name: "events",
                },
                Config(
                    [
                        (
                            "materialized",
                            String(
                                "table",
                            ),
                        ),
                    ],
                ),
                Ref {
                    arg1: "dim_users",
                    arg2: None,
                },
            ],
        )
        "#);
    }

    #[test]
    fn scenario_config_preserves_kwarg_order() {
        let TypedNode::Root(calls) = ok("{{ config(k='v', x=True) }}");
        assert_eq!(
            calls,
            vec![TopCall::Config(vec![
                ("k".into(), LiteralValue::String("v".into())),
                ("x".into(), LiteralValue::Bool(true)),
            ])]
        );
    }
}
