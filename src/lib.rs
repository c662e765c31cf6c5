//! Static analyzer for the restricted `ref()`/`source()`/`config()` Jinja
//! subset embedded in SQL.
//!
//! The core is a three-stage pipeline, each stage a pure function of its
//! input: [`parser`] produces a lossless concrete tree, [`typecheck`] walks
//! it into a typed AST (or a [`typecheck::TypeCheckFailure`]), and
//! [`extract`] folds the typed AST into an [`Extraction`]. [`extract_from_source`]
//! runs all three in one call.
//!
//! # Example
//!
//! ```
//! use jinja_tags::extract_from_source;
//!
//! let extraction = extract_from_source(b"select * from {{ ref('my_table') }}").unwrap();
//! assert_eq!(extraction.refs, vec![vec!["my_table".to_string()]]);
//! assert!(!extraction.python_jinja);
//! ```
//!
//! Malformed template syntax fails instead of guessing:
//!
//! ```
//! use jinja_tags::extract_from_source;
//!
//! let failure = extract_from_source(b"{% this is a statement, not an expression %}").unwrap_err();
//! assert_eq!(failure.msg, "jinja expressions are unsupported: {% syntax like this %}");
//! ```

pub mod diagnostics;
pub mod extract;
pub mod parser;
pub mod typecheck;

pub use extract::{Extraction, extract};
pub use parser::{Parser, error_count};
pub use typecheck::{Kwarg, LiteralValue, TopCall, TypeCheckFailure, TypedNode, type_check};

/// Runs the full parse → type-check → extract pipeline over a UTF-8 byte
/// buffer.
///
/// Invalid UTF-8 is not a distinct failure mode: bytes are decoded with
/// [`String::from_utf8_lossy`], so malformed sequences become `U+FFFD` and
/// either sit harmlessly in surrounding text or, if they land inside a
/// `{{ … }}` region, surface as an ordinary parse error through
/// [`error_count`]. This keeps the error surface to the two categories the
/// type checker already defines — no separate fatal-error type is needed.
pub fn extract_from_source(src: &[u8]) -> Result<Extraction, TypeCheckFailure> {
    let text = String::from_utf8_lossy(src);
    let parsed = Parser::new(&text).parse();
    let typed = type_check(&text, parsed.root)?;
    Ok(extract(typed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_success() {
        let extraction = extract_from_source(b"{{ ref('my_table') }} {{ ref('other_table')}}").unwrap();
        assert_eq!(
            extraction.refs,
            vec![vec!["my_table".to_string()], vec!["other_table".to_string()]]
        );
    }

    #[test]
    fn end_to_end_failure_message_is_stable() {
        let failure = extract_from_source(b"{% expression %}").unwrap_err();
        assert_eq!(failure.msg, "jinja expressions are unsupported: {% syntax like this %}");
    }

    #[test]
    fn end_to_end_ordering_rule_message_is_stable() {
        let failure = extract_from_source(b"{{ source(source_name='kwarg', 'positional') }}").unwrap_err();
        assert_eq!(failure.msg, "keyword arguments must all be at the end");
    }

    #[test]
    fn no_delimiters_is_robust() {
        let extraction = extract_from_source(b"just a plain sentence.").unwrap();
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn invalid_utf8_is_handled_via_lossy_decode() {
        let src: &[u8] = b"select {{ ref('x') }} \xff\xfe more text";
        let extraction = extract_from_source(src).unwrap();
        assert_eq!(extraction.refs, vec![vec!["x".to_string()]]);
    }

    #[test]
    fn idempotent_type_check() {
        let src = "{{ ref('x') }} {{ config(a=['a', 'b']) }}";
        let parsed1 = Parser::new(src).parse();
        let parsed2 = Parser::new(src).parse();
        let r1 = type_check(src, parsed1.root);
        let r2 = type_check(src, parsed2.root);
        assert_eq!(r1, r2);
    }
}
