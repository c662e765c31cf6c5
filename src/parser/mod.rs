//! Parser infrastructure for the restricted-Jinja template language.
//!
//! Two phases feed one `rowan` green tree: [`lexer::segment`] splits the raw
//! source into `Text`/`{{ … }}`/`{% … %}` regions by hand, and
//! [`grammar::parse_expr_content`] runs a small recursive-descent grammar
//! over the `Logos`-tokenized interior of each `{{ … }}` region. [`core::Parser`]
//! drives both and hands back a lossless [`cst::SyntaxNode`] tree: malformed
//! input never panics, it surfaces as `Error`/`Missing` nodes for
//! [`error_count`] to count.

pub mod ast;
pub mod cst;

mod core;
mod grammar;
mod lexer;

pub use core::{ParseResult, Parser, error_count};
pub use cst::{SyntaxKind, SyntaxNode, SyntaxToken};
