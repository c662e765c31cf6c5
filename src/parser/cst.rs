//! Syntax kinds for the restricted-Jinja template language.
//!
//! `SyntaxKind` serves dual roles: token kinds (from the lexer) and node
//! kinds (from the parser). Only the tokens listed here with `#[token(..)]`/
//! `#[regex(..)]` attributes are reachable through `Logos`; the structural
//! delimiters (`{{`, `}}`, `{%`, `%}`, raw `Text`, opaque `StmtRaw`) are
//! built by hand in `lexer::segment` and never seen by the derived lexer.
//! `Lang` implements Rowan's `Language` trait so both layers share one green
//! tree.

use logos::Logos;
use rowan::Language;

/// All token and node kinds. `#[repr(u16)]` enables the safe transmute in
/// `kind_from_raw`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- structural delimiters, built by hand, never by the inner lexer ---
    Text = 0,
    LCurlyCurly,
    RCurlyCurly,
    LCurlyPercent,
    RCurlyPercent,
    /// Opaque body of a `{% … %}` statement; never further tokenized.
    StmtRaw,

    // --- inner call-expression tokens, recognized inside `{{ … }}` ---
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,
    #[token(",")]
    Comma,

    #[token("True")]
    KwTrue,
    #[token("False")]
    KwFalse,

    /// Defined after the keywords above so they take precedence.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Id,

    #[regex(r"'[^']*'")]
    #[doc(hidden)]
    StringLiteral, // lexer-internal only, split into SingleQuote+StrVal+SingleQuote

    SingleQuote,
    /// String content between the quotes.
    StrVal,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Coalesced run of characters the grammar does not recognize.
    Garbage,

    // --- node kinds (non-terminals) ---
    Root,
    TemplateExpr,
    TemplateStmt,
    Call,
    ArgList,
    Kwarg,
    Str,
    Bool,
    List,
    Dict,
    DictEntry,
    /// A bare identifier used where a value was expected (e.g. `{{ foo }}`).
    Ident,
    /// Wraps a token or run of tokens the grammar did not expect.
    Error,
    /// Zero-width marker where a required token was never found.
    Missing,

    // Must be last - used for bounds checking in `kind_from_raw`.
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Garbage | Error)
    }

    #[inline]
    pub fn is_missing(self) -> bool {
        matches!(self, Missing)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: we've verified the value is in bounds, and SyntaxKind is repr(u16).
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for Rowan types parameterized by our language.
pub type SyntaxNode = rowan::SyntaxNode<Lang>;
pub type SyntaxToken = rowan::SyntaxToken<Lang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_is_in_bounds_for_repr_u16() {
        assert!((__LAST as u16) < u16::MAX);
    }

    #[test]
    fn trivia_and_error_kinds_do_not_overlap() {
        assert!(!Whitespace.is_error());
        assert!(!Garbage.is_trivia());
        assert!(Garbage.is_error());
        assert!(Error.is_error());
        assert!(Missing.is_missing());
        assert!(!Missing.is_error());
    }
}
