//! Two-phase lexing for the restricted-Jinja template language.
//!
//! [`segment`] performs the outer pass by hand: it walks the raw source
//! looking for literal `{{`/`{%` delimiters and, once inside one, tracks
//! paren/bracket/brace nesting and quoted strings to find the matching
//! closer without ever invoking the call-expression grammar on arbitrary
//! surrounding SQL. [`lex_expr`] then runs the `Logos`-derived inner lexer
//! over exactly the text between a `{{`/`}}` pair, the same way the
//! teacher's own lexer wraps Logos with pre/post-processing rather than
//! using it as the whole story.

use logos::Logos;
use std::ops::Range;

use super::cst::SyntaxKind;

/// Zero-copy token: kind + span relative to the slice it was lexed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Range<usize>,
}

impl Token {
    #[inline]
    pub fn new(kind: SyntaxKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    #[inline]
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.span.clone()]
    }
}

/// One top-level segment of source text.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Arbitrary text outside any `{{ }}`/`{% %}` region.
    Text(Range<usize>),
    /// A `{{ … }}` region. `close` is `None` when no matching `}}` was found
    /// (unbalanced delimiters), in which case the region runs to EOF.
    Expr {
        open: Range<usize>,
        inner: Range<usize>,
        close: Option<Range<usize>>,
    },
    /// A `{% … %}` region. `close` is `None` when no matching `%}` was found.
    Stmt {
        open: Range<usize>,
        body: Range<usize>,
        close: Option<Range<usize>>,
    },
}

/// Splits `source` into [`Segment`]s by literal `{{`/`{%` search.
pub fn segment(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let len = source.len();
    let mut i = 0usize;
    let mut text_start = 0usize;

    while i < len {
        if source[i..].starts_with("{{") {
            if i > text_start {
                segments.push(Segment::Text(text_start..i));
            }
            let open = i..i + 2;
            let inner_start = i + 2;
            match find_expr_end(source, inner_start) {
                Some(end) => {
                    segments.push(Segment::Expr {
                        open,
                        inner: inner_start..end,
                        close: Some(end..end + 2),
                    });
                    i = end + 2;
                }
                None => {
                    segments.push(Segment::Expr {
                        open,
                        inner: inner_start..len,
                        close: None,
                    });
                    i = len;
                }
            }
            text_start = i;
        } else if source[i..].starts_with("{%") {
            if i > text_start {
                segments.push(Segment::Text(text_start..i));
            }
            let open = i..i + 2;
            let body_start = i + 2;
            match source[body_start..].find("%}") {
                Some(rel) => {
                    let end = body_start + rel;
                    segments.push(Segment::Stmt {
                        open,
                        body: body_start..end,
                        close: Some(end..end + 2),
                    });
                    i = end + 2;
                }
                None => {
                    segments.push(Segment::Stmt {
                        open,
                        body: body_start..len,
                        close: None,
                    });
                    i = len;
                }
            }
            text_start = i;
        } else {
            let ch_len = source[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
            i += ch_len;
        }
    }

    if len > text_start {
        segments.push(Segment::Text(text_start..len));
    }

    segments
}

/// Finds the byte offset of the `}}` that closes a `{{` opened at `start`,
/// respecting `()`/`[]`/`{}` nesting and single-quoted strings so that a
/// dict literal's own `}` is never mistaken for the expression closer.
/// Every delimiter byte checked here is ASCII, so stepping one byte at a
/// time is safe even when the source contains multi-byte UTF-8 (e.g. inside
/// a string literal): no continuation byte can equal an ASCII delimiter.
fn find_expr_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut i = start;
    let mut depth: i32 = 0;
    let mut in_string = false;

    while i < len {
        let b = bytes[i];
        if in_string {
            if b == b'\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => {
                in_string = true;
                i += 1;
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' => {
                depth = (depth - 1).max(0);
                i += 1;
            }
            b'}' => {
                if depth == 0 {
                    if bytes.get(i + 1) == Some(&b'}') {
                        return Some(i);
                    }
                    i += 1;
                } else {
                    depth -= 1;
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    None
}

/// Tokenizes the interior of a `{{ … }}` region (a slice of the original
/// source) into the call-expression mini-grammar. Post-processes the Logos
/// output the same way the teacher's lexer does: coalesces consecutive
/// lexer errors into `Garbage`, and splits `StringLiteral` into quote +
/// content + quote.
pub fn lex_expr(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = SyntaxKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(SyntaxKind::Garbage, start..end));
                }

                let span = lexer.span();
                if kind == SyntaxKind::StringLiteral {
                    split_string_literal(span, &mut tokens);
                } else {
                    tokens.push(Token::new(kind, span));
                }
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(SyntaxKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    tokens
}

/// Splits a `'...'` string literal token into: quote + content + quote.
fn split_string_literal(span: Range<usize>, tokens: &mut Vec<Token>) {
    let start = span.start;
    let end = span.end;

    tokens.push(Token::new(SyntaxKind::SingleQuote, start..start + 1));
    if end - start > 2 {
        tokens.push(Token::new(SyntaxKind::StrVal, start + 1..end - 1));
    }
    tokens.push(Token::new(SyntaxKind::SingleQuote, end - 1..end));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<SyntaxKind> {
        lex_expr(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_simple_call() {
        assert_eq!(
            kinds(" ref('my_table') "),
            vec![
                SyntaxKind::Whitespace,
                SyntaxKind::Id,
                SyntaxKind::ParenOpen,
                SyntaxKind::SingleQuote,
                SyntaxKind::StrVal,
                SyntaxKind::SingleQuote,
                SyntaxKind::ParenClose,
                SyntaxKind::Whitespace,
            ]
        );
    }

    #[test]
    fn keywords_take_precedence_over_identifiers() {
        assert_eq!(kinds("True"), vec![SyntaxKind::KwTrue]);
        assert_eq!(kinds("False"), vec![SyntaxKind::KwFalse]);
        assert_eq!(kinds("Truest"), vec![SyntaxKind::Id]);
    }

    #[test]
    fn coalesces_unrecognized_characters() {
        assert_eq!(kinds("@#$"), vec![SyntaxKind::Garbage]);
    }

    #[test]
    fn find_expr_end_skips_nested_brackets_and_strings() {
        let src = "{{ config(key={'a': 'b}}c'}) }}";
        let inner_start = 3;
        let end = find_expr_end(src, inner_start).unwrap();
        assert_eq!(&src[end..end + 2], "}}");
        assert_eq!(&src[..end], "{{ config(key={'a': 'b}}c'}) ");
    }

    #[test]
    fn unbalanced_expr_has_no_close() {
        let src = "{{ ref(";
        assert!(find_expr_end(src, 2).is_none());
    }

    #[test]
    fn segment_splits_text_and_expr() {
        let segs = segment("select * from {{ ref('x') }} where 1=1");
        assert_eq!(segs.len(), 2);
        assert!(matches!(segs[0], Segment::Text(ref r) if r == &(0..14)));
        assert!(matches!(segs[1], Segment::Expr { close: Some(_), .. }));
    }
}
