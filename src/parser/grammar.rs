//! Recursive-descent grammar for the interior of a `{{ … }}` region.
//!
//! Operates over the token stream produced by [`super::lexer::lex_expr`]
//! and pushes directly into the shared green-tree builder, nesting its
//! nodes inside the enclosing `TemplateExpr`. Whitespace tokens are skipped
//! rather than buffered as trivia: the grammar has no use for them (the
//! spec treats whitespace inside `{{ … }}` as insignificant), so dropping
//! them keeps this parser a plain recursive descent rather than needing
//! trivia-buffering machinery.
//!
//! Recovery mirrors the rest of the crate: an unexpected token is wrapped in
//! an `Error` node and consumed; an absent required token produces a
//! zero-width `Missing` node and is not consumed.

use rowan::GreenNodeBuilder;

use super::cst::SyntaxKind;
use super::lexer::Token;

pub(super) fn parse_expr_content(builder: &mut GreenNodeBuilder<'static>, src: &str, tokens: Vec<Token>) {
    let mut parser = ExprParser { builder, src, tokens, pos: 0 };
    parser.parse_top();
}

struct ExprParser<'b, 'src> {
    builder: &'b mut GreenNodeBuilder<'static>,
    src: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser<'_, '_> {
    fn skip_ws(&mut self) {
        while matches!(self.tokens.get(self.pos), Some(t) if t.kind == SyntaxKind::Whitespace) {
            self.pos += 1;
        }
    }

    /// Current non-whitespace token kind, or `Error` at EOF (sentinel).
    fn current(&mut self) -> SyntaxKind {
        self.skip_ws();
        self.tokens.get(self.pos).map_or(SyntaxKind::Error, |t| t.kind)
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.tokens.len()
    }

    /// Whether the `n`-th non-whitespace token after the current one has `kind`.
    /// `peek_is(0, k)` is equivalent to `at(k)`.
    fn peek_is(&mut self, n: usize, kind: SyntaxKind) -> bool {
        self.skip_ws();
        let mut idx = self.pos;
        let mut seen = 0usize;
        loop {
            match self.tokens.get(idx) {
                None => return false,
                Some(t) if t.kind == SyntaxKind::Whitespace => idx += 1,
                Some(t) => {
                    if seen == n {
                        return t.kind == kind;
                    }
                    seen += 1;
                    idx += 1;
                }
            }
        }
    }

    fn bump(&mut self) {
        self.skip_ws();
        let token = self.tokens[self.pos];
        self.builder.token(token.kind.into(), token.text(self.src));
        self.pos += 1;
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_ws();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn missing(&mut self) {
        self.builder.start_node(SyntaxKind::Missing.into());
        self.builder.finish_node();
    }

    /// Expects `kind`; emits a zero-width `Missing` node if absent.
    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.missing();
            false
        }
    }

    fn error_bump_one(&mut self) {
        self.start_node(SyntaxKind::Error);
        if !self.eof() {
            self.bump();
        }
        self.finish_node();
    }

    fn error_bump_rest(&mut self) {
        self.start_node(SyntaxKind::Error);
        while !self.eof() {
            self.bump();
        }
        self.finish_node();
    }

    /// The single top-level construct inside `{{ … }}`.
    fn parse_top(&mut self) {
        if self.eof() {
            self.missing();
            return;
        }
        match self.current() {
            SyntaxKind::Id if self.peek_is(1, SyntaxKind::Equals) => self.parse_kwarg(),
            SyntaxKind::Id if self.peek_is(1, SyntaxKind::ParenOpen) => self.parse_call(),
            SyntaxKind::Id => self.parse_ident(),
            SyntaxKind::KwTrue | SyntaxKind::KwFalse => self.parse_bool(),
            SyntaxKind::SingleQuote => self.parse_str(),
            SyntaxKind::BracketOpen => self.parse_list(),
            SyntaxKind::BraceOpen => self.parse_dict(),
            _ => self.error_bump_one(),
        }
        if !self.eof() {
            self.error_bump_rest();
        }
    }

    /// A value in argument, list-item, or dict key/value position.
    fn parse_value(&mut self) {
        match self.current() {
            SyntaxKind::Id if self.peek_is(1, SyntaxKind::ParenOpen) => self.parse_call(),
            SyntaxKind::Id => self.parse_ident(),
            SyntaxKind::KwTrue | SyntaxKind::KwFalse => self.parse_bool(),
            SyntaxKind::SingleQuote => self.parse_str(),
            SyntaxKind::BracketOpen => self.parse_list(),
            SyntaxKind::BraceOpen => self.parse_dict(),
            _ if self.eof() => self.missing(),
            _ => self.error_bump_one(),
        }
    }

    /// An argument-list entry: positional value or `name=value` keyword.
    fn parse_arg(&mut self) {
        if self.at(SyntaxKind::Id) && self.peek_is(1, SyntaxKind::Equals) {
            self.parse_kwarg();
        } else {
            self.parse_value();
        }
    }

    fn parse_kwarg(&mut self) {
        self.start_node(SyntaxKind::Kwarg);
        self.bump(); // Id
        self.expect(SyntaxKind::Equals);
        self.parse_value();
        self.finish_node();
    }

    fn parse_call(&mut self) {
        self.start_node(SyntaxKind::Call);
        self.bump(); // Id
        if self.eat(SyntaxKind::ParenOpen) {
            self.parse_arg_list();
            self.expect(SyntaxKind::ParenClose);
        } else {
            self.missing();
        }
        self.finish_node();
    }

    fn parse_arg_list(&mut self) {
        self.start_node(SyntaxKind::ArgList);
        loop {
            if self.at(SyntaxKind::ParenClose) || self.eof() {
                break;
            }
            self.parse_arg();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
            if self.at(SyntaxKind::ParenClose) || self.eof() {
                break;
            }
        }
        self.finish_node();
    }

    fn parse_list(&mut self) {
        self.start_node(SyntaxKind::List);
        self.bump(); // [
        loop {
            if self.at(SyntaxKind::BracketClose) || self.eof() {
                break;
            }
            self.parse_value();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
            if self.at(SyntaxKind::BracketClose) || self.eof() {
                break;
            }
        }
        self.expect(SyntaxKind::BracketClose);
        self.finish_node();
    }

    fn parse_dict(&mut self) {
        self.start_node(SyntaxKind::Dict);
        self.bump(); // {
        loop {
            if self.at(SyntaxKind::BraceClose) || self.eof() {
                break;
            }
            self.parse_dict_entry();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
            if self.at(SyntaxKind::BraceClose) || self.eof() {
                break;
            }
        }
        self.expect(SyntaxKind::BraceClose);
        self.finish_node();
    }

    fn parse_dict_entry(&mut self) {
        self.start_node(SyntaxKind::DictEntry);
        self.parse_value();
        self.expect(SyntaxKind::Colon);
        self.parse_value();
        self.finish_node();
    }

    fn parse_str(&mut self) {
        self.start_node(SyntaxKind::Str);
        self.bump(); // opening '
        if self.at(SyntaxKind::StrVal) {
            self.bump();
        }
        self.expect(SyntaxKind::SingleQuote);
        self.finish_node();
    }

    fn parse_bool(&mut self) {
        self.start_node(SyntaxKind::Bool);
        self.bump();
        self.finish_node();
    }

    fn parse_ident(&mut self) {
        self.start_node(SyntaxKind::Ident);
        self.bump();
        self.finish_node();
    }
}
