//! Top-level parser: drives outer segmentation and the green-tree builder.
//!
//! `Parser` walks the `Segment`s produced by [`lexer::segment`] and lowers
//! each into the tree: `Text` segments become leaf tokens, `{{ … }}`/
//! `{% … %}` segments become `TemplateExpr`/`TemplateStmt` nodes wrapping
//! their delimiters. The interior of a `TemplateExpr` is handed to
//! [`super::grammar::parse_expr_content`], which runs the recursive-descent
//! call-expression grammar against its own inner-lexed token stream.

use std::ops::Range;

use rowan::GreenNodeBuilder;

use super::cst::{SyntaxKind, SyntaxNode};
use super::lexer::{self, Segment};
use crate::diagnostics::Diagnostics;

pub struct ParseResult {
    pub root: SyntaxNode,
    pub diagnostics: Diagnostics,
}

pub struct Parser<'src> {
    source: &'src str,
    builder: GreenNodeBuilder<'static>,
    diagnostics: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            builder: GreenNodeBuilder::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn parse(mut self) -> ParseResult {
        self.builder.start_node(SyntaxKind::Root.into());
        for seg in lexer::segment(self.source) {
            self.lower_segment(seg);
        }
        self.builder.finish_node();
        ParseResult {
            root: SyntaxNode::new_root(self.builder.finish()),
            diagnostics: self.diagnostics,
        }
    }

    fn lower_segment(&mut self, seg: Segment) {
        match seg {
            Segment::Text(range) => {
                self.builder.token(SyntaxKind::Text.into(), &self.source[range]);
            }
            Segment::Expr { open, inner, close } => self.lower_expr(open, inner, close),
            Segment::Stmt { open, body, close } => self.lower_stmt(open, body, close),
        }
    }

    fn lower_expr(&mut self, open: Range<usize>, inner: Range<usize>, close: Option<Range<usize>>) {
        self.builder.start_node(SyntaxKind::TemplateExpr.into());
        self.builder.token(SyntaxKind::LCurlyCurly.into(), &self.source[open]);

        let inner_src = &self.source[inner.clone()];
        let tokens = lexer::lex_expr(inner_src);
        super::grammar::parse_expr_content(&mut self.builder, inner_src, tokens);

        match close {
            Some(close_range) => {
                self.builder
                    .token(SyntaxKind::RCurlyCurly.into(), &self.source[close_range]);
            }
            None => {
                self.builder.start_node(SyntaxKind::Missing.into());
                self.builder.finish_node();
                self.diagnostics
                    .error("expected a closing `}}`", text_range(&inner))
                    .emit();
            }
        }
        self.builder.finish_node();
    }

    fn lower_stmt(&mut self, open: Range<usize>, body: Range<usize>, close: Option<Range<usize>>) {
        self.builder.start_node(SyntaxKind::TemplateStmt.into());
        self.builder.token(SyntaxKind::LCurlyPercent.into(), &self.source[open]);
        if !body.is_empty() {
            self.builder
                .token(SyntaxKind::StmtRaw.into(), &self.source[body.clone()]);
        }
        match close {
            Some(close_range) => {
                self.builder
                    .token(SyntaxKind::RCurlyPercent.into(), &self.source[close_range]);
            }
            None => {
                self.builder.start_node(SyntaxKind::Missing.into());
                self.builder.finish_node();
                self.diagnostics
                    .error("expected a closing `%}`", text_range(&body))
                    .emit();
            }
        }
        self.builder.finish_node();
    }
}

fn text_range(r: &Range<usize>) -> rowan::TextRange {
    rowan::TextRange::new((r.start as u32).into(), (r.end as u32).into())
}

/// Counts nodes and tokens in `node`'s subtree (including `node` itself)
/// flagged `is_error` or `is_missing`. A non-zero count means the tree is
/// not trustworthy enough for the type checker to walk.
pub fn error_count(node: &SyntaxNode) -> usize {
    node.descendants_with_tokens()
        .filter(|el| {
            let kind = match el {
                rowan::NodeOrToken::Node(n) => n.kind(),
                rowan::NodeOrToken::Token(t) => t.kind(),
            };
            kind.is_error() || kind.is_missing()
        })
        .count()
}
