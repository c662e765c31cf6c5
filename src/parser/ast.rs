//! Typed AST wrappers over the concrete syntax tree.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors. Cast is
//! infallible for a matching `SyntaxKind` - validation happens in
//! [`crate::typecheck`].

use super::cst::{SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn as_cst(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(Root, Root);
ast_node!(TemplateExpr, TemplateExpr);
ast_node!(TemplateStmt, TemplateStmt);
ast_node!(Call, Call);
ast_node!(ArgList, ArgList);
ast_node!(Kwarg, Kwarg);
ast_node!(Str, Str);
ast_node!(Bool, Bool);
ast_node!(List, List);
ast_node!(Dict, Dict);
ast_node!(DictEntry, DictEntry);
ast_node!(Ident, Ident);

/// Anything that can appear where a value is expected: a string, a bool, a
/// list, a dict, a nested call, or a bad bare identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Str(Str),
    Bool(Bool),
    List(List),
    Dict(Dict),
    Call(Call),
    Ident(Ident),
}

impl Value {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::Str => Str::cast(node).map(Value::Str),
            SyntaxKind::Bool => Bool::cast(node).map(Value::Bool),
            SyntaxKind::List => List::cast(node).map(Value::List),
            SyntaxKind::Dict => Dict::cast(node).map(Value::Dict),
            SyntaxKind::Call => Call::cast(node).map(Value::Call),
            SyntaxKind::Ident => Ident::cast(node).map(Value::Ident),
            _ => None,
        }
    }

    pub fn as_cst(&self) -> &SyntaxNode {
        match self {
            Value::Str(n) => n.as_cst(),
            Value::Bool(n) => n.as_cst(),
            Value::List(n) => n.as_cst(),
            Value::Dict(n) => n.as_cst(),
            Value::Call(n) => n.as_cst(),
            Value::Ident(n) => n.as_cst(),
        }
    }
}

/// A single entry in an argument list: positional or keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arg {
    Positional(Value),
    Kwarg(Kwarg),
}

impl Arg {
    fn cast(node: SyntaxNode) -> Option<Self> {
        if node.kind() == SyntaxKind::Kwarg {
            return Kwarg::cast(node).map(Arg::Kwarg);
        }
        Value::cast(node).map(Arg::Positional)
    }
}

impl Root {
    pub fn template_exprs(&self) -> impl Iterator<Item = TemplateExpr> + '_ {
        self.0.children().filter_map(TemplateExpr::cast)
    }

    pub fn template_stmts(&self) -> impl Iterator<Item = TemplateStmt> + '_ {
        self.0.children().filter_map(TemplateStmt::cast)
    }
}

impl TemplateExpr {
    /// The single top-level construct inside `{{ … }}`: a call or a bare
    /// value. `None` for an empty or wholly-garbled expr.
    pub fn content(&self) -> Option<SyntaxNode> {
        self.0.children().next()
    }

    pub fn call(&self) -> Option<Call> {
        self.content().and_then(Call::cast)
    }
}

impl Call {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Id)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    pub fn args(&self) -> impl Iterator<Item = Arg> + '_ {
        self.0
            .children()
            .find_map(ArgList::cast)
            .into_iter()
            .flat_map(|list| list.0.children().filter_map(Arg::cast))
    }
}

impl Kwarg {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Id)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    pub fn value(&self) -> Option<Value> {
        self.0.children().find_map(Value::cast)
    }
}

impl Str {
    pub fn value(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::StrVal)
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}

impl Bool {
    pub fn value(&self) -> bool {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::KwTrue)
    }
}

impl List {
    pub fn items(&self) -> impl Iterator<Item = Value> + '_ {
        self.0.children().filter_map(Value::cast)
    }
}

impl Dict {
    pub fn entries(&self) -> impl Iterator<Item = DictEntry> + '_ {
        self.0.children().filter_map(DictEntry::cast)
    }
}

impl DictEntry {
    pub fn key(&self) -> Option<Value> {
        self.0.children().filter_map(Value::cast).next()
    }

    pub fn value(&self) -> Option<Value> {
        self.0.children().filter_map(Value::cast).nth(1)
    }
}

impl Ident {
    pub fn text(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Id)
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }
}
