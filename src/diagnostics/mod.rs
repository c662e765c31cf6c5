//! Parser diagnostics infrastructure.
//!
//! This module collects human-readable, source-anchored messages the parser
//! attaches to `Error`/`Missing` nodes. It is tooling support, not part of
//! the stable analyzer contract: [`crate::type_check`] still reports failure
//! as a single [`crate::TypeCheckFailure`] message, regardless of how many
//! diagnostics the parser collected along the way.

mod message;
mod printer;

use rowan::TextRange;

pub use message::Severity;
pub use printer::DiagnosticsPrinter;

use message::{DiagnosticMessage, Fix, RelatedInfo};

/// Collection of diagnostic messages gathered while parsing.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

/// Builder for constructing a diagnostic message.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn error(&mut self, msg: impl Into<String>, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::error(range, msg),
        }
    }

    pub fn warning(&mut self, msg: impl Into<String>, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::warning(range, msg),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.message.related.push(RelatedInfo::new(range, msg));
        self
    }

    pub fn fix(mut self, description: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.message.fix = Some(Fix::new(replacement, description));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_and_emit_records_a_message() {
        let mut diags = Diagnostics::new();
        diags.error("bad token", TextRange::new(0.into(), 1.into())).emit();
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn related_and_fix_are_attached() {
        let mut diags = Diagnostics::new();
        diags
            .error("missing `}}`", TextRange::new(0.into(), 2.into()))
            .related_to("opened here", TextRange::new(2.into(), 4.into()))
            .fix("insert closing brace", "}}")
            .emit();
        let msg = diags.iter().next().unwrap();
        assert_eq!(msg.related.len(), 1);
        assert!(msg.fix.is_some());
    }

    #[test]
    fn plain_printer_renders_one_line_per_message() {
        let mut diags = Diagnostics::new();
        diags.error("bad token", TextRange::new(0.into(), 1.into())).emit();
        diags.warning("unusual spacing", TextRange::new(4.into(), 5.into())).emit();
        assert_eq!(
            diags.printer().render(),
            "error at 0..1: bad token\nwarning at 4..5: unusual spacing"
        );
    }
}
