//! Diagnostics
//!
//! Two channels, errors and warnings, each an ordered list of human-readable
//! messages. Parsing and upgrading return a [`Diagnostics`] value alongside
//! their result; [`DiagnosticsSink`] collects those values per operation for
//! callers (the CLI, a UI) that want one log across several calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The affected unit (parse, table, upgrade call) is invalid
    Error,
    /// Recoverable omission; a best-effort result is still produced
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Diagnostics produced by one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. Anything `Display` works, typically a `thiserror` enum.
    pub fn error(&mut self, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::warn!(severity = Severity::Error.as_str(), "{}", message);
        self.errors.push(Diagnostic::new(message));
    }

    /// Record a warning.
    pub fn warning(&mut self, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::debug!(severity = Severity::Warning.as_str(), "{}", message);
        self.warnings.push(Diagnostic::new(message));
    }

    /// Records of one channel
    pub fn channel(&self, severity: Severity) -> &[Diagnostic] {
        match severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

}

/// A call result together with its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.diagnostics.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.diagnostics.warnings
    }

    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }
}

/// Identifier under which an operation's diagnostics are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    pub const PARSE_CONTRIBUTION: &'static str = "PARSE_CONTRIBUTION";
    pub const UPGRADE_CONTRIBUTION: &'static str = "UPGRADE_CONTRIBUTION";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn parse_contribution() -> Self {
        Self::new(Self::PARSE_CONTRIBUTION)
    }

    pub fn upgrade_contribution() -> Self {
        Self::new(Self::UPGRADE_CONTRIBUTION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only diagnostics log keyed by operation and channel.
///
/// Nothing is filtered, deduplicated or reset automatically: running the
/// same operation twice accumulates both runs until [`clear`](Self::clear).
/// Not meant for concurrent writers; use one sink per pipeline.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    entries: HashMap<(OperationId, Severity), Vec<Diagnostic>>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, severity: Severity, operation: &OperationId, record: Diagnostic) {
        self.entries
            .entry((operation.clone(), severity))
            .or_default()
            .push(record);
    }

    /// Records of one channel for one operation, oldest first
    pub fn read(&self, severity: Severity, operation: &OperationId) -> &[Diagnostic] {
        self.entries
            .get(&(operation.clone(), severity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append both channels of a call's diagnostics under `operation`
    pub fn absorb(&mut self, operation: &OperationId, diagnostics: &Diagnostics) {
        for severity in [Severity::Error, Severity::Warning] {
            for record in diagnostics.channel(severity) {
                self.append(severity, operation, record.clone());
            }
        }
    }

    /// Drop everything recorded for `operation`
    pub fn clear(&mut self, operation: &OperationId) {
        self.entries.retain(|(op, _), _| op != operation);
    }

    /// Snapshot of both channels for `operation`
    pub fn diagnostics(&self, operation: &OperationId) -> Diagnostics {
        Diagnostics {
            errors: self.read(Severity::Error, operation).to_vec(),
            warnings: self.read(Severity::Warning, operation).to_vec(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|((_, severity), records)| *severity == Severity::Error && !records.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_accumulates_without_reset() {
        let op = OperationId::parse_contribution();
        let mut diagnostics = Diagnostics::new();
        diagnostics.error("first");
        diagnostics.warning("careful");

        let mut sink = DiagnosticsSink::new();
        sink.absorb(&op, &diagnostics);
        sink.absorb(&op, &diagnostics);

        let errors = sink.read(Severity::Error, &op);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "first");
        assert_eq!(sink.read(Severity::Warning, &op).len(), 2);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_sink_keys_by_operation() {
        let parse = OperationId::parse_contribution();
        let upgrade = OperationId::upgrade_contribution();

        let mut sink = DiagnosticsSink::new();
        sink.append(Severity::Warning, &parse, Diagnostic::new("empty"));
        sink.append(Severity::Error, &upgrade, Diagnostic::new("bad version"));

        assert_eq!(sink.read(Severity::Warning, &parse).len(), 1);
        assert!(sink.read(Severity::Error, &parse).is_empty());
        assert_eq!(sink.read(Severity::Error, &upgrade)[0].message, "bad version");

        sink.clear(&upgrade);
        assert!(sink.read(Severity::Error, &upgrade).is_empty());
        assert_eq!(sink.read(Severity::Warning, &parse).len(), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_diagnostics_serialize_as_messages() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("No data values were found in table \"sites\".");
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(
            json["warnings"][0]["message"],
            "No data values were found in table \"sites\"."
        );
        assert_eq!(json["errors"], serde_json::json!([]));
    }
}
