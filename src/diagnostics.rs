//! Diagnostics
//!
//! Observational reports emitted while a schema is built: types added,
//! excluded or dropped, relationships omitted. A sink never affects the
//! build outcome; fatal conditions are `SchemaError`s instead.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing build events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Registry ===
    /// A type configuration was created
    TypeAdded,
    /// A type was excluded from the schema
    TypeExcluded,

    // === Reconciliation ===
    /// Explicitly configured type never referenced by any property
    UnusedTypeRemoved,
    /// Referenced type with no explicit configuration received a default one
    ImplicitTypeAdded,

    // === Objects ===
    /// Relationship dropped because either end is not a resource type
    RelationshipOmitted,
    /// Property ignored by configuration
    PropertyIgnored,
    /// Property kept, but its target type is excluded or was never realized
    DanglingTarget,
    /// Two types of the same kind share a display name
    DuplicateTypeName,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeAdded => "I001",
            Self::TypeExcluded => "I002",
            Self::UnusedTypeRemoved => "I003",
            Self::ImplicitTypeAdded => "I004",
            Self::PropertyIgnored => "I005",
            Self::RelationshipOmitted => "W001",
            Self::DuplicateTypeName => "W002",
            Self::DanglingTarget => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::TypeAdded
            | Self::TypeExcluded
            | Self::UnusedTypeRemoved
            | Self::ImplicitTypeAdded
            | Self::PropertyIgnored => Severity::Info,

            Self::RelationshipOmitted | Self::DuplicateTypeName | Self::DanglingTarget => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Entity the report is about (type key, or `Type.member`)
    pub subject: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (related types, precedence levels)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |d| d.code == code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|d| d.severity() == Severity::Warning)
    }

    /// Summary line: "N warnings, M info"
    pub fn summary(&self) -> String {
        let warnings = self.warnings().count();
        let info = self.items.len() - warnings;
        format!("{} warnings, {} info", warnings, info)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of build diagnostics, injected into the schema builder
pub trait DiagnosticsSink {
    fn report(&self, item: DiagnosticItem);
}

/// Forwards every diagnostic to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Info => tracing::debug!(
                code = %item.code,
                subject = %item.subject,
                context = ?item.context,
                "{}",
                item.message
            ),
            Severity::Warning => tracing::warn!(
                code = %item.code,
                subject = %item.subject,
                context = ?item.context,
                "{}",
                item.message
            ),
        }
    }
}

/// A pair of sinks receives every diagnostic twice, first then second
impl<A: DiagnosticsSink, B: DiagnosticsSink> DiagnosticsSink for (A, B) {
    fn report(&self, item: DiagnosticItem) {
        self.0.report(item.clone());
        self.1.report(item);
    }
}

/// Keeps every diagnostic in memory. Clones share the same collection, so a
/// caller can keep one handle and give another to the builder.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    collected: Rc<RefCell<Diagnostics>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Diagnostics {
        self.collected.borrow().clone()
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.collected.borrow().with_code(code).count()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&self, item: DiagnosticItem) {
        self.collected.borrow_mut().push(item);
    }
}
