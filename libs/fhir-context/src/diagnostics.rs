//! Non-fatal findings collected while loading, building and transforming.

use std::fmt;

/// Where in the pipeline a diagnostic was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// A definition or input document could not be read or parsed
    Load,
    /// An instance element did not match its definition
    Build,
    /// A mapping rule could not be executed
    Transform,
    /// The remote comparison run did not produce a result
    ComparisonUnavailable,
}

impl DiagnosticCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCategory::Load => "load",
            DiagnosticCategory::Build => "build",
            DiagnosticCategory::Transform => "transform",
            DiagnosticCategory::ComparisonUnavailable => "comparison-unavailable",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem, with the file, rule or element path it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        category: DiagnosticCategory,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn load(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Load, location, message)
    }

    pub fn build(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Build, location, message)
    }

    pub fn transform(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Transform, location, message)
    }

    pub fn comparison_unavailable(
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(DiagnosticCategory::ComparisonUnavailable, location, message)
    }

    /// Emit through `tracing` at warn level
    pub fn emit(&self) {
        tracing::warn!(
            category = %self.category,
            location = %self.location,
            "{}",
            self.message
        );
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.location, self.message)
    }
}
