//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add multiple suggestions
    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Input file does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                "TRY: Use '-' to read the contribution from stdin".to_string(),
            ])
    }

    /// File cannot be read (permission or encoding error)
    pub fn cannot_read_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Contribution files must be UTF-8 text".to_string(),
            ])
    }

    /// Output file cannot be written
    pub fn cannot_write_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot write file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions(["TRY: Check that the parent directory exists and is writable"])
    }

    /// Contribution JSON could not be decoded
    pub fn invalid_contribution(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid contribution JSON: {}", details))
            .with_context(format!("Failed to read contribution: {}", path.display()))
            .with_suggestions([
                "TRY: Every value must be a JSON string, e.g. \"1.2\" not 1.2".to_string(),
                "TRY: Produce the JSON with: magic parse FILE --json".to_string(),
            ])
    }

    /// No catalog at the resolved location
    pub fn catalog_not_found(path: &Path) -> Self {
        Self::new(format!("Schema catalog not found: {}", path.display()))
            .with_context("Upgrading needs the versioned data model definitions")
            .with_suggestions([
                "TRY: Pass the catalog explicitly: --catalog data_models.json".to_string(),
                "TRY: Set MAGIC_CATALOG or [catalog] path in config.toml".to_string(),
                format!("TRY: Place the catalog at {}", path.display()),
            ])
    }

    /// Catalog exists but is malformed
    pub fn invalid_catalog(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid schema catalog: {}", details))
            .with_context(format!("Failed to load catalog: {}", path.display()))
            .with_suggestions([
                "TRY: Expected {\"versions\": [...], \"models\": {\"<version>\": {\"tables\": {...}}}}"
                    .to_string(),
                "TRY: Every listed version needs a model and may appear only once".to_string(),
            ])
    }

    /// Requested version is not in the catalog
    pub fn unknown_version(version: &str, known: &str) -> Self {
        Self::new(format!("Unknown data model version: {}", version))
            .with_context(format!("Known versions: {}", known))
            .with_suggestions(["TRY: List versions with: magic catalog versions"])
    }

    /// Config file is malformed
    pub fn invalid_config(path: &Path, details: &str) -> Self {
        Self::new(format!("Invalid configuration: {}", details))
            .with_context(format!("Failed to read {}", path.display()))
            .with_suggestions([
                "TRY: Supported sections: [catalog] path, [upgrade] max_version, [logging] filter",
            ])
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "message": self.message,
                "context": self.context,
                "suggestions": self.suggestions,
            }
        })
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print a command failure as JSON on stdout
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => helpful.to_json(),
        None => HelpfulError::new(format!("{:#}", err)).to_json(),
    };
    println!("{}", payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While processing data")
            .with_suggestions(["Try again"]);

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While processing data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_catalog_not_found() {
        let path = PathBuf::from("/nonexistent/data_models.json");
        let err = HelpfulError::catalog_not_found(&path);

        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/data_models.json"));
        assert!(display.contains("--catalog"));
    }

    #[test]
    fn test_json_payload() {
        let err = HelpfulError::unknown_version("9.9", "\"3.0\"");
        let json = err.to_json();
        assert_eq!(json["error"]["message"], "Unknown data model version: 9.9");
        assert_eq!(json["error"]["context"], "Known versions: \"3.0\"");
    }
}
