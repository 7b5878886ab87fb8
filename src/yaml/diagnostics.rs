//! YAML error diagnostics
//!
//! Session files are edited by hand, so parse failures need to point at the
//! offending line with context rather than dump a bare serde message.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors from reading an entity file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parse failure with the source attached for rendering
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(bdt::yaml::parse),
    help("check indentation and field names against a working session file")
)]
pub struct YamlSyntaxError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("problem is here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err.location().and_then(|loc| {
            if content.is_empty() {
                return None;
            }
            let at = loc.index().min(content.len() - 1);
            Some(SourceSpan::from(at..at + 1))
        });

        Self {
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}
