//! Request types accepted by the HTTP boundary

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest accepted question
pub const MAX_QUESTION_CHARS: usize = 1000;
/// Shortest meaningful question after whitespace normalisation
pub const MIN_QUESTION_CHARS: usize = 3;
/// Upper bound on sources per question
pub const MAX_NUM_SOURCES: usize = 10;

const DANGEROUS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "onerror=",
    "onclick=",
    "onload=",
    "<iframe",
];

/// Question about the indexed documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of sources to retrieve (1-10, default: 4)
    #[serde(default = "default_num_sources")]
    pub num_sources: usize,
}

fn default_num_sources() -> usize {
    4
}

impl QueryRequest {
    /// Create a request with the default number of sources
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            num_sources: default_num_sources(),
        }
    }

    /// Validate and normalise the request in place
    pub fn validate(mut self) -> Result<Self> {
        if self.question.chars().count() > MAX_QUESTION_CHARS {
            return Err(Error::validation(format!(
                "Question too long. Maximum {} characters.",
                MAX_QUESTION_CHARS
            )));
        }

        let question = self.question.split_whitespace().collect::<Vec<_>>().join(" ");
        if question.chars().count() < MIN_QUESTION_CHARS {
            return Err(Error::validation(format!(
                "Question too short. Minimum {} characters.",
                MIN_QUESTION_CHARS
            )));
        }

        let lower = question.to_lowercase();
        if DANGEROUS_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Err(Error::validation("Invalid characters in question"));
        }

        if !(1..=MAX_NUM_SOURCES).contains(&self.num_sources) {
            return Err(Error::validation(format!(
                "num_sources must be between 1 and {}",
                MAX_NUM_SOURCES
            )));
        }

        self.question = question;
        Ok(self)
    }
}

/// Request to remove one document from the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveFileRequest {
    /// Filename to remove (must end with .pdf)
    pub filename: String,
}

impl RemoveFileRequest {
    /// Validate the filename
    pub fn validate(self) -> Result<Self> {
        let name = &self.filename;
        if name.is_empty() || name.chars().count() > 255 {
            return Err(Error::validation("Filename must be 1-255 characters"));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(Error::validation("Invalid filename: path traversal detected"));
        }
        if name.contains('\0') {
            return Err(Error::validation("Invalid filename: null byte detected"));
        }
        if name.chars().any(|c| (c as u32) < 32 || c as u32 == 127) {
            return Err(Error::validation("Invalid filename: control characters detected"));
        }
        if !name.to_lowercase().ends_with(".pdf") {
            return Err(Error::validation("Filename must end with .pdf"));
        }
        Ok(self)
    }
}

/// Optional workspace selector on every API route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceParams {
    /// Workspace name (default: "default")
    #[serde(default)]
    pub workspace: Option<String>,
}

impl WorkspaceParams {
    /// Name of the default workspace
    pub const DEFAULT: &'static str = "default";

    /// Validated workspace name
    pub fn name(&self) -> Result<&str> {
        let name = self.workspace.as_deref().unwrap_or(Self::DEFAULT);
        let valid = !name.is_empty()
            && name.len() <= 64
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(name)
        } else {
            Err(Error::validation(
                "Workspace names use 1-64 letters, digits, '-' or '_'",
            ))
        }
    }
}
