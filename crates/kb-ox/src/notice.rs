use serde::Serialize;

use crate::error::KnowledgeBaseError;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A short user-facing message produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Notice for a failed question.
    pub fn for_question_error(error: &KnowledgeBaseError) -> Self {
        match error.severity() {
            Severity::Warning => Self::warning(error.message()),
            _ => Self::error(format!("failed to get answer: {}", error.message())),
        }
    }

    /// Notice for the outcome of a delete.
    pub fn for_delete(name: &str, result: &Result<(), KnowledgeBaseError>) -> Self {
        match result {
            Ok(()) => Self::success(format!("document \"{name}\" deleted")),
            Err(e) => Self::error(format!("delete failed: {}", e.message())),
        }
    }
}

impl From<&KnowledgeBaseError> for Notice {
    fn from(error: &KnowledgeBaseError) -> Self {
        Self::new(error.severity(), error.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_displays_snake_case() {
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn empty_question_is_a_warning_notice() {
        let notice = Notice::for_question_error(&KnowledgeBaseError::EmptyQuestion);
        assert_eq!(notice.severity, Severity::Warning);
    }

    #[test]
    fn rejected_question_keeps_backend_text() {
        let notice =
            Notice::for_question_error(&KnowledgeBaseError::QuestionRejected("model offline".into()));
        assert_eq!(notice, Notice::error("failed to get answer: model offline"));
    }

    #[test]
    fn delete_notices() {
        assert_eq!(
            Notice::for_delete("a.txt", &Ok(())),
            Notice::success("document \"a.txt\" deleted")
        );
        let failed = Err(KnowledgeBaseError::DeleteRejected("not found".into()));
        assert_eq!(
            Notice::for_delete("a.txt", &failed),
            Notice::error("delete failed: not found")
        );
    }
}
