use thiserror::Error;

/// Hard failures. User-input problems (empty text, empty quiz) are not
/// errors; they come back as messages in `SessionOutcome`.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("unknown difficulty level '{0}' (expected easy, medium or hard)")]
    InvalidDifficulty(String),

    #[error("topic '{topic}' has {available} questions but {requested} were requested")]
    SampleTooLarge {
        topic: String,
        requested: usize,
        available: usize,
    },

    #[error("unknown question type '{0}'")]
    InvalidQuestionType(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_too_large_message() {
        let err = QuizError::SampleTooLarge {
            topic: "Topic 1: NLP".to_string(),
            requested: 10,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Topic 1: NLP"));
        assert!(msg.contains("10"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::other("Disk full");
        let err: QuizError = io.into();
        assert_eq!(err.to_string(), "Disk full");
    }
}
