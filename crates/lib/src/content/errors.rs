//! Error types for lesson content
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ContentError {
    /// The JSON could not be decoded into any lesson shape
    #[error("Malformed lesson content: {reason}")]
    Malformed { reason: String },

    /// A lesson without anything to play
    #[error("A {kind} lesson needs at least one {what}")]
    Empty {
        kind: &'static str,
        what: &'static str,
    },

    /// A story choice points at a page that does not exist
    #[error("Story choice on page {page_id} leads to unknown page {target}")]
    UnknownPage { page_id: String, target: String },

    /// A quiz question's correct answer is not among its options
    #[error("Question {question_id} has no option {answer}")]
    UnknownAnswer { question_id: String, answer: String },

    /// `min_correct` completion without a threshold
    #[error("Completion criteria {criteria} requires a value")]
    MissingCriteriaValue { criteria: &'static str },
}

impl From<ContentError> for crate::Error {
    fn from(err: ContentError) -> Self {
        crate::Error::Content(err)
    }
}
