//! Error types for activity players
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    /// The activity already completed
    #[error("Activity is finished")]
    Finished,

    /// Story choice index out of range for the current page
    #[error("No choice {index} on this page")]
    InvalidChoice { index: usize },

    #[error("Unknown option: {id}")]
    UnknownOption { id: String },

    /// Confirm without a selected option
    #[error("No option selected")]
    NoSelection,

    #[error("Question already answered")]
    AlreadyAnswered,

    /// Moving on before confirming an answer
    #[error("Question not answered yet")]
    NotAnswered,

    #[error("Unknown item: {id}")]
    UnknownItem { id: String },

    #[error("Unknown zone: {id}")]
    UnknownZone { id: String },

    #[error("Item already placed: {id}")]
    AlreadyPlaced { id: String },

    /// Action sent to a player of another kind
    #[error("Expected a {expected} activity, found {actual}")]
    WrongActivity {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<ActivityError> for crate::Error {
    fn from(err: ActivityError) -> Self {
        crate::Error::Activity(err)
    }
}
