use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    /// A required top-level field is missing or has the wrong shape.
    /// Always fatal; the message names the offending field.
    #[error("{message}")]
    Structural {
        field: &'static str,
        message: String,
    },
    /// A single card failed a required-field check. Fatal for that card;
    /// list-conversion contexts exclude the card instead of aborting.
    #[error("card '{card_id}': {message}")]
    Card {
        card_id: String,
        field: &'static str,
        message: String,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
