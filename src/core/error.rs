use thiserror::Error;

use crate::core::amount::MAX_AMOUNT;

/// Rejections of user input. Raised before anything touches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The payload is not a JSON object at all.
    #[error("payload must be a JSON object")]
    NotAnObject,
    /// A required text field is absent, not a string, or blank.
    #[error("field \"{0}\" is required")]
    MissingField(&'static str),
    /// The amount field is absent or does not read as a finite number.
    #[error("field \"{0}\" must be a number")]
    InvalidAmount(&'static str),
    /// The amount rounds to zero or below.
    #[error("field \"{0}\" must be a positive number")]
    NonPositiveAmount(&'static str),
    /// The amount exceeds [`MAX_AMOUNT`].
    #[error("field \"{0}\" must not exceed {max}", max = MAX_AMOUNT)]
    AmountTooLarge(&'static str),
    /// A date range bound is not formatted as `YYYY-MM-DD`.
    #[error("invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("date range starts ({from}) after it ends ({to})")]
    InvertedRange { from: String, to: String },
}

/// Problems decoding a record that is already stored on disk.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record is missing \"{0}\"")]
    MissingField(&'static str),
    #[error("record field \"{0}\" has an unreadable amount")]
    InvalidAmount(&'static str),
}
