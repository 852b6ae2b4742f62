use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use anyhow;
use serde_json::json;

use zakupy::{TrackerError, ValidationError};

pub(crate) enum ServerError{
    BadRequest(String),
    /// `message` goes to the client, the error itself only to the log
    InternalError { message: &'static str, source: anyhow::Error }
}

impl ServerError {
    /// Maps a tracker failure, using `message` if it turns out to be a storage problem.
    pub(crate) fn tracker(message: &'static str) -> impl FnOnce(TrackerError) -> ServerError {
        move |err| match err {
            TrackerError::Validation(err) => err.into(),
            TrackerError::Storage(err) => Self::InternalError { message, source: err.into() },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) =>
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response(),
            Self::InternalError { message, source } => {
                log::error!("{}: {:#}", message, source);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
