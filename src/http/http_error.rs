use super::run_payload::InvalidRun;
use crate::database::DuplicateRun;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use core::fmt;
use log::error;
use std::error::Error;

#[derive(Debug)]
pub enum HttpError {
    GenericError(StatusCode),
    InvalidRun(InvalidRun),
    Conflict(DuplicateRun),
    Internal(anyhow::Error),
}

impl HttpError {
    pub fn from_status_code(status_code: StatusCode) -> Self {
        Self::GenericError(status_code)
    }

    fn reason(&self) -> String {
        match self {
            Self::InvalidRun(err) => err.to_string(),
            Self::Conflict(err) => err.to_string(),
            _ => self
                .status_code()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_owned(),
        }
    }
}

impl From<InvalidRun> for HttpError {
    fn from(err: InvalidRun) -> Self {
        Self::InvalidRun(err)
    }
}

// Store failures are opaque to clients except for id collisions
impl From<anyhow::Error> for HttpError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DuplicateRun>() {
            Ok(duplicate) => Self::Conflict(duplicate),
            Err(err) => Self::Internal(err),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status_code().as_str(), self.reason())
    }
}

impl Error for HttpError {}

impl ResponseError for HttpError {
    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(err) = self {
            error!("Failed to handle request\n{err:?}");
        }
        HttpResponse::build(self.status_code()).body(self.reason())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::GenericError(status_code) => *status_code,
            Self::InvalidRun(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
