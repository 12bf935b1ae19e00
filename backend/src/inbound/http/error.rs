//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const MALFORMED_JSON: &str =
    "Could not parse your JSON data. Please make sure it is formatted correctly.";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::NotRoutable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::ServiceUnavailable | ErrorCode::AdmissionTimeout => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorCode::ReconciliationFailed | ErrorCode::Misconfigured | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn redact_if_fatal(error: &Error) -> Error {
    if error.is_fatal() {
        error!(code = ?error.code(), message = error.message(), "request failed");
        Error::new(error.code(), "Internal server error")
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(redact_if_fatal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

/// JSON extractor configuration reporting unreadable bodies as
/// `invalid_request` domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "rejected unreadable JSON body");
        Error::invalid_request(MALFORMED_JSON).into()
    })
}
