use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("rejected request body: {}", e);
        ApiErrorCode::InvalidRequest
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::InvalidRequest
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        warn!("unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum ApiErrorCode {
    #[error("Invalid user credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

// Clients only ever learn that a token was not accepted. Which check failed is
// for the logs.
impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            e if e.is_rejection() => {
                debug!(reason = %e, "request not authenticated");
                ApiErrorCode::InvalidToken
            }
            e => ApiErrorCode::internal(e),
        }
    }
}
