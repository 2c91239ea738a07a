use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        *code
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        warn!("Rejected request body: {}", e);
        ApiErrorCode::InvalidRequest
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        ApiErrorCode::InvalidRequest
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        ApiErrorCode::InvalidToken
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        error!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code, code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Refresh token is missing")]
    RefreshTokenNotFound,
    #[error("Refresh token is not valid")]
    InvalidRefreshToken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Unsupported login provider or profile")]
    InvalidSocialProfile,
    #[error("Post not found")]
    PostNotFound,
    #[error("Malformed request")]
    InvalidRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn unavailable<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Backend unavailable: {}", error);
        ApiErrorCode::ServiceUnavailable
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::RefreshTokenNotFound
            | ApiErrorCode::InvalidRefreshToken
            | ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidSocialProfile | ApiErrorCode::InvalidRequest => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::PostNotFound | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Access tokens presented as `Authorization: Bearer`.
    pub fn from_access(error: AuthError) -> ApiErrorCode {
        if error.is_rejection() {
            ApiErrorCode::InvalidToken
        } else {
            ApiErrorCode::from(error)
        }
    }
}

impl reject::Reject for ApiErrorCode {}

/// Refresh-token failures. The four rejections collapse into one code so a
/// caller cannot tell which check failed.
impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::TokenNotFound
            | AuthError::TokenMismatch => ApiErrorCode::InvalidRefreshToken,
            AuthError::InfrastructureUnavailable(e) => ApiErrorCode::unavailable(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<ViewError> for ApiErrorCode {
    fn from(error: ViewError) -> Self {
        match error {
            ViewError::ItemNotFound(_) => ApiErrorCode::PostNotFound,
            ViewError::InfrastructureUnavailable(e) => ApiErrorCode::unavailable(e),
            ViewError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<SocialLoginError> for ApiErrorCode {
    fn from(error: SocialLoginError) -> Self {
        match error {
            SocialLoginError::Profile(e) => {
                warn!("Rejected social profile: {}", e);
                ApiErrorCode::InvalidSocialProfile
            }
            SocialLoginError::Auth(e) => ApiErrorCode::from(e),
            SocialLoginError::Store(e) => ApiErrorCode::from(AuthError::from(e)),
        }
    }
}
