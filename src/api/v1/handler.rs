use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Older app builds send the ids as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn to_i64(&self) -> Result<i64, ApiErrorCode> {
        match self {
            NumberOrString::Number(n) => Ok(*n),
            NumberOrString::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiErrorCode::InvalidRequest),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub tsa_id: NumberOrString,
    pub school_code: NumberOrString,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub refresh_token: RefreshToken,
    pub expiration: DateTime<Utc>,
    pub user_id: UserId,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let identity = LoginIdentity {
        tsa_id: body.tsa_id.to_i64().map_err(reject::custom)?,
        school_code: body.school_code.to_i64().map_err(reject::custom)?,
    };

    let login_result = auth_service
        .login(identity)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = LoginResponse {
        refresh_token: login_result.refresh.token,
        expiration: login_result.refresh.expires_at,
        user_id: login_result.user_id,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub user_id: String,
    pub refresh_token: String,
}

impl TokenRequest {
    /// An id that cannot belong to anyone fails like a mismatched one.
    fn claimed_user(&self) -> Result<UserId, ApiErrorCode> {
        self.user_id
            .trim()
            .parse::<UserId>()
            .map_err(|_| ApiErrorCode::InvalidToken)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: AccessToken,
    pub expiration: DateTime<Utc>,
}

pub async fn create_access_token(
    body: TokenRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let claimed_user = body.claimed_user().map_err(reject::custom)?;
    let issued = auth_service
        .create_access_token(claimed_user, &body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = TokenResponse {
        token: issued.token,
        expiration: issued.expires_at,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub refresh_token: RefreshToken,
    pub expiration: DateTime<Utc>,
    pub user_id: UserId,
    pub token: AccessToken,
    pub token_expiration: DateTime<Utc>,
}

pub async fn refresh_token(
    body: TokenRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let claimed_user = body.claimed_user().map_err(reject::custom)?;
    let tokens = auth_service
        .refresh_token(claimed_user, &body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = RefreshResponse {
        refresh_token: tokens.refresh.token,
        expiration: tokens.refresh.expires_at,
        user_id: claimed_user,
        token: tokens.access.token,
        token_expiration: tokens.access.expires_at,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

pub async fn user_ping(user_id: UserId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(PingResponse {
        message: "pong",
        user_id: Some(user_id),
    })))
}

pub async fn admin_ping(api_key: ApiKeyRecord) -> Result<impl warp::Reply, warp::Rejection> {
    debug!(key_id = api_key.id, purpose = %api_key.purpose, "admin ping");
    Ok(warp::reply::json(&ApiResponse::ok(PingResponse {
        message: "pong",
        user_id: None,
    })))
}
