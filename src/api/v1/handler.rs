use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::{self, reject};

pub const REFRESH_COOKIE: &str = "refreshToken";

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

fn refresh_cookie(token: &RefreshToken, max_age_secs: u64) -> String {
    format!(
        "{REFRESH_COOKIE}={}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax",
        token.as_str()
    )
}

fn clear_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = token_service
        .rotate(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&pair))
}

/// Trade the cookie set by social login for a token pair. The cookie is
/// single-use and cleared on success.
pub async fn exchange(
    cookie: Option<String>,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = cookie
        .filter(|value| !value.is_empty())
        .ok_or(ApiErrorCode::RefreshTokenNotFound)
        .map_err(reject::custom)?;

    let pair = token_service
        .rotate(&presented)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_header(
        warp::reply::json(&pair),
        SET_COOKIE,
        clear_refresh_cookie(),
    ))
}

pub async fn logout(
    body: RefreshRequest,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    token_service
        .logout(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(())))
}

pub async fn revoke_sessions(
    principal: Principal,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    token_service
        .revoke(principal.identity)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(())))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SocialLoginResponse {
    identity: Identity,
}

/// Called by the OAuth gateway once the provider handshake succeeded.
pub async fn complete_social_login(
    provider: SocialProvider,
    attributes: serde_json::Value,
    social_login_service: Arc<dyn SocialLoginService>,
    refresh_ttl_secs: u64,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = social_login_service
        .complete(provider, &attributes)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_header(
        warp::reply::json(&ApiResponse::ok(SocialLoginResponse {
            identity: result.identity,
        })),
        SET_COOKIE,
        refresh_cookie(&result.refresh_token, refresh_ttl_secs),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub size: Option<u16>,
    pub order: Option<ListingOrder>,
}

pub async fn list_posts(
    query: PostListQuery,
    view_service: Arc<dyn ViewService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.size.unwrap_or(defaults.size),
    );
    let slice = view_service
        .list(query.order.unwrap_or_default(), page)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(slice)))
}

pub async fn post_detail(
    id: i64,
    view_service: Arc<dyn ViewService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let view = view_service
        .detail(ItemId(id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(view)))
}
