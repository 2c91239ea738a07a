use super::error::*;
use super::handler;
use super::handler::PostListQuery;
use crate::application_port::TokenService;
use crate::domain_model::*;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let refresh = warp::post()
        .and(warp::path!("jwt" / "refresh"))
        .and(json_body())
        .and(with(server.token_service.clone()))
        .and_then(handler::refresh);

    let exchange = warp::post()
        .and(warp::path!("jwt" / "exchange"))
        .and(warp::cookie::optional(handler::REFRESH_COOKIE))
        .and(with(server.token_service.clone()))
        .and_then(handler::exchange);

    let logout = warp::post()
        .and(warp::path!("logout"))
        .and(json_body())
        .and(with(server.token_service.clone()))
        .and_then(handler::logout);

    let revoke = warp::delete()
        .and(warp::path!("sessions"))
        .and(with_verification(server.token_service.clone()))
        .and(with(server.token_service.clone()))
        .and_then(handler::revoke_sessions);

    let refresh_ttl_secs = server.refresh_ttl_secs;
    let social = warp::post()
        .and(warp::path!("social" / SocialProvider / "complete"))
        .and(json_body())
        .and(with(server.social_login_service.clone()))
        .and(warp::any().map(move || refresh_ttl_secs))
        .and_then(handler::complete_social_login);

    let list_posts = warp::get()
        .and(warp::path!("posts"))
        .and(warp::query::<PostListQuery>())
        .and(with(server.view_service.clone()))
        .and_then(handler::list_posts);

    let post_detail = warp::get()
        .and(warp::path!("posts" / i64))
        .and(with(server.view_service.clone()))
        .and_then(handler::post_detail);

    refresh
        .or(exchange)
        .or(logout)
        .or(revoke)
        .or(social)
        .or(list_posts)
        .or(post_detail)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T: DeserializeOwned + Send>()
-> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_verification(
    token_service: Arc<dyn TokenService>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_service = token_service.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let principal = token_service
                    .verify_access(token)
                    .map_err(ApiErrorCode::from_access)
                    .map_err(reject::custom)?;
                Ok(principal)
            } else {
                Err(reject::custom(ApiErrorCode::InvalidToken))
            }
        }
    })
}
