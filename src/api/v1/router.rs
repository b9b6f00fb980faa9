use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let token = warp::path("token")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::create_access_token);

    let token_refresh = warp::path!("token" / "refresh")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh_token);

    let user_ping = warp::path!("user" / "ping")
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::user_ping);

    let admin_ping = warp::path!("admin" / "ping")
        .and(warp::get())
        .and(with_api_key(server.auth_service.clone()))
        .and_then(handler::admin_ping);

    login
        .or(token)
        .or(token_refresh)
        .or(user_ping)
        .or(admin_ping)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// The token from `Authorization: Bearer <token>`. A missing header or scheme
/// is rejected the same way as a bad token.
fn bearer() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str()).and_then(
        |header: Option<String>| async move {
            header
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))
        },
    )
}

/// Gate for app users: passes on the id of the user the access token belongs to.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    bearer().and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            let user_id = auth_service
                .verify_token(&token)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)?;
            Ok::<_, warp::Rejection>(user_id)
        }
    })
}

/// Gate for the management dashboard.
fn with_api_key(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (ApiKeyRecord,), Error = warp::Rejection> + Clone {
    bearer().and_then(move |key: String| {
        let auth_service = auth_service.clone();
        async move {
            let record = auth_service
                .verify_api_key(&key)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)?;
            Ok::<_, warp::Rejection>(record)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::recover_error;
    use crate::infra_memory::*;
    use serde_json::{Value, json};
    use warp::http::StatusCode;

    struct Harness {
        fixture: MemoryAuthFixture,
        server: Arc<Server>,
        user_id: UserId,
    }

    fn harness(rotation: RotationPolicy) -> Harness {
        let fixture = MemoryAuthFixture::new(rotation);
        let user_id = fixture.users.add(2001, 37);
        let server = Arc::new(Server::new(fixture.auth.clone()));
        Harness {
            fixture,
            server,
            user_id,
        }
    }

    impl Harness {
        async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
            let res = warp::test::request()
                .method("POST")
                .path(path)
                .json(&body)
                .reply(&routes(self.server.clone()).recover(recover_error))
                .await;
            (res.status(), serde_json::from_slice(res.body()).unwrap())
        }

        async fn get(&self, path: &str, authorization: Option<&str>) -> (StatusCode, Value) {
            let mut req = warp::test::request().method("GET").path(path);
            if let Some(value) = authorization {
                req = req.header("authorization", value);
            }
            let res = req
                .reply(&routes(self.server.clone()).recover(recover_error))
                .await;
            (res.status(), serde_json::from_slice(res.body()).unwrap())
        }

        async fn login(&self) -> String {
            let (status, body) = self
                .post("/login", json!({ "tsaId": 2001, "schoolCode": 37 }))
                .await;
            assert_eq!(status, StatusCode::OK);
            body["data"]["refreshToken"].as_str().unwrap().to_string()
        }

        async fn access_token(&self, refresh_token: &str) -> String {
            let (status, body) = self
                .post(
                    "/token",
                    json!({ "userId": self.user_id, "refreshToken": refresh_token }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["data"]["token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn login_then_ping_with_access_token() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let access = h.access_token(&refresh).await;

        let (status, body) = h
            .get("/user/ping", Some(&format!("Bearer {}", access)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "pong");
        assert_eq!(body["data"]["userId"], json!(h.user_id));
    }

    #[tokio::test]
    async fn legacy_string_ids_can_log_in() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, body) = h
            .post("/login", json!({ "tsaId": "2001", "schoolCode": " 37" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["userId"], json!(h.user_id));
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_bad_request() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, body) = h
            .post("/login", json!({ "tsaId": "abc", "schoolCode": 37 }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "InvalidRequest");
    }

    #[tokio::test]
    async fn unknown_member_is_unauthorized() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, body) = h
            .post("/login", json!({ "tsaId": 9999, "schoolCode": 37 }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "InvalidCredentials");
    }

    #[tokio::test]
    async fn ping_without_header_is_unauthorized() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, body) = h.get("/user/ping", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "InvalidToken");
    }

    #[tokio::test]
    async fn token_without_bearer_scheme_is_unauthorized() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let access = h.access_token(&refresh).await;
        let (status, _) = h.get("/user/ping", Some(&access)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_and_forged_tokens_look_the_same() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let access = h.access_token(&refresh).await;

        let (forged_status, forged) = h
            .get("/user/ping", Some(&format!("Bearer {}x", access)))
            .await;

        h.fixture.clock.advance(chrono::Duration::minutes(16));
        let (expired_status, expired) = h
            .get("/user/ping", Some(&format!("Bearer {}", access)))
            .await;

        assert_eq!(forged_status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired_status, StatusCode::UNAUTHORIZED);
        assert_eq!(forged, expired);
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_access_token() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let (status, _) = h
            .get("/user/ping", Some(&format!("Bearer {}", refresh)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_request_for_another_user_is_unauthorized() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let other = UserId(uuid::Uuid::new_v4());
        let (status, _) = h
            .post(
                "/token",
                json!({ "userId": other, "refreshToken": refresh }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_user_id_fails_like_a_mismatch() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let other = UserId(uuid::Uuid::new_v4());

        let (malformed_status, malformed) = h
            .post(
                "/token",
                json!({ "userId": "not-a-uuid", "refreshToken": refresh }),
            )
            .await;
        let (mismatch_status, mismatch) = h
            .post("/token", json!({ "userId": other, "refreshToken": refresh }))
            .await;

        assert_eq!(malformed_status, StatusCode::UNAUTHORIZED);
        assert_eq!(malformed, mismatch);
        assert_eq!(mismatch_status, StatusCode::UNAUTHORIZED);

        let (status, body) = h
            .post(
                "/token/refresh",
                json!({ "userId": 42, "refreshToken": refresh }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "InvalidRequest");
    }

    #[tokio::test]
    async fn rotation_returns_both_tokens() {
        let h = harness(RotationPolicy::InvalidateOnRotate);
        let refresh = h.login().await;

        let (status, body) = h
            .post(
                "/token/refresh",
                json!({ "userId": h.user_id, "refreshToken": refresh }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["data"]["token"].as_str().unwrap();
        let rotated = body["data"]["refreshToken"].as_str().unwrap();
        assert_ne!(rotated, refresh);
        assert!(body["data"]["tokenExpiration"].is_string());

        let (status, _) = h
            .get("/user/ping", Some(&format!("Bearer {}", access)))
            .await;
        assert_eq!(status, StatusCode::OK);

        // The presented refresh token was retired by the rotation.
        let (status, _) = h
            .post(
                "/token/refresh",
                json!({ "userId": h.user_id, "refreshToken": refresh }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_ping_requires_a_known_api_key() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, _) = h
            .get("/admin/ping", Some(&format!("Bearer {}", TEST_API_KEY)))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = h.get("/admin/ping", Some("Bearer guessed")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_token_does_not_open_admin_routes() {
        let h = harness(RotationPolicy::AllowOverlap);
        let refresh = h.login().await;
        let access = h.access_token(&refresh).await;
        let (status, _) = h
            .get("/admin/ping", Some(&format!("Bearer {}", access)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let h = harness(RotationPolicy::AllowOverlap);
        let (status, body) = h.get("/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NotFound");
    }
}
