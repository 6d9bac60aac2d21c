use crate::middleware::identity::ResolvedIdentity;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use log::*;

pub const LOGIN_PATH: &str = "/users/login";

/// Authentication gate: anonymous requests are sent to the login page.
///
/// Pages behind the gate are marked `no-store` so a browser never shows them
/// from its cache after logout.
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<ResolvedIdentity>().is_none() {
        debug!("Redirecting anonymous request for {} to login", request.uri());
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn,
        routing::get,
        Router,
    };
    use domain::Identity;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    async fn test_handler() -> &'static str {
        "authenticated"
    }

    fn gated() -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .route_layer(from_fn(require_auth))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
    }

    #[tokio::test]
    async fn anonymous_requests_are_redirected_to_login_without_a_session() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = gated().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn an_invalid_session_cookie_is_still_anonymous() {
        let request = Request::builder()
            .uri("/test")
            .header(header::COOKIE, "id=not-a-session")
            .body(Body::empty())
            .unwrap();
        let response = gated().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn resolved_identities_pass_and_are_marked_no_store() {
        let mut request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ResolvedIdentity(Identity(1)));

        let response = gated().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}
