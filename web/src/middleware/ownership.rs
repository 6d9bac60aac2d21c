use crate::error::{Error, Result as WebResult};
use crate::extractors::AuthenticatedUser;
use crate::flash::{self, Severity};
use crate::form::{codec, DecodeError};
use crate::middleware::{buffer, rebuild, referer_path};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use domain::Id;
use log::*;
use tower_sessions::Session;

pub const OWNER_FIELD: &str = "user_id";

/// Ownership gate for mutations of owned records.
///
/// The form's `user_id` must name the signed-in user. A mismatch is answered
/// with a danger flash and a redirect back, and the handler never runs.
pub async fn verify_ownership(
    session: Session,
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> WebResult<Response> {
    let (parts, bytes) = buffer(request).await?;

    let owner: Id = codec::first_value(&bytes, OWNER_FIELD)
        .ok_or_else(|| DecodeError(format!("missing {OWNER_FIELD}")))?
        .parse()
        .map_err(|_| Error::Decode(DecodeError(format!("unparsable {OWNER_FIELD}"))))?;

    if owner != identity.id() {
        warn!(
            "User {identity} attempted {} {} on a record owned by user {owner}",
            parts.method, parts.uri
        );
        flash::push(&session, "Unauthorized action!", Severity::Danger).await?;
        return Ok(Redirect::to(&referer_path(&parts.headers)).into_response());
    }

    Ok(next.run(rebuild(parts, bytes)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::identity::ResolvedIdentity;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        middleware::from_fn,
        routing::post,
        Router,
    };
    use domain::Identity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    fn app(calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/patients/delete",
                post(move |body: String| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        body
                    }
                }),
            )
            .route_layer(from_fn(verify_ownership))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
    }

    fn delete_as(identity: Identity, body: &'static str) -> Request {
        let mut request = Request::builder()
            .method("POST")
            .uri("/patients/delete")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::REFERER, "http://localhost:4000/patients/4")
            .body(Body::from(body))
            .unwrap();
        request.extensions_mut().insert(ResolvedIdentity(identity));
        request
    }

    #[tokio::test]
    async fn matching_owner_reaches_the_handler_with_the_body_intact() {
        let calls = Arc::new(AtomicUsize::new(0));

        let response = app(calls.clone())
            .oneshot(delete_as(Identity(1), "id=4&user_id=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"id=4&user_id=1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_owner_is_redirected_back_with_a_flash() {
        let calls = Arc::new(AtomicUsize::new(0));

        let response = app(calls.clone())
            .oneshot(delete_as(Identity(2), "id=4&user_id=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/patients/4");
        // The flash was queued, so the session is written back.
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_or_unparsable_owner_is_a_bad_request() {
        let calls = Arc::new(AtomicUsize::new(0));

        for body in ["id=4", "id=4&user_id=abc"] {
            let response = app(calls.clone())
                .oneshot(delete_as(Identity(1), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
