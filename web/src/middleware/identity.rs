use axum::{extract::Request, middleware::Next, response::Response};
use domain::{user::AuthSession, Identity};
use log::*;

/// The identity of a request whose session user still exists.
///
/// Crate-private, so nothing outside this crate can forge or shadow it in the
/// request extensions.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedIdentity(pub(crate) Identity);

/// Attaches [`ResolvedIdentity`] to the request when the authentication
/// manager resolved the session to a user that still exists.
///
/// The manager looks the session's user id up in the backend on every
/// request; a session naming a deleted user comes through anonymous, and a
/// failed lookup has already failed the request.
pub async fn resolve_identity(
    auth_session: AuthSession,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = auth_session.user {
        trace!("Resolved session identity {identity}");
        request.extensions_mut().insert(ResolvedIdentity(identity));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::MaybeAuthenticated;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        extract::Path,
        http::{header, StatusCode},
        middleware::from_fn,
        routing::get,
        Router,
    };
    use axum_login::AuthManagerLayerBuilder;
    use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind};
    use domain::user::Backend;
    use domain::UserDirectory;
    use sea_orm::DatabaseConnection;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    /// Users 1 and 2 exist; everyone else has been deleted. Any lookup of 99 fails.
    struct FakeDirectory {
        lookups: Mutex<Vec<Identity>>,
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn exists(&self, identity: Identity) -> Result<bool, DomainError> {
            self.lookups.lock().unwrap().push(identity);
            if identity == Identity(99) {
                return Err(DomainError {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::StoreUnavailable),
                });
            }
            Ok(matches!(identity, Identity(1) | Identity(2)))
        }
    }

    async fn whoami(MaybeAuthenticated(identity): MaybeAuthenticated) -> String {
        identity.map_or("anonymous".to_owned(), |identity| identity.to_string())
    }

    // Signing in does not consult the directory, so any id can be stored.
    async fn sign_in_as(Path(id): Path<i32>, mut auth_session: AuthSession) -> &'static str {
        auth_session.login(&Identity(id)).await.unwrap();
        "ok"
    }

    fn app(directory: Arc<FakeDirectory>) -> Router {
        let backend = Backend::new(&Arc::new(DatabaseConnection::Disconnected))
            .with_directory(directory);
        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

        Router::new()
            .route("/whoami", get(whoami))
            .route("/sign_in/{id}", get(sign_in_as))
            .layer(from_fn(resolve_identity))
            .layer(AuthManagerLayerBuilder::new(backend, session_layer).build())
    }

    fn directory() -> Arc<FakeDirectory> {
        Arc::new(FakeDirectory {
            lookups: Mutex::new(Vec::new()),
        })
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn cookie_for(app: &Router, uri: &str) -> String {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }

    async fn whoami_with(app: &Router, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri("/whoami");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn requests_without_a_session_stay_anonymous() {
        let directory = directory();
        let app = app(directory.clone());

        let response = whoami_with(&app, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
        assert!(directory.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn an_existing_user_is_attached_to_every_request() {
        let directory = directory();
        let app = app(directory.clone());
        let cookie = cookie_for(&app, "/sign_in/1").await;

        assert_eq!(body_text(whoami_with(&app, Some(&cookie)).await).await, "1");
        assert_eq!(body_text(whoami_with(&app, Some(&cookie)).await).await, "1");

        // Looked up again on each request, never cached.
        assert_eq!(
            *directory.lookups.lock().unwrap(),
            vec![Identity(1), Identity(1)]
        );
    }

    #[tokio::test]
    async fn a_deleted_user_is_anonymous() {
        let directory = directory();
        let app = app(directory.clone());
        // User 7 is not in the directory.
        let cookie = cookie_for(&app, "/sign_in/7").await;

        let response = whoami_with(&app, Some(&cookie)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
        assert_eq!(*directory.lookups.lock().unwrap(), vec![Identity(7)]);
    }

    #[tokio::test]
    async fn directory_failures_fail_the_request() {
        let app = app(directory());
        let cookie = cookie_for(&app, "/sign_in/99").await;

        let response = whoami_with(&app, Some(&cookie)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
