use crate::controller::{
    health_check_controller, home_controller, medication_controller, patient_controller,
    user_controller, user_session_controller,
};
use crate::middleware::{
    auth::require_auth,
    csrf::verify_csrf,
    identity::resolve_identity,
    logging::log_request,
    ownership::verify_ownership,
    recover::handle_panic,
    security_headers::security_headers,
    session_lock::{serialize_session, SessionLocks},
};
use crate::{session, AppState};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use axum_login::AuthManagerLayerBuilder;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir};
use tower_sessions::SessionStore;

/// Assembles every route behind the shared middleware stack.
///
/// Requests pass, outermost first, through panic recovery, request logging,
/// security headers, the per-session lock, the session and authentication
/// managers, identity resolution and the anti-forgery check before reaching
/// the per-route gates.
pub fn define_routes<S>(app_state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = session::session_layer(store, app_state.config());
    let auth_layer =
        AuthManagerLayerBuilder::new(app_state.backend.clone(), session_layer).build();

    Router::new()
        .merge(health_routes())
        .merge(home_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(patient_routes(app_state.clone()))
        .merge(medication_routes(app_state))
        .merge(static_routes())
        .layer(from_fn(verify_csrf))
        .layer(from_fn(resolve_identity))
        .layer(auth_layer)
        .layer(from_fn_with_state(SessionLocks::default(), serialize_session))
        .layer(from_fn(security_headers))
        .layer(from_fn(log_request))
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn home_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home_controller::index))
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users/signup",
            get(user_controller::new).post(user_controller::create),
        )
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users/login",
            get(user_session_controller::new).post(user_session_controller::create),
        )
        .merge(
            // POST /users/logout
            Router::new()
                .route("/users/logout", post(user_session_controller::delete))
                .route_layer(from_fn(require_auth)),
        )
        .with_state(app_state)
}

fn patient_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/patients", get(patient_controller::index))
        .route(
            "/patients/create",
            get(patient_controller::new).post(patient_controller::create),
        )
        .route("/patients/search", post(patient_controller::search))
        .route(
            "/patients/medication/{name}",
            get(patient_controller::by_medication),
        )
        .route("/patients/{id}", get(patient_controller::read))
        .merge(
            // Mutations of an existing patient carry its owner's user_id
            Router::new()
                .route("/patients/{id}", post(patient_controller::update))
                .route("/patients/delete", post(patient_controller::delete))
                .route_layer(from_fn(verify_ownership)),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn medication_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/medications",
            get(medication_controller::index).post(medication_controller::create),
        )
        .merge(
            // POST /medications/delete
            Router::new()
                .route("/medications/delete", post(medication_controller::delete))
                .route_layer(from_fn(verify_ownership)),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn static_routes() -> Router {
    Router::new().nest_service("/static", ServeDir::new("static"))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::middleware::auth::LOGIN_PATH;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, request::Builder, Request, StatusCode},
        response::Response,
    };
    use domain::error::Error as DomainError;
    use domain::{medications, patients, users, Identity, UserDirectory};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use service::config::Config;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    const PASSWORD: &str = "abc12345";

    /// Only user 1 is registered.
    struct SingleUser;

    #[async_trait]
    impl UserDirectory for SingleUser {
        async fn exists(&self, identity: Identity) -> Result<bool, DomainError> {
            Ok(identity == Identity(1))
        }
    }

    /// Sends requests the way a browser would, replaying the last session cookie.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        fn new(db: &Arc<DatabaseConnection>) -> Self {
            let service_state = service::AppState::new(Config::default(), db);
            let app_state = AppState::new(service_state).with_user_directory(Arc::new(SingleUser));

            Browser {
                app: define_routes(app_state, MemoryStore::default()),
                cookie: None,
            }
        }

        async fn send(&mut self, mut request: Builder, body: Body) -> Response {
            if let Some(cookie) = &self.cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let response = self
                .app
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();

            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_owned());
            }
            response
        }

        async fn get(&mut self, uri: &str) -> Response {
            self.send(Request::builder().uri(uri), Body::empty()).await
        }

        async fn post(&mut self, uri: &str, form: String) -> Response {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            self.send(request, Body::from(form)).await
        }

        /// Signs in as user 1 and returns the session's anti-forgery token.
        async fn log_in(&mut self) -> (Response, String) {
            let page = text(self.get(LOGIN_PATH).await).await;
            let token = csrf_token(&page);

            let response = self
                .post(
                    LOGIN_PATH,
                    format!("email=maria%40example.com&password={PASSWORD}&csrf_token={token}"),
                )
                .await;
            (response, token)
        }
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn csrf_token(page: &str) -> String {
        let marker = r#"name="csrf_token" value=""#;
        let start = page.find(marker).unwrap() + marker.len();
        page[start..].split('"').next().unwrap().to_owned()
    }

    fn user_one() -> users::Model {
        users::Model {
            id: 1,
            name: "Maria".to_owned(),
            email: "maria@example.com".to_owned(),
            hashed_password: password_auth::generate_hash(PASSWORD),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn aspirin() -> medications::Model {
        medications::Model {
            name: "Aspirin".to_owned(),
            user_id: 1,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn count_row(count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::from(count))])
    }

    #[tokio::test]
    async fn login_signs_in_and_flashes_exactly_once() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_one()]])
                .append_query_results([Vec::<patients::Model>::new(), Vec::new()])
                .into_connection(),
        );
        let mut browser = Browser::new(&db);

        let (response, _) = browser.log_in().await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let first = text(browser.get("/").await).await;
        assert!(first.contains("Logged in successfully!"));
        assert!(first.contains("/users/logout"));

        let second = text(browser.get("/").await).await;
        assert!(!second.contains("Logged in successfully!"));
        assert!(second.contains("Latest patients"));
    }

    #[tokio::test]
    async fn wrong_password_is_sent_back_to_login() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_one()]])
                .into_connection(),
        );
        let mut browser = Browser::new(&db);
        let token = csrf_token(&text(browser.get(LOGIN_PATH).await).await);

        let response = browser
            .post(
                LOGIN_PATH,
                format!("email=maria%40example.com&password=wrong1234&csrf_token={token}"),
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
        let page = text(browser.get(LOGIN_PATH).await).await;
        assert!(page.contains("Invalid email address or password."));
        assert!(page.contains("alert alert-danger"));
    }

    #[tokio::test]
    async fn anonymous_requests_to_gated_pages_go_to_login() {
        let mut browser = Browser::new(&Arc::new(DatabaseConnection::Disconnected));

        for uri in ["/patients", "/patients/create", "/patients/4", "/medications"] {
            let response = browser.get(uri).await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
            assert!(response.headers().get(header::SET_COOKIE).is_none());
        }
    }

    #[tokio::test]
    async fn posts_without_the_session_token_are_forbidden() {
        let mut browser = Browser::new(&Arc::new(DatabaseConnection::Disconnected));
        browser.get(LOGIN_PATH).await;

        let response = browser
            .post(LOGIN_PATH, "email=maria%40example.com&password=x".to_owned())
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deleting_a_referenced_medication_only_warns() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_one()]])
                .append_query_results([Vec::<patients::Model>::new()])
                .append_query_results([[count_row(2)]])
                .append_query_results([[aspirin()]])
                .into_connection(),
        );
        let mut browser = Browser::new(&db);
        let (_, token) = browser.log_in().await;
        // Pops the login flash.
        browser.get("/").await;

        let response = browser
            .post(
                "/medications/delete",
                format!("name=Aspirin&user_id=1&csrf_token={token}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/medications");

        let page = text(browser.get("/medications").await).await;
        assert!(page.contains("Medication cannot be deleted due to registered patients."));
        assert!(page.contains("alert alert-warning"));

        drop(browser);
        let log = Arc::try_unwrap(db)
            .ok()
            .unwrap()
            .into_transaction_log();
        assert!(log.iter().all(|t| !format!("{t:?}").contains("DELETE")));
    }

    #[tokio::test]
    async fn someone_elses_record_is_refused_before_the_handler() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_one()]])
                .append_query_results([Vec::<patients::Model>::new(), Vec::new()])
                .into_connection(),
        );
        let mut browser = Browser::new(&db);
        let (_, token) = browser.log_in().await;
        // Pops the login flash.
        browser.get("/").await;

        let response = browser
            .post(
                "/patients/delete",
                format!("id=4&user_id=2&csrf_token={token}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let page = text(browser.get("/").await).await;
        assert!(page.contains("Unauthorized action!"));
        assert!(page.contains("alert alert-danger"));
    }

    #[tokio::test]
    async fn logout_signs_the_session_out() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_one()]])
                .append_query_results([Vec::<patients::Model>::new()])
                .into_connection(),
        );
        let mut browser = Browser::new(&db);
        let (_, token) = browser.log_in().await;
        // Pops the login flash.
        browser.get("/").await;

        let response = browser
            .post("/users/logout", format!("csrf_token={token}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let page = text(browser.get("/").await).await;
        assert!(page.contains("Logged out successfully!"));
        assert!(!page.contains("/users/logout"));

        let response = browser.get("/patients").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[tokio::test]
    async fn every_response_carries_the_security_headers() {
        let mut browser = Browser::new(&Arc::new(DatabaseConnection::Disconnected));

        let response = browser.get("/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "deny");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
    }
}
