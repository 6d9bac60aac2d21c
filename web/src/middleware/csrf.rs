//! Per-session anti-forgery token, checked on every unsafe request.
use crate::error::{Error, Result as WebResult};
use crate::form::codec;
use crate::middleware::{buffer, rebuild};
use axum::{extract::Request, middleware::Next, response::Response};
use rand::Rng;
use subtle::ConstantTimeEq;
use tower_sessions::{session, Session};

pub const CSRF_SESSION_KEY: &str = "csrf.token";
pub const CSRF_FIELD: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// The session's token, generated on first use.
pub async fn token(session: &Session) -> Result<String, session::Error> {
    if let Some(token) = session.get::<String>(CSRF_SESSION_KEY).await? {
        return Ok(token);
    }

    let token = generate_token();
    session.insert(CSRF_SESSION_KEY, &token).await?;
    Ok(token)
}

fn generate_token() -> String {
    let token: [u8; 32] = rand::thread_rng().gen();
    hex::encode(token)
}

fn tokens_match(submitted: &str, expected: &str) -> bool {
    bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}

/// Rejects unsafe requests whose `csrf_token` field (or `x-csrf-token`
/// header) does not match the session's token.
pub async fn verify_csrf(session: Session, request: Request, next: Next) -> WebResult<Response> {
    if request.method().is_safe() {
        return Ok(next.run(request).await);
    }

    let expected = session
        .get::<String>(CSRF_SESSION_KEY)
        .await?
        .ok_or(Error::Forgery)?;

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let (parts, bytes) = buffer(request).await?;
    let submitted = header_token.or_else(|| codec::first_value(&bytes, CSRF_FIELD));

    match submitted {
        Some(submitted) if tokens_match(&submitted, &expected) => {
            Ok(next.run(rebuild(parts, bytes)).await)
        }
        _ => Err(Error::Forgery),
    }
}
