//! Serialises requests that carry the same session cookie.
//!
//! The session layer loads the record when a request starts and saves it when
//! the response is produced. Two overlapping requests on one session would
//! each load the same flash queue and could both deliver its head. Holding a
//! per-cookie lock across the session layer makes load, pop and save one unit.
use crate::session::SESSION_COOKIE;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;

#[derive(Clone, Default)]
pub struct SessionLocks(Arc<DashMap<String, Arc<Mutex<()>>>>);

impl SessionLocks {
    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.0.entry(key.to_owned()).or_default())
    }

    fn release(&self, key: &str) {
        // Only the map itself still holds the lock once every waiter is done.
        self.0.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.len()
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

pub async fn serialize_session(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(&key);
    let response = {
        let _guard = lock.lock().await;
        next.run(request).await
    };
    drop(lock);
    locks.release(&key);

    response
}
