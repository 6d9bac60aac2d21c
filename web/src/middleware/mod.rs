use crate::form::DecodeError;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{header, request::Parts, HeaderMap},
};

pub(crate) mod auth;
pub(crate) mod csrf;
pub(crate) mod identity;
pub(crate) mod logging;
pub(crate) mod ownership;
pub(crate) mod recover;
pub(crate) mod security_headers;
pub(crate) mod session_lock;

/// Largest form body any middleware buffers; matches axum's default body limit.
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// Reads the whole body so a middleware can inspect form fields. The handler
/// gets the same bytes back through [`rebuild`].
pub(crate) async fn buffer(request: Request) -> Result<(Parts, Bytes), DecodeError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| DecodeError(e.to_string()))?;
    Ok((parts, bytes))
}

pub(crate) fn rebuild(parts: Parts, bytes: Bytes) -> Request {
    Request::from_parts(parts, Body::from(bytes))
}

/// The path and query of the `Referer` header, or `/`.
///
/// Only the local part is kept, so redirecting "back" never leaves the site.
pub(crate) fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        })
        .unwrap_or_else(|| "/".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn referer_is_reduced_to_a_local_path() {
        let mut headers = HeaderMap::new();
        assert_eq!(referer_path(&headers), "/");

        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://evil.example/patients/4?tab=notes"),
        );
        assert_eq!(referer_path(&headers), "/patients/4?tab=notes");

        headers.insert(header::REFERER, HeaderValue::from_static("not a url"));
        assert_eq!(referer_path(&headers), "/");
    }
}
