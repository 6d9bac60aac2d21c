use crate::error::Error;
use crate::form::{self, DecodeError};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// A url-encoded form body decoded with [`form::decode`].
///
/// Rejects with `400 Bad Request`, so a handler taking it never runs on an
/// undecodable submission.
pub(crate) struct HtmlForm<T>(pub T);

impl<S, T> FromRequest<S> for HtmlForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| DecodeError(rejection.body_text()))?;

        Ok(HtmlForm(form::decode(&bytes)?))
    }
}
