use crate::middleware::{auth::LOGIN_PATH, identity::ResolvedIdentity};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use domain::Identity;
use std::convert::Infallible;

/// The identity resolved for this request. Anonymous requests are sent to
/// the login page.
pub(crate) struct AuthenticatedUser(pub Identity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedIdentity>()
            .map(|ResolvedIdentity(identity)| AuthenticatedUser(*identity))
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ResolvedIdentity>()
            .map(|ResolvedIdentity(identity)| AuthenticatedUser(*identity)))
    }
}

/// The identity resolved for this request, if any.
pub(crate) struct MaybeAuthenticated(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user =
            <AuthenticatedUser as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
                .await?;
        Ok(MaybeAuthenticated(user.map(|AuthenticatedUser(identity)| identity)))
    }
}
