use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use domain::user::Backend;
use log::*;

use crate::form::DecodeError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Domain(DomainError),
    Decode(DecodeError),
    Session(tower_sessions::session::Error),
    Render(handlebars::RenderError),
    /// Missing or mismatched anti-forgery token.
    Forgery,
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Domain(err) => Some(err),
            Error::Decode(err) => Some(err),
            Error::Session(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Forgery => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn server_error(err: &dyn StdError) -> Response {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    error!("{chain}");

    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Decode(err) => {
                debug!("Rejecting undecodable form: {err}");
                (StatusCode::BAD_REQUEST, "Bad Request").into_response()
            }
            Error::Forgery => {
                warn!("Rejecting request with a missing or invalid anti-forgery token");
                (StatusCode::FORBIDDEN, "Forbidden").into_response()
            }
            Error::Session(ref err) => server_error(err),
            Error::Render(ref err) => server_error(err),
            Error::Domain(ref err) => match &err.error_kind {
                DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)) => {
                    match entity_error_kind {
                        EntityErrorKind::NotFound => {
                            (StatusCode::NOT_FOUND, "Not Found").into_response()
                        }
                        EntityErrorKind::Unauthenticated => {
                            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
                        }
                        EntityErrorKind::Unauthorized => {
                            (StatusCode::FORBIDDEN, "Forbidden").into_response()
                        }
                        EntityErrorKind::ExistingDependency | EntityErrorKind::Duplicate => {
                            (StatusCode::CONFLICT, "Conflict").into_response()
                        }
                        EntityErrorKind::Other(_) => server_error(err),
                    }
                }
                DomainErrorKind::External(ExternalErrorKind::StoreUnavailable) => server_error(err),
            },
        }
    }
}

impl From<DomainError> for Error {
    fn from(err: DomainError) -> Self {
        Error::Domain(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<axum_login::Error<Backend>> for Error {
    fn from(err: axum_login::Error<Backend>) -> Self {
        match err {
            axum_login::Error::Session(err) => Error::Session(err),
            axum_login::Error::Backend(err) => Error::Domain(err),
        }
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::Render(err)
    }
}

impl From<tower_sessions::session::Error> for Error {
    fn from(err: tower_sessions::session::Error) -> Self {
        Error::Session(err)
    }
}
