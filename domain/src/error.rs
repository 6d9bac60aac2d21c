//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` maps the
/// kinds onto HTTP responses and never depends on `entity_api` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
}

/// Entity errors bubbling up from `entity_api`, reduced to the kinds the
/// request pipeline reacts to.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Unauthenticated,
    /// An owner-scoped mutation matched no row owned by the caller.
    Unauthorized,
    ExistingDependency,
    Duplicate,
    Other(String),
}

/// Failures of systems outside this process.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    StoreUnavailable,
}

impl Error {
    pub fn entity(kind: EntityErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(kind)),
        }
    }

    /// The entity kind of this error, if it is one.
    pub fn entity_kind(&self) -> Option<&EntityErrorKind> {
        match &self.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(kind)) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
            }
            EntityApiErrorKind::RecordUnauthenticated => DomainErrorKind::Internal(
                InternalErrorKind::Entity(EntityErrorKind::Unauthenticated),
            ),
            EntityApiErrorKind::Unauthorized => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Unauthorized))
            }
            EntityApiErrorKind::ExistingDependency => DomainErrorKind::Internal(
                InternalErrorKind::Entity(EntityErrorKind::ExistingDependency),
            ),
            // users.email and medications.name
            EntityApiErrorKind::DuplicateRecord => DomainErrorKind::Internal(
                InternalErrorKind::Entity(EntityErrorKind::Duplicate),
            ),
            EntityApiErrorKind::SystemError => {
                DomainErrorKind::External(ExternalErrorKind::StoreUnavailable)
            }
            EntityApiErrorKind::RecordNotUpdated => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Other(
                    format!("{:?}", err.error_kind),
                )))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
