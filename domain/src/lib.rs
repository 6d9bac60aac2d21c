//! The layer `web` talks to.
//!
//! Record types are re-exported from `entity_api` so that `web` never depends on
//! `entity_api` directly, and every record-store error is translated into
//! [`error::Error`] on the way out.
pub use entity_api::{medications, patients, users, Id};

pub mod error;
pub mod medication;
pub mod patient;
pub mod user;

pub use user::{Identity, UserDirectory};
