pub mod codec;
pub mod validator;

pub use codec::{decode, DecodeError};
pub use validator::{FieldValue, Fields, FormErrors, Validator};
