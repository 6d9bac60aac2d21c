pub(crate) mod medication;
pub(crate) mod patient;
pub(crate) mod user;
