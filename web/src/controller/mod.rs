pub(crate) mod health_check_controller;
pub(crate) mod home_controller;
pub(crate) mod medication_controller;
pub(crate) mod patient_controller;
pub(crate) mod user_controller;
pub(crate) mod user_session_controller;
