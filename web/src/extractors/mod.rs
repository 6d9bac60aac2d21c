pub(crate) mod authenticated_user;
pub(crate) mod html_form;

pub(crate) use authenticated_user::{AuthenticatedUser, MaybeAuthenticated};
pub(crate) use html_form::HtmlForm;
