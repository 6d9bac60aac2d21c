use crate::extractors::{AuthenticatedUser, HtmlForm, MaybeAuthenticated};
use crate::flash::{self, Severity};
use crate::middleware::auth::LOGIN_PATH;
use crate::params::user::LoginParams;
use crate::view::{pages, render, template_data, FormState};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use domain::user::{AuthSession, Credentials};
use log::*;
use tower_sessions::Session;

/// GET the login form
pub async fn new(
    session: Session,
    MaybeAuthenticated(identity): MaybeAuthenticated,
) -> Result<Response, Error> {
    let data = template_data(&session, identity).await?;
    Ok(render(StatusCode::OK, pages::login(&data)?))
}

/// POST sign the session in.
///
/// An unknown email and a wrong password get the same answer: a danger flash
/// and a redirect back to the login form.
pub async fn create(
    State(app_state): State<AppState>,
    mut auth_session: AuthSession,
    session: Session,
    MaybeAuthenticated(identity): MaybeAuthenticated,
    HtmlForm(params): HtmlForm<LoginParams>,
) -> Result<Response, Error> {
    let (valid, errors) = app_state.validator.validate(&params);
    if !valid {
        debug!("Rejected login form: {:?}", errors.keys());
        let mut data = template_data(&session, identity).await?;
        data.form = FormState::submitted(&params, errors);
        return Ok(render(StatusCode::UNPROCESSABLE_ENTITY, pages::login(&data)?));
    }

    let credentials = Credentials {
        email: params.email,
        password: params.password,
    };

    match auth_session.authenticate(credentials).await? {
        Some(user) => {
            auth_session.login(&user).await?;
            info!("User {user} logged in");
            flash::push(&session, "Logged in successfully!", Severity::Success).await?;
            Ok(Redirect::to("/").into_response())
        }
        None => {
            warn!("Failed login attempt");
            flash::push(&session, "Invalid email address or password.", Severity::Danger).await?;
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
    }
}

/// POST sign the session out. The whole session is flushed, so the flash
/// lands in a fresh one.
pub async fn delete(
    mut auth_session: AuthSession,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, Error> {
    auth_session.logout().await?;
    info!("User {user} logged out");
    flash::push(&session, "Logged out successfully!", Severity::Success).await?;

    Ok(Redirect::to("/").into_response())
}
