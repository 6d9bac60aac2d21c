use crate::extractors::{HtmlForm, MaybeAuthenticated};
use crate::flash::{self, Severity};
use crate::middleware::auth::LOGIN_PATH;
use crate::params::user::SignupParams;
use crate::view::{pages, render, template_data, FormState};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use domain::error::EntityErrorKind;
use domain::user as UserApi;
use log::*;
use tower_sessions::Session;

/// GET the signup form
pub async fn new(
    session: Session,
    MaybeAuthenticated(identity): MaybeAuthenticated,
) -> Result<Response, Error> {
    let data = template_data(&session, identity).await?;
    Ok(render(StatusCode::OK, pages::signup(&data)?))
}

/// POST register a new user
pub async fn create(
    State(app_state): State<AppState>,
    session: Session,
    MaybeAuthenticated(identity): MaybeAuthenticated,
    HtmlForm(params): HtmlForm<SignupParams>,
) -> Result<Response, Error> {
    let (valid, mut errors) = app_state.validator.validate(&params);
    if valid {
        match UserApi::create(
            app_state.db_conn_ref(),
            params.name.trim().to_owned(),
            params.email.trim().to_owned(),
            params.password.clone(),
        )
        .await
        {
            Ok(user) => {
                info!("Registered user {}", user.id);
                flash::push(
                    &session,
                    "Registration successful! You may now log in.",
                    Severity::Success,
                )
                .await?;
                return Ok(Redirect::to(LOGIN_PATH).into_response());
            }
            Err(err) if err.entity_kind() == Some(&EntityErrorKind::Duplicate) => {
                errors.insert("email".to_owned(), "email address already in use".to_owned());
            }
            Err(err) => return Err(err.into()),
        }
    }

    debug!("Rejected signup form: {:?}", errors.keys());
    let mut data = template_data(&session, identity).await?;
    data.form = FormState::submitted(&params, errors);

    Ok(render(StatusCode::UNPROCESSABLE_ENTITY, pages::signup(&data)?))
}
