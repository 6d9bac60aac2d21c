use crate::extractors::{AuthenticatedUser, HtmlForm};
use crate::flash::{self, Severity};
use crate::params::medication::{DeleteMedicationParams, MedicationParams};
use crate::view::{pages, render, template_data, FormState};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use domain::error::EntityErrorKind;
use domain::{medication as MedicationApi, Identity};
use log::*;
use tower_sessions::Session;

const MEDICATIONS_PATH: &str = "/medications";

/// GET all medications with the add form
pub async fn index(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, Error> {
    render_index(&app_state, &session, user, FormState::default(), StatusCode::OK).await
}

async fn render_index(
    app_state: &AppState,
    session: &Session,
    user: Identity,
    form: FormState,
    status: StatusCode,
) -> Result<Response, Error> {
    let medications = MedicationApi::find_all(app_state.db_conn_ref()).await?;

    let mut data = template_data(session, Some(user)).await?;
    data.medications = medications;
    data.form = form;

    Ok(render(status, pages::medications(&data)?))
}

/// POST add a medication
pub async fn create(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    HtmlForm(params): HtmlForm<MedicationParams>,
) -> Result<Response, Error> {
    let (valid, mut errors) = app_state.validator.validate(&params);
    if valid {
        let name = params.name.trim().to_owned();
        match MedicationApi::create(app_state.db_conn_ref(), name, user).await {
            Ok(medication) => {
                info!("User {user} added medication {}", medication.name);
                flash::push(&session, "Medication successfully added!", Severity::Success)
                    .await?;
                return Ok(Redirect::to(MEDICATIONS_PATH).into_response());
            }
            Err(err) if err.entity_kind() == Some(&EntityErrorKind::Duplicate) => {
                errors.insert("name".to_owned(), "medication already exists".to_owned());
            }
            Err(err) => return Err(err.into()),
        }
    }

    debug!("Rejected medication form: {errors:?}");
    let form = FormState::submitted(&params, errors);
    render_index(&app_state, &session, user, form, StatusCode::UNPROCESSABLE_ENTITY).await
}

/// POST delete a medication no patient is registered on
pub async fn delete(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    HtmlForm(DeleteMedicationParams { name }): HtmlForm<DeleteMedicationParams>,
) -> Result<Response, Error> {
    match MedicationApi::delete(app_state.db_conn_ref(), &name, user).await {
        Ok(()) => {
            info!("User {user} deleted medication {name}");
            flash::push(&session, "Medication successfully deleted!", Severity::Success).await?;
        }
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::ExistingDependency) => {
            debug!("Medication {name} is still referenced by patients");
            flash::push(
                &session,
                "Medication cannot be deleted due to registered patients.",
                Severity::Warning,
            )
            .await?;
        }
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::Unauthorized) => {
            warn!("User {user} may not delete medication {name}");
            flash::push(
                &session,
                "Unauthorized action - cannot delete medications!",
                Severity::Danger,
            )
            .await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Redirect::to(MEDICATIONS_PATH).into_response())
}
