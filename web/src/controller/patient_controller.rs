use crate::extractors::{AuthenticatedUser, HtmlForm};
use crate::flash::{self, Severity};
use crate::form::FormErrors;
use crate::middleware::referer_path;
use crate::params::patient::{DeletePatientParams, PatientParams, SearchParams};
use crate::view::{pages, render, template_data, FormState};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use domain::error::EntityErrorKind;
use domain::{medication as MedicationApi, patient as PatientApi, patients::Model, Id, Identity};
use log::*;
use tower_sessions::Session;

const UNKNOWN_MEDICATION: &str = "unknown medication";

fn patient_path(id: Id) -> String {
    format!("/patients/{id}")
}

/// GET all patients
pub async fn index(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, Error> {
    let patients = PatientApi::find_all(app_state.db_conn_ref()).await?;

    let mut data = template_data(&session, Some(user)).await?;
    data.patients = patients;

    Ok(render(StatusCode::OK, pages::patient_list(&data, "Patients")?))
}

/// GET the patients taking one medication
pub async fn by_medication(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(medication): Path<String>,
) -> Result<Response, Error> {
    let patients = PatientApi::find_by_medication(app_state.db_conn_ref(), &medication).await?;

    let mut data = template_data(&session, Some(user)).await?;
    data.patients = patients;

    Ok(render(
        StatusCode::OK,
        pages::patient_list(&data, &format!("Patients on {medication}"))?,
    ))
}

/// GET the new patient form
pub async fn new(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, Error> {
    render_create(&app_state, &session, user, FormState::default(), StatusCode::OK).await
}

async fn render_create(
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

    Ok(render(status, pages::patient_create(&data)?))
}

/// POST create a new patient owned by the signed-in user
pub async fn create(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    HtmlForm(params): HtmlForm<PatientParams>,
) -> Result<Response, Error> {
    let (valid, errors) = app_state.validator.validate(&params);
    if !valid {
        debug!("Rejected new patient form: {errors:?}");
        let form = FormState::submitted(&params, errors);
        return render_create(&app_state, &session, user, form, StatusCode::UNPROCESSABLE_ENTITY)
            .await;
    }

    let form = FormState::submitted(&params, FormErrors::new());
    match PatientApi::create(app_state.db_conn_ref(), params.into(), user).await {
        Ok(patient) => {
            info!("User {user} registered patient {}", patient.id);
            flash::push(&session, "Patient successfully added!", Severity::Success).await?;
            Ok(Redirect::to(&patient_path(patient.id)).into_response())
        }
        // The medication was removed between rendering the form and submitting it.
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::ExistingDependency) => {
            let mut form = form;
            form.errors
                .insert("medication".to_owned(), UNKNOWN_MEDICATION.to_owned());
            render_create(&app_state, &session, user, form, StatusCode::UNPROCESSABLE_ENTITY)
                .await
        }
        Err(err) => Err(err.into()),
    }
}

/// GET a single patient along with its edit form
pub async fn read(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Response, Error> {
    let patient = PatientApi::find_by_id(app_state.db_conn_ref(), id).await?;
    let form = FormState::submitted(&PatientParams::from(&patient), FormErrors::new());

    render_view(&app_state, &session, user, patient, form, StatusCode::OK).await
}

async fn render_view(
    app_state: &AppState,
    session: &Session,
    user: Identity,
    patient: Model,
    form: FormState,
    status: StatusCode,
) -> Result<Response, Error> {
    let medications = MedicationApi::find_all(app_state.db_conn_ref()).await?;

    let mut data = template_data(session, Some(user)).await?;
    data.patient = Some(patient);
    data.medications = medications;
    data.form = form;

    Ok(render(status, pages::patient_view(&data)?))
}

/// POST update a patient; the ownership gate has already checked `user_id`.
pub async fn update(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Id>,
    HtmlForm(params): HtmlForm<PatientParams>,
) -> Result<Response, Error> {
    let (valid, errors) = app_state.validator.validate(&params);
    if !valid {
        debug!("Rejected update of patient {id}: {errors:?}");
        let patient = PatientApi::find_by_id(app_state.db_conn_ref(), id).await?;
        let form = FormState::submitted(&params, errors);
        return render_view(
            &app_state,
            &session,
            user,
            patient,
            form,
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    }

    let form = FormState::submitted(&params, FormErrors::new());
    match PatientApi::update(app_state.db_conn_ref(), id, user, params.into()).await {
        Ok(()) => {
            info!("User {user} updated patient {id}");
            flash::push(&session, "Patient successfully updated!", Severity::Success).await?;
        }
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::Unauthorized) => {
            warn!("User {user} may not modify patient {id}");
            flash::push(
                &session,
                "Unauthorized action - cannot modify patient!",
                Severity::Danger,
            )
            .await?;
        }
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::ExistingDependency) => {
            let patient = PatientApi::find_by_id(app_state.db_conn_ref(), id).await?;
            let mut form = form;
            form.errors
                .insert("medication".to_owned(), UNKNOWN_MEDICATION.to_owned());
            return render_view(
                &app_state,
                &session,
                user,
                patient,
                form,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Redirect::to(&patient_path(id)).into_response())
}

/// POST delete a patient; the ownership gate has already checked `user_id`.
pub async fn delete(
    State(app_state): State<AppState>,
    session: Session,
    AuthenticatedUser(user): AuthenticatedUser,
    HtmlForm(DeletePatientParams { id }): HtmlForm<DeletePatientParams>,
) -> Result<Response, Error> {
    match PatientApi::delete(app_state.db_conn_ref(), id, user).await {
        Ok(()) => {
            info!("User {user} deleted patient {id}");
            flash::push(&session, "Patient successfully deleted!", Severity::Success).await?;
            Ok(Redirect::to("/patients").into_response())
        }
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::Unauthorized) => {
            warn!("User {user} may not delete patient {id}");
            flash::push(
                &session,
                "Unauthorized action - cannot delete patient!",
                Severity::Danger,
            )
            .await?;
            Ok(Redirect::to(&patient_path(id)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// POST search for a patient by unified civil number
pub async fn search(
    State(app_state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    HtmlForm(SearchParams { q }): HtmlForm<SearchParams>,
) -> Result<Response, Error> {
    match PatientApi::find_by_ucn(app_state.db_conn_ref(), q.trim()).await {
        Ok(patient) => Ok(Redirect::to(&patient_path(patient.id)).into_response()),
        Err(err) if err.entity_kind() == Some(&EntityErrorKind::NotFound) => {
            flash::push(&session, "No patients exists with this UCN.", Severity::Warning).await?;
            Ok(Redirect::to(&referer_path(&headers)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}
