use crate::extractors::MaybeAuthenticated;
use crate::view::{pages, render, template_data};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use domain::patient as PatientApi;
use tower_sessions::Session;

/// GET the home page; signed-in users see the latest registered patients.
pub async fn index(
    State(app_state): State<AppState>,
    session: Session,
    MaybeAuthenticated(identity): MaybeAuthenticated,
) -> Result<Response, Error> {
    let patients = match identity {
        Some(_) => PatientApi::find_latest(app_state.db_conn_ref()).await?,
        None => Vec::new(),
    };

    let mut data = template_data(&session, identity).await?;
    data.patients = patients;

    Ok(render(StatusCode::OK, pages::home(&data)?))
}
