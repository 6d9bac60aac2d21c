//! Server-rendered HTML.
//!
//! Every page is built from a [`TemplateData`], which carries the popped flash
//! entry, the signed-in identity and the anti-forgery token next to the
//! page's own records. Pages are handlebars templates under `web/templates`;
//! values reach them through serde and are HTML-escaped by the registry.
use crate::error::Result as WebResult;
use crate::flash::{self, FlashEntry};
use crate::form::{FieldValue, Fields, FormErrors};
use crate::middleware::csrf;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use domain::{medications, patients, Identity};
use handlebars::Handlebars;
use log::*;
use std::collections::HashMap;
use std::sync::LazyLock;
use tower_sessions::Session;

pub(crate) mod pages;

const LAYOUT: &str = "layout";

const TEMPLATES: &[(&str, &str)] = &[
    (LAYOUT, include_str!("../../templates/layout.hbs")),
    ("home", include_str!("../../templates/home.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("signup", include_str!("../../templates/signup.hbs")),
    ("medications", include_str!("../../templates/medications.hbs")),
    ("patient_list", include_str!("../../templates/patient_list.hbs")),
    ("patient_create", include_str!("../../templates/patient_create.hbs")),
    ("patient_view", include_str!("../../templates/patient_view.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[
    ("csrf", include_str!("../../templates/partials/csrf.hbs")),
    ("field", include_str!("../../templates/partials/field.hbs")),
    ("patient_table", include_str!("../../templates/partials/patient_table.hbs")),
];

static REGISTRY: LazyLock<Handlebars<'static>> = LazyLock::new(registry);

/// A template that fails to compile is logged and left out, so rendering it
/// fails the request.
fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();

    for (name, source) in PARTIALS {
        if let Err(err) = registry.register_partial(name, *source) {
            error!("Partial {name} does not compile: {err}");
        }
    }
    for (name, source) in TEMPLATES {
        if let Err(err) = registry.register_template_string(name, *source) {
            error!("Template {name} does not compile: {err}");
        }
    }

    registry
}

#[derive(Debug, Default)]
pub struct FormState {
    pub values: HashMap<&'static str, String>,
    pub errors: FormErrors,
}

impl FormState {
    /// Captures the submitted values so a rejected form is shown as entered.
    pub fn submitted(form: &dyn Fields, errors: FormErrors) -> Self {
        let values = form
            .rules()
            .iter()
            .filter_map(|(name, _)| {
                let value = match form.field(name)? {
                    FieldValue::Text(s) => s.to_owned(),
                    FieldValue::Int(i) => i.to_string(),
                    FieldValue::Bool(b) => b.to_string(),
                };
                Some((*name, value))
            })
            .collect();

        FormState { values, errors }
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct TemplateData {
    pub flash: Option<FlashEntry>,
    pub identity: Option<Identity>,
    pub csrf_token: String,
    pub form: FormState,
    pub patients: Vec<patients::Model>,
    pub patient: Option<patients::Model>,
    pub medications: Vec<medications::Model>,
}

impl TemplateData {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Common data for a page about to be rendered. Pops the flash queue, so call
/// it once per rendered page and never on a redirect.
pub async fn template_data(
    session: &Session,
    identity: Option<Identity>,
) -> WebResult<TemplateData> {
    Ok(TemplateData {
        flash: flash::pop(session).await?,
        identity,
        csrf_token: csrf::token(session).await?,
        ..Default::default()
    })
}

pub fn render(status: StatusCode, page: String) -> Response {
    (status, Html(page)).into_response()
}
