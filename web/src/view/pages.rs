use super::{TemplateData, LAYOUT, REGISTRY};
use crate::error::Result as WebResult;
use crate::flash::FlashEntry;
use crate::middleware::csrf::CSRF_FIELD;
use domain::{medications, patients, Id};
use serde::Serialize;

/// Percent-encodes a value for use as one path segment.
fn path_segment(value: &str) -> String {
    // byte_serialize writes spaces as `+`, which a path does not decode.
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[derive(Serialize)]
struct PatientRow<'a> {
    id: Id,
    owner: Id,
    ucn: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    medication: &'a str,
    medication_path: String,
    approved: bool,
    registered: String,
}

impl<'a> From<&'a patients::Model> for PatientRow<'a> {
    fn from(patient: &'a patients::Model) -> Self {
        PatientRow {
            id: patient.id,
            owner: patient.user_id,
            ucn: &patient.ucn,
            first_name: &patient.first_name,
            last_name: &patient.last_name,
            medication: &patient.medication,
            medication_path: path_segment(&patient.medication),
            approved: patient.approved,
            registered: patient.created_at.format("%d %b %Y").to_string(),
        }
    }
}

#[derive(Serialize)]
struct MedicationRow<'a> {
    name: &'a str,
    path: String,
    owner: Id,
}

impl<'a> From<&'a medications::Model> for MedicationRow<'a> {
    fn from(medication: &'a medications::Model) -> Self {
        MedicationRow {
            name: &medication.name,
            path: path_segment(&medication.name),
            owner: medication.user_id,
        }
    }
}

#[derive(Serialize)]
struct Choice<'a> {
    name: &'a str,
    selected: bool,
}

/// One form control with its submitted value and validation message.
#[derive(Serialize)]
struct Field<'a> {
    name: &'static str,
    label: &'static str,
    kind: &'static str,
    value: &'a str,
    error: Option<&'a str>,
    checkbox: bool,
    checked: bool,
    select: bool,
    options: Vec<Choice<'a>>,
}

impl<'a> Field<'a> {
    fn input(
        data: &'a TemplateData,
        name: &'static str,
        label: &'static str,
        kind: &'static str,
    ) -> Self {
        Field {
            name,
            label,
            kind,
            value: data.form.value(name),
            error: data.form.error(name),
            checkbox: false,
            checked: false,
            select: false,
            options: Vec::new(),
        }
    }

    /// Never echoes the submitted value back.
    fn password(data: &'a TemplateData, name: &'static str, label: &'static str) -> Self {
        Field {
            value: "",
            ..Field::input(data, name, label, "password")
        }
    }

    fn checkbox(data: &'a TemplateData, name: &'static str, label: &'static str) -> Self {
        Field {
            checkbox: true,
            checked: data.form.value(name) == "true",
            ..Field::input(data, name, label, "checkbox")
        }
    }

    fn medication(data: &'a TemplateData) -> Self {
        let selected = data.form.value("medication");
        Field {
            select: true,
            options: data
                .medications
                .iter()
                .map(|medication| Choice {
                    name: &medication.name,
                    selected: medication.name == selected,
                })
                .collect(),
            ..Field::input(data, "medication", "Medication", "select")
        }
    }
}

/// Everything a page template and the layout read.
#[derive(Serialize)]
struct Page<'a> {
    title: &'a str,
    heading: &'a str,
    authenticated: bool,
    csrf_field: &'static str,
    csrf_token: &'a str,
    flash: Option<&'a FlashEntry>,
    fields: Vec<Field<'a>>,
    patients: Vec<PatientRow<'a>>,
    patient: Option<PatientRow<'a>>,
    medications: Vec<MedicationRow<'a>>,
    main: String,
}

impl<'a> Page<'a> {
    fn new(title: &'a str, data: &'a TemplateData) -> Self {
        Page {
            title,
            heading: title,
            authenticated: data.is_authenticated(),
            csrf_field: CSRF_FIELD,
            csrf_token: &data.csrf_token,
            flash: data.flash.as_ref(),
            fields: Vec::new(),
            patients: data.patients.iter().map(PatientRow::from).collect(),
            patient: data.patient.as_ref().map(PatientRow::from),
            medications: data.medications.iter().map(MedicationRow::from).collect(),
            main: String::new(),
        }
    }

    /// Renders `template` and wraps it in the layout.
    fn render(mut self, template: &str) -> WebResult<String> {
        self.main = REGISTRY.render(template, &self)?;
        Ok(REGISTRY.render(LAYOUT, &self)?)
    }
}

fn patient_fields(data: &TemplateData) -> Vec<Field<'_>> {
    vec![
        Field::input(data, "ucn", "UCN", "text"),
        Field::input(data, "first_name", "First name", "text"),
        Field::input(data, "last_name", "Last name", "text"),
        Field::input(data, "phone_number", "Phone number", "tel"),
        Field::input(data, "height", "Height (cm)", "number"),
        Field::input(data, "weight", "Weight (kg)", "number"),
        Field::medication(data),
        Field::input(data, "note", "Note", "text"),
    ]
}

pub fn home(data: &TemplateData) -> WebResult<String> {
    Page::new("Home", data).render("home")
}

pub fn patient_list(data: &TemplateData, heading: &str) -> WebResult<String> {
    Page {
        heading,
        ..Page::new("Patients", data)
    }
    .render("patient_list")
}

pub fn patient_create(data: &TemplateData) -> WebResult<String> {
    Page {
        fields: patient_fields(data),
        ..Page::new("New patient", data)
    }
    .render("patient_create")
}

pub fn patient_view(data: &TemplateData) -> WebResult<String> {
    let mut fields = patient_fields(data);
    fields.push(Field::checkbox(data, "approved", "Approved"));
    fields.push(Field::checkbox(data, "first_continuation", "First continuation"));

    Page {
        fields,
        ..Page::new("Patient", data)
    }
    .render("patient_view")
}

pub fn medications(data: &TemplateData) -> WebResult<String> {
    Page {
        fields: vec![Field::input(data, "name", "Name", "text")],
        ..Page::new("Medications", data)
    }
    .render("medications")
}

pub fn signup(data: &TemplateData) -> WebResult<String> {
    Page {
        fields: vec![
            Field::input(data, "name", "Name", "text"),
            Field::input(data, "email", "Email", "email"),
            Field::password(data, "password", "Password"),
            Field::password(data, "confirm_password", "Confirm password"),
        ],
        ..Page::new("Signup", data)
    }
    .render("signup")
}

pub fn login(data: &TemplateData) -> WebResult<String> {
    Page {
        fields: vec![
            Field::input(data, "email", "Email", "email"),
            Field::password(data, "password", "Password"),
        ],
        ..Page::new("Login", data)
    }
    .render("login")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::Severity;
    use crate::view::FormState;
    use domain::Identity;

    fn patient() -> patients::Model {
        patients::Model {
            id: 4,
            ucn: "8001010000".to_owned(),
            first_name: "Ivan".to_owned(),
            last_name: "Petrov".to_owned(),
            phone_number: "+359123456789".to_owned(),
            height: 180,
            weight: 80,
            medication: "Vitamin C".to_owned(),
            note: String::new(),
            approved: true,
            first_continuation: false,
            user_id: 2,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn the_flash_entry_is_rendered_escaped() {
        let data = TemplateData {
            flash: Some(FlashEntry {
                content: "<b>Saved</b>".to_owned(),
                severity: Severity::Success,
            }),
            ..Default::default()
        };

        let page = login(&data).unwrap();

        assert!(page.contains(r#"class="alert alert-success"#));
        assert!(page.contains("&lt;b&gt;Saved&lt;/b&gt;"));
    }

    #[test]
    fn path_segments_encode_spaces_as_percent_twenty() {
        assert_eq!(path_segment("Vitamin C+"), "Vitamin%20C%2B");
    }

    #[test]
    fn forms_carry_the_anti_forgery_token() {
        let data = TemplateData {
            identity: Some(Identity(1)),
            csrf_token: "tok123".to_owned(),
            ..Default::default()
        };

        let page = medications(&data).unwrap();

        assert!(page.contains(r#"name="csrf_token" value="tok123""#));
        assert!(page.contains("/users/logout"));
    }

    #[test]
    fn submitted_values_are_escaped_inside_attributes() {
        let mut form = FormState::default();
        form.values.insert("email", r#""><script>"#.to_owned());
        form.errors.insert("email".to_owned(), "invalid format".to_owned());
        let data = TemplateData {
            form,
            ..Default::default()
        };

        let page = login(&data).unwrap();

        assert!(!page.contains("<script>"));
        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
        assert!(page.contains("is-invalid"));
        assert!(page.contains(r#"<div class="invalid-feedback">invalid format</div>"#));
    }

    #[test]
    fn patient_pages_link_rows_and_carry_the_owner() {
        let data = TemplateData {
            identity: Some(Identity(2)),
            patients: vec![patient()],
            patient: Some(patient()),
            ..Default::default()
        };

        let list = patient_list(&data, "Patients on Vitamin C").unwrap();
        assert!(list.contains(r#"<a href="/patients/4">8001010000</a>"#));
        assert!(list.contains("/patients/medication/Vitamin%20C"));
        assert!(list.contains("<td>Yes</td>"));

        let view = patient_view(&data).unwrap();
        assert!(view.contains(r#"<input type="hidden" name="user_id" value="2">"#));
        assert!(view.contains(r#"action="/patients/4""#));
    }

    #[test]
    fn an_empty_patient_list_says_so() {
        let data = TemplateData {
            identity: Some(Identity(1)),
            ..Default::default()
        };

        let page = home(&data).unwrap();

        assert!(page.contains("Latest patients"));
        assert!(page.contains("There are no patients to show."));
    }
}
