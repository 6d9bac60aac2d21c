use crate::form::{codec::checkbox, FieldValue, Fields};
use domain::{patient, patients, Id};
use serde::Deserialize;

/// The create/update patient form. The hidden `user_id` field is read by the
/// ownership gate, not here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientParams {
    pub ucn: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub height: i32,
    pub weight: i32,
    pub medication: String,
    pub note: String,
    #[serde(deserialize_with = "checkbox")]
    pub approved: bool,
    #[serde(deserialize_with = "checkbox")]
    pub first_continuation: bool,
}

impl Fields for PatientParams {
    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("ucn", "required,numeric,len=10"),
            ("first_name", "required,alpha-unicode"),
            ("last_name", "required,alpha-unicode"),
            ("phone_number", "required,phone-e164"),
            ("height", "required,numeric"),
            ("weight", "required,numeric"),
            ("medication", "required"),
            ("note", "required"),
            ("approved", "boolean"),
            ("first_continuation", "boolean"),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "ucn" => FieldValue::Text(&self.ucn),
            "first_name" => FieldValue::Text(&self.first_name),
            "last_name" => FieldValue::Text(&self.last_name),
            "phone_number" => FieldValue::Text(&self.phone_number),
            "height" => FieldValue::Int(self.height.into()),
            "weight" => FieldValue::Int(self.weight.into()),
            "medication" => FieldValue::Text(&self.medication),
            "note" => FieldValue::Text(&self.note),
            "approved" => FieldValue::Bool(self.approved),
            "first_continuation" => FieldValue::Bool(self.first_continuation),
            _ => return None,
        };
        Some(value)
    }
}

impl From<PatientParams> for patient::Fields {
    fn from(params: PatientParams) -> Self {
        patient::Fields {
            ucn: params.ucn,
            first_name: params.first_name,
            last_name: params.last_name,
            phone_number: params.phone_number,
            height: params.height,
            weight: params.weight,
            medication: params.medication,
            note: params.note,
            approved: params.approved,
            first_continuation: params.first_continuation,
        }
    }
}

/// Prefills the edit form with the stored record.
impl From<&patients::Model> for PatientParams {
    fn from(model: &patients::Model) -> Self {
        PatientParams {
            ucn: model.ucn.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            phone_number: model.phone_number.clone(),
            height: model.height,
            weight: model.weight,
            medication: model.medication.clone(),
            note: model.note.clone(),
            approved: model.approved,
            first_continuation: model.first_continuation,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeletePatientParams {
    pub id: Id,
}

/// Search by unified civil number.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: String,
}
