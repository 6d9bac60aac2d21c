use crate::form::{FieldValue, Fields};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MedicationParams {
    pub name: String,
}

impl Fields for MedicationParams {
    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        &[("name", "required")]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        (name == "name").then_some(FieldValue::Text(&self.name))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteMedicationParams {
    pub name: String,
}
