use crate::form::{FieldValue, Fields};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupParams {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Fields for SignupParams {
    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("name", "required"),
            ("email", "required,email"),
            ("password", "required,password-strength"),
            (
                "confirm_password",
                "required,password-strength,equals-field=password",
            ),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "name" => &self.name,
            "email" => &self.email,
            "password" => &self.password,
            "confirm_password" => &self.confirm_password,
            _ => return None,
        };
        Some(FieldValue::Text(value))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

impl Fields for LoginParams {
    fn rules(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("email", "required,email"),
            ("password", "required,password-strength"),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "email" => Some(FieldValue::Text(&self.email)),
            "password" => Some(FieldValue::Text(&self.password)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{decode, Validator};

    #[test]
    fn mismatched_confirmation_is_reported_on_the_confirmation_field() {
        let params: SignupParams = decode(
            b"name=Maria&email=maria%40example.com&password=abc12345&confirm_password=abc123456",
        )
        .unwrap();

        let (valid, errors) = Validator::new().validate(&params);

        assert!(!valid);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["confirm_password"], "field does not equal password");
    }

    #[test]
    fn login_requires_a_well_formed_email() {
        let params: LoginParams = decode(b"email=maria&password=abc12345").unwrap();

        let (_, errors) = Validator::new().validate(&params);

        assert_eq!(errors["email"], "invalid format (e.g. email@example.com)");
    }
}
