//! Declarative per-field validation.
//!
//! A form declares its rules as `(wire name, "tag,tag=param,...")` pairs and
//! exposes its decoded values through [`Fields`]. [`Validator`] holds the
//! registry mapping each tag to a predicate and a message; it never changes
//! while serving and is shared through `AppState`.
use email_address::EmailAddress;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Field wire-name to message. A key is present iff that field failed.
pub type FormErrors = BTreeMap<String, String>;

/// Message used for tags the registry does not know.
pub const UNKNOWN_RULE_MESSAGE: &str = "validation failed";

/// A decoded field value as seen by the rule predicates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i64),
    Bool(bool),
}

/// Implemented by every form struct that can be validated.
pub trait Fields {
    /// Rules in declaration order, keyed by the field's wire-name.
    fn rules(&self) -> &'static [(&'static str, &'static str)];

    /// The decoded value of the field with this wire-name.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Everything a predicate may look at.
pub struct Check<'a> {
    pub value: FieldValue<'a>,
    /// The text after `=` in `tag=param`.
    pub param: Option<&'a str>,
    pub form: &'a dyn Fields,
}

pub type Predicate = fn(&Check<'_>) -> bool;

struct Rule {
    predicate: Predicate,
    // `{}` is replaced with the rule parameter
    message: &'static str,
}

pub struct Validator {
    rules: HashMap<&'static str, Rule>,
}

impl Default for Validator {
    fn default() -> Self {
        let mut validator = Validator {
            rules: HashMap::new(),
        };

        validator
            .register("required", required, "required field")
            .register("numeric", numeric, "invalid format (only numbers allowed)")
            .register("len", exact_len, "invalid amount (requires {})")
            .register(
                "alpha-unicode",
                alpha_unicode,
                "invalid format (only letters allowed)",
            )
            .register("phone-e164", phone_e164, "invalid format (e.g. +359123456789)")
            .register("email", email, "invalid format (e.g. email@example.com)")
            .register(
                "password-strength",
                password_strength,
                "invalid format (requires minimum 8 characters, including letters and numbers)",
            )
            .register("equals-field", equals_field, "field does not equal {}")
            .register("boolean", boolean, "invalid format (expected true or false)");

        validator
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `tag`.
    pub fn register(
        &mut self,
        tag: &'static str,
        predicate: Predicate,
        message: &'static str,
    ) -> &mut Self {
        self.rules.insert(tag, Rule { predicate, message });
        self
    }

    /// Evaluates every declared rule of every field.
    ///
    /// A field gets at most one message: the one of its first failing rule.
    pub fn validate(&self, form: &dyn Fields) -> (bool, FormErrors) {
        let mut errors = FormErrors::new();

        for (name, declared) in form.rules() {
            let Some(value) = form.field(name) else {
                errors.insert((*name).to_owned(), UNKNOWN_RULE_MESSAGE.to_owned());
                continue;
            };

            for spec in declared.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let (tag, param) = match spec.split_once('=') {
                    Some((tag, param)) => (tag, Some(param)),
                    None => (spec, None),
                };

                let check = Check { value, param, form };
                let failure = match self.rules.get(tag) {
                    Some(rule) if (rule.predicate)(&check) => None,
                    Some(rule) => Some(rule.message.replace("{}", param.unwrap_or_default())),
                    None => Some(UNKNOWN_RULE_MESSAGE.to_owned()),
                };

                if let Some(message) = failure {
                    errors.entry((*name).to_owned()).or_insert(message);
                }
            }
        }

        (errors.is_empty(), errors)
    }
}

fn required(check: &Check<'_>) -> bool {
    match check.value {
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::Int(i) => i != 0,
        FieldValue::Bool(b) => b,
    }
}

fn numeric(check: &Check<'_>) -> bool {
    match check.value {
        FieldValue::Text(s) => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        FieldValue::Int(_) => true,
        FieldValue::Bool(_) => false,
    }
}

fn exact_len(check: &Check<'_>) -> bool {
    let Some(Ok(expected)) = check.param.map(usize::from_str) else {
        return false;
    };

    match check.value {
        FieldValue::Text(s) => s.chars().count() == expected,
        FieldValue::Int(i) => usize::try_from(i).is_ok_and(|i| i == expected),
        FieldValue::Bool(_) => false,
    }
}

fn alpha_unicode(check: &Check<'_>) -> bool {
    match check.value {
        FieldValue::Text(s) => !s.is_empty() && s.chars().all(char::is_alphabetic),
        _ => false,
    }
}

fn phone_e164(check: &Check<'_>) -> bool {
    let FieldValue::Text(s) = check.value else {
        return false;
    };
    let Some(digits) = s.strip_prefix('+') else {
        return false;
    };

    // `^\+[1-9]?[0-9]{7,14}$`: only the fifteenth digit forces a non-zero lead.
    (7..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !(digits.len() == 15 && digits.starts_with('0'))
}

fn email(check: &Check<'_>) -> bool {
    match check.value {
        FieldValue::Text(s) => EmailAddress::is_valid(s),
        _ => false,
    }
}

fn password_strength(check: &Check<'_>) -> bool {
    let FieldValue::Text(s) = check.value else {
        return false;
    };

    s.chars().count() >= 8
        && s.chars().any(char::is_alphabetic)
        && s.chars().any(char::is_numeric)
}

fn equals_field(check: &Check<'_>) -> bool {
    check
        .param
        .and_then(|other| check.form.field(other))
        .is_some_and(|other| other == check.value)
}

fn boolean(check: &Check<'_>) -> bool {
    match check.value {
        FieldValue::Bool(_) => true,
        FieldValue::Text(s) => matches!(s, "true" | "false" | "1" | "0" | "on"),
        FieldValue::Int(i) => i == 0 || i == 1,
    }
}
