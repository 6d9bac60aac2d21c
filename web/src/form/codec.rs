//! `application/x-www-form-urlencoded` decoding into typed form structs.
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A submitted value could not be coerced into its field's type.
#[derive(Debug, PartialEq)]
pub struct DecodeError(pub(crate) String);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "form decode error: {}", self.0)
    }
}

impl std::error::Error for DecodeError {}

/// Decodes a url-encoded body into `T`.
///
/// Keys `T` does not declare are ignored, a repeated key keeps its first value,
/// and empty values are dropped so the field keeps its `Default`. Form structs
/// are expected to carry `#[serde(default)]`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    let mut seen = HashSet::new();
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());

    for (key, value) in url::form_urlencoded::parse(body) {
        if seen.insert(key.clone()) && !value.is_empty() {
            serializer.append_pair(&key, &value);
        }
    }

    serde_urlencoded::from_str(&serializer.finish()).map_err(|e| DecodeError(e.to_string()))
}

/// Looks up the first value submitted for `name`.
pub fn first_value(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Deserializes an HTML checkbox: present as `on` (or a boolean literal) when ticked.
pub fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"a checkbox value",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        height: i32,
        #[serde(deserialize_with = "checkbox")]
        approved: bool,
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let sample: Sample = decode(b"csrf_token=abc&name=Ivan&height=180").unwrap();

        assert_eq!(
            sample,
            Sample {
                name: "Ivan".to_owned(),
                height: 180,
                approved: false,
            }
        );
    }

    #[test]
    fn missing_and_empty_fields_keep_their_default() {
        let sample: Sample = decode(b"name=&height=").unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn the_first_of_repeated_keys_is_used() {
        let sample: Sample = decode(b"name=first&name=second").unwrap();
        assert_eq!(sample.name, "first");
    }

    #[test]
    fn checkboxes_accept_on() {
        let sample: Sample = decode(b"approved=on").unwrap();
        assert!(sample.approved);
    }

    #[test]
    fn uncoercible_scalars_fail_the_whole_decode() {
        assert!(decode::<Sample>(b"name=Ivan&height=tall").is_err());
        assert!(decode::<Sample>(b"approved=maybe").is_err());
    }

    #[test]
    fn percent_encoding_is_undone() {
        let sample: Sample = decode(b"name=Ivan+Petrov%21").unwrap();
        assert_eq!(sample.name, "Ivan Petrov!");
    }

    #[test]
    fn first_value_finds_hidden_fields() {
        assert_eq!(first_value(b"id=4&user_id=7", "user_id").as_deref(), Some("7"));
        assert_eq!(first_value(b"id=4", "user_id"), None);
    }
}
