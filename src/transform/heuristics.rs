//! Label-based inference of person and device fields
//!
//! These look only at response labels and values, never at the form
//! structure, so they can be swapped for a schema-driven lookup without
//! touching the transformer.

use serde_json::Value;

use crate::model::Response;

const FIRST_NAME_KEYS: &[&str] = &["firstname", "first name"];
const LAST_NAME_KEYS: &[&str] = &["lastname", "last name"];
const DEVICE_DATE_KEYS: &[&str] = &["devicedate", "device date"];

/// Fields recovered from free-text labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredFields {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub device_date: Option<Value>,
    pub user_name: Option<String>,
}

/// Scan all responses, mapped or not.
///
/// Name and device-date matches keep the last answered response; the user
/// name is the first answered value that looks like an email address.
pub fn infer(responses: &[Response]) -> InferredFields {
    let mut fields = InferredFields::default();

    for response in responses {
        let Some(value) = response.answered_value() else {
            continue;
        };
        let label = response.label.as_deref().unwrap_or_default().to_lowercase();

        if matches_any(&label, FIRST_NAME_KEYS) {
            fields.first_name = Some(value.clone());
        } else if matches_any(&label, LAST_NAME_KEYS) {
            fields.last_name = Some(value.clone());
        } else if matches_any(&label, DEVICE_DATE_KEYS) {
            fields.device_date = Some(value.clone());
        }
    }

    fields.user_name = responses
        .iter()
        .filter_map(|response| response.answered_value()?.as_str())
        .find(|value| looks_like_email(value))
        .map(str::to_string);

    fields
}

fn matches_any(label: &str, keys: &[&str]) -> bool {
    keys.iter().any(|key| label.contains(key))
}

fn looks_like_email(value: &str) -> bool {
    value.contains('@') && value.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(label: &str, value: Value) -> Response {
        Response {
            entry_id: None,
            label: Some(label.to_string()),
            kind: Some("Text".to_string()),
            value: Some(value),
        }
    }

    #[test]
    fn test_names_and_device_date() {
        let fields = infer(&[
            response("Inspector First Name", json!("Ada")),
            response("LASTNAME", json!("Lovelace")),
            response("Device Date", json!("2025-03-04")),
        ]);

        assert_eq!(fields.first_name, Some(json!("Ada")));
        assert_eq!(fields.last_name, Some(json!("Lovelace")));
        assert_eq!(fields.device_date, Some(json!("2025-03-04")));
        assert_eq!(fields.user_name, None);
    }

    #[test]
    fn test_last_match_wins_for_names() {
        let fields = infer(&[
            response("First Name", json!("Ada")),
            response("Witness first name", json!("Grace")),
        ]);
        assert_eq!(fields.first_name, Some(json!("Grace")));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let fields = infer(&[
            response("First Name", json!("Ada")),
            response("First Name", json!("")),
            response("Last Name", json!(null)),
        ]);
        assert_eq!(fields.first_name, Some(json!("Ada")));
        assert_eq!(fields.last_name, None);
    }

    #[test]
    fn test_first_name_label_is_not_reused() {
        // "firstname lastname" matches the first-name pattern only
        let fields = infer(&[response("FirstName LastName", json!("Ada L"))]);
        assert_eq!(fields.first_name, Some(json!("Ada L")));
        assert_eq!(fields.last_name, None);
    }

    #[test]
    fn test_first_email_wins() {
        let fields = infer(&[
            response("Notes", json!("no address here")),
            response("Hydrographer Email", json!("j.doe@example.com")),
            response("Supervisor Email", json!("boss@example.com")),
        ]);
        assert_eq!(fields.user_name.as_deref(), Some("j.doe@example.com"));
    }

    #[test]
    fn test_email_requires_at_and_dot() {
        let fields = infer(&[
            response("Handle", json!("@someone")),
            response("Version", json!("1.2")),
            response("Count", json!(42)),
        ]);
        assert_eq!(fields.user_name, None);
    }

    #[test]
    fn test_missing_label() {
        let fields = infer(&[Response {
            value: Some(json!("x@y.z")),
            ..Default::default()
        }]);
        assert_eq!(fields.first_name, None);
        assert_eq!(fields.user_name.as_deref(), Some("x@y.z"));
    }
}
