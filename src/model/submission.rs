//! Submissions as returned by `GET submissions/{id}`

use serde::Deserialize;
use serde_json::Value;

use super::scalar;

/// One filled-out instance of a form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default, deserialize_with = "scalar::string")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub client_guid: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub submission_number: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "scalar::id")]
    pub form_id: Option<u64>,
    #[serde(default)]
    pub form: Option<FormRef>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub responses: Vec<Response>,
}

impl Submission {
    /// Form id carried by the submission itself, if any
    pub fn source_form_id(&self) -> Option<u64> {
        self.form_id
            .or_else(|| self.form.as_ref().and_then(|form| form.id))
    }
}

/// Embedded reference to the submission's form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormRef {
    #[serde(default, deserialize_with = "scalar::id")]
    pub id: Option<u64>,
}

/// One answer within a submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "scalar::id")]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Response {
    /// The value, unless it is empty or zero-equivalent
    pub fn answered_value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|value| scalar::is_truthy(value))
    }
}
