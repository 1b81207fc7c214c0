//! Form definitions as returned by `GET forms/{id}`

use serde::{Deserialize, Serialize};

use super::scalar;

/// A nested form definition: sections, then sheets, then entries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormDefinition {
    #[serde(default, deserialize_with = "scalar::string")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub status: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar::list")]
    pub sections: Vec<FormSection>,
}

impl FormDefinition {
    pub fn identity(&self) -> FormIdentity {
        FormIdentity {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status.clone(),
            version: self.version.clone(),
        }
    }
}

/// Top-level grouping of a form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSection {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "scalar::list")]
    pub sheets: Vec<FormSheet>,
}

impl FormSection {
    /// Display name; the service carries it in `description`
    pub fn title(&self) -> &str {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// A screen within a section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSheet {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "scalar::list")]
    pub entries: Vec<FormEntry>,
}

impl FormSheet {
    pub fn title(&self) -> &str {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// A single question definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormEntry {
    #[serde(default, deserialize_with = "scalar::id")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "scalar::string")]
    pub guid: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub label: String,
    #[serde(default, deserialize_with = "scalar::position")]
    pub position: i64,
}

/// Identity block copied into every reshaped document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FormIdentity {
    pub id: String,
    pub name: String,
    pub status: String,
    pub version: String,
}
