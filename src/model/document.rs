//! The reshaped submission document
//!
//! Field names and nesting follow the legacy export layout consumed
//! downstream, so most fields carry explicit serde renames.

use serde::Serialize;
use serde_json::{Map, Value};

use super::FormIdentity;

/// A submission regrouped under its form's sections and sheets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedDocument {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "DeviceDate")]
    pub device_date: Option<Value>,
    #[serde(rename = "FirstName")]
    pub first_name: Option<Value>,
    #[serde(rename = "Form")]
    pub form: FormIdentity,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "LastName")]
    pub last_name: Option<Value>,
    #[serde(rename = "No.")]
    pub number: String,
    #[serde(rename = "ResponseID")]
    pub response_id: String,
    #[serde(rename = "Sections")]
    pub sections: SectionList,
    #[serde(rename = "SubmissionNumber", skip_serializing_if = "Option::is_none")]
    pub submission_number: Option<String>,
    #[serde(rename = "UserName", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionList {
    #[serde(rename = "Section")]
    pub items: Vec<SectionNode>,
}

/// One (section, sheet) pair of the output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectionNode {
    pub name: String,
    pub screens: Screens,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Screens {
    pub screen: Screen,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Screen {
    pub name: String,
    pub response_groups: Map<String, Value>,
    pub responses: Responses,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Responses {
    #[serde(rename = "Response")]
    pub items: Vec<ResponseNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseNode {
    pub guid: String,
    pub label: String,
    #[serde(rename = "Type")]
    pub kind: String,
    /// `None` for blank answers; serialized as an explicit `null`
    pub value: Option<Value>,
}

impl SectionNode {
    pub fn new(section: impl Into<String>, sheet: impl Into<String>, responses: Vec<ResponseNode>) -> Self {
        Self {
            name: section.into(),
            screens: Screens {
                screen: Screen {
                    name: sheet.into(),
                    response_groups: Map::new(),
                    responses: Responses { items: responses },
                },
            },
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.screens.screen.name
    }

    pub fn responses(&self) -> &[ResponseNode] {
        &self.screens.screen.responses.items
    }
}
