//! Reassembly of a flat submission into form-ordered sections

use std::collections::HashMap;

use tracing::{debug, warn};

use super::date::format_timestamp;
use super::heuristics;
use super::schema::SchemaIndex;
use crate::model::{
    Response, ResponseNode, SectionList, SectionNode, Submission, TransformedDocument,
};

/// How many unmapped responses are itemized in the log
const UNMAPPED_LOG_LIMIT: usize = 10;

/// A response whose entry id is unknown to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedResponse {
    pub entry_id: Option<u64>,
    pub label: Option<String>,
}

/// Mapping statistics for one transformation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformDiagnostics {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: Vec<UnmappedResponse>,
}

#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub document: TransformedDocument,
    pub diagnostics: TransformDiagnostics,
}

/// A mapped response with the positions it is ordered by
struct Placed {
    node: ResponseNode,
    position: i64,
    sheet_position: i64,
}

struct SheetGroup<'a> {
    name: &'a str,
    responses: Vec<Placed>,
}

impl SheetGroup<'_> {
    fn order_key(&self) -> i64 {
        self.responses
            .iter()
            .map(|placed| placed.sheet_position)
            .min()
            .unwrap_or_default()
    }
}

/// Rebuild `submission` along the sections and sheets of `index`.
///
/// Responses whose entry is not in the form are left out of the document
/// and reported through the returned diagnostics.
pub fn transform(submission: &Submission, index: &SchemaIndex) -> TransformOutcome {
    let mut groups: HashMap<&str, Vec<SheetGroup<'_>>> = HashMap::new();
    let mut diagnostics = TransformDiagnostics {
        total: submission.responses.len(),
        ..Default::default()
    };

    for response in &submission.responses {
        let Some(location) = response.entry_id.and_then(|id| index.get(id)) else {
            diagnostics.unmapped.push(UnmappedResponse {
                entry_id: response.entry_id,
                label: response.label.clone(),
            });
            continue;
        };

        let placed = Placed {
            node: response_node(response, &location.guid, &location.label),
            position: location.entry_position,
            sheet_position: location.sheet_position,
        };
        debug!(
            "Mapped entry {:?} to '{}' / '{}'",
            response.entry_id, location.section_name, location.sheet_name
        );

        let sheets = groups.entry(location.section_name.as_str()).or_default();
        match sheets.iter_mut().find(|sheet| sheet.name == location.sheet_name) {
            Some(sheet) => sheet.responses.push(placed),
            None => sheets.push(SheetGroup {
                name: &location.sheet_name,
                responses: vec![placed],
            }),
        }
        diagnostics.mapped += 1;
    }

    report_unmapped(&submission.id, &diagnostics);

    let mut sections = Vec::new();
    for section in &index.section_order {
        let Some(mut sheets) = groups.remove(section.name.as_str()) else {
            continue;
        };
        sheets.sort_by_key(SheetGroup::order_key);

        for mut sheet in sheets {
            sheet.responses.sort_by_key(|placed| placed.position);
            let responses = sheet.responses.into_iter().map(|placed| placed.node).collect();
            sections.push(SectionNode::new(section.name.as_str(), sheet.name, responses));
        }
    }

    for node in &sections {
        debug!(
            "Section '{}' / '{}': {} responses",
            node.name,
            node.sheet_name(),
            node.responses().len()
        );
    }

    let inferred = heuristics::infer(&submission.responses);
    let document = TransformedDocument {
        date: format_timestamp(&submission.created_at),
        device_date: inferred.device_date,
        first_name: inferred.first_name,
        form: index.form.clone(),
        id: submission.id.clone(),
        last_name: inferred.last_name,
        number: submission.submission_number.clone(),
        response_id: submission.client_guid.clone(),
        sections: SectionList { items: sections },
        submission_number: Some(submission.submission_number.clone()).filter(|n| !n.is_empty()),
        user_name: inferred.user_name,
    };

    TransformOutcome {
        document,
        diagnostics,
    }
}

fn response_node(response: &Response, guid: &str, schema_label: &str) -> ResponseNode {
    ResponseNode {
        guid: guid.to_string(),
        label: response
            .label
            .clone()
            .unwrap_or_else(|| schema_label.to_string()),
        kind: response.kind.clone().unwrap_or_default(),
        value: response.answered_value().cloned(),
    }
}

fn report_unmapped(submission_id: &str, diagnostics: &TransformDiagnostics) {
    debug!(
        "Submission {submission_id}: {} responses, {} mapped, {} unmapped",
        diagnostics.total,
        diagnostics.mapped,
        diagnostics.unmapped.len()
    );
    if diagnostics.unmapped.is_empty() {
        return;
    }
    warn!(
        "Submission {submission_id}: found {} unmapped responses",
        diagnostics.unmapped.len()
    );
    for unmapped in diagnostics.unmapped.iter().take(UNMAPPED_LOG_LIMIT) {
        warn!(
            "  entry_id: {:?}, label: {:?}",
            unmapped.entry_id, unmapped.label
        );
    }
}
