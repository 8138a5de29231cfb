use serde::{Deserialize, Serialize};

use super::table::{columns, Row};

const CRITERIA_DELIMITER: char = ';';

/// One item of an issue's acceptance-criteria checklist, in the checklist field's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub id: usize,
    pub name: String,
    pub is_header: bool,
    pub mandatory: bool,
    pub assignee_ids: Vec<String>,
    pub rank: u32,
    pub status: Option<String>,
}

impl ChecklistEntry {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_header: false,
            mandatory: true,
            assignee_ids: Vec::new(),
            rank: 0,
            status: None,
        }
    }
}

/// Split semicolon-delimited acceptance criteria into checklist entries.
///
/// Segments are kept verbatim, so `Some("")` yields a single empty entry. Rows never hit that
/// case because [`Row::field`] already maps an empty cell to `None`.
pub fn encode_criteria(criteria: Option<&str>) -> Vec<ChecklistEntry> {
    match criteria {
        None => Vec::new(),
        Some(text) => text
            .split(CRITERIA_DELIMITER)
            .enumerate()
            .map(|(i, segment)| ChecklistEntry::new(i, segment))
            .collect(),
    }
}

/// Everything needed to create one issue, independent of the tracker's field keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePayload {
    pub project_key: Option<String>,
    pub issue_type_id: String,
    pub product_owner: Option<String>,
    pub team_id: Option<String>,
    pub epic: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub checklist: Vec<ChecklistEntry>,
}

impl IssuePayload {
    pub fn from_row(row: &Row, issue_type_id: &str) -> Self {
        let owned = |column: &str| row.field(column).map(String::from);
        Self {
            project_key: owned(columns::PROJECT_KEY),
            issue_type_id: issue_type_id.to_string(),
            product_owner: owned(columns::PRODUCT_OWNER),
            team_id: owned(columns::TEAM_ID),
            epic: owned(columns::EPIC),
            summary: owned(columns::SUMMARY),
            description: owned(columns::DESCRIPTION),
            checklist: encode_criteria(row.field(columns::ACCEPTANCE_CRITERIA)),
        }
    }
}
