use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MigrateError, Result};

/// One row of the Mantis CSV export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIssue {
    pub id: u64,
    pub summary: String,
    pub description: String,
    pub info: Option<String>,
    pub notes: Option<String>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
    pub category_id: String,
    pub priority: String,
    pub severity: String,
    pub status: String,
    pub target_version: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Summary", default)]
    summary: String,
    #[serde(rename = "CategoryId", default)]
    category_id: String,
    #[serde(rename = "Priority", default)]
    priority: String,
    #[serde(rename = "Severity", default)]
    severity: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Created", default)]
    created: String,
    #[serde(rename = "Updated", default)]
    updated: String,
    #[serde(rename = "TargetVersion", default)]
    target_version: String,
    #[serde(rename = "Reporter", default)]
    reporter: String,
    #[serde(rename = "Assigned To", default)]
    assigned_to: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Info", default)]
    info: String,
    #[serde(rename = "Notes", default)]
    notes: String,
    #[serde(rename = "Tags", default)]
    tags: String,
}

/// Mantis writes `NULL` for empty columns; both spellings mean "absent".
pub fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "NULL" {
        None
    } else {
        Some(value)
    }
}

fn optional(value: String) -> Option<String> {
    present(&value).is_some().then_some(value)
}

impl CsvRow {
    fn into_issue(self, row: usize, path: &Path) -> Result<SourceIssue> {
        let id = self
            .id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                MigrateError::config(path, format!("row {row}: invalid issue id {:?}", self.id))
            })?;

        let tags = present(&self.tags)
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(SourceIssue {
            id,
            summary: self.summary,
            description: self.description,
            info: optional(self.info),
            notes: optional(self.notes),
            reporter: optional(self.reporter),
            assignee: optional(self.assigned_to),
            category_id: self.category_id,
            priority: self.priority,
            severity: self.severity,
            status: self.status,
            target_version: self.target_version,
            created_at: optional(self.created),
            updated_at: optional(self.updated),
            tags,
        })
    }
}

/// Read the export, sorted by ascending id, keeping only ids `>= from`.
pub fn load_issues(path: &Path, from: u64) -> Result<Vec<SourceIssue>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| MigrateError::config(path, format!("cannot open export: {e}")))?;
    parse_rows(&mut reader, path, from)
}

fn parse_rows<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    path: &Path,
    from: u64,
) -> Result<Vec<SourceIssue>> {
    let mut issues = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let row_number = index + 2;
        let row = row.map_err(|e| MigrateError::config(path, format!("row {row_number}: {e}")))?;
        issues.push(row.into_issue(row_number, path)?);
    }

    issues.sort_by_key(|issue| issue.id);
    let mut seen = HashSet::new();
    if let Some(dup) = issues.iter().find(|issue| !seen.insert(issue.id)) {
        return Err(MigrateError::config(
            path,
            format!("issue id {} appears more than once", dup.id),
        ));
    }

    issues.retain(|issue| issue.id >= from);
    Ok(issues)
}
