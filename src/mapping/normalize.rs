use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::identity::IdentityResolver;
use super::taxonomy::TaxonomyMapper;
use crate::error::{MigrateError, Result};
use crate::model::remote::{AuthorRef, IssuePayload};
use crate::model::source::{present, SourceIssue};

/// Prefix of every imported note body. Thread refresh only deletes notes
/// that start with it.
pub const ATTRIBUTION_MARKER: &str = "via Mantis:";

pub const NOTE_DELIMITER: &str = "$$$$";

static NOTE_RE: LazyLock<Regex> =
    LazyLock::new(
        || match Regex::new(r"(?s)^\s*([^\]\[]+?)\s*\]\[([^\]\[]*)\]\[(.*)$") {
            Ok(re) => re,
            Err(_) => unreachable!("static regex pattern"),
        },
    );

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub created_at: String,
    pub author: Option<String>,
    /// Already carries the attribution marker.
    pub body: String,
}

/// Split the `$$$$`-delimited notes column into comments.
///
/// Every non-blank chunk must look like `<timestamp>][<author>][<body>`.
pub fn extract_comments(record: &SourceIssue) -> Result<Vec<CommentEntry>> {
    let Some(notes) = record.notes.as_deref().and_then(present) else {
        return Ok(Vec::new());
    };

    notes
        .split(NOTE_DELIMITER)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| -> Result<CommentEntry> {
            let caps = NOTE_RE
                .captures(chunk)
                .ok_or_else(|| MigrateError::MalformedNotes {
                    issue: record.id,
                    chunk: chunk.to_string(),
                })?;
            let author = caps[2].trim();
            Ok(CommentEntry {
                created_at: caps[1].to_string(),
                author: present(author).map(String::from),
                body: format!("{ATTRIBUTION_MARKER} {}", caps[3].trim()),
            })
        })
        .collect()
}

pub fn is_imported(body: &str) -> bool {
    body.starts_with(ATTRIBUTION_MARKER)
}

/// RFC 3339 when the value is a recognizable date, otherwise unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.to_rfc3339();
    }
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Some(dt) = raw.parse::<i64>().ok().and_then(|s| DateTime::from_timestamp(s, 0)) {
            return dt.to_rfc3339();
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return dt.and_utc().to_rfc3339();
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.and_utc().to_rfc3339();
    }
    raw.to_string()
}

/// Builds GitLab issue payloads from Mantis rows.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    source_url: Option<String>,
}

impl Normalizer {
    pub fn new(source_url: Option<&str>) -> Self {
        Self {
            source_url: source_url
                .and_then(present)
                .map(|url| url.trim().trim_end_matches('/').to_string()),
        }
    }

    /// Header mentions carry the Mantis usernames as exported.
    pub fn description(&self, record: &SourceIssue) -> String {
        let mut header = vec![match &self.source_url {
            Some(url) => format!("[Mantis Issue {id}]({url}/view.php?id={id})", id = record.id),
            None => format!("Mantis Issue {}", record.id),
        }];
        if let Some(reporter) = record.reporter.as_deref().and_then(present) {
            header.push(format!("Reported By: @{reporter}"));
        }
        if let Some(assignee) = record.assignee.as_deref().and_then(present) {
            header.push(format!("Assigned To: @{assignee}"));
        }
        if let Some(created) = record.created_at.as_deref().and_then(present) {
            header.push(format!("Created: {created}"));
        }
        if let Some(updated) = record.updated_at.as_deref().and_then(present) {
            header.push(format!("Updated: {updated}"));
        }

        let mut text = format!("_{}_\n\n---\n\n{}\n\n", header.join(", "), record.description);
        if let Some(info) = record.info.as_deref().and_then(present) {
            text.push_str("---\n\n**Info:**\n\n");
            text.push_str(info);
            text.push('\n');
        }
        text
    }

    pub fn to_issue_payload(
        &self,
        record: &SourceIssue,
        identities: &IdentityResolver,
        taxonomy: &TaxonomyMapper,
    ) -> IssuePayload {
        let reporter = identities.identity_for(record.reporter.as_deref());
        let assignee = identities.identity_for(record.assignee.as_deref());

        IssuePayload {
            iid: record.id,
            title: record.summary.clone(),
            description: self.description(record),
            assignee_id: assignee.account_id,
            milestone_id: taxonomy.milestone_id_for(&record.target_version),
            created_at: record.created_at.as_deref().map(normalize_timestamp),
            labels: taxonomy.labels_for(record),
            author: AuthorRef {
                username: reporter.gitlab_username.clone(),
                name: reporter.display_name.clone(),
            },
        }
    }
}
