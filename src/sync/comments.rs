use futures::future::join_all;
use tracing::warn;

use crate::error::{MigrateError, Result};
use crate::gateway::Gateway;
use crate::mapping::normalize::{is_imported, normalize_timestamp};
use crate::mapping::{extract_comments, IdentityResolver};
use crate::model::remote::{NotePayload, Written};
use crate::model::source::SourceIssue;
use crate::remote::fetch_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thread {
    /// Just created; nothing to clear.
    New,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// Dry run.
    Skipped,
    /// The operator may not delete this note; left in place.
    Forbidden,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub deleted: usize,
    /// Deletions acknowledged but not sent (dry run).
    pub skipped: usize,
    pub forbidden: usize,
    pub created: usize,
}

/// Delete previously imported notes, then post one note per Mantis comment
/// as its author.
pub async fn refresh(
    gateway: &dyn Gateway,
    project_id: u64,
    identities: &IdentityResolver,
    record: &SourceIssue,
    thread: Thread,
) -> Result<RefreshSummary> {
    let iid = record.id;
    let mut summary = RefreshSummary::default();

    if thread == Thread::Existing {
        let notes = fetch_all("notes", |page| gateway.list_notes(project_id, iid, page))
            .await
            .map_err(|e| MigrateError::remote(format!("listing notes of issue {iid}"), e))?;

        let deletions = notes
            .iter()
            .filter(|note| is_imported(&note.body))
            .map(|note| delete_note(gateway, project_id, iid, note.id));
        for deletion in join_all(deletions).await {
            match deletion? {
                Deletion::Deleted => summary.deleted += 1,
                Deletion::Skipped => summary.skipped += 1,
                Deletion::Forbidden => summary.forbidden += 1,
            }
        }
    }

    let comments = extract_comments(record)?;
    if comments.is_empty() {
        return Ok(summary);
    }

    let creations = comments.iter().map(|comment| {
        let sudo = identities.identity_for(comment.author.as_deref()).sudo();
        let note = NotePayload {
            body: comment.body.clone(),
            created_at: Some(normalize_timestamp(&comment.created_at)),
        };
        async move { gateway.create_note(project_id, iid, &note, sudo).await }
    });
    for created in join_all(creations).await {
        created.map_err(|e| MigrateError::remote(format!("adding note to issue {iid}"), e))?;
        summary.created += 1;
    }

    Ok(summary)
}

async fn delete_note(
    gateway: &dyn Gateway,
    project_id: u64,
    iid: u64,
    note_id: u64,
) -> Result<Deletion> {
    match gateway.delete_note(project_id, iid, note_id).await {
        Ok(Written::Applied(())) => Ok(Deletion::Deleted),
        Ok(Written::Skipped(_)) => Ok(Deletion::Skipped),
        Err(e) if e.is_forbidden() => {
            warn!(issue = iid, note = note_id, "not permitted to delete imported note; keeping it");
            Ok(Deletion::Forbidden)
        }
        Err(e) => Err(MigrateError::remote(
            format!("deleting note {note_id} of issue {iid}"),
            e,
        )),
    }
}
