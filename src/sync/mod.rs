//! Replays the Mantis export onto the GitLab project, one record at a time.
//!
//! Each record is either updated in place (its number already exists
//! remotely) or created with its Mantis id as the GitLab issue number. Imported
//! notes are then refreshed so repeated runs converge on the same thread.

pub mod comments;
pub mod validate;

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use crate::gateway::Gateway;
use crate::mapping::{IdentityResolver, Normalizer, TaxonomyMapper};
use crate::model::remote::{IssuePayload, Project, RemoteIssue, StateEvent, Written};
use crate::model::source::SourceIssue;
use crate::remote::{Existence, IssueIndex, RemoteState};

use comments::Thread;

/// Lookup tables and remote inventory for one run.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub project: Project,
    pub identities: IdentityResolver,
    pub taxonomy: TaxonomyMapper,
    pub normalizer: Normalizer,
    index: IssueIndex,
}

impl SyncContext {
    pub fn new(config: &MigrationConfig, remote: RemoteState) -> Self {
        let mut identities = IdentityResolver::from_config(&config.users);
        let unmatched_users = identities.match_members(&remote.members);

        let mut taxonomy = TaxonomyMapper::from_config(config);
        let missing_milestones = taxonomy.cross_check_milestones(&remote.milestones);
        info!(
            unmatched_users,
            missing_milestones = ?missing_milestones,
            "checked mappings against remote state"
        );

        Self {
            project: remote.project,
            identities,
            taxonomy,
            normalizer: Normalizer::new(config.mantis_url.as_deref()),
            index: remote.index,
        }
    }

    #[cfg(test)]
    pub fn index(&self) -> &IssueIndex {
        &self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Updated,
    Inserted,
    InsertedAndClosed,
    /// Create was rejected; the record was skipped.
    InsertFailed,
    /// Created, but left open because the close request failed.
    CloseFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: usize,
    pub inserted: usize,
    pub inserted_and_closed: usize,
    pub insert_failed: usize,
    pub close_failed: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: RecordOutcome) {
        let counter = match outcome {
            RecordOutcome::Updated => &mut self.updated,
            RecordOutcome::Inserted => &mut self.inserted,
            RecordOutcome::InsertedAndClosed => &mut self.inserted_and_closed,
            RecordOutcome::InsertFailed => &mut self.insert_failed,
            RecordOutcome::CloseFailed => &mut self.close_failed,
        };
        *counter += 1;
    }

    pub fn total(&self) -> usize {
        self.updated
            + self.inserted
            + self.inserted_and_closed
            + self.insert_failed
            + self.close_failed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} updated, {} created, {} created closed, {} create failed, {} close failed",
            self.total(),
            self.updated,
            self.inserted,
            self.inserted_and_closed,
            self.insert_failed,
            self.close_failed
        )
    }
}

pub struct Synchronizer<'g> {
    gateway: &'g dyn Gateway,
    ctx: SyncContext,
}

impl<'g> Synchronizer<'g> {
    pub fn new(gateway: &'g dyn Gateway, ctx: SyncContext) -> Self {
        Self { gateway, ctx }
    }

    #[cfg(test)]
    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Validate every referenced username, then process records in
    /// ascending id order. Stops at the first fatal error.
    pub async fn run(&mut self, records: &[SourceIssue]) -> Result<SyncReport> {
        validate::validate_usernames(records, &self.ctx.identities)?;

        let mut ordered: Vec<&SourceIssue> = records.iter().collect();
        ordered.sort_by_key(|record| record.id);

        let mut report = SyncReport::default();
        for record in ordered {
            let outcome = self.sync_record(record).await?;
            info!(issue = record.id, ?outcome, "synchronized");
            report.record(outcome);
        }
        Ok(report)
    }

    pub async fn sync_record(&mut self, record: &SourceIssue) -> Result<RecordOutcome> {
        let payload =
            self.ctx
                .normalizer
                .to_issue_payload(record, &self.ctx.identities, &self.ctx.taxonomy);
        let closed = self.ctx.taxonomy.is_closed(record);

        match self.ctx.index.lookup(record.id) {
            Existence::Existing(issue) => {
                debug!(issue = issue.iid, state = %issue.state, "issue exists; updating");
                self.update(record, &payload, closed).await
            }
            Existence::Missing => self.insert(record, &payload, closed).await,
        }
    }

    async fn update(
        &self,
        record: &SourceIssue,
        payload: &IssuePayload,
        closed: bool,
    ) -> Result<RecordOutcome> {
        self.gateway
            .update_issue(self.ctx.project.id, payload, StateEvent::for_closed(closed))
            .await
            .map_err(|e| MigrateError::remote(format!("updating issue {}", record.id), e))?;
        self.refresh_comments(record, Thread::Existing).await?;
        Ok(RecordOutcome::Updated)
    }

    async fn insert(
        &mut self,
        record: &SourceIssue,
        payload: &IssuePayload,
        closed: bool,
    ) -> Result<RecordOutcome> {
        let project_id = self.ctx.project.id;
        let sudo = self
            .ctx
            .identities
            .identity_for(record.reporter.as_deref())
            .sudo()
            .map(String::from);

        let created = match self
            .gateway
            .create_issue(project_id, payload, sudo.as_deref())
            .await
        {
            Ok(Written::Applied(issue)) => issue,
            Ok(Written::Skipped(ack)) => {
                debug!(%ack, "indexing placeholder for unsent create");
                placeholder(payload)
            }
            Err(e) => {
                error!(issue = record.id, error = %e, "failed to create issue; skipping");
                return Ok(RecordOutcome::InsertFailed);
            }
        };
        self.ctx.index.register(created);

        if closed {
            return match self.gateway.close_issue(project_id, record.id).await {
                Ok(_) => Ok(RecordOutcome::InsertedAndClosed),
                Err(e) => {
                    warn!(issue = record.id, error = %e, "created issue but could not close it");
                    Ok(RecordOutcome::CloseFailed)
                }
            };
        }

        self.refresh_comments(record, Thread::New).await?;
        Ok(RecordOutcome::Inserted)
    }

    async fn refresh_comments(&self, record: &SourceIssue, thread: Thread) -> Result<()> {
        let summary = comments::refresh(
            self.gateway,
            self.ctx.project.id,
            &self.ctx.identities,
            record,
            thread,
        )
        .await?;
        debug!(
            issue = record.id,
            deleted = summary.deleted,
            skipped = summary.skipped,
            forbidden = summary.forbidden,
            created = summary.created,
            "refreshed comments"
        );
        Ok(())
    }
}

/// Stand-in for an issue whose create was not sent (dry run).
fn placeholder(payload: &IssuePayload) -> RemoteIssue {
    RemoteIssue {
        id: 0,
        iid: payload.iid,
        title: payload.title.clone(),
        state: "opened".into(),
    }
}
