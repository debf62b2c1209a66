pub mod gitlab;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use tracing::info;

use crate::error::GatewayError;
use crate::model::remote::{
    IssuePayload, Member, Milestone, NoOp, Note, NotePayload, Project, RemoteIssue, StateEvent,
    Written,
};

/// Page size for every listing request.
pub const PAGE_SIZE: usize = 100;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// The only path to the GitLab API.
///
/// Listing methods take a zero-based page index. Write methods take the
/// identity to act as (`sudo`) per call, so concurrent requests never share
/// delegation state.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_projects(&self, search: &str, page: u32) -> GatewayResult<Vec<Project>>;
    async fn list_members(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Member>>;
    async fn list_milestones(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Milestone>>;
    async fn list_issues(&self, project_id: u64, page: u32) -> GatewayResult<Vec<RemoteIssue>>;
    async fn list_notes(&self, project_id: u64, iid: u64, page: u32) -> GatewayResult<Vec<Note>>;

    async fn create_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<RemoteIssue>>;
    async fn update_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        state: StateEvent,
    ) -> GatewayResult<Written<RemoteIssue>>;
    async fn close_issue(&self, project_id: u64, iid: u64) -> GatewayResult<Written<RemoteIssue>>;
    async fn delete_note(
        &self,
        project_id: u64,
        iid: u64,
        note_id: u64,
    ) -> GatewayResult<Written<()>>;
    async fn create_note(
        &self,
        project_id: u64,
        iid: u64,
        note: &NotePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<Note>>;
}

/// Forwards reads to the wrapped gateway and acknowledges writes without
/// sending them.
pub struct DryRun<G> {
    inner: G,
}

impl<G: Gateway> DryRun<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    fn skip<T>(action: &str, target: String) -> GatewayResult<Written<T>> {
        let ack = NoOp {
            action: action.to_string(),
            target,
        };
        info!(action = %ack.action, target = %ack.target, "dry run: skipped write");
        Ok(Written::Skipped(ack))
    }
}

#[async_trait]
impl<G: Gateway> Gateway for DryRun<G> {
    async fn list_projects(&self, search: &str, page: u32) -> GatewayResult<Vec<Project>> {
        self.inner.list_projects(search, page).await
    }

    async fn list_members(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Member>> {
        self.inner.list_members(project_id, page).await
    }

    async fn list_milestones(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Milestone>> {
        self.inner.list_milestones(project_id, page).await
    }

    async fn list_issues(&self, project_id: u64, page: u32) -> GatewayResult<Vec<RemoteIssue>> {
        self.inner.list_issues(project_id, page).await
    }

    async fn list_notes(&self, project_id: u64, iid: u64, page: u32) -> GatewayResult<Vec<Note>> {
        self.inner.list_notes(project_id, iid, page).await
    }

    async fn create_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        _sudo: Option<&str>,
    ) -> GatewayResult<Written<RemoteIssue>> {
        Self::skip("create_issue", format!("{project_id}#{}", payload.iid))
    }

    async fn update_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        state: StateEvent,
    ) -> GatewayResult<Written<RemoteIssue>> {
        let action = match state {
            StateEvent::Close => "update_issue(close)",
            StateEvent::Reopen => "update_issue(reopen)",
        };
        Self::skip(action, format!("{project_id}#{}", payload.iid))
    }

    async fn close_issue(&self, project_id: u64, iid: u64) -> GatewayResult<Written<RemoteIssue>> {
        Self::skip("close_issue", format!("{project_id}#{iid}"))
    }

    async fn delete_note(
        &self,
        project_id: u64,
        iid: u64,
        note_id: u64,
    ) -> GatewayResult<Written<()>> {
        Self::skip("delete_note", format!("{project_id}#{iid}/notes/{note_id}"))
    }

    async fn create_note(
        &self,
        project_id: u64,
        iid: u64,
        _note: &NotePayload,
        _sudo: Option<&str>,
    ) -> GatewayResult<Written<Note>> {
        Self::skip("create_note", format!("{project_id}#{iid}"))
    }
}

#[cfg(test)]
mod tests;
