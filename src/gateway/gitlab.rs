use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{Gateway, GatewayResult, PAGE_SIZE};
use crate::error::GatewayError;
use crate::model::remote::{
    IssuePayload, Member, Milestone, Note, NotePayload, Project, RemoteIssue, StateEvent, Written,
};

pub struct GitLabGateway {
    api: String,
    token: String,
    client: reqwest::Client,
}

impl GitLabGateway {
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            api: api_root(base_url),
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
        sudo: Option<&str>,
    ) -> GatewayResult<T> {
        debug!(%method, path, sudo = sudo.unwrap_or("-"), "gitlab request");

        let mut request = self
            .client
            .request(method.clone(), format!("{}{path}", self.api))
            .header("PRIVATE-TOKEN", &self.token)
            .query(query);
        if let Some(user) = sudo {
            request = request.header("Sudo", user);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        // DELETE answers 204 with no body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        extra: &[(&str, String)],
    ) -> GatewayResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = page_query(page);
        query.extend(extra.iter().cloned());
        self.call(Method::GET, path, &query, None, None).await
    }
}

/// Normalize a configured instance URL to the v4 API root.
pub fn api_root(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/api/v4") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api/v4")
    }
}

/// GitLab pages are one-based.
pub fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", (page + 1).to_string()),
        ("per_page", PAGE_SIZE.to_string()),
    ]
}

fn issue_body(payload: &IssuePayload) -> GatewayResult<serde_json::Value> {
    Ok(serde_json::to_value(payload)?)
}

#[async_trait]
impl Gateway for GitLabGateway {
    async fn list_projects(&self, search: &str, page: u32) -> GatewayResult<Vec<Project>> {
        self.get_page("/projects", page, &[("search", search.to_string())])
            .await
    }

    async fn list_members(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Member>> {
        self.get_page(&format!("/projects/{project_id}/members/all"), page, &[])
            .await
    }

    async fn list_milestones(&self, project_id: u64, page: u32) -> GatewayResult<Vec<Milestone>> {
        self.get_page(&format!("/projects/{project_id}/milestones"), page, &[])
            .await
    }

    async fn list_issues(&self, project_id: u64, page: u32) -> GatewayResult<Vec<RemoteIssue>> {
        self.get_page(
            &format!("/projects/{project_id}/issues"),
            page,
            &[
                ("scope", "all".to_string()),
                ("order_by", "created_at".to_string()),
            ],
        )
        .await
    }

    async fn list_notes(&self, project_id: u64, iid: u64, page: u32) -> GatewayResult<Vec<Note>> {
        self.get_page(&format!("/projects/{project_id}/issues/{iid}/notes"), page, &[])
            .await
    }

    async fn create_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<RemoteIssue>> {
        let issue = self
            .call(
                Method::POST,
                &format!("/projects/{project_id}/issues"),
                &[],
                Some(issue_body(payload)?),
                sudo,
            )
            .await?;
        Ok(Written::Applied(issue))
    }

    async fn update_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        state: StateEvent,
    ) -> GatewayResult<Written<RemoteIssue>> {
        let mut body = issue_body(payload)?;
        body["state_event"] = serde_json::to_value(state)?;
        let issue = self
            .call(
                Method::PUT,
                &format!("/projects/{project_id}/issues/{}", payload.iid),
                &[],
                Some(body),
                None,
            )
            .await?;
        Ok(Written::Applied(issue))
    }

    async fn close_issue(&self, project_id: u64, iid: u64) -> GatewayResult<Written<RemoteIssue>> {
        let issue = self
            .call(
                Method::PUT,
                &format!("/projects/{project_id}/issues/{iid}"),
                &[],
                Some(json!({ "state_event": StateEvent::Close })),
                None,
            )
            .await?;
        Ok(Written::Applied(issue))
    }

    async fn delete_note(
        &self,
        project_id: u64,
        iid: u64,
        note_id: u64,
    ) -> GatewayResult<Written<()>> {
        self.call::<serde_json::Value>(
            Method::DELETE,
            &format!("/projects/{project_id}/issues/{iid}/notes/{note_id}"),
            &[],
            None,
            None,
        )
        .await?;
        Ok(Written::Applied(()))
    }

    async fn create_note(
        &self,
        project_id: u64,
        iid: u64,
        note: &NotePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<Note>> {
        let created = self
            .call(
                Method::POST,
                &format!("/projects/{project_id}/issues/{iid}/notes"),
                &[],
                Some(serde_json::to_value(note)?),
                sudo,
            )
            .await?;
        Ok(Written::Applied(created))
    }
}
