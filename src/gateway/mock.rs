use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Gateway, GatewayResult, PAGE_SIZE};
use crate::error::GatewayError;
use crate::model::remote::{
    IssuePayload, Member, Milestone, Note, NotePayload, Project, RemoteIssue, StateEvent, Written,
};

#[derive(Default)]
pub struct MockState {
    pub projects: Vec<Project>,
    pub members: Vec<Member>,
    pub milestones: Vec<Milestone>,
    pub issues: BTreeMap<u64, RemoteIssue>,
    pub notes: HashMap<u64, Vec<Note>>,
    pub calls: Vec<String>,
    pub next_id: u64,
    pub fail_create: HashSet<u64>,
    pub fail_update: bool,
    pub fail_close: bool,
    pub fail_note_create: bool,
    pub delete_status: Option<u16>,
}

/// In-memory GitLab project.
#[derive(Clone, Default)]
pub struct MockGateway {
    pub state: Arc<Mutex<MockState>>,
}

pub const PROJECT_ID: u64 = 42;

impl MockGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.state.lock().unwrap();
            state.next_id = 1000;
            state.projects = vec![
                Project {
                    id: 7,
                    path_with_namespace: "other/tracker".into(),
                },
                Project {
                    id: PROJECT_ID,
                    path_with_namespace: "acme/tracker".into(),
                },
            ];
        }
        gateway
    }

    pub fn with_members(self, usernames: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.members = usernames
                .iter()
                .enumerate()
                .map(|(i, name)| Member {
                    id: 100 + i as u64,
                    username: name.to_string(),
                    name: name.to_string(),
                })
                .collect();
        }
        self
    }

    pub fn with_issue(self, iid: u64, state_name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.issues.insert(
                iid,
                RemoteIssue {
                    id: 500 + iid,
                    iid,
                    title: format!("Existing {iid}"),
                    state: state_name.to_string(),
                },
            );
        }
        self
    }

    pub fn with_note(self, iid: u64, id: u64, body: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.notes.entry(iid).or_default().push(Note {
                id,
                body: body.to_string(),
            });
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn note_bodies(&self, iid: u64) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .notes
            .get(&iid)
            .map(|notes| notes.iter().map(|n| n.body.clone()).collect())
            .unwrap_or_default()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn page_of<T: Clone>(items: &[T], page: u32) -> Vec<T> {
    items
        .iter()
        .skip(page as usize * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect()
}

fn rejected(method: &str, path: String, status: u16) -> GatewayError {
    GatewayError::Status {
        method: method.to_string(),
        path,
        status,
        body: "mock rejection".into(),
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn list_projects(&self, search: &str, page: u32) -> GatewayResult<Vec<Project>> {
        self.record(format!("list_projects {search} page={page}"));
        let state = self.state.lock().unwrap();
        let matching: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.path_with_namespace.contains(search))
            .cloned()
            .collect();
        Ok(page_of(&matching, page))
    }

    async fn list_members(&self, _project_id: u64, page: u32) -> GatewayResult<Vec<Member>> {
        self.record(format!("list_members page={page}"));
        Ok(page_of(&self.state.lock().unwrap().members, page))
    }

    async fn list_milestones(&self, _project_id: u64, page: u32) -> GatewayResult<Vec<Milestone>> {
        self.record(format!("list_milestones page={page}"));
        Ok(page_of(&self.state.lock().unwrap().milestones, page))
    }

    async fn list_issues(&self, _project_id: u64, page: u32) -> GatewayResult<Vec<RemoteIssue>> {
        self.record(format!("list_issues page={page}"));
        let state = self.state.lock().unwrap();
        let issues: Vec<RemoteIssue> = state.issues.values().cloned().collect();
        Ok(page_of(&issues, page))
    }

    async fn list_notes(&self, _project_id: u64, iid: u64, page: u32) -> GatewayResult<Vec<Note>> {
        self.record(format!("list_notes {iid} page={page}"));
        let state = self.state.lock().unwrap();
        let notes = state.notes.get(&iid).cloned().unwrap_or_default();
        Ok(page_of(&notes, page))
    }

    async fn create_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<RemoteIssue>> {
        self.record(format!(
            "create_issue {} sudo={}",
            payload.iid,
            sudo.unwrap_or("-")
        ));
        let mut state = self.state.lock().unwrap();
        let path = format!("/projects/{project_id}/issues");
        if state.fail_create.contains(&payload.iid) {
            return Err(rejected("POST", path, 400));
        }
        if state.issues.contains_key(&payload.iid) {
            return Err(rejected("POST", path, 409));
        }
        state.next_id += 1;
        let issue = RemoteIssue {
            id: state.next_id,
            iid: payload.iid,
            title: payload.title.clone(),
            state: "opened".into(),
        };
        state.issues.insert(payload.iid, issue.clone());
        Ok(Written::Applied(issue))
    }

    async fn update_issue(
        &self,
        project_id: u64,
        payload: &IssuePayload,
        state_event: StateEvent,
    ) -> GatewayResult<Written<RemoteIssue>> {
        let event = match state_event {
            StateEvent::Close => "close",
            StateEvent::Reopen => "reopen",
        };
        self.record(format!("update_issue {} {event}", payload.iid));
        let mut state = self.state.lock().unwrap();
        let path = format!("/projects/{project_id}/issues/{}", payload.iid);
        if state.fail_update {
            return Err(rejected("PUT", path, 500));
        }
        let issue = state
            .issues
            .get_mut(&payload.iid)
            .ok_or_else(|| rejected("PUT", path, 404))?;
        issue.title = payload.title.clone();
        issue.state = match state_event {
            StateEvent::Close => "closed".into(),
            StateEvent::Reopen => "opened".into(),
        };
        Ok(Written::Applied(issue.clone()))
    }

    async fn close_issue(&self, project_id: u64, iid: u64) -> GatewayResult<Written<RemoteIssue>> {
        self.record(format!("close_issue {iid}"));
        let mut state = self.state.lock().unwrap();
        let path = format!("/projects/{project_id}/issues/{iid}");
        if state.fail_close {
            return Err(rejected("PUT", path, 500));
        }
        let issue = state
            .issues
            .get_mut(&iid)
            .ok_or_else(|| rejected("PUT", path, 404))?;
        issue.state = "closed".into();
        Ok(Written::Applied(issue.clone()))
    }

    async fn delete_note(
        &self,
        project_id: u64,
        iid: u64,
        note_id: u64,
    ) -> GatewayResult<Written<()>> {
        self.record(format!("delete_note {iid}/{note_id}"));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.delete_status {
            return Err(rejected(
                "DELETE",
                format!("/projects/{project_id}/issues/{iid}/notes/{note_id}"),
                status,
            ));
        }
        if let Some(notes) = state.notes.get_mut(&iid) {
            notes.retain(|n| n.id != note_id);
        }
        Ok(Written::Applied(()))
    }

    async fn create_note(
        &self,
        project_id: u64,
        iid: u64,
        note: &NotePayload,
        sudo: Option<&str>,
    ) -> GatewayResult<Written<Note>> {
        self.record(format!("create_note {iid} sudo={}", sudo.unwrap_or("-")));
        let mut state = self.state.lock().unwrap();
        if state.fail_note_create {
            return Err(rejected(
                "POST",
                format!("/projects/{project_id}/issues/{iid}/notes"),
                500,
            ));
        }
        state.next_id += 1;
        let created = Note {
            id: state.next_id,
            body: note.body.clone(),
        };
        state.notes.entry(iid).or_default().push(created.clone());
        Ok(Written::Applied(created))
    }
}
