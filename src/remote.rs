use std::collections::BTreeMap;
use std::future::Future;

use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::gateway::{Gateway, GatewayResult, PAGE_SIZE};
use crate::model::remote::{Member, Milestone, Project, RemoteIssue};

/// Request pages starting at 0 until one comes back shorter than
/// [`PAGE_SIZE`], concatenating the results.
pub async fn fetch_all<T, F, Fut>(kind: &str, mut fetch_page: F) -> GatewayResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = GatewayResult<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 0;
    loop {
        let batch = fetch_page(page).await?;
        let has_more = batch.len() >= PAGE_SIZE;
        items.extend(batch);
        debug!(kind, page, total = items.len(), "fetched page");
        if !has_more {
            return Ok(items);
        }
        page += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence<'a> {
    Existing(&'a RemoteIssue),
    Missing,
}

/// Remote issues keyed by project-scoped number.
#[derive(Debug, Clone, Default)]
pub struct IssueIndex {
    issues: BTreeMap<u64, RemoteIssue>,
}

impl IssueIndex {
    pub fn from_issues(issues: impl IntoIterator<Item = RemoteIssue>) -> Self {
        let mut index = Self::default();
        for issue in issues {
            index.register(issue);
        }
        index
    }

    pub fn lookup(&self, iid: u64) -> Existence<'_> {
        match self.issues.get(&iid) {
            Some(issue) => Existence::Existing(issue),
            None => Existence::Missing,
        }
    }

    /// Last write wins.
    pub fn register(&mut self, issue: RemoteIssue) {
        self.issues.insert(issue.iid, issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}

/// Everything read from GitLab before the first write.
#[derive(Debug, Clone)]
pub struct RemoteState {
    pub project: Project,
    pub members: Vec<Member>,
    pub milestones: Vec<Milestone>,
    pub index: IssueIndex,
}

impl RemoteState {
    pub async fn load(gateway: &dyn Gateway, project_path: &str) -> Result<Self> {
        let project = find_project(gateway, project_path).await?;
        let project_id = project.id;
        info!(project = %project.path_with_namespace, id = project_id, "found project");

        let members = fetch_all("members", |page| gateway.list_members(project_id, page))
            .await
            .map_err(|e| MigrateError::remote("listing project members", e))?;
        let milestones = fetch_all("milestones", |page| {
            gateway.list_milestones(project_id, page)
        })
        .await
        .map_err(|e| MigrateError::remote("listing milestones", e))?;
        let issues = fetch_all("issues", |page| gateway.list_issues(project_id, page))
            .await
            .map_err(|e| MigrateError::remote("listing issues", e))?;

        let index = IssueIndex::from_issues(issues);
        info!(
            members = members.len(),
            milestones = milestones.len(),
            issues = index.len(),
            "loaded remote state"
        );

        Ok(Self {
            project,
            members,
            milestones,
            index,
        })
    }
}

async fn find_project(gateway: &dyn Gateway, path: &str) -> Result<Project> {
    let search = path.rsplit('/').next().unwrap_or(path);
    let projects = fetch_all("projects", |page| gateway.list_projects(search, page))
        .await
        .map_err(|e| MigrateError::remote("listing projects", e))?;
    projects
        .into_iter()
        .find(|p| p.path_with_namespace == path)
        .ok_or_else(|| MigrateError::ProjectNotFound(path.to_string()))
}
