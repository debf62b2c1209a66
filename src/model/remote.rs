use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RemoteIssue {
    pub id: u64,
    /// Project-scoped issue number; correlates with the Mantis id.
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorRef {
    pub username: Option<String>,
    pub name: String,
}

/// Body of an issue create/update request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssuePayload {
    pub iid: u64,
    pub title: String,
    pub description: String,
    pub assignee_id: Option<u64>,
    #[serde(serialize_with = "empty_when_none")]
    pub milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(serialize_with = "comma_joined")]
    pub labels: Vec<String>,
    pub author: AuthorRef,
}

fn empty_when_none<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(id) => serializer.serialize_u64(*id),
        None => serializer.serialize_str(""),
    }
}

fn comma_joined<S: Serializer>(labels: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&labels.join(","))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StateEvent {
    Close,
    Reopen,
}

impl StateEvent {
    pub fn for_closed(closed: bool) -> Self {
        if closed {
            Self::Close
        } else {
            Self::Reopen
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotePayload {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Acknowledgement returned in place of a write that was not sent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoOp {
    pub action: String,
    pub target: String,
}

impl std::fmt::Display for NoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written<T> {
    Applied(T),
    Skipped(NoOp),
}
