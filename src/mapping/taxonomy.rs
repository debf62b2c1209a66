use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::MigrationConfig;
use crate::model::remote::Milestone;
use crate::model::source::SourceIssue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneMapping {
    pub version: String,
    /// Configured id; this is what goes into payloads.
    pub id: u64,
    pub title: String,
    /// Id of the remote milestone whose title matches, if any.
    pub resolved_id: Option<u64>,
}

/// Mantis category/priority/severity/status/version codes to GitLab labels,
/// state and milestones.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyMapper {
    categories: HashMap<String, String>,
    priorities: HashMap<String, String>,
    severities: HashMap<String, String>,
    closed_statuses: HashMap<String, bool>,
    milestones: HashMap<String, MilestoneMapping>,
}

impl TaxonomyMapper {
    pub fn from_config(config: &MigrationConfig) -> Self {
        let milestones = config
            .version_milestones
            .iter()
            .map(|(version, spec)| {
                let mapping = MilestoneMapping {
                    version: version.clone(),
                    id: spec.id(),
                    title: spec.title().unwrap_or(version.as_str()).to_string(),
                    resolved_id: None,
                };
                (version.clone(), mapping)
            })
            .collect();

        Self {
            categories: config.category_labels.clone(),
            priorities: config.priority_labels.clone(),
            severities: config.severity_labels.clone(),
            closed_statuses: config.closed_statuses.clone(),
            milestones,
        }
    }

    /// Record tags, then category, priority and severity labels when mapped.
    pub fn labels_for(&self, record: &SourceIssue) -> Vec<String> {
        let mut labels = record.tags.clone();
        let mapped = [
            self.categories.get(&record.category_id),
            self.priorities.get(&record.priority),
            self.severities.get(&record.severity),
        ];
        labels.extend(mapped.into_iter().flatten().cloned());
        labels
    }

    pub fn is_closed(&self, record: &SourceIssue) -> bool {
        self.closed_statuses
            .get(&record.status)
            .copied()
            .unwrap_or(false)
    }

    pub fn milestone_id_for(&self, version: &str) -> Option<u64> {
        self.milestones.get(version).map(|m| m.id)
    }

    #[cfg(test)]
    pub fn milestone(&self, version: &str) -> Option<&MilestoneMapping> {
        self.milestones.get(version)
    }

    /// Match configured milestones against the project's milestones by title.
    /// Informational only; returns the versions that found no match.
    pub fn cross_check_milestones(&mut self, remote: &[Milestone]) -> Vec<String> {
        let by_title: HashMap<&str, u64> = remote.iter().map(|m| (m.title.as_str(), m.id)).collect();

        let mut missing = Vec::new();
        for mapping in self.milestones.values_mut() {
            mapping.resolved_id = by_title.get(mapping.title.as_str()).copied();
            match mapping.resolved_id {
                Some(id) if id == mapping.id => {
                    debug!(version = %mapping.version, id, "milestone confirmed");
                }
                Some(id) => warn!(
                    version = %mapping.version,
                    configured = mapping.id,
                    remote = id,
                    "milestone title matches a different id; using the configured id"
                ),
                None => {
                    warn!(version = %mapping.version, title = %mapping.title, "no milestone with this title");
                    missing.push(mapping.version.clone());
                }
            }
        }
        missing.sort();
        missing
    }
}
