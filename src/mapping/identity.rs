use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::config::UserEntry;
use crate::model::remote::Member;
use crate::model::source::present;

pub const FALLBACK_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub source_username: String,
    pub display_name: String,
    pub gitlab_username: Option<String>,
    /// Filled in once the project's member list has been fetched.
    pub account_id: Option<u64>,
}

impl Identity {
    fn from_entry(source_username: &str, entry: &UserEntry) -> Self {
        let display_name = entry
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                if source_username.is_empty() {
                    FALLBACK_NAME.to_string()
                } else {
                    source_username.to_string()
                }
            });
        Self {
            source_username: source_username.to_string(),
            display_name,
            gitlab_username: entry.gitlab.clone().filter(|g| !g.is_empty()),
            account_id: None,
        }
    }

    fn fallback() -> Self {
        Self {
            source_username: String::new(),
            display_name: FALLBACK_NAME.to_string(),
            gitlab_username: None,
            account_id: None,
        }
    }

    /// Username to act as. `None` means the operator's own account.
    pub fn sudo(&self) -> Option<&str> {
        self.gitlab_username.as_deref()
    }
}

/// Outcome of looking up a Mantis username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The username has its own entry.
    Mapped(&'a Identity),
    /// Empty or missing username; the fallback entry applies.
    Fallback(&'a Identity),
    /// A non-empty username with no entry. Resolves to the fallback but fails validation.
    Unmapped(&'a Identity),
}

impl<'a> Resolution<'a> {
    pub fn identity(self) -> &'a Identity {
        match self {
            Self::Mapped(id) | Self::Fallback(id) | Self::Unmapped(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    identities: HashMap<String, Identity>,
    fallback: Identity,
}

impl IdentityResolver {
    pub fn from_config(users: &HashMap<String, UserEntry>) -> Self {
        let mut identities = HashMap::new();
        let mut fallback = Identity::fallback();
        for (username, entry) in users {
            if username.is_empty() {
                fallback = Identity::from_entry("", entry);
            } else {
                identities.insert(username.clone(), Identity::from_entry(username, entry));
            }
        }
        Self {
            identities,
            fallback,
        }
    }

    pub fn resolve(&self, username: Option<&str>) -> Resolution<'_> {
        let Some(username) = username.and_then(present) else {
            return Resolution::Fallback(&self.fallback);
        };
        match self.identities.get(username) {
            Some(identity) => Resolution::Mapped(identity),
            None => Resolution::Unmapped(&self.fallback),
        }
    }

    /// Never fails; unknown usernames degrade to the fallback identity.
    pub fn identity_for(&self, username: Option<&str>) -> &Identity {
        self.resolve(username).identity()
    }

    /// Record each identity's GitLab account id by exact username match.
    /// Returns how many configured GitLab usernames had no matching member.
    pub fn match_members(&mut self, members: &[Member]) -> usize {
        let by_username: HashMap<&str, u64> = members
            .iter()
            .map(|m| (m.username.as_str(), m.id))
            .collect();

        let mut unmatched = 0;
        for identity in self
            .identities
            .values_mut()
            .chain(std::iter::once(&mut self.fallback))
        {
            let Some(gitlab) = identity.gitlab_username.as_deref() else {
                continue;
            };
            identity.account_id = by_username.get(gitlab).copied();
            match identity.account_id {
                Some(id) => debug!(mantis = %identity.source_username, gitlab, id, "matched member"),
                None => {
                    unmatched += 1;
                    warn!(mantis = %identity.source_username, gitlab, "no project member with this username");
                }
            }
        }
        unmatched
    }

    /// Every distinct username in `usernames` that has no entry, sorted.
    pub fn unmapped<'a>(&self, usernames: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        usernames
            .into_iter()
            .filter(|u| matches!(self.resolve(Some(*u)), Resolution::Unmapped(_)))
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
