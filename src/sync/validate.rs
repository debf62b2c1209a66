use tracing::error;

use crate::error::{MigrateError, Result};
use crate::mapping::IdentityResolver;
use crate::model::source::SourceIssue;

/// Every reporter and assignee must either be empty or have a user entry.
/// All offenders are reported at once.
pub fn validate_usernames(records: &[SourceIssue], identities: &IdentityResolver) -> Result<()> {
    let referenced = records
        .iter()
        .flat_map(|record| [record.reporter.as_deref(), record.assignee.as_deref()])
        .flatten();

    let usernames = identities.unmapped(referenced);
    if usernames.is_empty() {
        return Ok(());
    }
    for username in &usernames {
        error!(username = %username, "no user entry for this Mantis username");
    }
    Err(MigrateError::Validation { usernames })
}
