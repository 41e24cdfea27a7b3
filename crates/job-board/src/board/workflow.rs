//! Application status lifecycle.
//!
//! `pending -> reviewing -> shortlisted | rejected`, `shortlisted -> accepted | rejected`.
//! The permissive policy accepts any status a recruiter writes; the strict policy
//! enforces the graph above.

use serde::{Deserialize, Serialize};

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewing,
    Shortlisted,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    /// States reachable in one step under the strict policy.
    pub const fn successors(self) -> &'static [ApplicationStatus] {
        match self {
            ApplicationStatus::Pending => &[ApplicationStatus::Reviewing],
            ApplicationStatus::Reviewing => {
                &[ApplicationStatus::Shortlisted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Shortlisted => {
                &[ApplicationStatus::Accepted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Rejected | ApplicationStatus::Accepted => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {} to {}", .from.label(), .to.label())]
pub struct TransitionRejected {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

impl TransitionPolicy {
    pub fn check(
        self,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<(), TransitionRejected> {
        match self {
            TransitionPolicy::Permissive => Ok(()),
            // Same-state writes only attach notes.
            TransitionPolicy::Strict if from == to => Ok(()),
            TransitionPolicy::Strict if from.successors().contains(&to) => Ok(()),
            TransitionPolicy::Strict => Err(TransitionRejected { from, to }),
        }
    }
}
