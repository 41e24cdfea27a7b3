//! Ownership and role predicates.
//!
//! Every predicate is pure: callers load the entities first, answer `NotFound` when the
//! target is missing, and only then consult these rules. Admins hold no ownership override.

use super::domain::{Application, Company, Job, Role, User, UserId};

/// The authenticated actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Reason a principal was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Access denied. Recruiter privileges required.")]
    RecruiterRoleRequired,
    #[error("Access denied. Admin privileges required.")]
    AdminRoleRequired,
    #[error("Not authorized to manage this company")]
    NotCompanyOwner,
    #[error("Not authorized to manage this job")]
    NotJobOwner,
    #[error("Not authorized to access this application")]
    NotApplicationParticipant,
    #[error("Not authorized to delete this application")]
    NotApplicant,
}

impl Denial {
    pub const fn code(self) -> &'static str {
        match self {
            Denial::RecruiterRoleRequired => "recruiter_role_required",
            Denial::AdminRoleRequired => "admin_role_required",
            Denial::NotCompanyOwner => "not_company_owner",
            Denial::NotJobOwner => "not_job_owner",
            Denial::NotApplicationParticipant => "not_application_participant",
            Denial::NotApplicant => "not_applicant",
        }
    }
}

pub type Decision = Result<(), Denial>;

fn allow_if(condition: bool, denial: Denial) -> Decision {
    if condition {
        Ok(())
    } else {
        Err(denial)
    }
}

/// Gate for recruiter-only actions, checked before any entity is loaded.
pub fn require_recruiter(principal: &Principal) -> Decision {
    allow_if(principal.role.can_recruit(), Denial::RecruiterRoleRequired)
}

pub fn can_create_company(principal: &Principal) -> Decision {
    require_recruiter(principal)
}

pub fn can_mutate_company(principal: &Principal, company: &Company) -> Decision {
    allow_if(principal.id == company.recruiter, Denial::NotCompanyOwner)
}

pub fn can_create_job(principal: &Principal, company: &Company) -> Decision {
    allow_if(principal.id == company.recruiter, Denial::NotCompanyOwner)
}

pub fn can_mutate_job(principal: &Principal, job: &Job) -> Decision {
    allow_if(principal.id == job.recruiter, Denial::NotJobOwner)
}

pub fn can_view_job_applications(principal: &Principal, job: &Job) -> Decision {
    allow_if(principal.id == job.recruiter, Denial::NotJobOwner)
}

/// `job` is the application's job; `None` when it no longer exists.
pub fn can_mutate_application_status(principal: &Principal, job: Option<&Job>) -> Decision {
    allow_if(
        job.is_some_and(|job| principal.id == job.recruiter),
        Denial::NotJobOwner,
    )
}

pub fn can_view_application(
    principal: &Principal,
    application: &Application,
    job: Option<&Job>,
) -> Decision {
    let is_applicant = principal.id == application.applicant;
    let is_recruiter = job.is_some_and(|job| principal.id == job.recruiter);
    allow_if(
        is_applicant || is_recruiter,
        Denial::NotApplicationParticipant,
    )
}

pub fn can_delete_application(principal: &Principal, application: &Application) -> Decision {
    allow_if(principal.id == application.applicant, Denial::NotApplicant)
}

pub fn can_assign_role(principal: &Principal) -> Decision {
    allow_if(principal.role == Role::Admin, Denial::AdminRoleRequired)
}
