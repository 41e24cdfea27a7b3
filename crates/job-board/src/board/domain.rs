use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::workflow::ApplicationStatus;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

entity_id!(
    /// Identifier of a stored user record.
    UserId
);
entity_id!(
    /// Identifier of a recruiter-owned company profile.
    CompanyId
);
entity_id!(
    /// Identifier of a job posting.
    JobId
);
entity_id!(
    /// Identifier of a seeker's application to a job.
    ApplicationId
);

/// Access level attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Recruiter,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }

    pub const fn can_recruit(self) -> bool {
        matches!(self, Role::Recruiter | Role::Admin)
    }
}

/// Headcount bucket advertised on a company profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompanySize {
    #[default]
    #[serde(rename = "1-10")]
    Tiny,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-500")]
    Large,
    #[serde(rename = "501-1000")]
    XLarge,
    #[serde(rename = "1000+")]
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Remote,
}

impl JobType {
    pub const fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            JobType::FullTime,
            JobType::PartTime,
            JobType::Contract,
            JobType::Internship,
            JobType::Remote,
        ]
        .into_iter()
        .find(|candidate| candidate.label() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobLevel {
    #[default]
    #[serde(rename = "Entry Level")]
    Entry,
    #[serde(rename = "Mid Level")]
    Mid,
    #[serde(rename = "Senior Level")]
    Senior,
    Lead,
    Manager,
}

/// Publication state of a posting. Only `Active` postings are listed publicly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

/// Identity record, created on first sign-in through the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: String,
    pub role: Role,
    pub resume: String,
    pub phone: String,
    pub location: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    /// Personal index of submitted applications. `Application::applicant` is authoritative.
    pub applications: Vec<ApplicationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub description: String,
    pub logo: String,
    pub website: String,
    pub location: String,
    pub industry: String,
    pub size: CompanySize,
    /// Owning recruiter, fixed at creation.
    pub recruiter: UserId,
    /// Back-reference cache of spawned jobs. `Job::company` is authoritative.
    pub jobs: Vec<JobId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: String,
    pub location: String,
    pub job_type: JobType,
    pub level: JobLevel,
    pub category: String,
    pub company: CompanyId,
    /// Copy of the company's recruiter taken when the job was created.
    pub recruiter: UserId,
    /// Back-reference cache of applications. `Application::job` is authoritative.
    pub applications: Vec<ApplicationId>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    /// Copied from the job when the application was submitted.
    pub company: CompanyId,
    pub resume: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    /// Recruiter-only free text.
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
