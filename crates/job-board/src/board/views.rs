//! Response shapes with referenced documents expanded into summaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    Application, ApplicationId, Company, CompanyId, CompanySize, Job, JobId, JobLevel,
    JobStatus, JobType, Role, User, UserId,
};
use super::workflow::ApplicationStatus;

/// A reference rendered either as the bare id or as the expanded document. Ids whose
/// target no longer exists stay bare.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reference<Id, T> {
    Id(Id),
    Populated(T),
}

impl<Id, T> Reference<Id, T> {
    pub fn resolve(id: Id, found: Option<T>) -> Self {
        match found {
            Some(doc) => Reference::Populated(doc),
            None => Reference::Id(id),
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Reference::Populated(doc) => Some(doc),
            Reference::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile_image: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Applicant details shown to the recruiter reviewing an application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile_image: String,
    pub phone: String,
    pub location: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

impl From<&User> for ApplicantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            profile_image: user.profile_image.clone(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            skills: user.skills.clone(),
            experience: user.experience.clone(),
            education: user.education.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub logo: String,
    pub location: String,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id.clone(),
            name: company.name.clone(),
            logo: company.logo.clone(),
            location: company.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub salary: String,
    pub location: String,
    pub job_type: JobType,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            salary: job.salary.clone(),
            location: job.location.clone(),
            job_type: job.job_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: String,
    pub location: String,
    pub job_type: JobType,
    pub level: JobLevel,
    pub category: String,
    pub company: Reference<CompanyId, CompanySummary>,
    pub recruiter: Reference<UserId, UserSummary>,
    pub applications: Vec<ApplicationId>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobView {
    /// `applications` are the ids found through `Application::job`; the job's own
    /// cache may still hold withdrawn ones.
    pub fn new(
        job: Job,
        company: Option<&Company>,
        recruiter: Option<&User>,
        applications: Vec<ApplicationId>,
    ) -> Self {
        Self {
            company: Reference::resolve(job.company, company.map(CompanySummary::from)),
            recruiter: Reference::resolve(job.recruiter, recruiter.map(UserSummary::from)),
            id: job.id,
            title: job.title,
            description: job.description,
            requirements: job.requirements,
            salary: job.salary,
            location: job.location,
            job_type: job.job_type,
            level: job.level,
            category: job.category,
            applications,
            status: job.status,
            deadline: job.deadline,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Jobs attached to a company view, read through `Job::company`: bare ids in listings,
/// full postings on detail pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompanyJobs {
    Ids(Vec<JobId>),
    Postings(Vec<Job>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: CompanyId,
    pub name: String,
    pub description: String,
    pub logo: String,
    pub website: String,
    pub location: String,
    pub industry: String,
    pub size: CompanySize,
    pub recruiter: Reference<UserId, UserSummary>,
    pub jobs: CompanyJobs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyView {
    pub fn new(company: Company, recruiter: Option<&User>, jobs: CompanyJobs) -> Self {
        Self {
            recruiter: Reference::resolve(company.recruiter, recruiter.map(UserSummary::from)),
            jobs,
            id: company.id,
            name: company.name,
            description: company.description,
            logo: company.logo,
            website: company.website,
            location: company.location,
            industry: company.industry,
            size: company.size,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub job: Reference<JobId, JobSummary>,
    pub applicant: Reference<UserId, ApplicantSummary>,
    pub company: Reference<CompanyId, CompanySummary>,
    pub resume: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    /// Present only for the recruiter owning the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Referenced documents available when rendering an application.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationContext<'a> {
    pub job: Option<&'a Job>,
    pub applicant: Option<&'a User>,
    pub company: Option<&'a Company>,
    pub show_notes: bool,
}

impl ApplicationView {
    pub fn new(application: Application, context: ApplicationContext<'_>) -> Self {
        Self {
            job: Reference::resolve(application.job, context.job.map(JobSummary::from)),
            applicant: Reference::resolve(
                application.applicant,
                context.applicant.map(ApplicantSummary::from),
            ),
            company: Reference::resolve(
                application.company,
                context.company.map(CompanySummary::from),
            ),
            notes: context.show_notes.then_some(application.notes),
            id: application.id,
            resume: application.resume,
            cover_letter: application.cover_letter,
            status: application.status,
            applied_at: application.applied_at,
            created_at: application.created_at,
            updated_at: application.updated_at,
        }
    }
}

/// The caller's own user record with applications expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
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
    pub applications: Vec<ApplicationView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(user: User, applications: Vec<ApplicationView>) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            email: user.email,
            name: user.name,
            profile_image: user.profile_image,
            role: user.role,
            resume: user.resume,
            phone: user.phone,
            location: user.location,
            skills: user.skills,
            experience: user.experience,
            education: user.education,
            applications,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
