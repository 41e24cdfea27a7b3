mod memory;

pub use memory::InMemoryStore;

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, Company, CompanyId, Job, JobId, Role, User, UserId,
};
use super::query::{ApplicationSelector, CompanySelector, JobSelector, PageWindow};

/// Fields the identity provider owns on a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUpsert {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub profile_image: String,
    /// Applied only when the record is created.
    pub initial_role: Role,
    pub at: DateTime<Utc>,
}

/// Document persistence for users, companies, jobs and applications.
///
/// Every method is atomic on its own; nothing spans documents. `find_*` results are
/// ordered newest first (`created_at`, then insertion order), and `find_applications`
/// newest `applied_at` first.
pub trait EntityStore: Send + Sync {
    fn upsert_identity(&self, identity: IdentityUpsert) -> Result<User, StoreError>;
    fn insert_user(&self, user: User) -> Result<User, StoreError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    fn fetch_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;
    fn save_user(&self, user: User) -> Result<User, StoreError>;

    fn insert_company(&self, company: Company) -> Result<Company, StoreError>;
    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, StoreError>;
    fn save_company(&self, company: Company) -> Result<Company, StoreError>;
    fn delete_company(&self, id: &CompanyId) -> Result<bool, StoreError>;
    fn find_companies(
        &self,
        selector: &CompanySelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Company>, StoreError>;
    fn count_companies(&self, selector: &CompanySelector) -> Result<u64, StoreError>;

    fn insert_job(&self, job: Job) -> Result<Job, StoreError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    fn save_job(&self, job: Job) -> Result<Job, StoreError>;
    fn delete_job(&self, id: &JobId) -> Result<bool, StoreError>;
    fn delete_jobs_by_company(&self, company: &CompanyId) -> Result<usize, StoreError>;
    fn find_jobs(
        &self,
        selector: &JobSelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Job>, StoreError>;
    fn count_jobs(&self, selector: &JobSelector) -> Result<u64, StoreError>;

    /// Fails with `Conflict` when an application for the same (job, applicant) exists.
    fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    fn fetch_application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn save_application(&self, application: Application) -> Result<Application, StoreError>;
    fn delete_application(&self, id: &ApplicationId) -> Result<bool, StoreError>;
    fn find_applications(
        &self,
        selector: &ApplicationSelector,
    ) -> Result<Vec<Application>, StoreError>;

    // Back-reference appends are add-if-absent so the cache phase can be retried.
    fn link_company_job(&self, company: &CompanyId, job: &JobId) -> Result<(), StoreError>;
    fn link_job_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), StoreError>;
    fn link_user_application(
        &self,
        user: &UserId,
        application: &ApplicationId,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether repeating the same write may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
