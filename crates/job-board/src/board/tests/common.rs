use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::http::{header, Request};
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::board::authz::Principal;
use crate::board::domain::{
    Application, ApplicationId, Company, CompanyId, CompanySize, Job, JobId, JobLevel, JobType,
    Role, User, UserId,
};
use crate::board::input::{NewApplication, NewCompany, NewJob};
use crate::board::query::{ApplicationSelector, CompanySelector, JobSelector, PageWindow};
use crate::board::store::{EntityStore, IdentityUpsert, InMemoryStore, StoreError};
use crate::board::token::TokenAuthority;
use crate::board::JobBoard;
use crate::config::BoardConfig;

pub(super) const SECRET: &str = "test-secret";

pub(super) fn authority() -> TokenAuthority {
    TokenAuthority::new(SECRET, Duration::days(1))
}

pub(super) fn board() -> (Arc<JobBoard<InMemoryStore>>, Arc<InMemoryStore>) {
    board_with(BoardConfig::default())
}

pub(super) fn board_with(
    config: BoardConfig,
) -> (Arc<JobBoard<InMemoryStore>>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let board = Arc::new(JobBoard::new(store.clone(), authority(), config));
    (board, store)
}

pub(super) fn seed_user<S: EntityStore>(store: &S, handle: &str, role: Role) -> Principal {
    let now = Utc::now();
    let user = store
        .insert_user(User {
            id: UserId::generate(),
            external_id: format!("ext_{handle}"),
            email: format!("{handle}@example.com"),
            name: handle.to_string(),
            profile_image: String::new(),
            role,
            resume: String::new(),
            phone: String::new(),
            location: String::new(),
            skills: Vec::new(),
            experience: String::new(),
            education: String::new(),
            applications: Vec::new(),
            created_at: now,
            updated_at: now,
        })
        .expect("user inserted");
    Principal::from(&user)
}

pub(super) fn bearer(principal: &Principal) -> String {
    let token = authority().issue(&principal.id).expect("token issued");
    format!("Bearer {token}")
}

pub(super) fn new_company(name: &str) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        description: format!("{name} builds things"),
        logo: String::new(),
        website: String::new(),
        location: "Lisbon".to_string(),
        industry: "Software".to_string(),
        size: CompanySize::Small,
    }
}

pub(super) fn new_job(company: &CompanyId, title: &str) -> NewJob {
    NewJob {
        title: title.to_string(),
        description: format!("{title} wanted"),
        requirements: vec!["Rust".to_string()],
        salary: "$80k - $95k".to_string(),
        location: "Remote".to_string(),
        job_type: JobType::FullTime,
        level: JobLevel::Mid,
        category: "Programming".to_string(),
        company: company.clone(),
        deadline: None,
    }
}

pub(super) fn new_application(job: &JobId) -> NewApplication {
    NewApplication {
        job_id: job.clone(),
        resume: "https://cv.example.com/seeker.pdf".to_string(),
        cover_letter: "I would love to join".to_string(),
    }
}

/// A recruiter R owning company C with one active job J, plus a seeker U.
pub(super) struct Scenario {
    pub board: Arc<JobBoard<InMemoryStore>>,
    pub store: Arc<InMemoryStore>,
    pub recruiter: Principal,
    pub other_recruiter: Principal,
    pub seeker: Principal,
    pub company: CompanyId,
    pub job: JobId,
}

pub(super) fn scenario() -> Scenario {
    scenario_with(BoardConfig::default())
}

pub(super) fn scenario_with(config: BoardConfig) -> Scenario {
    let (board, store) = board_with(config);
    let recruiter = seed_user(store.as_ref(), "rita", Role::Recruiter);
    let other_recruiter = seed_user(store.as_ref(), "oscar", Role::Recruiter);
    let seeker = seed_user(store.as_ref(), "sam", Role::User);

    let company = board
        .create_company(&recruiter, new_company("Acme"))
        .expect("company created")
        .id;
    let job = board
        .create_job(&recruiter, new_job(&company, "Backend Engineer"))
        .expect("job created")
        .id;

    Scenario {
        board,
        store,
        recruiter,
        other_recruiter,
        seeker,
        company,
        job,
    }
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder
        .body(axum::body::Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, token: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

/// Wraps the in-memory store and fails back-reference appends while `link_failures`
/// is above zero. Everything else is delegated.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub inner: InMemoryStore,
    pub link_failures: AtomicU32,
    pub link_calls: AtomicU32,
}

impl FlakyStore {
    pub fn failing(times: u32) -> Self {
        Self {
            link_failures: AtomicU32::new(times),
            ..Self::default()
        }
    }

    fn link_outcome(&self) -> Result<(), StoreError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.link_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.link_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("replica lagging".to_string()));
        }
        Ok(())
    }
}

impl EntityStore for FlakyStore {
    fn upsert_identity(&self, identity: IdentityUpsert) -> Result<User, StoreError> {
        self.inner.upsert_identity(identity)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.inner.insert_user(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.inner.fetch_user(id)
    }

    fn fetch_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.inner.fetch_user_by_external_id(external_id)
    }

    fn save_user(&self, user: User) -> Result<User, StoreError> {
        self.inner.save_user(user)
    }

    fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        self.inner.insert_company(company)
    }

    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, StoreError> {
        self.inner.fetch_company(id)
    }

    fn save_company(&self, company: Company) -> Result<Company, StoreError> {
        self.inner.save_company(company)
    }

    fn delete_company(&self, id: &CompanyId) -> Result<bool, StoreError> {
        self.inner.delete_company(id)
    }

    fn find_companies(
        &self,
        selector: &CompanySelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Company>, StoreError> {
        self.inner.find_companies(selector, window)
    }

    fn count_companies(&self, selector: &CompanySelector) -> Result<u64, StoreError> {
        self.inner.count_companies(selector)
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        self.inner.fetch_job(id)
    }

    fn save_job(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.save_job(job)
    }

    fn delete_job(&self, id: &JobId) -> Result<bool, StoreError> {
        self.inner.delete_job(id)
    }

    fn delete_jobs_by_company(&self, company: &CompanyId) -> Result<usize, StoreError> {
        self.inner.delete_jobs_by_company(company)
    }

    fn find_jobs(
        &self,
        selector: &JobSelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Job>, StoreError> {
        self.inner.find_jobs(selector, window)
    }

    fn count_jobs(&self, selector: &JobSelector) -> Result<u64, StoreError> {
        self.inner.count_jobs(selector)
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.fetch_application(id)
    }

    fn save_application(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.save_application(application)
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<bool, StoreError> {
        self.inner.delete_application(id)
    }

    fn find_applications(
        &self,
        selector: &ApplicationSelector,
    ) -> Result<Vec<Application>, StoreError> {
        self.inner.find_applications(selector)
    }

    fn link_company_job(&self, company: &CompanyId, job: &JobId) -> Result<(), StoreError> {
        self.link_outcome()?;
        self.inner.link_company_job(company, job)
    }

    fn link_job_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), StoreError> {
        self.link_outcome()?;
        self.inner.link_job_application(job, application)
    }

    fn link_user_application(
        &self,
        user: &UserId,
        application: &ApplicationId,
    ) -> Result<(), StoreError> {
        self.link_outcome()?;
        self.inner.link_user_application(user, application)
    }
}
