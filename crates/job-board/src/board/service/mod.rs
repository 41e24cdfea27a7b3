//! `JobBoard` composes the store, authorization rules, integrity manager and workflow
//! policy behind one facade. Each action loads its targets, answers `NotFound` for
//! missing ones, consults the rules, and only then writes.

mod applications;
mod companies;
mod jobs;
mod users;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::authz::Principal;
use super::domain::{Company, CompanyId, Job, JobId, User, UserId};
use super::error::{BoardError, Entity};
use super::integrity::IntegrityManager;
use super::query::{ApplicationSelector, JobSelector, Pagination};
use super::store::{EntityStore, StoreError};
use super::token::{AuthFailure, TokenAuthority};
use super::views::{CompanyJobs, JobView};
use crate::config::BoardConfig;

pub struct JobBoard<S> {
    store: Arc<S>,
    integrity: IntegrityManager<S>,
    tokens: TokenAuthority,
    config: BoardConfig,
}

/// One page of a listing plus its pagination summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<S> JobBoard<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, tokens: TokenAuthority, config: BoardConfig) -> Self {
        let integrity = IntegrityManager::new(store.clone(), config.cache_update_attempts);
        Self {
            store,
            integrity,
            tokens,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Resolves an `Authorization` header value to the principal it names.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, BoardError> {
        let user_id = self.tokens.verify_header(authorization)?;
        let user = self
            .store
            .fetch_user(&user_id)?
            .ok_or(AuthFailure::UnknownUser)?;
        Ok(Principal::from(&user))
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn lookup(&self) -> Lookup<'_, S> {
        Lookup::new(&self.store)
    }
}

/// Maps a store `NotFound` (record vanished between load and write) onto the entity.
fn vanished(entity: Entity) -> impl Fn(StoreError) -> BoardError {
    move |err| match err {
        StoreError::NotFound => BoardError::NotFound(entity),
        other => BoardError::Store(other),
    }
}

/// Memoizing reference resolver used while rendering views.
struct Lookup<'a, S> {
    store: &'a S,
    users: HashMap<UserId, Option<User>>,
    companies: HashMap<CompanyId, Option<Company>>,
    jobs: HashMap<JobId, Option<Job>>,
}

impl<'a, S> Lookup<'a, S>
where
    S: EntityStore,
{
    fn new(store: &'a S) -> Self {
        Self {
            store,
            users: HashMap::new(),
            companies: HashMap::new(),
            jobs: HashMap::new(),
        }
    }

    fn user(&mut self, id: &UserId) -> Result<Option<User>, StoreError> {
        if let Some(cached) = self.users.get(id) {
            return Ok(cached.clone());
        }
        let found = self.store.fetch_user(id)?;
        self.users.insert(id.clone(), found.clone());
        Ok(found)
    }

    fn company(&mut self, id: &CompanyId) -> Result<Option<Company>, StoreError> {
        if let Some(cached) = self.companies.get(id) {
            return Ok(cached.clone());
        }
        let found = self.store.fetch_company(id)?;
        self.companies.insert(id.clone(), found.clone());
        Ok(found)
    }

    fn job(&mut self, id: &JobId) -> Result<Option<Job>, StoreError> {
        if let Some(cached) = self.jobs.get(id) {
            return Ok(cached.clone());
        }
        let found = self.store.fetch_job(id)?;
        self.jobs.insert(id.clone(), found.clone());
        Ok(found)
    }

    fn job_view(&mut self, job: Job) -> Result<JobView, StoreError> {
        let company = self.company(&job.company)?;
        let recruiter = self.user(&job.recruiter)?;
        let applications = self
            .store
            .find_applications(&ApplicationSelector {
                job: Some(job.id.clone()),
                ..ApplicationSelector::default()
            })?
            .into_iter()
            .map(|application| application.id)
            .collect();
        Ok(JobView::new(
            job,
            company.as_ref(),
            recruiter.as_ref(),
            applications,
        ))
    }

    /// Ids of the jobs currently posted under `company`.
    fn company_job_ids(&self, company: &CompanyId) -> Result<CompanyJobs, StoreError> {
        let jobs = self
            .store
            .find_jobs(&JobSelector::for_company(company.clone()), None)?;
        Ok(CompanyJobs::Ids(jobs.into_iter().map(|job| job.id).collect()))
    }
}
