use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{EntityStore, IdentityUpsert, StoreError};
use crate::board::domain::{
    Application, ApplicationId, Company, CompanyId, Job, JobId, User, UserId,
};
use crate::board::query::{ApplicationSelector, CompanySelector, JobSelector, PageWindow};

/// Process-local store. A single lock covers every collection, which is what makes the
/// (job, applicant) uniqueness check and the insert one atomic step.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    sequence: u64,
    users: HashMap<UserId, Stored<User>>,
    companies: HashMap<CompanyId, Stored<Company>>,
    jobs: HashMap<JobId, Stored<Job>>,
    applications: HashMap<ApplicationId, Stored<Application>>,
    applicant_index: HashMap<(JobId, UserId), ApplicationId>,
}

struct Stored<T> {
    sequence: u64,
    record: T,
}

impl StoreState {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

fn insert_new<K, T>(
    map: &mut HashMap<K, Stored<T>>,
    key: K,
    record: T,
    sequence: u64,
) -> Result<T, StoreError>
where
    K: Eq + Hash + std::fmt::Display,
    T: Clone,
{
    if map.contains_key(&key) {
        return Err(StoreError::Conflict(key.to_string()));
    }
    map.insert(
        key,
        Stored {
            sequence,
            record: record.clone(),
        },
    );
    Ok(record)
}

fn replace<K, T>(map: &mut HashMap<K, Stored<T>>, key: &K, record: T) -> Result<T, StoreError>
where
    K: Eq + Hash,
    T: Clone,
{
    let stored = map.get_mut(key).ok_or(StoreError::NotFound)?;
    stored.record = record.clone();
    Ok(record)
}

fn newest_first<'a, K, T, F, S>(
    map: &'a HashMap<K, Stored<T>>,
    keep: F,
    sort_key: S,
) -> Vec<&'a Stored<T>>
where
    F: Fn(&T) -> bool,
    S: Fn(&T) -> DateTime<Utc>,
{
    let mut matching: Vec<&Stored<T>> = map
        .values()
        .filter(|stored| keep(&stored.record))
        .collect();
    matching.sort_by_key(|stored| Reverse((sort_key(&stored.record), stored.sequence)));
    matching
}

fn paged<T: Clone>(matching: Vec<&Stored<T>>, window: Option<PageWindow>) -> Vec<T> {
    let (skip, limit) = match window {
        Some(window) => (window.skip, window.limit),
        None => (0, usize::MAX),
    };
    matching
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|stored| stored.record.clone())
        .collect()
}

fn push_unique<T: PartialEq + Clone>(list: &mut Vec<T>, value: &T) {
    if !list.contains(value) {
        list.push(value.clone());
    }
}

impl EntityStore for InMemoryStore {
    fn upsert_identity(&self, identity: IdentityUpsert) -> Result<User, StoreError> {
        let mut state = self.state()?;

        let email_taken = state.users.values().any(|stored| {
            stored.record.email == identity.email
                && stored.record.external_id != identity.external_id
        });
        if email_taken {
            return Err(StoreError::Conflict(identity.email));
        }

        let existing = state
            .users
            .values_mut()
            .find(|stored| stored.record.external_id == identity.external_id);
        if let Some(stored) = existing {
            let user = &mut stored.record;
            user.email = identity.email;
            user.name = identity.name;
            user.profile_image = identity.profile_image;
            user.updated_at = identity.at;
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::generate(),
            external_id: identity.external_id,
            email: identity.email,
            name: identity.name,
            profile_image: identity.profile_image,
            role: identity.initial_role,
            resume: String::new(),
            phone: String::new(),
            location: String::new(),
            skills: Vec::new(),
            experience: String::new(),
            education: String::new(),
            applications: Vec::new(),
            created_at: identity.at,
            updated_at: identity.at,
        };
        let sequence = state.next_sequence();
        insert_new(&mut state.users, user.id.clone(), user, sequence)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.state()?;
        let duplicate = state.users.values().any(|stored| {
            stored.record.external_id == user.external_id || stored.record.email == user.email
        });
        if duplicate {
            return Err(StoreError::Conflict(user.email));
        }
        let sequence = state.next_sequence();
        insert_new(&mut state.users, user.id.clone(), user, sequence)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let state = self.state()?;
        Ok(state.users.get(id).map(|stored| stored.record.clone()))
    }

    fn fetch_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let state = self.state()?;
        Ok(state
            .users
            .values()
            .find(|stored| stored.record.external_id == external_id)
            .map(|stored| stored.record.clone()))
    }

    fn save_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.state()?;
        let id = user.id.clone();
        replace(&mut state.users, &id, user)
    }

    fn insert_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut state = self.state()?;
        let sequence = state.next_sequence();
        insert_new(&mut state.companies, company.id.clone(), company, sequence)
    }

    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, StoreError> {
        let state = self.state()?;
        Ok(state.companies.get(id).map(|stored| stored.record.clone()))
    }

    fn save_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut state = self.state()?;
        let id = company.id.clone();
        replace(&mut state.companies, &id, company)
    }

    fn delete_company(&self, id: &CompanyId) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        Ok(state.companies.remove(id).is_some())
    }

    fn find_companies(
        &self,
        selector: &CompanySelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Company>, StoreError> {
        let state = self.state()?;
        let matching = newest_first(
            &state.companies,
            |company| selector.matches(company),
            |company| company.created_at,
        );
        Ok(paged(matching, window))
    }

    fn count_companies(&self, selector: &CompanySelector) -> Result<u64, StoreError> {
        let state = self.state()?;
        Ok(state
            .companies
            .values()
            .filter(|stored| selector.matches(&stored.record))
            .count() as u64)
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut state = self.state()?;
        let sequence = state.next_sequence();
        insert_new(&mut state.jobs, job.id.clone(), job, sequence)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        let state = self.state()?;
        Ok(state.jobs.get(id).map(|stored| stored.record.clone()))
    }

    fn save_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut state = self.state()?;
        let id = job.id.clone();
        replace(&mut state.jobs, &id, job)
    }

    fn delete_job(&self, id: &JobId) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        Ok(state.jobs.remove(id).is_some())
    }

    fn delete_jobs_by_company(&self, company: &CompanyId) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        let before = state.jobs.len();
        state.jobs.retain(|_, stored| &stored.record.company != company);
        Ok(before - state.jobs.len())
    }

    fn find_jobs(
        &self,
        selector: &JobSelector,
        window: Option<PageWindow>,
    ) -> Result<Vec<Job>, StoreError> {
        let state = self.state()?;
        let matching = newest_first(&state.jobs, |job| selector.matches(job), |job| job.created_at);
        Ok(paged(matching, window))
    }

    fn count_jobs(&self, selector: &JobSelector) -> Result<u64, StoreError> {
        let state = self.state()?;
        Ok(state
            .jobs
            .values()
            .filter(|stored| selector.matches(&stored.record))
            .count() as u64)
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut state = self.state()?;
        let pair = (application.job.clone(), application.applicant.clone());
        if let Some(existing) = state.applicant_index.get(&pair) {
            return Err(StoreError::Conflict(existing.to_string()));
        }
        let sequence = state.next_sequence();
        let stored = insert_new(
            &mut state.applications,
            application.id.clone(),
            application,
            sequence,
        )?;
        state.applicant_index.insert(pair, stored.id.clone());
        Ok(stored)
    }

    fn fetch_application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let state = self.state()?;
        Ok(state.applications.get(id).map(|stored| stored.record.clone()))
    }

    fn save_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut state = self.state()?;
        let id = application.id.clone();
        let current = state.applications.get(&id).ok_or(StoreError::NotFound)?;
        if current.record.job != application.job
            || current.record.applicant != application.applicant
        {
            return Err(StoreError::Conflict(id.to_string()));
        }
        replace(&mut state.applications, &id, application)
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        match state.applications.remove(id) {
            Some(stored) => {
                state
                    .applicant_index
                    .remove(&(stored.record.job, stored.record.applicant));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_applications(
        &self,
        selector: &ApplicationSelector,
    ) -> Result<Vec<Application>, StoreError> {
        let state = self.state()?;
        let matching = newest_first(
            &state.applications,
            |application| selector.matches(application),
            |application| application.applied_at,
        );
        Ok(paged(matching, None))
    }

    fn link_company_job(&self, company: &CompanyId, job: &JobId) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let stored = state.companies.get_mut(company).ok_or(StoreError::NotFound)?;
        push_unique(&mut stored.record.jobs, job);
        Ok(())
    }

    fn link_job_application(
        &self,
        job: &JobId,
        application: &ApplicationId,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let stored = state.jobs.get_mut(job).ok_or(StoreError::NotFound)?;
        push_unique(&mut stored.record.applications, application);
        Ok(())
    }

    fn link_user_application(
        &self,
        user: &UserId,
        application: &ApplicationId,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let stored = state.users.get_mut(user).ok_or(StoreError::NotFound)?;
        push_unique(&mut stored.record.applications, application);
        Ok(())
    }
}
