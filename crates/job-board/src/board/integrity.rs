//! Maintenance of the derived back-reference lists (`Company::jobs`,
//! `Job::applications`, `User::applications`) and the company cascade.
//!
//! Multi-document changes run in two phases: the primary document is written first and
//! its errors propagate; the cache update follows, retried while the store reports a
//! transient failure. A cache phase that still fails leaves the primary record in place
//! and is reported as `CacheSync::Stale`. Readers never rely on the caches.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{Application, Company, Job};
use super::store::{EntityStore, StoreError};

pub const DEFAULT_CACHE_ATTEMPTS: u8 = 3;

/// Result of the best-effort cache phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSync {
    Synced,
    Stale { cache: &'static str, reason: String },
}

impl CacheSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, CacheSync::Synced)
    }
}

pub struct IntegrityManager<S> {
    store: Arc<S>,
    attempts: u8,
}

impl<S> IntegrityManager<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, attempts: u8) -> Self {
        Self {
            store,
            attempts: attempts.max(1),
        }
    }

    /// Appends the job to its company's cache. Call only after the job is stored.
    pub fn on_job_created(&self, job: &Job) -> CacheSync {
        self.refresh_cache("company.jobs", || {
            self.store.link_company_job(&job.company, &job.id)
        })
    }

    /// Appends the application to the job's and the applicant's caches. Call only after
    /// the application is stored. The two caches are updated independently.
    pub fn on_application_created(&self, application: &Application) -> (CacheSync, CacheSync) {
        let job_cache = self.refresh_cache("job.applications", || {
            self.store
                .link_job_application(&application.job, &application.id)
        });
        let user_cache = self.refresh_cache("user.applications", || {
            self.store
                .link_user_application(&application.applicant, &application.id)
        });
        (job_cache, user_cache)
    }

    /// Removes every job of the company, then the company itself, so no job is left
    /// pointing at a missing company. Applications of those jobs are kept.
    pub fn on_company_deleted(&self, company: &Company) -> Result<usize, StoreError> {
        let removed_jobs = self.store.delete_jobs_by_company(&company.id)?;
        if !self.store.delete_company(&company.id)? {
            return Err(StoreError::NotFound);
        }
        info!(company_id = %company.id, removed_jobs, "company deleted with its jobs");
        Ok(removed_jobs)
    }

    /// Deletes the job record only; `Company::jobs` keeps the stale id.
    pub fn on_job_deleted(&self, job: &Job) -> Result<(), StoreError> {
        if !self.store.delete_job(&job.id)? {
            return Err(StoreError::NotFound);
        }
        debug!(job_id = %job.id, company_id = %job.company, "job deleted");
        Ok(())
    }

    /// Deletes the application record only; job and user caches keep the stale id.
    pub fn on_application_deleted(&self, application: &Application) -> Result<(), StoreError> {
        if !self.store.delete_application(&application.id)? {
            return Err(StoreError::NotFound);
        }
        debug!(application_id = %application.id, "application deleted");
        Ok(())
    }

    fn refresh_cache<F>(&self, cache: &'static str, mut write: F) -> CacheSync
    where
        F: FnMut() -> Result<(), StoreError>,
    {
        let mut attempt = 1;
        loop {
            match write() {
                Ok(()) => return CacheSync::Synced,
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    debug!(cache, attempt, error = %err, "retrying cache update");
                    attempt += 1;
                }
                Err(err) => {
                    warn!(cache, attempt, error = %err, "back-reference cache left stale");
                    return CacheSync::Stale {
                        cache,
                        reason: err.to_string(),
                    };
                }
            }
        }
    }
}
