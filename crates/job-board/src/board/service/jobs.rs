use tracing::{info, warn};

use super::{vanished, JobBoard, Listing};
use crate::board::authz::{self, Principal};
use crate::board::domain::{Job, JobId, JobStatus};
use crate::board::error::{BoardError, Entity};
use crate::board::input::{JobUpdate, NewJob};
use crate::board::query::{BrowseFilter, BrowsePage, JobSelector, PageRequest};
use crate::board::store::EntityStore;
use crate::board::views::JobView;

impl<S> JobBoard<S>
where
    S: EntityStore + 'static,
{
    /// Public listing. Only active postings are ever returned, whatever the selector says.
    pub fn list_jobs(
        &self,
        selector: JobSelector,
        page: PageRequest,
    ) -> Result<Listing<JobView>, BoardError> {
        let selector = JobSelector {
            status: Some(JobStatus::Active),
            ..selector
        };
        let total = self.store.count_jobs(&selector)?;
        let jobs = self.store.find_jobs(&selector, Some(page.window()))?;

        let mut lookup = self.lookup();
        let items = jobs
            .into_iter()
            .map(|job| lookup.job_view(job))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Listing {
            items,
            pagination: page.pagination(total),
        })
    }

    /// Seeker browse view over every active posting.
    pub fn browse_jobs(
        &self,
        filter: &BrowseFilter,
        page: u32,
    ) -> Result<BrowsePage<JobView>, BoardError> {
        let mut lookup = self.lookup();
        let mut matching = Vec::new();
        for job in self.store.find_jobs(&JobSelector::active(), None)? {
            let company = lookup.company(&job.company)?;
            if filter.matches(&job, company.as_ref().map(|company| company.name.as_str())) {
                matching.push(lookup.job_view(job)?);
            }
        }
        Ok(BrowsePage::slice(matching, page))
    }

    pub fn job(&self, id: &JobId) -> Result<JobView, BoardError> {
        let job = self
            .store
            .fetch_job(id)?
            .ok_or(BoardError::NotFound(Entity::Job))?;
        Ok(self.lookup().job_view(job)?)
    }

    /// Posts a job under a company the caller owns. The job inherits the company's
    /// recruiter and starts `active`.
    pub fn create_job(&self, principal: &Principal, input: NewJob) -> Result<JobView, BoardError> {
        authz::require_recruiter(principal)?;
        let input = input.validate()?;
        let company = self
            .store
            .fetch_company(&input.company)?
            .ok_or(BoardError::NotFound(Entity::Company))?;
        authz::can_create_job(principal, &company)?;

        let now = self.now();
        let job = self.store.insert_job(Job {
            id: JobId::generate(),
            title: input.title,
            description: input.description,
            requirements: input.requirements,
            salary: input.salary,
            location: input.location,
            job_type: input.job_type,
            level: input.level,
            category: input.category,
            company: company.id.clone(),
            recruiter: company.recruiter.clone(),
            applications: Vec::new(),
            status: JobStatus::Active,
            deadline: input.deadline,
            created_at: now,
            updated_at: now,
        })?;

        let cache = self.integrity.on_job_created(&job);
        if !cache.is_synced() {
            warn!(job_id = %job.id, company_id = %company.id, "company cache left stale");
        }
        info!(
            job_id = %job.id,
            company_id = %company.id,
            recruiter_id = %principal.id,
            "job created"
        );

        let recruiter = self.store.fetch_user(&job.recruiter)?;
        Ok(JobView::new(
            job,
            Some(&company),
            recruiter.as_ref(),
            Vec::new(),
        ))
    }

    pub fn update_job(
        &self,
        principal: &Principal,
        id: &JobId,
        update: JobUpdate,
    ) -> Result<JobView, BoardError> {
        authz::require_recruiter(principal)?;
        let update = update.validate()?;
        let mut job = self
            .store
            .fetch_job(id)?
            .ok_or(BoardError::NotFound(Entity::Job))?;
        authz::can_mutate_job(principal, &job)?;

        let JobUpdate {
            title,
            description,
            requirements,
            salary,
            location,
            job_type,
            level,
            category,
            status,
            deadline,
        } = update;
        if let Some(title) = title {
            job.title = title;
        }
        if let Some(description) = description {
            job.description = description;
        }
        if let Some(requirements) = requirements {
            job.requirements = requirements;
        }
        if let Some(salary) = salary {
            job.salary = salary;
        }
        if let Some(location) = location {
            job.location = location;
        }
        if let Some(job_type) = job_type {
            job.job_type = job_type;
        }
        if let Some(level) = level {
            job.level = level;
        }
        if let Some(category) = category {
            job.category = category;
        }
        if let Some(status) = status {
            job.status = status;
        }
        if deadline.is_some() {
            job.deadline = deadline;
        }
        job.updated_at = self.now();

        let job = self.store.save_job(job).map_err(vanished(Entity::Job))?;
        info!(job_id = %job.id, status = ?job.status, "job updated");
        Ok(self.lookup().job_view(job)?)
    }

    /// Removes the posting. Its applications stay in place.
    pub fn delete_job(&self, principal: &Principal, id: &JobId) -> Result<(), BoardError> {
        authz::require_recruiter(principal)?;
        let job = self
            .store
            .fetch_job(id)?
            .ok_or(BoardError::NotFound(Entity::Job))?;
        authz::can_mutate_job(principal, &job)?;

        self.integrity
            .on_job_deleted(&job)
            .map_err(vanished(Entity::Job))?;
        info!(job_id = %job.id, recruiter_id = %principal.id, "job deleted");
        Ok(())
    }

    /// Every posting owned by the caller, whatever its status.
    pub fn my_jobs(&self, principal: &Principal) -> Result<Vec<JobView>, BoardError> {
        authz::require_recruiter(principal)?;
        let jobs = self
            .store
            .find_jobs(&JobSelector::for_recruiter(principal.id.clone()), None)?;

        let mut lookup = self.lookup();
        jobs.into_iter()
            .map(|job| lookup.job_view(job).map_err(BoardError::from))
            .collect()
    }
}
