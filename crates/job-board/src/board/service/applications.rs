use tracing::{info, warn};

use super::{vanished, JobBoard, Lookup};
use crate::board::authz::{self, Principal};
use crate::board::domain::{Application, ApplicationId, JobId};
use crate::board::error::{BoardError, Entity};
use crate::board::input::{NewApplication, StatusUpdate};
use crate::board::query::ApplicationSelector;
use crate::board::store::{EntityStore, StoreError};
use crate::board::views::{ApplicationContext, ApplicationView};
use crate::board::workflow::ApplicationStatus;

const DUPLICATE_APPLICATION: &str = "You have already applied for this job";

/// Which referenced documents to expand when rendering an application.
#[derive(Debug, Clone, Copy)]
struct Expand {
    job: bool,
    applicant: bool,
    company: bool,
}

impl Expand {
    const SEEKER: Expand = Expand {
        job: true,
        applicant: false,
        company: true,
    };
    const REVIEWER: Expand = Expand {
        job: true,
        applicant: true,
        company: false,
    };
    const FULL: Expand = Expand {
        job: true,
        applicant: true,
        company: true,
    };
}

impl<S> Lookup<'_, S>
where
    S: EntityStore,
{
    /// Renders an application for `viewer`. Notes are shown only to the recruiter
    /// owning the application's job.
    fn application_view(
        &mut self,
        application: Application,
        viewer: &Principal,
        expand: Expand,
    ) -> Result<ApplicationView, StoreError> {
        let job = self.job(&application.job)?;
        let applicant = if expand.applicant {
            self.user(&application.applicant)?
        } else {
            None
        };
        let company = if expand.company {
            self.company(&application.company)?
        } else {
            None
        };
        let show_notes = job.as_ref().is_some_and(|job| job.recruiter == viewer.id);

        Ok(ApplicationView::new(
            application,
            ApplicationContext {
                job: job.as_ref().filter(|_| expand.job),
                applicant: applicant.as_ref(),
                company: company.as_ref(),
                show_notes,
            },
        ))
    }
}

impl<S> JobBoard<S>
where
    S: EntityStore + 'static,
{
    /// Submits the caller's application. At most one application per (job, applicant)
    /// exists; the store enforces it atomically.
    pub fn apply(
        &self,
        principal: &Principal,
        input: NewApplication,
    ) -> Result<ApplicationView, BoardError> {
        let input = input.validate()?;
        let job = self
            .store
            .fetch_job(&input.job_id)?
            .ok_or(BoardError::NotFound(Entity::Job))?;

        let now = self.now();
        let application = self
            .store
            .insert_application(Application {
                id: ApplicationId::generate(),
                job: job.id.clone(),
                applicant: principal.id.clone(),
                company: job.company.clone(),
                resume: input.resume,
                cover_letter: input.cover_letter,
                status: ApplicationStatus::Pending,
                applied_at: now,
                notes: String::new(),
                created_at: now,
                updated_at: now,
            })
            .map_err(|err| match err {
                StoreError::Conflict(_) => BoardError::Conflict(DUPLICATE_APPLICATION.to_string()),
                other => BoardError::Store(other),
            })?;

        let (job_cache, user_cache) = self.integrity.on_application_created(&application);
        if !job_cache.is_synced() || !user_cache.is_synced() {
            warn!(application_id = %application.id, "application created with stale caches");
        }
        info!(
            application_id = %application.id,
            job_id = %job.id,
            applicant_id = %principal.id,
            "application submitted"
        );

        Ok(self
            .lookup()
            .application_view(application, principal, Expand::SEEKER)?)
    }

    /// The caller's applications, newest first, read through `Application::applicant`.
    pub fn my_applications(
        &self,
        principal: &Principal,
    ) -> Result<Vec<ApplicationView>, BoardError> {
        self.applications_of(principal)
    }

    pub(super) fn applications_of(
        &self,
        principal: &Principal,
    ) -> Result<Vec<ApplicationView>, BoardError> {
        let selector = ApplicationSelector {
            applicant: Some(principal.id.clone()),
            ..ApplicationSelector::default()
        };
        let mut lookup = self.lookup();
        self.store
            .find_applications(&selector)?
            .into_iter()
            .map(|application| {
                lookup
                    .application_view(application, principal, Expand::SEEKER)
                    .map_err(BoardError::from)
            })
            .collect()
    }

    /// Applications received by a job, for the recruiter owning it.
    pub fn job_applications(
        &self,
        principal: &Principal,
        job_id: &JobId,
    ) -> Result<Vec<ApplicationView>, BoardError> {
        authz::require_recruiter(principal)?;
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(BoardError::NotFound(Entity::Job))?;
        authz::can_view_job_applications(principal, &job)?;

        let selector = ApplicationSelector {
            job: Some(job.id.clone()),
            ..ApplicationSelector::default()
        };
        let mut lookup = self.lookup();
        self.store
            .find_applications(&selector)?
            .into_iter()
            .map(|application| {
                lookup
                    .application_view(application, principal, Expand::REVIEWER)
                    .map_err(BoardError::from)
            })
            .collect()
    }

    pub fn application(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<ApplicationView, BoardError> {
        let application = self
            .store
            .fetch_application(id)?
            .ok_or(BoardError::NotFound(Entity::Application))?;
        let mut lookup = self.lookup();
        let job = lookup.job(&application.job)?;
        authz::can_view_application(principal, &application, job.as_ref())?;

        Ok(lookup.application_view(application, principal, Expand::FULL)?)
    }

    /// Moves an application to a new status under the configured transition policy.
    /// Notes are replaced only when a non-blank value is supplied.
    pub fn update_application_status(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        update: StatusUpdate,
    ) -> Result<ApplicationView, BoardError> {
        authz::require_recruiter(principal)?;
        let mut application = self
            .store
            .fetch_application(id)?
            .ok_or(BoardError::NotFound(Entity::Application))?;
        let mut lookup = self.lookup();
        let job = lookup.job(&application.job)?;
        authz::can_mutate_application_status(principal, job.as_ref())?;

        self.config
            .transition_policy()
            .check(application.status, update.status)?;

        let previous = application.status;
        application.status = update.status;
        if let Some(notes) = update.notes.filter(|notes| !notes.trim().is_empty()) {
            application.notes = notes;
        }
        application.updated_at = self.now();

        let application = self
            .store
            .save_application(application)
            .map_err(vanished(Entity::Application))?;
        info!(
            application_id = %application.id,
            from = previous.label(),
            to = application.status.label(),
            "application status updated"
        );

        Ok(lookup.application_view(application, principal, Expand::REVIEWER)?)
    }

    /// Withdraws the caller's own application. Job and user caches keep the stale id.
    pub fn withdraw_application(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<(), BoardError> {
        let application = self
            .store
            .fetch_application(id)?
            .ok_or(BoardError::NotFound(Entity::Application))?;
        authz::can_delete_application(principal, &application)?;

        self.integrity
            .on_application_deleted(&application)
            .map_err(vanished(Entity::Application))?;
        info!(
            application_id = %application.id,
            applicant_id = %principal.id,
            "application withdrawn"
        );
        Ok(())
    }
}
