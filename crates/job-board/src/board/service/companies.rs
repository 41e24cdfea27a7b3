use tracing::info;

use super::{vanished, JobBoard, Listing};
use crate::board::authz::{self, Principal};
use crate::board::domain::{Company, CompanyId};
use crate::board::error::{BoardError, Entity};
use crate::board::input::{CompanyUpdate, NewCompany};
use crate::board::query::{CompanySelector, JobSelector, PageRequest};
use crate::board::store::EntityStore;
use crate::board::views::{CompanyJobs, CompanyView};

impl<S> JobBoard<S>
where
    S: EntityStore + 'static,
{
    pub fn list_companies(
        &self,
        selector: CompanySelector,
        page: PageRequest,
    ) -> Result<Listing<CompanyView>, BoardError> {
        let total = self.store.count_companies(&selector)?;
        let companies = self.store.find_companies(&selector, Some(page.window()))?;

        let mut lookup = self.lookup();
        let items = companies
            .into_iter()
            .map(|company| -> Result<CompanyView, BoardError> {
                let recruiter = lookup.user(&company.recruiter)?;
                let jobs = lookup.company_job_ids(&company.id)?;
                Ok(CompanyView::new(company, recruiter.as_ref(), jobs))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Listing {
            items,
            pagination: page.pagination(total),
        })
    }

    /// Company profile with its active postings, read through `Job::company`.
    pub fn company(&self, id: &CompanyId) -> Result<CompanyView, BoardError> {
        let company = self
            .store
            .fetch_company(id)?
            .ok_or(BoardError::NotFound(Entity::Company))?;
        let postings = self.store.find_jobs(
            &JobSelector {
                company: Some(company.id.clone()),
                ..JobSelector::active()
            },
            None,
        )?;
        let recruiter = self.store.fetch_user(&company.recruiter)?;
        Ok(CompanyView::new(
            company,
            recruiter.as_ref(),
            CompanyJobs::Postings(postings),
        ))
    }

    pub fn create_company(
        &self,
        principal: &Principal,
        input: NewCompany,
    ) -> Result<CompanyView, BoardError> {
        authz::can_create_company(principal)?;
        let input = input.validate()?;

        let now = self.now();
        let company = self.store.insert_company(Company {
            id: CompanyId::generate(),
            name: input.name,
            description: input.description,
            logo: input.logo,
            website: input.website,
            location: input.location,
            industry: input.industry,
            size: input.size,
            recruiter: principal.id.clone(),
            jobs: Vec::new(),
            created_at: now,
            updated_at: now,
        })?;

        info!(company_id = %company.id, recruiter_id = %principal.id, "company created");
        let recruiter = self.store.fetch_user(&company.recruiter)?;
        Ok(CompanyView::new(
            company,
            recruiter.as_ref(),
            CompanyJobs::Ids(Vec::new()),
        ))
    }

    pub fn update_company(
        &self,
        principal: &Principal,
        id: &CompanyId,
        update: CompanyUpdate,
    ) -> Result<CompanyView, BoardError> {
        authz::require_recruiter(principal)?;
        let update = update.validate()?;
        let mut company = self
            .store
            .fetch_company(id)?
            .ok_or(BoardError::NotFound(Entity::Company))?;
        authz::can_mutate_company(principal, &company)?;

        let CompanyUpdate {
            name,
            description,
            logo,
            website,
            location,
            industry,
            size,
        } = update;
        if let Some(name) = name {
            company.name = name;
        }
        if let Some(description) = description {
            company.description = description;
        }
        if let Some(logo) = logo {
            company.logo = logo;
        }
        if let Some(website) = website {
            company.website = website;
        }
        if let Some(location) = location {
            company.location = location;
        }
        if let Some(industry) = industry {
            company.industry = industry;
        }
        if let Some(size) = size {
            company.size = size;
        }
        company.updated_at = self.now();

        let company = self
            .store
            .save_company(company)
            .map_err(vanished(Entity::Company))?;
        info!(company_id = %company.id, "company updated");
        let mut lookup = self.lookup();
        let recruiter = lookup.user(&company.recruiter)?;
        let jobs = lookup.company_job_ids(&company.id)?;
        Ok(CompanyView::new(company, recruiter.as_ref(), jobs))
    }

    /// Deletes the company and cascades to its jobs. Returns the number of removed jobs.
    pub fn delete_company(
        &self,
        principal: &Principal,
        id: &CompanyId,
    ) -> Result<usize, BoardError> {
        authz::require_recruiter(principal)?;
        let company = self
            .store
            .fetch_company(id)?
            .ok_or(BoardError::NotFound(Entity::Company))?;
        authz::can_mutate_company(principal, &company)?;

        self.integrity
            .on_company_deleted(&company)
            .map_err(vanished(Entity::Company))
    }

    /// The caller's companies with every posting, whatever its status.
    pub fn my_companies(&self, principal: &Principal) -> Result<Vec<CompanyView>, BoardError> {
        authz::require_recruiter(principal)?;
        let selector = CompanySelector {
            recruiter: Some(principal.id.clone()),
            ..CompanySelector::default()
        };
        let recruiter = self.store.fetch_user(&principal.id)?;

        self.store
            .find_companies(&selector, None)?
            .into_iter()
            .map(|company| -> Result<CompanyView, BoardError> {
                let postings = self
                    .store
                    .find_jobs(&JobSelector::for_company(company.id.clone()), None)?;
                Ok(CompanyView::new(
                    company,
                    recruiter.as_ref(),
                    CompanyJobs::Postings(postings),
                ))
            })
            .collect()
    }
}
