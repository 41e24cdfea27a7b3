//! Search, filter and pagination for job and company listings.
//!
//! The public listing endpoints and the seeker browse view share `TextMatch`,
//! so both agree on case-insensitive substring semantics.

use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{Application, Company, CompanyId, Job, JobId, JobStatus, JobType, UserId};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const BROWSE_PAGE_SIZE: u32 = 9;

/// Case-insensitive substring needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    needle: String,
}

impl TextMatch {
    /// Returns `None` for blank input so callers can treat it as "no filter".
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                needle: trimmed.to_lowercase(),
            })
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }

    pub fn matches_any<'a>(&self, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
        haystacks.into_iter().any(|haystack| self.matches(haystack))
    }
}

/// Conjunctive job filter evaluated by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSelector {
    pub status: Option<JobStatus>,
    pub recruiter: Option<UserId>,
    pub company: Option<CompanyId>,
    /// Title or description.
    pub search: Option<TextMatch>,
    pub location: Option<TextMatch>,
    pub category: Option<String>,
    pub job_type: Option<JobType>,
}

impl JobSelector {
    pub fn active() -> Self {
        Self {
            status: Some(JobStatus::Active),
            ..Self::default()
        }
    }

    pub fn for_company(company: CompanyId) -> Self {
        Self {
            company: Some(company),
            ..Self::default()
        }
    }

    pub fn for_recruiter(recruiter: UserId) -> Self {
        Self {
            recruiter: Some(recruiter),
            ..Self::default()
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.status.map_or(true, |status| job.status == status)
            && self
                .recruiter
                .as_ref()
                .map_or(true, |recruiter| &job.recruiter == recruiter)
            && self
                .company
                .as_ref()
                .map_or(true, |company| &job.company == company)
            && self.search.as_ref().map_or(true, |search| {
                search.matches_any([job.title.as_str(), job.description.as_str()])
            })
            && self
                .location
                .as_ref()
                .map_or(true, |location| location.matches(&job.location))
            && self
                .category
                .as_ref()
                .map_or(true, |category| &job.category == category)
            && self.job_type.map_or(true, |job_type| job.job_type == job_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanySelector {
    pub recruiter: Option<UserId>,
    /// Name or industry.
    pub search: Option<TextMatch>,
}

impl CompanySelector {
    pub fn matches(&self, company: &Company) -> bool {
        self.recruiter
            .as_ref()
            .map_or(true, |recruiter| &company.recruiter == recruiter)
            && self.search.as_ref().map_or(true, |search| {
                search.matches_any([company.name.as_str(), company.industry.as_str()])
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationSelector {
    pub job: Option<JobId>,
    pub applicant: Option<UserId>,
}

impl ApplicationSelector {
    pub fn matches(&self, application: &Application) -> bool {
        self.job.as_ref().map_or(true, |job| &application.job == job)
            && self
                .applicant
                .as_ref()
                .map_or(true, |applicant| &application.applicant == applicant)
    }
}

/// Skip/limit window pushed down to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("limit must be an integer between 1 and {max}")]
    InvalidLimit { max: u32 },
}

/// Validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Parses raw query-string values; absent or blank values fall back to the defaults.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        max_limit: u32,
    ) -> Result<Self, PageError> {
        let page = match page.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or(PageError::InvalidPage)?,
            None => 1,
        };
        let limit = match limit.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| (1..=max_limit).contains(limit))
                .ok_or(PageError::InvalidLimit { max: max_limit })?,
            None => DEFAULT_PAGE_SIZE.min(max_limit),
        };
        Ok(Self { page, limit })
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            skip: (self.page as usize - 1) * self.limit as usize,
            limit: self.limit as usize,
        }
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            pages: page_count(total, self.limit),
        }
    }
}

/// `ceil(total / page_size)`; zero when there is nothing to show.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

/// Seeker-facing browse filter over the in-memory listing: free-text over title,
/// company name and location plus multi-select category and location sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilter {
    pub search: Option<TextMatch>,
    pub categories: BTreeSet<String>,
    pub locations: BTreeSet<String>,
}

impl BrowseFilter {
    /// Builds a filter from comma separated selections, ignoring blank entries.
    pub fn from_lists(
        search: Option<&str>,
        categories: Option<&str>,
        locations: Option<&str>,
    ) -> Self {
        Self {
            search: search.and_then(TextMatch::new),
            categories: split_selection(categories),
            locations: split_selection(locations),
        }
    }

    pub fn matches(&self, job: &Job, company_name: Option<&str>) -> bool {
        let matches_search = self.search.as_ref().map_or(true, |search| {
            search.matches(&job.title)
                || company_name.map_or(false, |name| search.matches(name))
                || search.matches(&job.location)
        });
        let matches_category =
            self.categories.is_empty() || self.categories.contains(&job.category);
        let matches_location =
            self.locations.is_empty() || self.locations.contains(&job.location);

        matches_search && matches_category && matches_location
    }
}

fn split_selection(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Fixed-size page over an already filtered, ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowsePage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub pages: u64,
}

impl<T> BrowsePage<T> {
    /// Slices `items` into the requested 1-based page of `BROWSE_PAGE_SIZE` entries.
    /// At least one page is always reported, and out-of-range pages are empty.
    pub fn slice(items: Vec<T>, page: u32) -> Self {
        let total = items.len();
        let pages = page_count(total as u64, BROWSE_PAGE_SIZE).max(1);
        let page = page.max(1);
        let start = (page as usize - 1).saturating_mul(BROWSE_PAGE_SIZE as usize);
        let items = items
            .into_iter()
            .skip(start)
            .take(BROWSE_PAGE_SIZE as usize)
            .collect();
        Self {
            items,
            total,
            page,
            pages,
        }
    }
}
