//! Job board domain: entity store, authorization rules, integrity manager, application
//! workflow, listing queries, and the `JobBoard` facade with its axum router.

pub mod authz;
pub mod domain;
pub mod error;
pub mod input;
pub mod integrity;
pub mod query;
pub mod router;
pub mod service;
pub mod store;
pub mod token;
pub mod views;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use authz::{Denial, Principal};
pub use domain::{
    Application, ApplicationId, Company, CompanyId, CompanySize, Job, JobId, JobLevel,
    JobStatus, JobType, Role, User, UserId,
};
pub use error::{BoardError, Entity};
pub use integrity::{CacheSync, IntegrityManager};
pub use query::{BrowseFilter, BrowsePage, JobSelector, PageRequest, Pagination, TextMatch};
pub use router::board_router;
pub use service::{JobBoard, Listing};
pub use store::{EntityStore, InMemoryStore, StoreError};
pub use token::{AuthFailure, TokenAuthority};
pub use workflow::{ApplicationStatus, TransitionPolicy};
