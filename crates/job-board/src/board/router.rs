use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::authz::{self, Decision, Principal};
use super::domain::{ApplicationId, CompanyId, JobId, JobType, UserId};
use super::error::BoardError;
use super::input::{self, IdentityEvent};
use super::query::{BrowseFilter, CompanySelector, JobSelector, PageError, PageRequest, TextMatch};
use super::service::JobBoard;
use super::store::EntityStore;

type Board<S> = State<Arc<JobBoard<S>>>;

/// Router exposing the job board REST surface under `/api`.
pub fn board_router<S>(service: Arc<JobBoard<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/api/jobs", get(list_jobs::<S>).post(create_job::<S>))
        .route("/api/jobs/browse", get(browse_jobs::<S>))
        .route("/api/jobs/recruiter/my-jobs", get(my_jobs::<S>))
        .route(
            "/api/jobs/:id",
            get(get_job::<S>).put(update_job::<S>).delete(delete_job::<S>),
        )
        .route(
            "/api/companies",
            get(list_companies::<S>).post(create_company::<S>),
        )
        .route(
            "/api/companies/recruiter/my-companies",
            get(my_companies::<S>),
        )
        .route(
            "/api/companies/:id",
            get(get_company::<S>)
                .put(update_company::<S>)
                .delete(delete_company::<S>),
        )
        .route("/api/applications", post(apply::<S>))
        .route(
            "/api/applications/my-applications",
            get(my_applications::<S>),
        )
        .route(
            "/api/applications/job/:job_id",
            get(job_applications::<S>),
        )
        .route(
            "/api/applications/:id",
            get(get_application::<S>).delete(withdraw_application::<S>),
        )
        .route(
            "/api/applications/:id/status",
            put(update_application_status::<S>),
        )
        .route("/api/users/webhook", post(identity_webhook::<S>))
        .route("/api/users/clerk/:external_id", get(user_by_external_id::<S>))
        .route(
            "/api/users/profile",
            get(get_profile::<S>).put(update_profile::<S>),
        )
        .route("/api/users/:id/role", put(assign_role::<S>))
        .with_state(service)
}

fn envelope(status: StatusCode, payload: Value) -> Response {
    let mut body = json!({ "success": true });
    if let (Value::Object(target), Value::Object(fields)) = (&mut body, payload) {
        target.extend(fields);
    }
    (status, axum::Json(body)).into_response()
}

fn authenticate<S>(service: &JobBoard<S>, headers: &HeaderMap) -> Result<Principal, BoardError>
where
    S: EntityStore + 'static,
{
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    service.authenticate(authorization)
}

/// Authenticates and applies the role gate before the body is decoded, so a refused
/// caller gets the role answer whatever it sent.
fn authenticate_with<S>(
    service: &JobBoard<S>,
    headers: &HeaderMap,
    gate: fn(&Principal) -> Decision,
) -> Result<Principal, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(service, headers)?;
    gate(&principal)?;
    Ok(principal)
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, BoardError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| BoardError::Validation(rejection.body_text()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobListParams {
    search: Option<String>,
    location: Option<String>,
    category: Option<String>,
    job_type: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl JobListParams {
    fn selector(&self) -> Result<JobSelector, BoardError> {
        let job_type = match self.job_type.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                JobType::parse(raw)
                    .ok_or_else(|| BoardError::Validation(format!("unknown jobType '{raw}'")))?,
            ),
            _ => None,
        };
        Ok(JobSelector {
            search: self.search.as_deref().and_then(TextMatch::new),
            location: self.location.as_deref().and_then(TextMatch::new),
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .map(str::to_string),
            job_type,
            ..JobSelector::active()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct CompanyListParams {
    search: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BrowseParams {
    search: Option<String>,
    categories: Option<String>,
    locations: Option<String>,
    page: Option<String>,
}

impl BrowseParams {
    fn page(&self) -> Result<u32, PageError> {
        match self.page.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or(PageError::InvalidPage),
            _ => Ok(1),
        }
    }
}

async fn list_jobs<S>(
    State(service): Board<S>,
    query: Result<Query<JobListParams>, QueryRejection>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let params = query_params(query)?;
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        service.config().max_page_size,
    )?;
    let listing = service.list_jobs(params.selector()?, page)?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "jobs": listing.items, "pagination": listing.pagination }),
    ))
}

async fn browse_jobs<S>(
    State(service): Board<S>,
    query: Result<Query<BrowseParams>, QueryRejection>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let params = query_params(query)?;
    let filter = BrowseFilter::from_lists(
        params.search.as_deref(),
        params.categories.as_deref(),
        params.locations.as_deref(),
    );
    let page = service.browse_jobs(&filter, params.page()?)?;
    Ok(envelope(
        StatusCode::OK,
        json!({
            "jobs": page.items,
            "pagination": { "total": page.total, "page": page.page, "pages": page.pages },
        }),
    ))
}

async fn my_jobs<S>(State(service): Board<S>, headers: HeaderMap) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let jobs = service.my_jobs(&principal)?;
    Ok(envelope(StatusCode::OK, json!({ "jobs": jobs })))
}

async fn get_job<S>(
    State(service): Board<S>,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let job = service.job(&JobId(id))?;
    Ok(envelope(StatusCode::OK, json!({ "job": job })))
}

async fn create_job<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::require_recruiter)?;
    let job = service.create_job(&principal, input::decode(&body)?)?;
    Ok(envelope(StatusCode::CREATED, json!({ "job": job })))
}

async fn update_job<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::require_recruiter)?;
    let job = service.update_job(&principal, &JobId(id), input::decode(&body)?)?;
    Ok(envelope(StatusCode::OK, json!({ "job": job })))
}

async fn delete_job<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    service.delete_job(&principal, &JobId(id))?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "message": "Job deleted successfully" }),
    ))
}

async fn list_companies<S>(
    State(service): Board<S>,
    query: Result<Query<CompanyListParams>, QueryRejection>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let params = query_params(query)?;
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        service.config().max_page_size,
    )?;
    let selector = CompanySelector {
        search: params.search.as_deref().and_then(TextMatch::new),
        ..CompanySelector::default()
    };
    let listing = service.list_companies(selector, page)?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "companies": listing.items, "pagination": listing.pagination }),
    ))
}

async fn my_companies<S>(
    State(service): Board<S>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let companies = service.my_companies(&principal)?;
    Ok(envelope(StatusCode::OK, json!({ "companies": companies })))
}

async fn get_company<S>(
    State(service): Board<S>,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let company = service.company(&CompanyId(id))?;
    Ok(envelope(StatusCode::OK, json!({ "company": company })))
}

async fn create_company<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::can_create_company)?;
    let company = service.create_company(&principal, input::decode(&body)?)?;
    Ok(envelope(StatusCode::CREATED, json!({ "company": company })))
}

async fn update_company<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::require_recruiter)?;
    let company = service.update_company(&principal, &CompanyId(id), input::decode(&body)?)?;
    Ok(envelope(StatusCode::OK, json!({ "company": company })))
}

async fn delete_company<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    service.delete_company(&principal, &CompanyId(id))?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "message": "Company and associated jobs deleted successfully" }),
    ))
}

async fn apply<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let application = service.apply(&principal, input::decode(&body)?)?;
    Ok(envelope(
        StatusCode::CREATED,
        json!({ "application": application }),
    ))
}

async fn my_applications<S>(
    State(service): Board<S>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let applications = service.my_applications(&principal)?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "applications": applications }),
    ))
}

async fn job_applications<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let applications = service.job_applications(&principal, &JobId(job_id))?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "applications": applications }),
    ))
}

async fn get_application<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let application = service.application(&principal, &ApplicationId(id))?;
    Ok(envelope(StatusCode::OK, json!({ "application": application })))
}

async fn update_application_status<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::require_recruiter)?;
    let application =
        service.update_application_status(&principal, &ApplicationId(id), input::decode(&body)?)?;
    Ok(envelope(StatusCode::OK, json!({ "application": application })))
}

async fn withdraw_application<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    service.withdraw_application(&principal, &ApplicationId(id))?;
    Ok(envelope(
        StatusCode::OK,
        json!({ "message": "Application deleted successfully" }),
    ))
}

async fn identity_webhook<S>(
    State(service): Board<S>,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let event: IdentityEvent = input::decode(&body)?;
    let payload = match service.sync_identity(event)? {
        Some(user) => json!({ "user": user }),
        None => json!({}),
    };
    Ok(envelope(StatusCode::OK, payload))
}

async fn user_by_external_id<S>(
    State(service): Board<S>,
    Path(external_id): Path<String>,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let user = service.user_by_external_id(&external_id)?;
    Ok(envelope(StatusCode::OK, json!({ "user": user })))
}

async fn get_profile<S>(
    State(service): Board<S>,
    headers: HeaderMap,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let profile = service.profile(&principal)?;
    Ok(envelope(StatusCode::OK, json!({ "user": profile })))
}

async fn update_profile<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate(&service, &headers)?;
    let user = service.update_profile(&principal, input::decode(&body)?)?;
    Ok(envelope(StatusCode::OK, json!({ "user": user })))
}

async fn assign_role<S>(
    State(service): Board<S>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, BoardError>
where
    S: EntityStore + 'static,
{
    let principal = authenticate_with(&service, &headers, authz::can_assign_role)?;
    let user = service.assign_role(&principal, &UserId(id), input::decode(&body)?)?;
    Ok(envelope(StatusCode::OK, json!({ "user": user })))
}
