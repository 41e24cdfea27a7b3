use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;

use super::common::*;
use crate::board::domain::{Application, ApplicationId, Role};
use crate::board::integrity::{CacheSync, IntegrityManager};
use crate::board::input::CompanyUpdate;
use crate::board::query::{ApplicationSelector, CompanySelector, JobSelector, PageRequest};
use crate::board::store::{EntityStore, StoreError};
use crate::board::views::CompanyJobs;
use crate::board::workflow::ApplicationStatus;
use crate::board::JobBoard;
use crate::config::BoardConfig;

fn flaky_board(failures: u32, attempts: u8) -> (JobBoard<FlakyStore>, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::failing(failures));
    let config = BoardConfig {
        cache_update_attempts: attempts,
        ..BoardConfig::default()
    };
    (JobBoard::new(store.clone(), authority(), config), store)
}

#[test]
fn transient_cache_failures_are_retried() {
    let (board, store) = flaky_board(2, 3);
    let recruiter = seed_user(store.as_ref(), "rita", Role::Recruiter);
    let company = board
        .create_company(&recruiter, new_company("Acme"))
        .expect("company created");

    let job = board
        .create_job(&recruiter, new_job(&company.id, "Platform Engineer"))
        .expect("job created");

    assert_eq!(store.link_calls.load(Ordering::SeqCst), 3);
    let cached = store
        .fetch_company(&company.id)
        .expect("fetch")
        .expect("company present");
    assert_eq!(cached.jobs, vec![job.id]);
}

#[test]
fn exhausted_cache_phase_keeps_the_primary_record() {
    let (board, store) = flaky_board(u32::MAX, 2);
    let recruiter = seed_user(store.as_ref(), "rita", Role::Recruiter);
    let company = board
        .create_company(&recruiter, new_company("Acme"))
        .expect("company created");

    let job = board
        .create_job(&recruiter, new_job(&company.id, "Platform Engineer"))
        .expect("job creation succeeds despite the stale cache");

    assert_eq!(store.link_calls.load(Ordering::SeqCst), 2);
    let cached = store
        .fetch_company(&company.id)
        .expect("fetch")
        .expect("company present");
    assert!(cached.jobs.is_empty(), "cache left stale");

    // Readers go through the forward reference, so the job is still listed.
    let detail = board.company(&company.id).expect("company detail");
    let value = serde_json::to_value(&detail).expect("serializes");
    assert_eq!(value["jobs"][0]["id"], serde_json::json!(job.id.as_str()));
}

#[test]
fn application_caches_are_updated_independently() {
    let store = Arc::new(FlakyStore::default());
    let manager = IntegrityManager::new(store.clone(), 1);
    let seeker = seed_user(store.as_ref(), "sam", Role::User);
    let recruiter = seed_user(store.as_ref(), "rita", Role::Recruiter);
    let board = JobBoard::new(store.clone(), authority(), BoardConfig::default());
    let company = board
        .create_company(&recruiter, new_company("Acme"))
        .expect("company created");
    let job = board
        .create_job(&recruiter, new_job(&company.id, "Analyst"))
        .expect("job created");

    let now = Utc::now();
    let application = store
        .insert_application(Application {
            id: ApplicationId::generate(),
            job: job.id.clone(),
            applicant: seeker.id.clone(),
            company: company.id.clone(),
            resume: "cv.pdf".to_string(),
            cover_letter: String::new(),
            status: ApplicationStatus::Pending,
            applied_at: now,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
        .expect("application stored");

    store.link_failures.store(1, Ordering::SeqCst);
    let (job_cache, user_cache) = manager.on_application_created(&application);

    assert!(matches!(job_cache, CacheSync::Stale { cache: "job.applications", .. }));
    assert_eq!(user_cache, CacheSync::Synced);
    let user = store
        .fetch_user(&seeker.id)
        .expect("fetch")
        .expect("user present");
    assert_eq!(user.applications, vec![application.id]);
}

#[test]
fn company_cascade_removes_jobs_and_keeps_applications() {
    let s = scenario();
    let second = s
        .board
        .create_job(&s.recruiter, new_job(&s.company, "Frontend Engineer"))
        .expect("second job");
    let application = s
        .board
        .apply(&s.seeker, new_application(&second.id))
        .expect("applied");

    let removed = s
        .board
        .delete_company(&s.recruiter, &s.company)
        .expect("company deleted");

    assert_eq!(removed, 2);
    assert!(s.store.fetch_company(&s.company).expect("fetch").is_none());
    let orphans = s
        .store
        .find_jobs(&JobSelector::for_company(s.company.clone()), None)
        .expect("query");
    assert!(orphans.is_empty(), "no job may point at a missing company");
    let kept = s
        .store
        .find_applications(&ApplicationSelector::default())
        .expect("query");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, application.id);
}

#[test]
fn reads_list_children_that_still_exist() {
    let s = scenario();
    let application = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect("applied");
    s.board
        .withdraw_application(&s.seeker, &application.id)
        .expect("withdrawn");

    let cached = s.store.fetch_job(&s.job).expect("fetch").expect("job present");
    assert_eq!(cached.applications, vec![application.id.clone()]);
    let job = s.board.job(&s.job).expect("job detail");
    assert!(job.applications.is_empty(), "withdrawn ids leaked: {:?}", job.applications);

    let second = s
        .board
        .create_job(&s.recruiter, new_job(&s.company, "Frontend Engineer"))
        .expect("second job");
    s.board.delete_job(&s.recruiter, &s.job).expect("job deleted");

    let cached = s
        .store
        .fetch_company(&s.company)
        .expect("fetch")
        .expect("company present");
    assert!(cached.jobs.contains(&s.job));
    let listing = s
        .board
        .list_companies(CompanySelector::default(), PageRequest::default())
        .expect("listing");
    assert_eq!(listing.items[0].jobs, CompanyJobs::Ids(vec![second.id.clone()]));

    let updated = s
        .board
        .update_company(
            &s.recruiter,
            &s.company,
            CompanyUpdate {
                industry: Some("Robotics".to_string()),
                ..CompanyUpdate::default()
            },
        )
        .expect("updated");
    assert_eq!(updated.jobs, CompanyJobs::Ids(vec![second.id]));
}

#[test]
fn deleting_a_missing_record_reports_not_found() {
    let s = scenario();
    let job = s
        .store
        .fetch_job(&s.job)
        .expect("fetch")
        .expect("job present");
    let manager = IntegrityManager::new(s.store.clone(), 3);

    manager.on_job_deleted(&job).expect("first delete");
    assert_eq!(manager.on_job_deleted(&job), Err(StoreError::NotFound));
}
