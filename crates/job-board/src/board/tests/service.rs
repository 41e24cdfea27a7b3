use std::thread;

use super::common::*;
use crate::board::authz::Denial;
use crate::board::domain::{
    ApplicationId, CompanyId, JobId, JobLevel, JobStatus, JobType, Role, UserId,
};
use crate::board::error::{BoardError, Entity};
use crate::board::input::{
    IdentityEmail, IdentityEvent, IdentityEventData, JobUpdate, ProfileUpdate, RoleAssignment,
    StatusUpdate,
};
use crate::board::query::ApplicationSelector;
use crate::board::store::EntityStore;
use crate::board::views::Reference;
use crate::board::workflow::ApplicationStatus;
use crate::config::BoardConfig;

fn status(status: ApplicationStatus, notes: Option<&str>) -> StatusUpdate {
    StatusUpdate {
        status,
        notes: notes.map(str::to_string),
    }
}

fn identity_event(kind: &str, external_id: &str, email: &str) -> IdentityEvent {
    IdentityEvent::user_sync(
        kind,
        &IdentityEventData {
            id: external_id.to_string(),
            email_addresses: vec![IdentityEmail {
                email_address: email.to_string(),
            }],
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
            image_url: Some("https://img.example.com/grace.png".to_string()),
        },
    )
}

#[test]
fn hiring_round_follows_ownership_and_uniqueness_rules() {
    let s = scenario();

    let rename = JobUpdate {
        title: Some("Staff Engineer".to_string()),
        ..JobUpdate::default()
    };
    let err = s
        .board
        .update_job(&s.other_recruiter, &s.job, rename)
        .expect_err("non-owner cannot edit");
    assert!(matches!(err, BoardError::Forbidden(Denial::NotJobOwner)));

    let application = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect("first application");
    assert_eq!(application.status, ApplicationStatus::Pending);

    let err = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect_err("second application");
    assert_eq!(err.to_string(), "You have already applied for this job");
    assert!(matches!(err, BoardError::Conflict(_)));

    let updated = s
        .board
        .update_application_status(
            &s.recruiter,
            &application.id,
            status(ApplicationStatus::Shortlisted, None),
        )
        .expect("owner updates status");
    assert_eq!(updated.status, ApplicationStatus::Shortlisted);

    let err = s
        .board
        .update_application_status(
            &s.other_recruiter,
            &application.id,
            status(ApplicationStatus::Rejected, None),
        )
        .expect_err("non-owner status update");
    assert!(matches!(err, BoardError::Forbidden(Denial::NotJobOwner)));

    let stored = s
        .store
        .fetch_application(&application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.status, ApplicationStatus::Shortlisted);
}

#[test]
fn concurrent_duplicate_applications_admit_exactly_one() {
    let s = scenario();

    let outcomes: Vec<Result<ApplicationId, BoardError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    s.board
                        .apply(&s.seeker, new_application(&s.job))
                        .map(|view| view.id)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker finished"))
            .collect()
    });

    let accepted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(BoardError::Conflict(_))))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 7);

    let stored = s
        .store
        .find_applications(&ApplicationSelector {
            job: Some(s.job.clone()),
            applicant: Some(s.seeker.id.clone()),
        })
        .expect("query");
    assert_eq!(stored.len(), 1);
}

#[test]
fn forbidden_and_not_found_are_never_conflated() {
    let s = scenario();
    let missing = JobId::from("no-such-job");

    assert!(matches!(
        s.board.delete_job(&s.other_recruiter, &s.job),
        Err(BoardError::Forbidden(Denial::NotJobOwner))
    ));
    assert!(matches!(
        s.board.delete_job(&s.other_recruiter, &missing),
        Err(BoardError::NotFound(Entity::Job))
    ));
    assert!(matches!(
        s.board
            .update_job(&s.other_recruiter, &missing, JobUpdate::default()),
        Err(BoardError::NotFound(Entity::Job))
    ));
    assert!(matches!(
        s.board.delete_company(&s.other_recruiter, &s.company),
        Err(BoardError::Forbidden(Denial::NotCompanyOwner))
    ));
    assert!(matches!(
        s.board
            .delete_company(&s.other_recruiter, &CompanyId::from("gone")),
        Err(BoardError::NotFound(Entity::Company))
    ));

    // The role gate runs before any lookup.
    assert!(matches!(
        s.board.delete_job(&s.seeker, &missing),
        Err(BoardError::Forbidden(Denial::RecruiterRoleRequired))
    ));
}

#[test]
fn created_job_round_trips_with_server_fields() {
    let s = scenario();
    let mut input = new_job(&s.company, "Data Engineer");
    input.job_type = JobType::Remote;
    input.level = JobLevel::Lead;
    input.requirements = vec!["SQL".to_string(), "Python".to_string()];

    let created = s
        .board
        .create_job(&s.recruiter, input.clone())
        .expect("created");
    let fetched = s.board.job(&created.id).expect("fetched");

    assert_eq!(fetched, created);
    assert_eq!(fetched.title, input.title);
    assert_eq!(fetched.description, input.description);
    assert_eq!(fetched.requirements, input.requirements);
    assert_eq!(fetched.salary, input.salary);
    assert_eq!(fetched.location, input.location);
    assert_eq!(fetched.job_type, JobType::Remote);
    assert_eq!(fetched.level, JobLevel::Lead);
    assert_eq!(fetched.category, input.category);
    assert_eq!(fetched.status, JobStatus::Active);
    assert!(fetched.applications.is_empty());
    assert!(fetched.created_at <= fetched.updated_at);
    assert_eq!(
        fetched.company.populated().map(|company| company.name.as_str()),
        Some("Acme")
    );
    assert_eq!(
        fetched.recruiter.populated().map(|recruiter| &recruiter.id),
        Some(&s.recruiter.id)
    );
}

#[test]
fn job_inherits_company_recruiter_and_rejects_foreign_company() {
    let s = scenario();
    let err = s
        .board
        .create_job(&s.other_recruiter, new_job(&s.company, "Intruder"))
        .expect_err("cannot post under someone else's company");
    assert!(matches!(err, BoardError::Forbidden(Denial::NotCompanyOwner)));

    let err = s
        .board
        .create_job(&s.recruiter, new_job(&CompanyId::from("ghost"), "Nowhere"))
        .expect_err("unknown company");
    assert!(matches!(err, BoardError::NotFound(Entity::Company)));

    let job = s
        .store
        .fetch_job(&s.job)
        .expect("fetch")
        .expect("present");
    assert_eq!(job.recruiter, s.recruiter.id);
    let company = s
        .store
        .fetch_company(&s.company)
        .expect("fetch")
        .expect("present");
    assert_eq!(company.jobs, vec![s.job.clone()]);
}

#[test]
fn notes_are_shown_only_to_the_job_owner() {
    let s = scenario();
    let application = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect("applied");
    s.board
        .update_application_status(
            &s.recruiter,
            &application.id,
            status(ApplicationStatus::Reviewing, Some("strong systems background")),
        )
        .expect("status updated");

    let for_recruiter = s
        .board
        .application(&s.recruiter, &application.id)
        .expect("recruiter view");
    assert_eq!(
        for_recruiter.notes.as_deref(),
        Some("strong systems background")
    );
    assert!(matches!(for_recruiter.applicant, Reference::Populated(_)));

    let for_seeker = s
        .board
        .application(&s.seeker, &application.id)
        .expect("seeker view");
    assert_eq!(for_seeker.notes, None);

    assert!(matches!(
        s.board.application(&s.other_recruiter, &application.id),
        Err(BoardError::Forbidden(Denial::NotApplicationParticipant))
    ));
}

#[test]
fn listing_applications_for_a_job_requires_ownership() {
    let s = scenario();
    s.board
        .apply(&s.seeker, new_application(&s.job))
        .expect("applied");

    let applications = s
        .board
        .job_applications(&s.recruiter, &s.job)
        .expect("owner lists");
    assert_eq!(applications.len(), 1);
    let applicant = applications[0]
        .applicant
        .populated()
        .expect("applicant expanded");
    assert_eq!(applicant.email, "sam@example.com");

    assert!(matches!(
        s.board.job_applications(&s.other_recruiter, &s.job),
        Err(BoardError::Forbidden(Denial::NotJobOwner))
    ));
    assert!(matches!(
        s.board.job_applications(&s.seeker, &s.job),
        Err(BoardError::Forbidden(Denial::RecruiterRoleRequired))
    ));
}

#[test]
fn withdrawal_is_reserved_to_the_applicant() {
    let s = scenario();
    let application = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect("applied");

    assert!(matches!(
        s.board.withdraw_application(&s.recruiter, &application.id),
        Err(BoardError::Forbidden(Denial::NotApplicant))
    ));
    s.board
        .withdraw_application(&s.seeker, &application.id)
        .expect("applicant withdraws");
    assert!(matches!(
        s.board.withdraw_application(&s.seeker, &application.id),
        Err(BoardError::NotFound(Entity::Application))
    ));

    // The stale id stays in the job cache, and the pair is free again.
    let job = s
        .store
        .fetch_job(&s.job)
        .expect("fetch")
        .expect("present");
    assert_eq!(job.applications, vec![application.id]);
    s.board
        .apply(&s.seeker, new_application(&s.job))
        .expect("can apply again");
}

#[test]
fn profile_lists_applications_through_the_forward_reference() {
    let s = scenario();
    let first = s
        .board
        .apply(&s.seeker, new_application(&s.job))
        .expect("applied");
    let other_job = s
        .board
        .create_job(&s.recruiter, new_job(&s.company, "SRE"))
        .expect("job");
    let second = s
        .board
        .apply(&s.seeker, new_application(&other_job.id))
        .expect("applied");

    let profile = s.board.profile(&s.seeker).expect("profile");
    let ids: Vec<_> = profile.applications.iter().map(|view| view.id.clone()).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(profile.applications[0].job.populated().is_some());
    assert!(profile.applications[0].company.populated().is_some());
}

#[test]
fn profile_update_keeps_blank_fields_and_replaces_skills() {
    let s = scenario();
    s.board
        .update_profile(
            &s.seeker,
            ProfileUpdate {
                phone: Some("+351 900 000 000".to_string()),
                skills: Some(vec!["Rust".to_string(), "SQL".to_string()]),
                ..ProfileUpdate::default()
            },
        )
        .expect("first update");

    let user = s
        .board
        .update_profile(
            &s.seeker,
            ProfileUpdate {
                name: Some("   ".to_string()),
                phone: Some(String::new()),
                location: Some("Braga".to_string()),
                skills: Some(vec![" Go ".to_string(), "".to_string()]),
                ..ProfileUpdate::default()
            },
        )
        .expect("second update");

    assert_eq!(user.name, "sam");
    assert_eq!(user.phone, "+351 900 000 000");
    assert_eq!(user.location, "Braga");
    assert_eq!(user.skills, vec!["Go".to_string()]);
}

#[test]
fn identity_sync_upserts_by_external_id() {
    let (board, _) = board_with(BoardConfig {
        bootstrap_admins: vec!["user_root".to_string()],
        ..BoardConfig::default()
    });

    let created = board
        .sync_identity(identity_event("user.created", "user_42", " Grace@Navy.MIL "))
        .expect("sync")
        .expect("user returned");
    assert_eq!(created.email, "grace@navy.mil");
    assert_eq!(created.name, "Grace Hopper");
    assert_eq!(created.role, Role::User);

    let updated = board
        .sync_identity(identity_event("user.updated", "user_42", "grace@example.com"))
        .expect("sync")
        .expect("user returned");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.email, "grace@example.com");

    let root = board
        .sync_identity(identity_event("user.created", "user_root", "root@example.com"))
        .expect("sync")
        .expect("user returned");
    assert_eq!(root.role, Role::Admin);

    let err = board
        .sync_identity(identity_event("user.created", "user_43", "grace@example.com"))
        .expect_err("email belongs to user_42");
    assert!(matches!(err, BoardError::Conflict(_)));

    let ignored = board
        .sync_identity(identity_event("session.created", "user_42", "x@example.com"))
        .expect("acknowledged");
    assert!(ignored.is_none());

    assert_eq!(
        board.user_by_external_id("user_42").expect("lookup").id,
        created.id
    );
    assert!(matches!(
        board.user_by_external_id("user_404"),
        Err(BoardError::NotFound(Entity::User))
    ));
}

#[test]
fn only_admins_assign_roles() {
    let s = scenario();
    let admin = seed_user(s.store.as_ref(), "ada", Role::Admin);

    assert!(matches!(
        s.board.assign_role(
            &s.recruiter,
            &s.seeker.id,
            RoleAssignment {
                role: Role::Recruiter
            }
        ),
        Err(BoardError::Forbidden(Denial::AdminRoleRequired))
    ));

    let promoted = s
        .board
        .assign_role(
            &admin,
            &s.seeker.id,
            RoleAssignment {
                role: Role::Recruiter,
            },
        )
        .expect("admin promotes");
    assert_eq!(promoted.role, Role::Recruiter);

    // Admins still hold no ownership override.
    assert!(matches!(
        s.board.delete_job(&admin, &s.job),
        Err(BoardError::Forbidden(Denial::NotJobOwner))
    ));
}

#[test]
fn bearer_tokens_resolve_to_stored_users() {
    let s = scenario();
    let header = bearer(&s.seeker);
    let principal = s
        .board
        .authenticate(Some(header.as_str()))
        .expect("valid token");
    assert_eq!(principal, s.seeker);

    assert!(matches!(
        s.board.authenticate(None),
        Err(BoardError::Unauthenticated(_))
    ));
    assert!(matches!(
        s.board.authenticate(Some("Bearer garbage")),
        Err(BoardError::Unauthenticated(_))
    ));

    let stranger = authority()
        .issue(&UserId::from("deleted-user"))
        .expect("token");
    let header = format!("Bearer {stranger}");
    assert!(matches!(
        s.board.authenticate(Some(header.as_str())),
        Err(BoardError::Unauthenticated(_))
    ));
}
