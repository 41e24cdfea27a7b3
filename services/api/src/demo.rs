use chrono::Duration;
use clap::Args;
use job_board::board::input::{
    IdentityEmail, IdentityEvent, IdentityEventData, NewApplication, NewCompany, NewJob,
    RoleAssignment, StatusUpdate,
};
use job_board::board::{
    ApplicationStatus, BoardError, CompanySize, JobLevel, JobSelector, JobType, PageRequest,
    Principal, Role, TokenAuthority, User,
};
use job_board::error::AppError;
use job_board::{BoardConfig, InMemoryStore, JobBoard};
use std::sync::Arc;

const DEMO_ADMIN: &str = "demo_admin";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Enforce the review graph for application status changes.
    #[arg(long)]
    pub(crate) strict: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = BoardConfig {
        strict_status_transitions: args.strict,
        bootstrap_admins: vec![DEMO_ADMIN.to_string()],
        ..BoardConfig::default()
    };
    let board = JobBoard::new(
        Arc::new(InMemoryStore::new()),
        TokenAuthority::new("job-board-demo-secret", Duration::hours(1)),
        config,
    );

    println!("Job board demo (in-memory store)");
    println!(
        "- Status transitions: {}",
        if args.strict { "strict" } else { "permissive" }
    );

    let admin = sign_in(&board, DEMO_ADMIN, "Ada", "Admin")?;
    let rita = sign_in(&board, "demo_rita", "Rita", "Recruiter")?;
    let oscar = sign_in(&board, "demo_oscar", "Oscar", "Recruiter")?;
    let sam = sign_in(&board, "demo_sam", "Sam", "Seeker")?;
    println!("- Synced 4 identities; {} bootstrapped as admin", admin.id);

    for recruiter in [&rita, &oscar] {
        board.assign_role(
            &admin,
            &recruiter.id,
            RoleAssignment {
                role: Role::Recruiter,
            },
        )?;
    }
    let rita = Principal {
        role: Role::Recruiter,
        ..rita
    };
    let oscar = Principal {
        role: Role::Recruiter,
        ..oscar
    };
    println!("- Promoted Rita and Oscar to recruiter");

    let company = board.create_company(
        &rita,
        NewCompany {
            name: "Acme Robotics".to_string(),
            description: "Industrial automation".to_string(),
            logo: String::new(),
            website: "https://acme.example.com".to_string(),
            location: "Lisbon".to_string(),
            industry: "Manufacturing".to_string(),
            size: CompanySize::Medium,
        },
    )?;
    println!("\nRita created company {} ({})", company.name, company.id);

    let job = board.create_job(
        &rita,
        NewJob {
            title: "Backend Engineer".to_string(),
            description: "Own the control plane services".to_string(),
            requirements: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            salary: "$80k - $95k".to_string(),
            location: "Remote".to_string(),
            job_type: JobType::FullTime,
            level: JobLevel::Mid,
            category: "Programming".to_string(),
            company: company.id.clone(),
            deadline: None,
        },
    )?;
    println!(
        "- Posted {} [{} | {}] as job {}",
        job.title,
        job.job_type.label(),
        job.location,
        job.id
    );

    match board.create_job(
        &oscar,
        NewJob {
            title: "Impostor Role".to_string(),
            description: "Posted under someone else's company".to_string(),
            requirements: Vec::new(),
            salary: "Negotiable".to_string(),
            location: "Remote".to_string(),
            job_type: JobType::Contract,
            level: JobLevel::Entry,
            category: "Programming".to_string(),
            company: company.id.clone(),
            deadline: None,
        },
    ) {
        Ok(_) => println!("- Unexpected: Oscar posted under Rita's company"),
        Err(err) => println!("- Oscar posting under Rita's company: {}", outcome(&err)),
    }

    let application = board.apply(
        &sam,
        NewApplication {
            job_id: job.id.clone(),
            resume: "https://cv.example.com/sam.pdf".to_string(),
            cover_letter: "Keen to work on robotics".to_string(),
        },
    )?;
    println!(
        "\nSam applied to {} -> application {} ({})",
        job.title,
        application.id,
        application.status.label()
    );

    match board.apply(
        &sam,
        NewApplication {
            job_id: job.id.clone(),
            resume: "https://cv.example.com/sam.pdf".to_string(),
            cover_letter: String::new(),
        },
    ) {
        Ok(_) => println!("- Unexpected: duplicate application accepted"),
        Err(err) => println!("- Second application: {}", outcome(&err)),
    }

    match board.update_application_status(
        &oscar,
        &application.id,
        StatusUpdate {
            status: ApplicationStatus::Reviewing,
            notes: None,
        },
    ) {
        Ok(_) => println!("- Unexpected: Oscar reviewed Rita's applicant"),
        Err(err) => println!("- Oscar changing the status: {}", outcome(&err)),
    }

    for (status, notes) in [
        (ApplicationStatus::Accepted, None),
        (ApplicationStatus::Reviewing, Some("Strong systems background")),
        (ApplicationStatus::Shortlisted, None),
    ] {
        let update = StatusUpdate {
            status,
            notes: notes.map(str::to_string),
        };
        match board.update_application_status(&rita, &application.id, update) {
            Ok(view) => println!(
                "- Rita moved the application to {}{}",
                view.status.label(),
                view.notes
                    .filter(|notes| !notes.is_empty())
                    .map(|notes| format!(" (notes: {notes})"))
                    .unwrap_or_default()
            ),
            Err(err) => println!(
                "- Rita moving the application to {}: {}",
                status.label(),
                outcome(&err)
            ),
        }
    }

    let profile = board.profile(&sam)?;
    println!("\nSam's profile lists {} application(s):", profile.applications.len());
    for entry in &profile.applications {
        println!("  - {} -> {}", entry.id, entry.status.label());
    }

    let removed = board.delete_company(&rita, &company.id)?;
    let remaining = board.list_jobs(JobSelector::default(), PageRequest::default())?;
    println!(
        "\nRita deleted {}: {} job(s) removed, {} active job(s) left",
        company.name, removed, remaining.pagination.total
    );
    let surviving = board.my_applications(&sam)?;
    println!(
        "- Sam still holds {} application(s) after the cascade",
        surviving.len()
    );

    Ok(())
}

fn sign_in(
    board: &JobBoard<InMemoryStore>,
    external_id: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Principal, AppError> {
    let event = IdentityEvent::user_sync(
        "user.created",
        &IdentityEventData {
            id: external_id.to_string(),
            email_addresses: vec![IdentityEmail {
                email_address: format!("{}@example.com", first_name.to_lowercase()),
            }],
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            image_url: None,
        },
    );
    let user: User = board
        .sync_identity(event)?
        .ok_or_else(|| BoardError::Validation("identity event was ignored".to_string()))?;
    Ok(Principal::from(&user))
}

fn outcome(err: &BoardError) -> String {
    match err.code() {
        Some(code) => format!("{} {} ({})", err.status().as_u16(), err, code),
        None => format!("{} {}", err.status().as_u16(), err),
    }
}
