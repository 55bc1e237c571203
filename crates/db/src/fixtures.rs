//! Demo seed data: a small faculty with one admin, three professors and
//! three students, built against the typed domain records.
//!
//! The seeded academic year is not current, so submission and defense
//! windows stay open until an admin activates a year.

use chrono::NaiveDate;
use pfehub_core::academic::{AcademicYearInput, DepartmentInput, SpecializationInput};
use pfehub_core::error::CoreError;
use pfehub_core::types::DbId;
use pfehub_core::users::UserProfile;

use crate::models::user::CreateUser;
use crate::repositories::{AcademicRepo, UserRepo};
use crate::{DbPool, DbResult};

/// Password shared by every demo account (hash supplied by the caller).
pub const DEMO_PASSWORD: &str = "pfehub-demo";

pub const ADMIN_EMAIL: &str = "admin@pfehub.ma";

/// Identifiers of the seeded rows, in creation order.
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub admin_id: DbId,
    pub professor_ids: Vec<DbId>,
    pub student_ids: Vec<DbId>,
    pub department_ids: Vec<DbId>,
    pub specialization_ids: Vec<DbId>,
    pub academic_year_id: DbId,
}

struct Person<'a> {
    first: &'a str,
    last: &'a str,
    email: &'a str,
    department: usize,
    specialization: usize,
}

fn date(y: i32, m: u32, d: u32) -> DbResult<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| CoreError::Internal(format!("invalid fixture date {y}-{m}-{d}")).into())
}

/// Populate an empty store. `password_hash` is stored for every account.
pub async fn seed_demo_data(pool: &DbPool, password_hash: &str) -> DbResult<SeedSummary> {
    let mut department_ids = Vec::new();
    for (name, code) in [("Informatique", "GI"), ("Génie Civil", "GC")] {
        let d = AcademicRepo::create_department(
            pool,
            &DepartmentInput {
                name: name.into(),
                code: code.into(),
                description: None,
            },
        )
        .await?;
        department_ids.push(d.id);
    }

    let mut specialization_ids = Vec::new();
    for (name, code, department) in [
        ("Génie Logiciel", "GL", 0),
        ("Intelligence Artificielle", "IA", 0),
        ("Structures", "ST", 1),
    ] {
        let s = AcademicRepo::create_specialization(
            pool,
            &SpecializationInput {
                name: name.into(),
                code: code.into(),
                description: None,
                department_id: department_ids[department],
            },
        )
        .await?;
        specialization_ids.push(s.id);
    }

    let year = AcademicRepo::create_year(
        pool,
        &AcademicYearInput {
            year: "2024-2025".into(),
            submission_start_date: date(2024, 10, 1)?,
            submission_end_date: date(2025, 2, 28)?,
            defense_start_date: date(2025, 6, 1)?,
            defense_end_date: date(2025, 7, 31)?,
            is_current: false,
        },
    )
    .await?;

    let account = |p: &Person<'_>, profile: UserProfile| CreateUser {
        first_name: p.first.into(),
        last_name: p.last.into(),
        email: p.email.into(),
        password_hash: password_hash.to_string(),
        department_id: Some(department_ids[p.department]),
        specialization_id: Some(specialization_ids[p.specialization]),
        profile,
    };

    let admin = UserRepo::create(
        pool,
        CreateUser {
            first_name: "Admin".into(),
            last_name: "PFEHub".into(),
            email: ADMIN_EMAIL.into(),
            password_hash: password_hash.to_string(),
            department_id: None,
            specialization_id: None,
            profile: UserProfile::Admin {
                permissions: vec!["ALL".into()],
            },
        },
    )
    .await?;

    let professors = [
        (
            Person { first: "Karim", last: "Alaoui", email: "k.alaoui@pfehub.ma", department: 0, specialization: 0 },
            vec!["web", "java", "devops"],
            5,
        ),
        (
            Person { first: "Nadia", last: "Tazi", email: "n.tazi@pfehub.ma", department: 0, specialization: 1 },
            vec!["machine learning", "nlp", "python"],
            5,
        ),
        (
            Person { first: "Omar", last: "Fassi", email: "o.fassi@pfehub.ma", department: 1, specialization: 2 },
            vec!["structures", "beton"],
            2,
        ),
    ];
    let mut professor_ids = Vec::new();
    for (person, expertise, capacity) in &professors {
        let profile = UserProfile::Professor {
            expertise: expertise.iter().map(|s| s.to_string()).collect(),
            current_project_count: 0,
            max_project_capacity: *capacity,
        };
        professor_ids.push(UserRepo::create(pool, account(person, profile)).await?.id);
    }

    let students = [
        Person { first: "Sara", last: "Idrissi", email: "s.idrissi@pfehub.ma", department: 0, specialization: 0 },
        Person { first: "Youssef", last: "Berrada", email: "y.berrada@pfehub.ma", department: 0, specialization: 1 },
        Person { first: "Imane", last: "Chami", email: "i.chami@pfehub.ma", department: 1, specialization: 2 },
    ];
    let mut student_ids = Vec::new();
    for (index, person) in students.iter().enumerate() {
        let profile = UserProfile::Student {
            student_number: format!("E2025{:03}", index + 1),
            promotion: "2025".into(),
        };
        student_ids.push(UserRepo::create(pool, account(person, profile)).await?.id);
    }

    tracing::info!(
        professors = professor_ids.len(),
        students = student_ids.len(),
        "Demo data seeded"
    );

    Ok(SeedSummary {
        admin_id: admin.id,
        professor_ids,
        student_ids,
        department_ids,
        specialization_ids,
        academic_year_id: year.id,
    })
}
