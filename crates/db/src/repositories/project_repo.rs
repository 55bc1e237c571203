//! Repository for the `projects` table and its lifecycle transitions.
//!
//! Every transition loads the row, runs the pure transition from
//! `pfehub_core::project` and writes the result inside one write
//! transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use pfehub_core::error::CoreError;
use pfehub_core::project::{
    self, AssignmentInput, Project, ProjectResubmission, ProjectStatus, ProjectSubmission,
};
use pfehub_core::recommendation::{self, ProjectProfile, Recommendation, ScoringStrategy};
use pfehub_core::roles::{Actor, Role};
use pfehub_core::stats::{self, NO_DEPARTMENT};
use pfehub_core::types::{DbId, FileRef};
use sqlx::types::Json;

use crate::models::project::{FileOwner, ProjectFilter, ProjectRow, ProjectStats, PROJECT_COLUMNS};
use crate::repositories::{academic_repo, user_repo};
use crate::{begin_write, next_id, DbConn, DbPool, DbResult, DbTransaction};

pub struct ProjectRepo;

/// Upper bound on rows returned by [`ProjectRepo::recent`].
pub const MAX_RECENT: u32 = 50;

pub(crate) async fn load(conn: &mut DbConn, id: DbId) -> DbResult<Project> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
    sqlx::query_as::<_, ProjectRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound { entity: "Project", id })?
        .try_into()
}

pub(crate) async fn load_of_student(conn: &mut DbConn, student_id: DbId) -> DbResult<Option<Project>> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE student_id = $1");
    sqlx::query_as::<_, ProjectRow>(&query)
        .bind(student_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Project::try_from)
        .transpose()
}

async fn fetch_all(conn: &mut DbConn, query: &str, binds: &[Option<DbId>]) -> DbResult<Vec<Project>> {
    let mut q = sqlx::query_as::<_, ProjectRow>(query);
    for value in binds {
        q = q.bind(*value);
    }
    q.fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Project::try_from)
        .collect()
}

pub(crate) async fn load_all(conn: &mut DbConn) -> DbResult<Vec<Project>> {
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id");
    fetch_all(conn, &query, &[]).await
}

/// Insert or overwrite the row for `project`.
pub(crate) async fn save(conn: &mut DbConn, project: &Project) -> DbResult<()> {
    let columns: Vec<&str> = PROJECT_COLUMNS.split(',').map(str::trim).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .skip(1)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();
    let query = format!(
        "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES ({})
         ON CONFLICT (id) DO UPDATE SET {}",
        placeholders.join(", "),
        updates.join(", ")
    );
    sqlx::query(&query)
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.objectives)
        .bind(&project.context)
        .bind(&project.methodology)
        .bind(&project.expected_results)
        .bind(Json(&project.keywords))
        .bind(project.status.as_str())
        .bind(project.student_id)
        .bind(project.professor_id)
        .bind(project.proposal_file.as_ref().map(Json))
        .bind(project.submitted_at)
        .bind(project.assigned_at)
        .bind(project.accepted_at)
        .bind(project.final_submitted_at)
        .bind(project.final_report.as_ref().map(Json))
        .bind(&project.professor_comments)
        .bind(&project.rejection_reason)
        .bind(i64::from(project.revision))
        .bind(project.updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Check, write and commit the result of a transition.
async fn commit(mut tx: DbTransaction, next: Project) -> DbResult<Project> {
    project::check_invariants(&next)?;
    save(&mut tx, &next).await?;
    tx.commit().await?;
    Ok(next)
}

impl ProjectRepo {
    /// Create the acting student's project.
    pub async fn submit(
        pool: &DbPool,
        actor: &Actor,
        input: &ProjectSubmission,
        proposal_file: Option<FileRef>,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let existing = load_of_student(&mut tx, actor.user_id).await?;
        let year = academic_repo::load_current_year(&mut tx).await?;
        let id = next_id(&mut tx, "projects").await?;
        let created = project::submit(
            id,
            actor,
            input,
            existing.as_ref(),
            year.as_ref(),
            proposal_file,
            Utc::now(),
        )?;
        let created = commit(tx, created).await?;
        tracing::debug!(project_id = id, student_id = actor.user_id, "Project row created");
        Ok(created)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> DbResult<Project> {
        let mut conn = pool.acquire().await?;
        load(&mut conn, id).await
    }

    /// The student's single project, if any.
    pub async fn find_by_student(pool: &DbPool, student_id: DbId) -> DbResult<Option<Project>> {
        let mut conn = pool.acquire().await?;
        load_of_student(&mut conn, student_id).await
    }

    /// Projects matching `filter`, newest submission first. Ids follow
    /// submission order.
    pub async fn list(pool: &DbPool, filter: &ProjectFilter) -> DbResult<Vec<Project>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE ($1 IS NULL OR status = $1)
               AND ($2 IS NULL OR professor_id = $2)
               AND ($3 IS NULL OR student_id = $3)
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.professor_id)
            .bind(filter.student_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Project::try_from)
            .collect()
    }

    /// Oldest first, so the longest-waiting proposal is assigned first.
    pub async fn pending_assignments(pool: &DbPool) -> DbResult<Vec<Project>> {
        let mut projects =
            Self::list(pool, &ProjectFilter::with_status(ProjectStatus::PendingAssignment)).await?;
        projects.reverse();
        Ok(projects)
    }

    /// Final report in and no defense proposed yet (or the last one postponed).
    pub async fn ready_for_defense(pool: &DbPool, professor_id: Option<DbId>) -> DbResult<Vec<Project>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.status = '{}'
               AND ($1 IS NULL OR p.professor_id = $1)
               AND NOT EXISTS (
                   SELECT 1 FROM defenses d WHERE d.project_id = p.id AND d.status != 'REPORTEE')
             ORDER BY p.id",
            ProjectStatus::FinalSubmission.as_str()
        );
        let mut conn = pool.acquire().await?;
        fetch_all(&mut conn, &query, &[professor_id]).await
    }

    /// Case-insensitive match on title, description or keywords.
    pub async fn search(pool: &DbPool, text: &str) -> DbResult<Vec<Project>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Err(CoreError::field("q", "a search term is required").into());
        }
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE instr(lower(title), $1) > 0
                OR instr(lower(description), $1) > 0
                OR instr(lower(keywords), $1) > 0
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(needle)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Project::try_from)
            .collect()
    }

    /// Most recently submitted projects, at most [`MAX_RECENT`].
    pub async fn recent(pool: &DbPool, limit: u32) -> DbResult<Vec<Project>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id DESC LIMIT $1"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(i64::from(limit.clamp(1, MAX_RECENT)))
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Project::try_from)
            .collect()
    }

    /// Counts by status and by the student's department.
    pub async fn stats(pool: &DbPool) -> DbResult<ProjectStats> {
        let mut conn = pool.acquire().await?;
        let projects = fetch_all(
            &mut conn,
            &format!("SELECT {PROJECT_COLUMNS} FROM projects"),
            &[],
        )
        .await?;
        let departments: Vec<(DbId, Option<String>)> = sqlx::query_as(
            "SELECT p.id, d.name FROM projects p
             JOIN users u ON u.id = p.student_id
             LEFT JOIN departments d ON d.id = u.department_id",
        )
        .fetch_all(&mut *conn)
        .await?;
        let department_of: BTreeMap<DbId, String> = departments
            .into_iter()
            .map(|(id, name)| (id, name.unwrap_or_else(|| NO_DEPARTMENT.to_string())))
            .collect();

        let mut out = ProjectStats {
            total: projects.len(),
            ..Default::default()
        };
        for status in ProjectStatus::ALL {
            out.by_status.insert(status.as_str().to_string(), 0);
        }
        for p in &projects {
            if stats::is_active(p) {
                out.active_projects += 1;
            }
            *out.by_status.entry(p.status.as_str().to_string()).or_default() += 1;
            let department = department_of
                .get(&p.id)
                .cloned()
                .unwrap_or_else(|| NO_DEPARTMENT.to_string());
            *out.by_department.entry(department).or_default() += 1;
        }
        Ok(out)
    }

    /// Which project (and deliverable) stores a file at `path`.
    pub async fn find_file_owner(pool: &DbPool, path: &str) -> DbResult<Option<FileOwner>> {
        let mut conn = pool.acquire().await?;
        let in_project: Option<(DbId, bool)> = sqlx::query_as(
            "SELECT id, COALESCE(json_extract(proposal_file, '$.path') = $1, 0) FROM projects
             WHERE json_extract(proposal_file, '$.path') = $1
                OR json_extract(final_report, '$.path') = $1
             LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some((id, is_proposal)) = in_project {
            return Ok(Some(if is_proposal {
                FileOwner::Proposal(id)
            } else {
                FileOwner::FinalReport(id)
            }));
        }
        let deliverable: Option<(DbId, DbId)> = sqlx::query_as(
            "SELECT id, project_id FROM deliverables WHERE json_extract(file, '$.path') = $1 LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(deliverable.map(|(deliverable_id, project_id)| FileOwner::Deliverable {
            project_id,
            deliverable_id,
        }))
    }

    pub async fn assign(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: &AssignmentInput,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let professor = user_repo::load(&mut tx, input.professor_id).await?;
        let next = project::assign(&current, actor, &professor, input.notes.as_deref(), Utc::now())?;
        commit(tx, next).await
    }

    pub async fn accept(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        comments: Option<&str>,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let next = project::accept(&current, actor, comments, Utc::now())?;
        commit(tx, next).await
    }

    pub async fn reject(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        reason: &str,
        comments: Option<&str>,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let next = project::reject(&current, actor, reason, comments, Utc::now())?;
        commit(tx, next).await
    }

    pub async fn request_revision(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        comments: &str,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let next = project::request_revision(&current, actor, comments, Utc::now())?;
        commit(tx, next).await
    }

    /// The refused project goes back to the same professor, who must have
    /// room for it again.
    pub async fn resubmit(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        update: &ProjectResubmission,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let next = project::resubmit(&current, actor, update, Utc::now())?;
        let professor_id = current.professor_id.ok_or_else(|| {
            CoreError::Internal(format!("refused project {id} has no professor"))
        })?;
        let professor = user_repo::load(&mut tx, professor_id).await?;
        project::ensure_resubmission_capacity(&current, &professor)?;
        commit(tx, next).await
    }

    pub async fn submit_final_report(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        report: FileRef,
    ) -> DbResult<Project> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        let next = project::submit_final_report(&current, actor, report, Utc::now())?;
        commit(tx, next).await
    }

    /// Rank professors for a project awaiting assignment.
    pub async fn recommendations(
        pool: &DbPool,
        id: DbId,
        strategy: &dyn ScoringStrategy,
        limit: usize,
    ) -> DbResult<Vec<Recommendation>> {
        let mut conn = pool.acquire().await?;
        let current = load(&mut conn, id).await?;
        if current.status != ProjectStatus::PendingAssignment {
            return Err(CoreError::InvalidTransition {
                entity: "Project",
                action: "recommend professors for",
                status: current.status.to_string(),
            }
            .into());
        }
        let student = user_repo::load(&mut conn, current.student_id).await?;
        let profile = ProjectProfile::new(&current, &student);
        let candidates = user_repo::load_by_role(&mut conn, Role::Professor).await?;
        Ok(recommendation::recommend(strategy, &profile, &candidates, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{DeliverableRepo, UserRepo};
    use crate::test_support::{admin, seeded};
    use crate::DbError;
    use assert_matches::assert_matches;
    use pfehub_core::deliverable::{DeliverableKind, DeliverableSubmission};
    use pfehub_core::project::ProjectResubmission;
    use pfehub_core::recommendation::WeightedScoring;

    fn submission(title: &str) -> ProjectSubmission {
        ProjectSubmission {
            title: title.into(),
            description: "Description".into(),
            objectives: "Objectifs".into(),
            context: None,
            methodology: None,
            expected_results: None,
            keywords: vec!["web".into()],
        }
    }

    fn file(path: &str) -> FileRef {
        FileRef {
            path: path.into(),
            original_name: "f.pdf".into(),
            size_bytes: 3,
            sha256: "cd".repeat(32),
        }
    }

    async fn load_of(pool: &DbPool, professor_id: DbId) -> u32 {
        UserRepo::find_by_id(pool, professor_id)
            .await
            .unwrap()
            .workload()
            .unwrap()
            .0
    }

    async fn assigned(pool: &DbPool, s: &crate::fixtures::SeedSummary, student: usize, professor: DbId) -> Project {
        let p = ProjectRepo::submit(
            pool,
            &Actor::student(s.student_ids[student]),
            &submission(&format!("Projet {student}")),
            None,
        )
        .await
        .unwrap();
        let input = AssignmentInput {
            professor_id: professor,
            notes: None,
        };
        ProjectRepo::assign(pool, p.id, &admin(s), &input).await.unwrap()
    }

    #[tokio::test]
    async fn test_submit_assign_updates_professor_load() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[1]);
        let p = ProjectRepo::submit(&pool, &student, &submission("Titre X"), None)
            .await
            .unwrap();
        assert_eq!(p.status, ProjectStatus::PendingAssignment);

        let before = load_of(&pool, s.professor_ids[1]).await;
        let input = AssignmentInput {
            professor_id: s.professor_ids[1],
            notes: None,
        };
        let p = ProjectRepo::assign(&pool, p.id, &admin(&s), &input).await.unwrap();
        assert_eq!(p.status, ProjectStatus::UnderReview);
        assert_eq!(load_of(&pool, s.professor_ids[1]).await, before + 1);
        assert_eq!(ProjectRepo::find_by_id(&pool, p.id).await.unwrap(), p);
    }

    #[tokio::test]
    async fn test_one_project_per_student() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[1]);
        ProjectRepo::submit(&pool, &student, &submission("A"), None).await.unwrap();
        let err = ProjectRepo::submit(&pool, &student, &submission("B"), None)
            .await
            .unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_row_untouched() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[1]);
        let p = ProjectRepo::submit(&pool, &student, &submission("A"), None).await.unwrap();
        let err = ProjectRepo::accept(&pool, p.id, &Actor::professor(s.professor_ids[0]), None)
            .await
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(ProjectRepo::find_by_id(&pool, p.id).await.unwrap(), p);
    }

    #[tokio::test]
    async fn test_concurrent_assign_only_one_wins() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[1]);
        let p = ProjectRepo::submit(&pool, &student, &submission("A"), None).await.unwrap();
        let project_id = p.id;

        let tasks: Vec<_> = s
            .professor_ids
            .iter()
            .map(|&professor_id| {
                let pool = pool.clone();
                let admin = admin(&s);
                tokio::spawn(async move {
                    let input = AssignmentInput {
                        professor_id,
                        notes: None,
                    };
                    ProjectRepo::assign(&pool, project_id, &admin, &input).await
                })
            })
            .collect();
        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_resubmit_refused_when_supervisor_filled_up_meanwhile() {
        let (pool, s) = seeded().await;
        let fassi = s.professor_ids[2];
        let first = assigned(&pool, &s, 0, fassi).await;
        assigned(&pool, &s, 1, fassi).await;
        assert_eq!(load_of(&pool, fassi).await, 2);

        ProjectRepo::reject(&pool, first.id, &Actor::professor(fassi), "Sujet trop large", None)
            .await
            .unwrap();
        assert_eq!(load_of(&pool, fassi).await, 1);
        assigned(&pool, &s, 2, fassi).await;

        let err = ProjectRepo::resubmit(
            &pool,
            first.id,
            &Actor::student(s.student_ids[0]),
            &ProjectResubmission::default(),
        )
        .await
        .unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(ref m)) if m.contains("maximum capacity (2/2)"));
        assert_eq!(load_of(&pool, fassi).await, 2);
        assert_eq!(
            ProjectRepo::find_by_id(&pool, first.id).await.unwrap().status,
            ProjectStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_resubmit_within_capacity() {
        let (pool, s) = seeded().await;
        let professor = s.professor_ids[0];
        let p = assigned(&pool, &s, 0, professor).await;
        ProjectRepo::reject(&pool, p.id, &Actor::professor(professor), "A revoir", None)
            .await
            .unwrap();
        let update = ProjectResubmission {
            title: Some("Titre revu".into()),
            ..Default::default()
        };
        let p = ProjectRepo::resubmit(&pool, p.id, &Actor::student(s.student_ids[0]), &update)
            .await
            .unwrap();
        assert_eq!(p.status, ProjectStatus::UnderReview);
        assert_eq!(p.revision, 1);
        assert_eq!(p.title, "Titre revu");
        assert_eq!(load_of(&pool, professor).await, 1);
    }

    #[tokio::test]
    async fn test_request_revision_stores_comments() {
        let (pool, s) = seeded().await;
        let professor = s.professor_ids[0];
        let p = assigned(&pool, &s, 0, professor).await;
        let p = ProjectRepo::request_revision(&pool, p.id, &Actor::professor(professor), "Détailler le planning")
            .await
            .unwrap();
        assert_eq!(p.status, ProjectStatus::UnderReview);
        assert_eq!(p.professor_comments.as_deref(), Some("Détailler le planning"));
    }

    #[tokio::test]
    async fn test_search_recent_and_stats() {
        let (pool, s) = seeded().await;
        let mut input = submission("Détection de fraude");
        input.keywords = vec!["Machine Learning".into()];
        ProjectRepo::submit(&pool, &Actor::student(s.student_ids[0]), &input, None)
            .await
            .unwrap();
        assigned(&pool, &s, 1, s.professor_ids[0]).await;

        let hits = ProjectRepo::search(&pool, "machine").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Détection de fraude");
        assert!(ProjectRepo::search(&pool, "  ").await.is_err());

        let recent = ProjectRepo::recent(&pool, 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Projet 1");

        let stats = ProjectRepo::stats(&pool).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status["EN_ATTENTE_ASSIGNATION"], 1);
        assert_eq!(stats.by_status["EN_REVISION"], 1);
        assert_eq!(stats.by_status["EVALUE"], 0);
        assert_eq!(stats.by_department["Informatique"], 2);
    }

    #[tokio::test]
    async fn test_file_owner_lookup() {
        let (pool, s) = seeded().await;
        let p = ProjectRepo::submit(
            &pool,
            &Actor::student(s.student_ids[0]),
            &submission("Portail"),
            Some(file("proposals/abc.pdf")),
        )
        .await
        .unwrap();
        assert_eq!(
            ProjectRepo::find_file_owner(&pool, "proposals/abc.pdf").await.unwrap(),
            Some(FileOwner::Proposal(p.id))
        );
        assert_eq!(ProjectRepo::find_file_owner(&pool, "proposals/other.pdf").await.unwrap(), None);

        let professor = Actor::professor(s.professor_ids[0]);
        let input = AssignmentInput {
            professor_id: professor.user_id,
            notes: None,
        };
        ProjectRepo::assign(&pool, p.id, &admin(&s), &input).await.unwrap();
        ProjectRepo::accept(&pool, p.id, &professor, None).await.unwrap();
        let d = DeliverableRepo::create(
            &pool,
            &Actor::student(s.student_ids[0]),
            &DeliverableSubmission {
                project_id: p.id,
                title: "Code".into(),
                description: "Jalon".into(),
                kind: DeliverableKind::Code,
                notes: None,
            },
            file("deliverables/code.zip"),
        )
        .await
        .unwrap();
        assert_eq!(
            ProjectRepo::find_file_owner(&pool, "deliverables/code.zip").await.unwrap(),
            Some(FileOwner::Deliverable {
                project_id: p.id,
                deliverable_id: d.id
            })
        );
        ProjectRepo::submit_final_report(&pool, p.id, &Actor::student(s.student_ids[0]), file("final/r.pdf"))
            .await
            .unwrap();
        assert_eq!(
            ProjectRepo::find_file_owner(&pool, "final/r.pdf").await.unwrap(),
            Some(FileOwner::FinalReport(p.id))
        );
    }

    #[tokio::test]
    async fn test_recommendations_only_for_pending_projects() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[1]);
        let p = ProjectRepo::submit(&pool, &student, &submission("A"), None).await.unwrap();
        let recs = ProjectRepo::recommendations(&pool, p.id, &WeightedScoring::default(), 5)
            .await
            .unwrap();
        assert_eq!(recs.len(), s.professor_ids.len());
        assert!(recs.windows(2).all(|w| w[0].at_capacity
            || w[1].at_capacity
            || w[0].match_percentage >= w[1].match_percentage));

        let input = AssignmentInput {
            professor_id: recs[0].professor_id,
            notes: None,
        };
        ProjectRepo::assign(&pool, p.id, &admin(&s), &input).await.unwrap();
        let err = ProjectRepo::recommendations(&pool, p.id, &WeightedScoring::default(), 5)
            .await
            .unwrap_err();
        assert!(err.is_precondition());
    }
}
