//! Repository for the `deliverables` table. Rows are append-only.

use chrono::Utc;
use pfehub_core::deliverable::{self, Deliverable, DeliverableSubmission};
use pfehub_core::roles::Actor;
use pfehub_core::types::{DbId, FileRef};
use sqlx::types::Json;

use crate::models::deliverable::{DeliverableRow, DELIVERABLE_COLUMNS};
use crate::repositories::project_repo;
use crate::{begin_write, next_id, DbPool, DbResult};

pub struct DeliverableRepo;

impl DeliverableRepo {
    pub async fn create(
        pool: &DbPool,
        actor: &Actor,
        input: &DeliverableSubmission,
        file: FileRef,
    ) -> DbResult<Deliverable> {
        let mut tx = begin_write(pool).await?;
        let project = project_repo::load(&mut tx, input.project_id).await?;
        let id = next_id(&mut tx, "deliverables").await?;
        let created = deliverable::submit(id, &project, actor, input, file, Utc::now())?;

        sqlx::query(
            "INSERT INTO deliverables
                (id, project_id, title, description, kind, file, submitted_at, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(created.id)
        .bind(created.project_id)
        .bind(&created.title)
        .bind(&created.description)
        .bind(created.kind.as_str())
        .bind(Json(&created.file))
        .bind(created.submitted_at)
        .bind(&created.notes)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Deliverables of a project in submission order.
    pub async fn list_for_project(pool: &DbPool, project_id: DbId) -> DbResult<Vec<Deliverable>> {
        let mut conn = pool.acquire().await?;
        project_repo::load(&mut conn, project_id).await?;
        let query = format!(
            "SELECT {DELIVERABLE_COLUMNS} FROM deliverables WHERE project_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, DeliverableRow>(&query)
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(Deliverable::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ProjectRepo;
    use crate::test_support::{admin, seeded};
    use crate::DbError;
    use assert_matches::assert_matches;
    use pfehub_core::deliverable::DeliverableKind;
    use pfehub_core::error::CoreError;
    use pfehub_core::project::{AssignmentInput, ProjectSubmission};

    fn file() -> FileRef {
        FileRef {
            path: "deliverables/x.zip".into(),
            original_name: "x.zip".into(),
            size_bytes: 10,
            sha256: "00".repeat(32),
        }
    }

    #[tokio::test]
    async fn test_deliverables_only_after_acceptance() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[0]);
        let professor = Actor::professor(s.professor_ids[0]);
        let p = ProjectRepo::submit(
            &pool,
            &student,
            &ProjectSubmission {
                title: "Portail".into(),
                description: "d".into(),
                objectives: "o".into(),
                context: None,
                methodology: None,
                expected_results: None,
                keywords: vec![],
            },
            None,
        )
        .await
        .unwrap();
        let input = DeliverableSubmission {
            project_id: p.id,
            title: "Code source".into(),
            description: "Premier jalon".into(),
            kind: DeliverableKind::Code,
            notes: None,
        };

        let err = DeliverableRepo::create(&pool, &student, &input, file()).await.unwrap_err();
        assert!(err.is_precondition());

        let assignment = AssignmentInput {
            professor_id: professor.user_id,
            notes: None,
        };
        ProjectRepo::assign(&pool, p.id, &admin(&s), &assignment).await.unwrap();
        ProjectRepo::accept(&pool, p.id, &professor, None).await.unwrap();

        let first = DeliverableRepo::create(&pool, &student, &input, file()).await.unwrap();
        DeliverableRepo::create(&pool, &student, &input, file()).await.unwrap();
        let listed = DeliverableRepo::list_for_project(&pool, p.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id < listed[1].id);
        assert_eq!(listed[0], first);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (pool, _) = seeded().await;
        assert_matches!(
            DeliverableRepo::list_for_project(&pool, 999).await,
            Err(DbError::Core(CoreError::NotFound { entity: "Project", .. }))
        );
    }
}
