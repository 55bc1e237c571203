//! Repository for the `defenses` table, its jury members and evaluation.
//!
//! Defense transitions also move the owning project (scheduled, back to
//! final submission, evaluated); both rows are written in one transaction.

use chrono::{NaiveDate, Utc};
use pfehub_core::academic::AcademicYear;
use pfehub_core::conflict::{self, ConflictReport};
use pfehub_core::defense::{
    self, Defense, DefenseModification, DefenseProposal, DefenseStatus, DefenseValidation,
    JuryUpdate,
};
use pfehub_core::error::CoreError;
use pfehub_core::evaluation::{DefenseEvaluation, EvaluationSubmission};
use pfehub_core::jury::JuryMember;
use pfehub_core::project::{self, Project};
use pfehub_core::roles::Actor;
use pfehub_core::schedule::Slot;
use pfehub_core::stats::{self, DefenseStats};
use pfehub_core::types::{DbId, IdSequence};

use crate::models::defense::{
    DefenseRow, EvaluationRow, JuryMemberRow, StateColumns, DEFENSE_COLUMNS, EVALUATION_COLUMNS,
    JURY_COLUMNS,
};
use crate::repositories::{academic_repo, project_repo};
use crate::{begin_write, next_id, DbConn, DbPool, DbResult};

pub struct DefenseRepo;

/// Attach jury members and evaluation to each row.
async fn hydrate(conn: &mut DbConn, rows: Vec<DefenseRow>) -> DbResult<Vec<Defense>> {
    let jury_query =
        format!("SELECT {JURY_COLUMNS} FROM jury_members WHERE defense_id = $1 ORDER BY position");
    let evaluation_query =
        format!("SELECT {EVALUATION_COLUMNS} FROM defense_evaluations WHERE defense_id = $1");

    let mut defenses = Vec::with_capacity(rows.len());
    for row in rows {
        let jury = sqlx::query_as::<_, JuryMemberRow>(&jury_query)
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(JuryMember::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        let evaluation = sqlx::query_as::<_, EvaluationRow>(&evaluation_query)
            .bind(row.id)
            .fetch_optional(&mut *conn)
            .await?
            .map(DefenseEvaluation::from);
        defenses.push(row.into_defense(jury, evaluation)?);
    }
    Ok(defenses)
}

/// Defenses matching `filter` (a WHERE clause with at most one `$1`, or empty).
async fn load_where(conn: &mut DbConn, filter: &str, bind: Option<DbId>) -> DbResult<Vec<Defense>> {
    let query = format!("SELECT {DEFENSE_COLUMNS} FROM defenses {filter} ORDER BY id");
    let mut q = sqlx::query_as::<_, DefenseRow>(&query);
    if let Some(value) = bind {
        q = q.bind(value);
    }
    let rows = q.fetch_all(&mut *conn).await?;
    hydrate(conn, rows).await
}

pub(crate) async fn load(conn: &mut DbConn, id: DbId) -> DbResult<Defense> {
    load_where(conn, "WHERE id = $1", Some(id))
        .await?
        .pop()
        .ok_or_else(|| CoreError::NotFound { entity: "Defense", id }.into())
}

pub(crate) async fn load_all(conn: &mut DbConn) -> DbResult<Vec<Defense>> {
    load_where(conn, "", None).await
}

async fn load_of_project(conn: &mut DbConn, project_id: DbId) -> DbResult<Option<Defense>> {
    Ok(load_where(conn, "WHERE project_id = $1", Some(project_id))
        .await?
        .pop())
}

/// Jury ids continue after the highest stored one.
async fn jury_ids(conn: &mut DbConn) -> DbResult<IdSequence> {
    Ok(IdSequence::starting_at(next_id(conn, "jury_members").await?))
}

/// Insert or overwrite the defense row and its jury; the evaluation is
/// written once.
async fn save(conn: &mut DbConn, defense: &Defense) -> DbResult<()> {
    let columns: Vec<&str> = DEFENSE_COLUMNS.split(',').map(str::trim).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .skip(1)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();
    let query = format!(
        "INSERT INTO defenses ({DEFENSE_COLUMNS}) VALUES ({})
         ON CONFLICT (id) DO UPDATE SET {}",
        placeholders.join(", "),
        updates.join(", ")
    );
    let state = StateColumns::of(&defense.state);
    let slot = &defense.proposed_slot;
    sqlx::query(&query)
        .bind(defense.id)
        .bind(defense.project_id)
        .bind(defense.status().as_str())
        .bind(slot.date)
        .bind(slot.time)
        .bind(&slot.room)
        .bind(state.final_date)
        .bind(state.final_time)
        .bind(&state.final_room)
        .bind(state.validated_at)
        .bind(state.validated_by)
        .bind(&state.modification_reason)
        .bind(state.modified_at)
        .bind(state.modified_by)
        .bind(&state.rejection_reason)
        .bind(state.postponed_at)
        .bind(state.postponed_by)
        .bind(defense.proposed_by)
        .bind(defense.proposed_at)
        .bind(&defense.notes)
        .bind(i64::from(defense.revision))
        .bind(defense.updated_at)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM jury_members WHERE defense_id = $1")
        .bind(defense.id)
        .execute(&mut *conn)
        .await?;
    for (position, member) in (0_i64..).zip(&defense.jury_members) {
        sqlx::query(
            "INSERT INTO jury_members (id, defense_id, position, name, email, role, professor_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(member.id)
        .bind(defense.id)
        .bind(position)
        .bind(&member.name)
        .bind(&member.email)
        .bind(member.role.as_str())
        .bind(member.professor_id)
        .execute(&mut *conn)
        .await?;
    }

    if let Some(e) = &defense.evaluation {
        let query = format!(
            "INSERT INTO defense_evaluations ({EVALUATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (defense_id) DO NOTHING"
        );
        sqlx::query(&query)
            .bind(defense.id)
            .bind(e.presentation_quality)
            .bind(e.subject_mastery)
            .bind(e.question_answers)
            .bind(e.time_respect)
            .bind(e.final_grade)
            .bind(&e.comments)
            .bind(&e.strengths)
            .bind(&e.improvements)
            .bind(e.evaluated_at)
            .bind(e.evaluated_by)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Run `transition` against defense `id`, sync the owning project and write
/// both rows in one transaction.
async fn apply<F>(pool: &DbPool, id: DbId, transition: F) -> DbResult<Defense>
where
    F: FnOnce(&Defense, &Project, Option<&AcademicYear>, &mut IdSequence) -> Result<Defense, CoreError>,
{
    let mut tx = begin_write(pool).await?;
    let current = load(&mut tx, id).await?;
    let owner = project_repo::load(&mut tx, current.project_id).await?;
    let year = academic_repo::load_current_year(&mut tx).await?;
    let mut ids = jury_ids(&mut tx).await?;

    let next = transition(&current, &owner, year.as_ref(), &mut ids)?;
    let next_project = defense::sync_project(&next, &owner, Utc::now())?;
    project::check_invariants(&next_project)?;

    save(&mut tx, &next).await?;
    project_repo::save(&mut tx, &next_project).await?;
    tx.commit().await?;
    Ok(next)
}

fn sorted_by_slot(mut defenses: Vec<Defense>) -> Vec<Defense> {
    defenses.sort_by(|a, b| {
        let (a, b) = (a.effective_slot(), b.effective_slot());
        (a.date, a.time).cmp(&(b.date, b.time))
    });
    defenses
}

impl DefenseRepo {
    pub async fn propose(pool: &DbPool, actor: &Actor, input: &DefenseProposal) -> DbResult<Defense> {
        let mut tx = begin_write(pool).await?;
        let owner = project_repo::load(&mut tx, input.project_id).await?;
        let existing = load_of_project(&mut tx, owner.id).await?;
        let year = academic_repo::load_current_year(&mut tx).await?;
        let id = next_id(&mut tx, "defenses").await?;
        let mut ids = jury_ids(&mut tx).await?;

        let created = defense::propose(
            id,
            &owner,
            actor,
            input,
            existing.as_ref(),
            year.as_ref(),
            &mut ids,
            Utc::now(),
        )?;
        save(&mut tx, &created).await?;
        tx.commit().await?;
        tracing::debug!(defense_id = id, project_id = owner.id, "Defense row created");
        Ok(created)
    }

    pub async fn validate(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: &DefenseValidation,
    ) -> DbResult<Defense> {
        apply(pool, id, |current, _, _, ids| {
            defense::validate(current, actor, input, ids, Utc::now())
        })
        .await
    }

    pub async fn modify(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: &DefenseModification,
    ) -> DbResult<Defense> {
        apply(pool, id, |current, _, _, ids| {
            defense::modify(current, actor, input, ids, Utc::now())
        })
        .await
    }

    pub async fn reject(pool: &DbPool, id: DbId, actor: &Actor, reason: &str) -> DbResult<Defense> {
        apply(pool, id, |current, _, _, _| {
            defense::reject(current, actor, reason, Utc::now())
        })
        .await
    }

    pub async fn repropose(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: &DefenseProposal,
    ) -> DbResult<Defense> {
        apply(pool, id, |current, owner, year, ids| {
            defense::repropose(current, owner, actor, input, year, ids, Utc::now())
        })
        .await
    }

    pub async fn evaluate(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: EvaluationSubmission,
    ) -> DbResult<Defense> {
        apply(pool, id, |current, owner, _, _| {
            defense::evaluate(current, owner, actor, input, Utc::now())
        })
        .await
    }

    pub async fn update_jury(
        pool: &DbPool,
        id: DbId,
        actor: &Actor,
        input: &JuryUpdate,
    ) -> DbResult<Defense> {
        apply(pool, id, |current, _, _, ids| {
            defense::update_jury(current, actor, input, ids, Utc::now())
        })
        .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> DbResult<Defense> {
        let mut conn = pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn find_by_project(pool: &DbPool, project_id: DbId) -> DbResult<Option<Defense>> {
        let mut conn = pool.acquire().await?;
        load_of_project(&mut conn, project_id).await
    }

    /// The defense of the student's project, if one was proposed.
    pub async fn find_by_student(pool: &DbPool, student_id: DbId) -> DbResult<Option<Defense>> {
        let mut conn = pool.acquire().await?;
        match project_repo::load_of_student(&mut conn, student_id).await? {
            Some(owned) => load_of_project(&mut conn, owned.id).await,
            None => Ok(None),
        }
    }

    pub async fn evaluation(pool: &DbPool, id: DbId) -> DbResult<Option<DefenseEvaluation>> {
        Ok(Self::find_by_id(pool, id).await?.evaluation)
    }

    /// Proposals awaiting an admin decision, oldest first.
    pub async fn pending(pool: &DbPool) -> DbResult<Vec<Defense>> {
        let mut conn = pool.acquire().await?;
        let filter = format!("WHERE status = '{}'", DefenseStatus::Proposed.as_str());
        let mut pending = load_where(&mut conn, &filter, None).await?;
        pending.sort_by_key(|d| d.proposed_at);
        Ok(pending)
    }

    /// Defenses of projects supervised by `professor_id`, by slot.
    pub async fn list_for_professor(pool: &DbPool, professor_id: DbId) -> DbResult<Vec<Defense>> {
        let mut conn = pool.acquire().await?;
        let defenses = load_where(
            &mut conn,
            "WHERE project_id IN (SELECT id FROM projects WHERE professor_id = $1)",
            Some(professor_id),
        )
        .await?;
        Ok(sorted_by_slot(defenses))
    }

    /// Scheduled, not yet evaluated, on or after `today`.
    pub async fn upcoming(pool: &DbPool, today: NaiveDate) -> DbResult<Vec<Defense>> {
        let mut conn = pool.acquire().await?;
        let mut defenses = load_all(&mut conn).await?;
        defenses.retain(|d| stats::is_upcoming(d, today));
        Ok(sorted_by_slot(defenses))
    }

    /// Live defenses whose effective slot falls between `start` and `end`
    /// inclusive.
    pub async fn in_range(pool: &DbPool, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Defense>> {
        if start > end {
            return Err(CoreError::field("endDate", "endDate must not precede startDate").into());
        }
        let mut conn = pool.acquire().await?;
        let mut defenses = load_all(&mut conn).await?;
        defenses.retain(|d| {
            let date = d.effective_slot().date;
            !d.is_postponed() && (start..=end).contains(&date)
        });
        Ok(sorted_by_slot(defenses))
    }

    /// Graded defenses, most recently graded first.
    pub async fn evaluated(pool: &DbPool) -> DbResult<Vec<Defense>> {
        let mut conn = pool.acquire().await?;
        let mut defenses = load_where(
            &mut conn,
            "WHERE id IN (SELECT defense_id FROM defense_evaluations)",
            None,
        )
        .await?;
        defenses.sort_by_key(|d| std::cmp::Reverse(d.evaluation.as_ref().map(|e| e.evaluated_at)));
        Ok(defenses)
    }

    pub async fn stats(pool: &DbPool, today: NaiveDate) -> DbResult<DefenseStats> {
        let mut conn = pool.acquire().await?;
        let defenses = load_all(&mut conn).await?;
        Ok(stats::defense_counts(&defenses, today))
    }

    pub async fn check_conflicts(
        pool: &DbPool,
        slot: &Slot,
        exclude: Option<DbId>,
    ) -> DbResult<ConflictReport> {
        let mut conn = pool.acquire().await?;
        let defenses = load_all(&mut conn).await?;
        Ok(conflict::report(&defenses, slot, exclude))
    }
}
