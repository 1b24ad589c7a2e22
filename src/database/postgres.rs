//! Postgres implementation of [`PassStore`].
//!
//! Slot claims are conditional `UPDATE`s on `status = 'available'`; Postgres
//! row locking makes concurrent claimants serialize on the row and every
//! loser sees zero updated rows. The partial unique index
//! `interview_slots_live_claim_per_round` backs the one-claim-per-round rule
//! for a single candidate racing against itself.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::store::{PassStore, RequestTeardown};
use crate::error::{Error, Result};
use crate::models::activity_log::ActivityLogEntry;
use crate::models::recruitment::{
    Candidate, InterviewFormat, InterviewSetup, RecruitmentRequest, RequestStatus,
};
use crate::models::slot::{
    CancelOutcome, ClaimOutcome, ConfirmOutcome, InterviewSlot, SlotStatus,
};
use crate::models::stage::{Stage, Status};

macro_rules! slot_columns {
    () => {
        "id, setup_id, slot_date, start_time, end_time, round_number, status, claimed_by, created_at, updated_at"
    };
}

macro_rules! candidate_columns {
    () => {
        "id, request_id, name, stage, status, booked_slot_id, updated_at"
    };
}

macro_rules! setup_columns {
    () => {
        "id, request_id, interview_rounds, interview_format, technical_assessment_required, created_by, created_at, updated_at"
    };
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn stored<T>(column: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| Error::InvariantViolation(format!("stored {} '{}' is not recognised", column, raw)))
}

#[derive(FromRow)]
struct RequestRow {
    id: Uuid,
    title: String,
    manager_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for RecruitmentRequest {
    type Error = Error;

    fn try_from(row: RequestRow) -> Result<Self> {
        let status = match row.status.as_str() {
            "open" => RequestStatus::Open,
            "filled" => RequestStatus::Filled,
            "cancelled" => RequestStatus::Cancelled,
            other => {
                return Err(Error::InvariantViolation(format!(
                    "stored request status '{}' is not recognised",
                    other
                )))
            }
        };
        Ok(Self {
            id: row.id,
            title: row.title,
            manager_id: row.manager_id,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CandidateRow {
    id: Uuid,
    request_id: Uuid,
    name: String,
    stage: String,
    status: String,
    booked_slot_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            request_id: row.request_id,
            name: row.name,
            stage: stored("stage", &row.stage)?,
            status: stored("status", &row.status)?,
            booked_slot: row.booked_slot_id,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SetupRow {
    id: Uuid,
    request_id: Uuid,
    interview_rounds: i32,
    interview_format: String,
    technical_assessment_required: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SetupRow> for InterviewSetup {
    type Error = Error;

    fn try_from(row: SetupRow) -> Result<Self> {
        let interview_format = match row.interview_format.as_str() {
            "online" => InterviewFormat::Online,
            "in_person" => InterviewFormat::InPerson,
            "hybrid" => InterviewFormat::Hybrid,
            other => {
                return Err(Error::InvariantViolation(format!(
                    "stored interview format '{}' is not recognised",
                    other
                )))
            }
        };
        Ok(Self {
            id: row.id,
            request_id: row.request_id,
            interview_rounds: row.interview_rounds,
            interview_format,
            technical_assessment_required: row.technical_assessment_required,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SlotRow {
    id: Uuid,
    setup_id: Uuid,
    slot_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    round_number: i32,
    status: String,
    claimed_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SlotRow> for InterviewSlot {
    type Error = Error;

    fn try_from(row: SlotRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            setup_id: row.setup_id,
            date: row.slot_date,
            start_time: row.start_time,
            end_time: row.end_time,
            round_number: row.round_number,
            status: row.status.parse()?,
            claimed_by: row.claimed_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: Uuid,
    candidate_id: Uuid,
    request_id: Uuid,
    stage: String,
    action_type: String,
    description: String,
    actor: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLogEntry {
    type Error = Error;

    fn try_from(row: ActivityRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            candidate_id: row.candidate_id,
            request_id: row.request_id,
            stage: stored("stage", &row.stage)?,
            action_type: row.action_type.parse()?,
            description: row.description,
            actor: row.actor,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl PassStore for PgStore {
    async fn insert_request(&self, request: RecruitmentRequest) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO recruitment_requests (id, title, manager_id, status, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(request.id)
        .bind(request.title)
        .bind(request.manager_id)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<RecruitmentRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"SELECT id, title, manager_id, status, created_at FROM recruitment_requests WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RecruitmentRequest::try_from).transpose()
    }

    async fn delete_request(&self, id: Uuid) -> Result<RequestTeardown> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RequestRow>(
            r#"SELECT id, title, manager_id, status, created_at FROM recruitment_requests WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(request) = request else {
            return Ok(RequestTeardown::default());
        };

        let removed_slots: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM interview_slots s
               JOIN interview_setups st ON st.id = s.setup_id
               WHERE st.request_id = $1"#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE candidates SET booked_slot_id = NULL, updated_at = NOW()
               WHERE request_id = $1 AND booked_slot_id IN (
                   SELECT s.id FROM interview_slots s
                   JOIN interview_setups st ON st.id = s.setup_id
                   WHERE st.request_id = $1
               )"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // setups and slots cascade
        sqlx::query(r#"DELETE FROM recruitment_requests WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let candidates = sqlx::query_as::<_, CandidateRow>(concat!(
            "SELECT ",
            candidate_columns!(),
            " FROM candidates WHERE request_id = $1 ORDER BY name, id"
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RequestTeardown {
            request: Some(request.try_into()?),
            removed_slots: removed_slots as usize,
            candidates: convert_all(candidates)?,
        })
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<()> {
        sqlx::query(concat!(
            "INSERT INTO candidates (",
            candidate_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(candidate.id)
        .bind(candidate.request_id)
        .bind(candidate.name)
        .bind(candidate.stage.as_str())
        .bind(candidate.status.as_str())
        .bind(candidate.booked_slot)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(concat!(
            "SELECT ",
            candidate_columns!(),
            " FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn list_candidates(&self, request_id: Uuid) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(concat!(
            "SELECT ",
            candidate_columns!(),
            " FROM candidates WHERE request_id = $1 ORDER BY name, id"
        ))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn set_candidate_stage(
        &self,
        id: Uuid,
        stage: Stage,
        status: Status,
    ) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(concat!(
            "UPDATE candidates SET stage = $2, status = $3, updated_at = NOW() WHERE id = $1 RETURNING ",
            candidate_columns!()
        ))
        .bind(id)
        .bind(stage.as_str())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn advance_candidate_if(
        &self,
        id: Uuid,
        from: (Stage, Status),
        to: (Stage, Status),
    ) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(concat!(
            "UPDATE candidates SET stage = $4, status = $5, updated_at = NOW() ",
            "WHERE id = $1 AND stage = $2 AND status = $3 RETURNING ",
            candidate_columns!()
        ))
        .bind(id)
        .bind(from.0.as_str())
        .bind(from.1.as_str())
        .bind(to.0.as_str())
        .bind(to.1.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn insert_setup(&self, setup: InterviewSetup) -> Result<bool> {
        let result = sqlx::query(concat!(
            "INSERT INTO interview_setups (",
            setup_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (request_id) DO NOTHING"
        ))
        .bind(setup.id)
        .bind(setup.request_id)
        .bind(setup.interview_rounds)
        .bind(setup.interview_format.as_str())
        .bind(setup.technical_assessment_required)
        .bind(setup.created_by)
        .bind(setup.created_at)
        .bind(setup.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_setup(&self, id: Uuid) -> Result<Option<InterviewSetup>> {
        let row = sqlx::query_as::<_, SetupRow>(concat!(
            "SELECT ",
            setup_columns!(),
            " FROM interview_setups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(InterviewSetup::try_from).transpose()
    }

    async fn get_setup_for_request(&self, request_id: Uuid) -> Result<Option<InterviewSetup>> {
        let row = sqlx::query_as::<_, SetupRow>(concat!(
            "SELECT ",
            setup_columns!(),
            " FROM interview_setups WHERE request_id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(InterviewSetup::try_from).transpose()
    }

    async fn update_setup(&self, setup: InterviewSetup) -> Result<()> {
        sqlx::query(
            r#"UPDATE interview_setups
               SET interview_rounds = $2, interview_format = $3,
                   technical_assessment_required = $4, updated_at = $5
               WHERE id = $1"#,
        )
        .bind(setup.id)
        .bind(setup.interview_rounds)
        .bind(setup.interview_format.as_str())
        .bind(setup.technical_assessment_required)
        .bind(setup.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_slots(&self, slots: Vec<InterviewSlot>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for slot in slots {
            sqlx::query(concat!(
                "INSERT INTO interview_slots (",
                slot_columns!(),
                ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            ))
            .bind(slot.id)
            .bind(slot.setup_id)
            .bind(slot.date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(slot.round_number)
            .bind(slot.status.as_str())
            .bind(slot.claimed_by)
            .bind(slot.created_at)
            .bind(slot.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<InterviewSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(concat!(
            "SELECT ",
            slot_columns!(),
            " FROM interview_slots WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(InterviewSlot::try_from).transpose()
    }

    async fn list_slots(&self, setup_id: Uuid) -> Result<Vec<InterviewSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(concat!(
            "SELECT ",
            slot_columns!(),
            " FROM interview_slots WHERE setup_id = $1 ORDER BY slot_date, start_time, round_number"
        ))
        .bind(setup_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn claim_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ClaimOutcome> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, SlotRow>(concat!(
            "UPDATE interview_slots s SET status = 'booked', claimed_by = $2, updated_at = NOW() ",
            "WHERE s.id = $1 AND s.status = 'available' AND NOT EXISTS (",
            "  SELECT 1 FROM interview_slots o WHERE o.setup_id = s.setup_id ",
            "  AND o.round_number = s.round_number AND o.claimed_by = $2 ",
            "  AND o.status IN ('booked', 'confirmed')",
            ") RETURNING ",
            slot_columns!()
        ))
        .bind(slot_id)
        .bind(candidate_id)
        .fetch_optional(&mut *tx)
        .await;

        let claimed = match claimed {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                return self.classify_failed_claim(slot_id, candidate_id).await;
            }
            Err(err) => return Err(err.into()),
        };

        let Some(row) = claimed else {
            tx.rollback().await?;
            return self.classify_failed_claim(slot_id, candidate_id).await;
        };

        sqlx::query(
            r#"UPDATE candidates SET booked_slot_id = $1, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(slot_id)
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ClaimOutcome::Claimed(row.try_into()?))
    }

    async fn confirm_slot(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ConfirmOutcome> {
        let confirmed = sqlx::query_as::<_, SlotRow>(concat!(
            "UPDATE interview_slots SET status = 'confirmed', updated_at = NOW() ",
            "WHERE id = $1 AND status = 'booked' AND claimed_by = $2 RETURNING ",
            slot_columns!()
        ))
        .bind(slot_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = confirmed {
            return Ok(ConfirmOutcome::Confirmed(row.try_into()?));
        }

        let Some(slot) = self.get_slot(slot_id).await? else {
            return Ok(ConfirmOutcome::NotFound);
        };
        let outcome = match (slot.status, slot.claimed_by) {
            (SlotStatus::Cancelled, _) => ConfirmOutcome::Cancelled,
            (SlotStatus::Booked | SlotStatus::Confirmed, None) => ConfirmOutcome::Inconsistent(slot),
            (SlotStatus::Confirmed, Some(owner)) if owner == candidate_id => {
                ConfirmOutcome::AlreadyConfirmed(slot)
            }
            _ => ConfirmOutcome::NotClaimant,
        };
        Ok(outcome)
    }

    async fn cancel_slot(&self, slot_id: Uuid) -> Result<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, SlotRow>(concat!(
            "SELECT ",
            slot_columns!(),
            " FROM interview_slots WHERE id = $1 FOR UPDATE"
        ))
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(CancelOutcome::NotFound);
        };
        let current = InterviewSlot::try_from(current)?;
        if current.status == SlotStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled(current));
        }

        let row = sqlx::query_as::<_, SlotRow>(concat!(
            "UPDATE interview_slots SET status = 'cancelled', claimed_by = NULL, updated_at = NOW() ",
            "WHERE id = $1 RETURNING ",
            slot_columns!()
        ))
        .bind(slot_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(candidate_id) = current.claimed_by {
            sqlx::query(
                r#"UPDATE candidates SET updated_at = NOW(), booked_slot_id = (
                       SELECT s.id FROM interview_slots s
                       WHERE s.claimed_by = $1 AND s.status IN ('booked', 'confirmed')
                       ORDER BY s.slot_date, s.start_time, s.round_number
                       LIMIT 1
                   )
                   WHERE id = $1 AND booked_slot_id = $2"#,
            )
            .bind(candidate_id)
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CancelOutcome::Cancelled {
            slot: row.try_into()?,
            released: current.claimed_by,
        })
    }

    async fn append_activity(&self, entry: ActivityLogEntry) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO activity_log (id, candidate_id, request_id, stage, action_type, description, actor, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(entry.id)
        .bind(entry.candidate_id)
        .bind(entry.request_id)
        .bind(entry.stage.as_str())
        .bind(entry.action_type.as_str())
        .bind(entry.description)
        .bind(entry.actor)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_activity_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"SELECT id, candidate_id, request_id, stage, action_type, description, actor, created_at
               FROM activity_log WHERE candidate_id = $1
               ORDER BY created_at DESC, seq DESC LIMIT $2"#,
        )
        .bind(candidate_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn recent_activity_for_request(
        &self,
        request_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"SELECT id, candidate_id, request_id, stage, action_type, description, actor, created_at
               FROM activity_log WHERE request_id = $1
               ORDER BY created_at DESC, seq DESC LIMIT $2"#,
        )
        .bind(request_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

impl PgStore {
    /// Explains a claim that updated nothing. Runs after the claiming
    /// transaction has ended, so it only reports; it never writes.
    async fn classify_failed_claim(&self, slot_id: Uuid, candidate_id: Uuid) -> Result<ClaimOutcome> {
        let Some(slot) = self.get_slot(slot_id).await? else {
            return Ok(ClaimOutcome::NotFound);
        };
        if slot.status != SlotStatus::Available {
            return Ok(ClaimOutcome::Conflict);
        }

        let held: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT id FROM interview_slots
               WHERE setup_id = $1 AND round_number = $2 AND claimed_by = $3
                 AND status IN ('booked', 'confirmed')
               LIMIT 1"#,
        )
        .bind(slot.setup_id)
        .bind(slot.round_number)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match held {
            Some(held_id) => ClaimOutcome::AlreadyHoldsRound {
                slot_id: held_id,
                round_number: slot.round_number,
            },
            None => ClaimOutcome::Conflict,
        })
    }
}
