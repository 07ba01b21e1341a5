//! Lesson progress: server-side storage and the caller-side write buffer
//!
//! Progress is keyed by `(kid_id, lesson_id)`. A missing row means the lesson
//! was never started. Writes arrive as partial [`ProgressPatch`]es and are
//! merged into the stored row by a single upsert statement:
//!
//! | field                | rule                                              |
//! |----------------------|---------------------------------------------------|
//! | `status`             | overwritten; absent means `in_progress`           |
//! | `score`              | `COALESCE(incoming, stored)`                      |
//! | `time_spent_seconds` | overwritten; absent means 0                       |
//! | `answers_blob`       | `COALESCE(incoming, stored)`                      |
//! | `started_at`         | set on insert only                                |
//! | `completed_at`       | set on the first write with status `completed`    |
//!
//! Status may move back from `completed` to `in_progress`; `completed_at` is
//! kept when that happens.

mod buffer;
mod errors;
mod sink;

use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use buffer::{DEFAULT_DEBOUNCE, ProgressBuffer};
pub use errors::ProgressError;
pub use sink::{HttpProgressSink, ProgressSink};

use crate::{
    Clock, Database, Result,
    backend::{BackendError, SqlxResultExt},
    clock::millis_to_datetime,
};

/// Stored lesson state. "Not started" is the absence of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(ProgressError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// A partial progress update. `None` means "not part of this update".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
    /// Opaque activity state, stored verbatim.
    #[serde(
        default,
        alias = "answers_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub answers_blob: Option<String>,
}

impl ProgressPatch {
    pub fn in_progress() -> Self {
        Self {
            status: Some(ProgressStatus::InProgress),
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            status: Some(ProgressStatus::Completed),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_time_spent(mut self, seconds: i64) -> Self {
        self.time_spent_seconds = Some(seconds);
        self
    }

    pub fn with_answers(mut self, answers: impl Into<String>) -> Self {
        self.answers_blob = Some(answers.into());
        self
    }

    /// Shallow merge: every field present in `newer` replaces ours.
    pub fn merge(&mut self, newer: ProgressPatch) {
        if newer.status.is_some() {
            self.status = newer.status;
        }
        if newer.score.is_some() {
            self.score = newer.score;
        }
        if newer.time_spent_seconds.is_some() {
            self.time_spent_seconds = newer.time_spent_seconds;
        }
        if newer.answers_blob.is_some() {
            self.answers_blob = newer.answers_blob;
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(ProgressStatus::Completed)
    }
}

/// A stored progress row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub kid_id: i64,
    pub lesson_id: i64,
    pub status: ProgressStatus,
    pub score: Option<i64>,
    pub time_spent_seconds: i64,
    pub answers_blob: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

type ProgressRow = (
    i64,
    i64,
    String,
    Option<i64>,
    i64,
    Option<String>,
    i64,
    Option<i64>,
);

const SELECT_PROGRESS: &str = "SELECT kid_id, lesson_id, status, score, time_spent_seconds,
        answers_blob, started_at, completed_at
    FROM progress";

fn from_row(row: ProgressRow) -> Result<Progress> {
    let (kid_id, lesson_id, status, score, time_spent_seconds, answers_blob, started_at, completed_at) =
        row;
    let status = status
        .parse::<ProgressStatus>()
        .map_err(|e| BackendError::CorruptRow {
            table: "progress",
            reason: e.to_string(),
        })?;

    Ok(Progress {
        kid_id,
        lesson_id,
        status,
        score,
        time_spent_seconds,
        answers_blob,
        started_at: millis_to_datetime(started_at),
        completed_at: completed_at.map(millis_to_datetime),
    })
}

/// Server-side progress persistence.
#[derive(Clone, Debug)]
pub struct ProgressStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl ProgressStore {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Merge a patch into the row for `(kid_id, lesson_id)`, creating it if needed.
    ///
    /// One statement, so concurrent writers never observe a half-applied merge.
    pub async fn upsert(&self, kid_id: i64, lesson_id: i64, patch: &ProgressPatch) -> Result<()> {
        let time_spent = patch.time_spent_seconds.unwrap_or(0);
        if time_spent < 0 {
            return Err(ProgressError::NegativeTime {
                seconds: time_spent,
            }
            .into());
        }

        let status = patch.status.unwrap_or(ProgressStatus::InProgress);
        let now = self.clock.now_millis();
        let completed_at = (status == ProgressStatus::Completed).then_some(now);

        let upserted = sqlx::query(
            "INSERT INTO progress (kid_id, lesson_id, status, score, time_spent_seconds,
                answers_blob, started_at, completed_at)
             SELECT $1, $2, $3, $4, $5, $6, $7, $8
             WHERE EXISTS (SELECT 1 FROM kids WHERE id = $1)
             ON CONFLICT (kid_id, lesson_id) DO UPDATE SET
                status = excluded.status,
                score = COALESCE(excluded.score, progress.score),
                time_spent_seconds = excluded.time_spent_seconds,
                answers_blob = COALESCE(excluded.answers_blob, progress.answers_blob),
                completed_at = COALESCE(progress.completed_at, excluded.completed_at)",
        )
        .bind(kid_id)
        .bind(lesson_id)
        .bind(status.as_str())
        .bind(patch.score)
        .bind(time_spent)
        .bind(patch.answers_blob.as_deref())
        .bind(now)
        .bind(completed_at)
        .execute(self.db.pool())
        .await;

        // Progress never outlives its kid.
        let rows = match upserted {
            Ok(result) => result.rows_affected(),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => 0,
            Err(e) => return Err(e).sql_context("Failed to upsert progress"),
        };
        if rows == 0 {
            return Err(ProgressError::KidNotFound { kid_id }.into());
        }

        tracing::debug!(kid_id, lesson_id, %status, "Saved progress");
        Ok(())
    }

    pub async fn get(&self, kid_id: i64, lesson_id: i64) -> Result<Option<Progress>> {
        let row: Option<ProgressRow> =
            sqlx::query_as(&format!("{SELECT_PROGRESS} WHERE kid_id = $1 AND lesson_id = $2"))
                .bind(kid_id)
                .bind(lesson_id)
                .fetch_optional(self.db.pool())
                .await
                .sql_context("Failed to load progress")?;
        row.map(from_row).transpose()
    }

    /// Every progress row of a kid, ordered by lesson id.
    pub async fn list(&self, kid_id: i64) -> Result<Vec<Progress>> {
        let rows: Vec<ProgressRow> =
            sqlx::query_as(&format!("{SELECT_PROGRESS} WHERE kid_id = $1 ORDER BY lesson_id"))
                .bind(kid_id)
                .fetch_all(self.db.pool())
                .await
                .sql_context("Failed to list progress")?;
        rows.into_iter().map(from_row).collect()
    }
}
