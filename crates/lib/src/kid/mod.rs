//! Kid profiles
//!
//! Kids do not log in with their own secret: a family credential unlocks the
//! app and the learner picks a profile. Sessions and progress rows reference
//! profiles by id.

mod errors;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use errors::KidError;

use crate::{Clock, Database, Result, backend::SqlxResultExt, clock::millis_to_datetime};

/// Ages accepted for a profile.
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 1..=17;

/// A kid profile.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Kid {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub age: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new profile.
#[derive(Clone, Debug, Deserialize)]
pub struct NewKid {
    pub name: String,
    pub age: i64,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct KidUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub avatar: Option<String>,
}

type KidRow = (i64, String, Option<String>, i64, i64);

fn from_row((id, name, avatar, age, created_at): KidRow) -> Kid {
    Kid {
        id,
        name,
        avatar,
        age,
        created_at: millis_to_datetime(created_at),
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(KidError::EmptyName.into());
    }
    Ok(())
}

fn validate_age(age: i64) -> Result<()> {
    if !AGE_RANGE.contains(&age) {
        return Err(KidError::InvalidAge { age }.into());
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct KidStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl KidStore {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn create(&self, new: NewKid) -> Result<Kid> {
        let name = new.name.trim().to_string();
        validate_name(&name)?;
        validate_age(new.age)?;

        let now = self.clock.now_millis();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO kids (name, avatar, age, created_at) VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&name)
        .bind(new.avatar.as_deref())
        .bind(new.age)
        .bind(now)
        .fetch_one(self.db.pool())
        .await
        .sql_context("Failed to insert kid")?;

        tracing::info!(kid_id = id, "Created kid profile");

        Ok(Kid {
            id,
            name,
            avatar: new.avatar,
            age: new.age,
            created_at: millis_to_datetime(now),
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Kid>> {
        let row: Option<KidRow> =
            sqlx::query_as("SELECT id, name, avatar, age, created_at FROM kids WHERE id = $1")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await
                .sql_context("Failed to load kid")?;
        Ok(row.map(from_row))
    }

    /// Like [`KidStore::get`], but a missing profile is an error.
    pub async fn require(&self, id: i64) -> Result<Kid> {
        self.get(id)
            .await?
            .ok_or_else(|| KidError::KidNotFound { id }.into())
    }

    /// All profiles, ordered by name.
    pub async fn list(&self) -> Result<Vec<Kid>> {
        let rows: Vec<KidRow> =
            sqlx::query_as("SELECT id, name, avatar, age, created_at FROM kids ORDER BY name, id")
                .fetch_all(self.db.pool())
                .await
                .sql_context("Failed to list kids")?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    pub async fn update(&self, id: i64, update: KidUpdate) -> Result<Kid> {
        let name = update.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            validate_name(name)?;
        }
        if let Some(age) = update.age {
            validate_age(age)?;
        }

        let result = sqlx::query(
            "UPDATE kids SET
                name = COALESCE($1, name),
                age = COALESCE($2, age),
                avatar = COALESCE($3, avatar)
             WHERE id = $4",
        )
        .bind(name)
        .bind(update.age)
        .bind(update.avatar)
        .bind(id)
        .execute(self.db.pool())
        .await
        .sql_context("Failed to update kid")?;

        if result.rows_affected() == 0 {
            return Err(KidError::KidNotFound { id }.into());
        }
        self.require(id).await
    }

    /// Delete a profile together with its sessions and progress.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM kid_sessions WHERE kid_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete kid sessions")?;
        sqlx::query("DELETE FROM progress WHERE kid_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete kid progress")?;
        let result = sqlx::query("DELETE FROM kids WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete kid")?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(KidError::KidNotFound { id }.into());
        }

        tx.commit()
            .await
            .sql_context("Failed to commit transaction")?;

        tracing::info!(kid_id = id, "Deleted kid profile");
        Ok(())
    }
}
