//! Meeting repository implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

use minutes_core::{
    Error, Meeting, MeetingFields, MeetingId, MeetingResults, MeetingStatus, MeetingStore, Result,
};

/// PostgreSQL implementation of MeetingStore.
///
/// Every write runs in its own transaction and touches `updated_at`.
#[derive(Clone)]
pub struct PgMeetingRepository {
    pool: Pool<Postgres>,
}

impl PgMeetingRepository {
    /// Create a new PgMeetingRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Explain why an update keyed by `id` matched nothing.
    ///
    /// Runs inside the caller's transaction so the answer reflects the same snapshot.
    async fn zero_row_error(conn: &mut PgConnection, id: MeetingId) -> Error {
        let current: std::result::Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT status::text FROM meetings WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await;

        match current {
            Ok(None) => Error::MeetingNotFound(id),
            Ok(Some(status)) => match status.parse::<MeetingStatus>() {
                Ok(current) => Error::StatusConflict { id, current },
                Err(e) => e,
            },
            Err(e) => Error::Database(e),
        }
    }

    /// Decode a JSONB array column into strings, stringifying non-string members.
    fn json_string_list(value: Option<JsonValue>) -> Option<Vec<String>> {
        match value? {
            JsonValue::Array(items) => Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            JsonValue::Null => None,
            other => Some(vec![other.to_string()]),
        }
    }

    /// Parse a meeting row into a Meeting struct.
    fn parse_meeting_row(row: PgRow) -> Result<Meeting> {
        let status: String = row.try_get("status").map_err(Error::Database)?;
        Ok(Meeting {
            id: row.try_get("id").map_err(Error::Database)?,
            status: status.parse()?,
            transcript: row.try_get("transcript").map_err(Error::Database)?,
            summary: row.try_get("summary").map_err(Error::Database)?,
            action_items: Self::json_string_list(
                row.try_get("action_items").map_err(Error::Database)?,
            ),
            key_points: Self::json_string_list(
                row.try_get("key_points").map_err(Error::Database)?,
            ),
            created_at: row.try_get("created_at").map_err(Error::Database)?,
            updated_at: row.try_get("updated_at").map_err(Error::Database)?,
        })
    }
}

#[async_trait]
impl MeetingStore for PgMeetingRepository {
    #[instrument(skip(self, fields), fields(subsystem = "db", component = "meetings", op = "set_status", meeting_id = id, status = %status))]
    async fn set_status(
        &self,
        id: MeetingId,
        status: MeetingStatus,
        fields: MeetingFields,
    ) -> Result<()> {
        if status == MeetingStatus::Completed {
            return Err(Error::InvalidInput(format!(
                "meeting {} can only be completed by saving its results",
                id
            )));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE meetings SET status = ");
        query
            .push_bind(status.as_str())
            .push("::meeting_status, updated_at = NOW()");

        if let Some(transcript) = fields.transcript {
            query.push(", transcript = ").push_bind(transcript);
        }
        if let Some(summary) = fields.summary {
            query.push(", summary = ").push_bind(summary);
        }
        if let Some(action_items) = fields.action_items {
            query.push(", action_items = ").push_bind(Json(action_items));
        }
        if let Some(key_points) = fields.key_points {
            query.push(", key_points = ").push_bind(Json(key_points));
        }

        // Forward-only: completed meetings never move back.
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND status <> 'completed'::meeting_status");

        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Self::zero_row_error(&mut *tx, id).await);
        }

        tx.commit().await.map_err(Error::Database)?;
        debug!("Meeting status updated");
        Ok(())
    }

    #[instrument(skip(self, results), fields(subsystem = "db", component = "meetings", op = "save_results", meeting_id = id, transcript_len = results.transcript.len(), action_item_count = results.action_items.len()))]
    async fn save_results(&self, id: MeetingId, results: &MeetingResults) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query(
            "UPDATE meetings
             SET transcript = $2, summary = $3, action_items = $4, key_points = $5,
                 status = 'completed'::meeting_status, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&results.transcript)
        .bind(&results.summary)
        .bind(Json(&results.action_items))
        .bind(results.key_points.as_ref().map(Json))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::MeetingNotFound(id));
        }

        tx.commit().await.map_err(Error::Database)?;
        debug!("Meeting results saved");
        Ok(())
    }

    async fn mark_failed(&self, id: MeetingId) -> Result<()> {
        self.set_status(id, MeetingStatus::Failed, MeetingFields::none())
            .await
    }

    async fn get(&self, id: MeetingId) -> Result<Option<Meeting>> {
        let row = sqlx::query(
            "SELECT id::bigint AS id, status::text AS status, transcript, summary,
                    action_items, key_points, created_at::timestamptz AS created_at,
                    updated_at::timestamptz AS updated_at
             FROM meetings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_meeting_row).transpose()
    }
}
