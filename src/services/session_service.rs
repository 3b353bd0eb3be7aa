use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::SessionConfig;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::SharedSession;
use crate::sessions::PlannedSession;

pub struct SessionService {
    pool: PgPool,
}

impl SessionService {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self { pool: DatabaseManager::pool()?.clone() })
    }

    /// Sessions for the listing, optionally for one course.
    ///
    /// Sessions that ended more than `ended_retention_hours` ago are left
    /// out, and at most `max_listed` rows come back, unfinished ones first.
    pub async fn list(
        &self,
        course_id: Option<Uuid>,
        now: DateTime<Utc>,
        config: &SessionConfig,
    ) -> Result<Vec<SharedSession>, DatabaseError> {
        let sessions = sqlx::query_as::<_, SharedSession>(
            "SELECT * FROM shared_sessions \
             WHERE ($1::uuid IS NULL OR course_id = $1) AND expires_at > $3 \
             ORDER BY expires_at <= $2, COALESCE(scheduled_start_time, created_at) \
             LIMIT $4",
        )
        .bind(course_id)
        .bind(now)
        .bind(ended_cutoff(now, config))
        .bind(config.max_listed.max(1))
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    pub async fn hosted_by(&self, host_id: Uuid) -> Result<Vec<SharedSession>, DatabaseError> {
        let sessions = sqlx::query_as::<_, SharedSession>("SELECT * FROM shared_sessions WHERE host_id = $1")
            .bind(host_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, DatabaseError> {
        sqlx::query_as::<_, SharedSession>("SELECT * FROM shared_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Session {} not found", id)))
    }

    pub async fn create(&self, host_id: Uuid, planned: &PlannedSession) -> Result<SharedSession, DatabaseError> {
        let session = sqlx::query_as::<_, SharedSession>(
            "INSERT INTO shared_sessions \
             (host_id, course_id, title, description, meeting_link, scheduled_start_time, estimated_duration, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(host_id)
        .bind(planned.course_id)
        .bind(&planned.title)
        .bind(&planned.description)
        .bind(&planned.meeting_link)
        .bind(planned.scheduled_start_time)
        .bind(planned.estimated_duration)
        .bind(planned.expires_at)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!("Session {} created by {}", session.id, host_id);
        Ok(session)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM shared_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Sessions whose expiry is at or before this instant are no longer listed
pub fn ended_cutoff(now: DateTime<Utc>, config: &SessionConfig) -> DateTime<Utc> {
    now - Duration::hours(config.ended_retention_hours.max(0))
}
