use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Assignment, Exam};

/// Per-user exams and assignments
pub struct TrackingService {
    pool: PgPool,
}

impl TrackingService {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self { pool: DatabaseManager::pool()?.clone() })
    }

    pub async fn exams(&self, user_id: Uuid) -> Result<Vec<Exam>, DatabaseError> {
        let exams = sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE user_id = $1 ORDER BY exam_date")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(exams)
    }

    pub async fn assignments(&self, user_id: Uuid) -> Result<Vec<Assignment>, DatabaseError> {
        let assignments =
            sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE user_id = $1 ORDER BY due_date")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(assignments)
    }
}
