use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::StudyPartner;

pub struct PartnerService {
    pool: PgPool,
}

impl PartnerService {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self { pool: DatabaseManager::pool()?.clone() })
    }

    pub async fn listing_for(&self, user_id: Uuid) -> Result<Option<StudyPartner>, DatabaseError> {
        let listing = sqlx::query_as::<_, StudyPartner>("SELECT * FROM study_partners WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(listing)
    }

    /// Listings of other users who are looking and share a course or the institution
    pub async fn candidates(&self, me: &StudyPartner) -> Result<Vec<StudyPartner>, DatabaseError> {
        let candidates = sqlx::query_as::<_, StudyPartner>(
            "SELECT * FROM study_partners \
             WHERE user_id <> $1 AND looking \
             AND (course_ids && $2 OR (institution_id IS NOT NULL AND institution_id = $3))",
        )
        .bind(me.user_id)
        .bind(&me.course_ids)
        .bind(me.institution_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }
}
