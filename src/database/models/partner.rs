use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyPartner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution_id: Option<Uuid>,
    pub course_ids: Vec<Uuid>,
    pub availability: Option<String>,
    pub bio: Option<String>,
    pub looking: bool,
    pub created_at: DateTime<Utc>,
}
