use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{ReportStatus, UserReport};
use crate::database::schema::Table;

#[derive(Debug, Clone, Serialize)]
pub struct PortalStats {
    pub users: i64,
    pub tables: BTreeMap<&'static str, i64>,
}

/// Moderation and dashboard queries for the elevated tier
pub struct AdminService {
    pool: PgPool,
}

impl AdminService {
    pub fn new() -> Result<Self, DatabaseError> {
        Ok(Self { pool: DatabaseManager::pool()?.clone() })
    }

    pub async fn stats(&self) -> Result<PortalStats, DatabaseError> {
        let counts = try_join_all(Table::ALL.iter().map(|table| self.count(table.name()))).await?;
        let users = self.count("users").await?;

        Ok(PortalStats {
            users,
            tables: Table::ALL.iter().map(|t| t.name()).zip(counts).collect(),
        })
    }

    // Table names come from the registry, never from the client.
    async fn count(&self, table: &'static str) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM \"{}\"", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn reports(&self, status: Option<ReportStatus>) -> Result<Vec<UserReport>, DatabaseError> {
        let reports = match status {
            Some(status) => {
                sqlx::query_as::<_, UserReport>(
                    "SELECT * FROM user_reports WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserReport>("SELECT * FROM user_reports ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(reports)
    }

    /// Closing a report stamps `resolved_at`; reopening clears it.
    pub async fn set_report_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        now: DateTime<Utc>,
    ) -> Result<UserReport, DatabaseError> {
        let resolved_at = status.is_closed().then_some(now);
        sqlx::query_as::<_, UserReport>(
            "UPDATE user_reports SET status = $2, resolved_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(resolved_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Report {} not found", id)))
    }
}
