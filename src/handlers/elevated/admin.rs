use axum::{
    extract::{Path, Query},
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{ReportStatus, UserReport};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{AdminService, PortalStats};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReportUpdate {
    pub status: ReportStatus,
}

/// GET /api/admin/stats
pub async fn stats() -> ApiResult<PortalStats> {
    Ok(ApiResponse::success(AdminService::new()?.stats().await?))
}

/// GET /api/admin/reports?status=open
pub async fn reports(Query(query): Query<ReportQuery>) -> ApiResult<Vec<UserReport>> {
    Ok(ApiResponse::success(AdminService::new()?.reports(query.status).await?))
}

/// PATCH /api/admin/reports/:id
pub async fn update_report(
    Path(id): Path<Uuid>,
    Extension(admin): Extension<AuthUser>,
    ApiJson(update): ApiJson<ReportUpdate>,
) -> ApiResult<UserReport> {
    let report = AdminService::new()?
        .set_report_status(id, update.status, Utc::now())
        .await?;
    tracing::info!("Report {} marked {} by {}", id, update.status.as_str(), admin.user_id);
    Ok(ApiResponse::success(report))
}
