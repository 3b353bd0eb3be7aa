use axum::{extract::Path, Extension};
use serde_json::{json, Value};

use super::data::{resolve_table, scoped_filter};
use crate::database::{DatabaseManager, Repository};
use crate::filter::FilterData;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

/// POST /api/find/:table - filtered query within the caller's read scope
pub async fn find(
    Path(table): Path<String>,
    Extension(user): Extension<AuthUser>,
    ApiJson(filter_data): ApiJson<FilterData>,
) -> ApiResult<Vec<Value>> {
    let table = resolve_table(&table)?;
    let mut filter = scoped_filter(table, &user).await?;
    filter.assign(filter_data)?;

    let rows = Repository::new(table).select_any(DatabaseManager::pool()?, &filter).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/find/:table/count - like find, but only the number of matches
pub async fn count(
    Path(table): Path<String>,
    Extension(user): Extension<AuthUser>,
    ApiJson(filter_data): ApiJson<FilterData>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let mut filter = scoped_filter(table, &user).await?;
    filter.assign(filter_data)?;

    let count = Repository::new(table).count(DatabaseManager::pool()?, &filter).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}
