// handlers/protected/data.rs - generic CRUD over registered tables
use axum::{
    extract::{Path, Query},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::database::schema::{ReadScope, Table, TableSpec, WriteScope};
use crate::database::{DatabaseManager, Repository};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{is_admin, ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// e.g. `order=created_at desc,title`
    pub order: Option<String>,
}

pub fn resolve_table(name: &str) -> Result<Table, ApiError> {
    name.parse::<Table>().map_err(ApiError::not_found)
}

fn column_is(column: &str, user_id: Uuid) -> Value {
    let mut condition = Map::new();
    condition.insert(column.to_string(), json!(user_id));
    Value::Object(condition)
}

/// Row-level read restriction for the caller, or `None` when unrestricted
pub fn read_restriction(spec: &TableSpec, user_id: Uuid, admin: bool) -> Result<Option<Value>, ApiError> {
    if admin {
        return Ok(None);
    }
    match spec.read {
        ReadScope::Everyone => Ok(None),
        ReadScope::Owner => {
            let owner = spec
                .owner_column
                .ok_or_else(|| ApiError::internal_server_error("Table has no owner column"))?;
            Ok(Some(column_is(owner, user_id)))
        }
        ReadScope::Participants(columns) => {
            let any_of: Vec<Value> = columns.iter().map(|c| column_is(c, user_id)).collect();
            Ok(Some(json!({ "$or": any_of })))
        }
        ReadScope::AdminOnly => Err(ApiError::forbidden(format!("Only administrators can read {}", spec.name))),
    }
}

/// Owner condition applied to updates and deletes, or `None` for admins
pub fn write_owner(spec: &TableSpec, user_id: Uuid, admin: bool) -> Result<Option<(&'static str, Uuid)>, ApiError> {
    if admin {
        return Ok(None);
    }
    match (spec.write, spec.owner_column) {
        (WriteScope::Owner, Some(owner)) => Ok(Some((owner, user_id))),
        _ => Err(ApiError::forbidden(format!("Only administrators can modify {}", spec.name))),
    }
}

pub async fn scoped_filter(table: Table, user: &AuthUser) -> Result<Filter, ApiError> {
    let admin = is_admin(user).await?;
    let mut filter = Filter::new(table);
    if let Some(restriction) = read_restriction(table.spec(), user.user_id, admin)? {
        filter.restrict(restriction);
    }
    Ok(filter)
}

fn object(payload: Value) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// GET /api/data/:table
pub async fn list(
    Path(table): Path<String>,
    Query(query): Query<ListQuery>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Value>> {
    let table = resolve_table(&table)?;
    let mut filter = scoped_filter(table, &user).await?;
    if let Some(order) = query.order {
        filter.order(Value::String(order))?;
    }
    if query.limit.is_some() || query.offset.is_some() {
        let limit = query.limit.unwrap_or(crate::config::config().filter.default_limit);
        filter.limit(limit, query.offset)?;
    }

    let rows = Repository::new(table).select_any(DatabaseManager::pool()?, &filter).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/data/:table/:id
pub async fn get(Path((table, id)): Path<(String, Uuid)>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let mut filter = scoped_filter(table, &user).await?;
    filter.restrict(json!({ "id": id }));

    let row = Repository::new(table).select_404(DatabaseManager::pool()?, &filter).await?;
    Ok(ApiResponse::success(row))
}

/// POST /api/data/:table
pub async fn create(
    Path(table): Path<String>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<Value>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let spec = table.spec();
    let admin = is_admin(&user).await?;

    if !spec.insertable && !admin {
        return Err(ApiError::forbidden(format!("Rows in {} cannot be created here", spec.name)));
    }
    if spec.write == WriteScope::AdminOnly && !admin {
        return Err(ApiError::forbidden(format!("Only administrators can modify {}", spec.name)));
    }

    let stamped: Vec<(&'static str, Value)> = match (spec.write, spec.owner_column) {
        (WriteScope::Owner, Some(owner)) => vec![(owner, json!(user.user_id))],
        _ => vec![],
    };

    let row = Repository::new(table)
        .insert(DatabaseManager::pool()?, object(payload)?, &stamped)
        .await?;
    tracing::debug!("Inserted into {} for {}", spec.name, user.user_id);
    Ok(ApiResponse::created(row))
}

/// PATCH /api/data/:table/:id
pub async fn update(
    Path((table, id)): Path<(String, Uuid)>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<Value>,
) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let owner = write_owner(table.spec(), user.user_id, is_admin(&user).await?)?;

    Repository::new(table)
        .update(DatabaseManager::pool()?, id, object(payload)?, owner)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Record {} not found in {}", id, table.name())))
}

/// DELETE /api/data/:table/:id
pub async fn delete(Path((table, id)): Path<(String, Uuid)>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let table = resolve_table(&table)?;
    let owner = write_owner(table.spec(), user.user_id, is_admin(&user).await?)?;

    if !Repository::new(table).delete(DatabaseManager::pool()?, id, owner).await? {
        return Err(ApiError::not_found(format!("Record {} not found in {}", id, table.name())));
    }
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
