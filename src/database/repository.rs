use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::schema::{Table, TableSpec};
use crate::filter::{Filter, FilterError};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Generic JSON-row access to one registered table.
///
/// Rows come back as `serde_json::Value` objects built by `row_to_json`, and
/// writes go through `jsonb_populate_record`, so Postgres handles every
/// column type conversion.
pub struct Repository {
    spec: &'static TableSpec,
}

impl Repository {
    pub fn new(table: Table) -> Self {
        Self { spec: table.spec() }
    }

    pub async fn select_any(&self, pool: &PgPool, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        let sql = filter.to_sql()?;
        let wrapped = format!("SELECT row_to_json(t) AS row FROM ({}) t", sql.query);
        let rows = bind_all(sqlx::query(&wrapped), &sql.params).fetch_all(pool).await?;
        rows.iter()
            .map(|r| r.try_get::<Value, _>("row").map_err(DatabaseError::from))
            .collect()
    }

    pub async fn select_one(&self, pool: &PgPool, filter: &Filter) -> Result<Option<Value>, DatabaseError> {
        Ok(self.select_any(pool, filter).await?.into_iter().next())
    }

    pub async fn select_404(&self, pool: &PgPool, filter: &Filter) -> Result<Value, DatabaseError> {
        self.select_one(pool, filter)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Record not found in {}", self.spec.name)))
    }

    pub async fn count(&self, pool: &PgPool, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql()?;
        let row = bind_all(sqlx::query(&sql.query), &sql.params).fetch_one(pool).await?;
        Ok(row.try_get("count")?)
    }

    /// Insert a row. `stamped` columns are set by the server and may name
    /// columns the client cannot write.
    pub async fn insert(
        &self,
        pool: &PgPool,
        data: Map<String, Value>,
        stamped: &[(&'static str, Value)],
    ) -> Result<Value, DatabaseError> {
        let (columns, record) = self.prepare_write(data, stamped)?;
        let column_list = quote_list(&columns);
        let sql = format!(
            "WITH inserted AS (INSERT INTO \"{table}\" ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::\"{table}\", $1::jsonb) RETURNING *) \
             SELECT row_to_json(inserted) AS row FROM inserted",
            table = self.spec.name,
            cols = column_list,
        );

        let row = sqlx::query(&sql).bind(record).fetch_one(pool).await?;
        Ok(row.try_get("row")?)
    }

    /// Update the row with `id`, optionally only when `owner` matches.
    /// Returns `None` when no row qualified.
    pub async fn update(
        &self,
        pool: &PgPool,
        id: Uuid,
        data: Map<String, Value>,
        owner: Option<(&'static str, Uuid)>,
    ) -> Result<Option<Value>, DatabaseError> {
        let (columns, record) = self.prepare_write(data, &[])?;
        let mut assignments: Vec<String> = columns.iter().map(|c| format!("\"{c}\" = r.\"{c}\"")).collect();
        if self.spec.column("updated_at").is_some() {
            assignments.push("\"updated_at\" = now()".to_string());
        }

        let mut sql = format!(
            "WITH updated AS (UPDATE \"{table}\" SET {set} FROM jsonb_populate_record(NULL::\"{table}\", $1::jsonb) AS r \
             WHERE \"{table}\".\"id\" = $2",
            table = self.spec.name,
            set = assignments.join(", "),
        );
        if let Some((column, _)) = owner {
            sql.push_str(&format!(" AND \"{}\".\"{}\" = $3", self.spec.name, column));
        }
        sql.push_str(&format!(
            " RETURNING \"{}\".*) SELECT row_to_json(updated) AS row FROM updated",
            self.spec.name
        ));

        let mut query = sqlx::query(&sql).bind(record).bind(id);
        if let Some((_, owner_id)) = owner {
            query = query.bind(owner_id);
        }
        let row = query.fetch_optional(pool).await?;
        row.map(|r| r.try_get::<Value, _>("row").map_err(DatabaseError::from))
            .transpose()
    }

    pub async fn delete(
        &self,
        pool: &PgPool,
        id: Uuid,
        owner: Option<(&'static str, Uuid)>,
    ) -> Result<bool, DatabaseError> {
        let result = match owner {
            Some((column, owner_id)) => {
                let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1 AND \"{}\" = $2", self.spec.name, column);
                sqlx::query(&sql).bind(id).bind(owner_id).execute(pool).await?
            }
            None => {
                let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", self.spec.name);
                sqlx::query(&sql).bind(id).execute(pool).await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Validate client columns and merge in server-stamped values.
    fn prepare_write(
        &self,
        data: Map<String, Value>,
        stamped: &[(&'static str, Value)],
    ) -> Result<(Vec<&'static str>, Value), DatabaseError> {
        let mut columns = Vec::with_capacity(data.len() + stamped.len());
        let mut record = Map::new();

        for (key, value) in data {
            if stamped.iter().any(|(name, _)| *name == key) {
                continue;
            }
            let column = self.spec.column(&key).ok_or_else(|| {
                DatabaseError::Filter(FilterError::UnknownColumn {
                    table: self.spec.name.to_string(),
                    column: key.clone(),
                })
            })?;
            if !column.writable {
                return Err(DatabaseError::QueryError(format!("Column '{}' is read-only", key)));
            }
            columns.push(column.name);
            record.insert(key, value);
        }

        for (name, value) in stamped {
            columns.push(*name);
            record.insert((*name).to_string(), value.clone());
        }

        if columns.is_empty() {
            return Err(DatabaseError::QueryError("No columns to write".to_string()));
        }
        Ok((columns, Value::Object(record)))
    }
}

fn quote_list(columns: &[&str]) -> String {
    columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
}

/// Filter params are bound as text; the SQL casts each one to its column type.
fn bind_all<'q>(mut query: PgQuery<'q>, params: &'q [Value]) -> PgQuery<'q> {
    for value in params {
        query = query.bind(param_text(value));
    }
    query
}

fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn prepare_write_stamps_owner_and_rejects_system_columns() {
        let repo = Repository::new(Table::Exams);
        let owner = json!("00000000-0000-0000-0000-000000000001");

        let (columns, record) = repo
            .prepare_write(
                map(json!({ "title": "Final", "exam_date": "2025-06-01T09:00:00Z", "user_id": "someone-else" })),
                &[("user_id", owner.clone())],
            )
            .unwrap();
        assert_eq!(columns, vec!["exam_date", "title", "user_id"]);
        assert_eq!(record["user_id"], owner);

        let err = repo
            .prepare_write(map(json!({ "created_at": "2020-01-01T00:00:00Z" })), &[])
            .unwrap_err();
        assert!(matches!(err, DatabaseError::QueryError(_)));

        let err = repo.prepare_write(map(json!({ "nope": 1 })), &[]).unwrap_err();
        assert!(matches!(err, DatabaseError::Filter(FilterError::UnknownColumn { .. })));
    }

    #[test]
    fn session_text_fields_cannot_bypass_session_validation() {
        let repo = Repository::new(Table::SharedSessions);
        for column in ["title", "description", "meeting_link", "estimated_duration"] {
            let mut data = Map::new();
            data.insert(column.to_string(), json!("https://x\r\nEND:VEVENT"));
            let err = repo.prepare_write(data, &[]).unwrap_err();
            assert!(matches!(err, DatabaseError::QueryError(_)), "{column} should be read-only");
        }

        let (columns, _) = repo
            .prepare_write(map(json!({ "course_id": "00000000-0000-0000-0000-000000000002" })), &[])
            .unwrap();
        assert_eq!(columns, vec!["course_id"]);
    }

    #[test]
    fn empty_writes_are_rejected() {
        let repo = Repository::new(Table::Courses);
        assert!(repo.prepare_write(Map::new(), &[]).is_err());
    }

    #[test]
    fn params_bind_as_text() {
        assert_eq!(param_text(&json!(null)), None);
        assert_eq!(param_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(param_text(&json!(42)), Some("42".to_string()));
        assert_eq!(param_text(&json!(true)), Some("true".to_string()));
    }
}
