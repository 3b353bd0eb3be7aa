use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::FilterOp;
use crate::database::schema::{Column, ColumnType, TableSpec};

/// Compiles a JSON where-object into a SQL predicate with positional params.
///
/// Every parameter is cast to its column's type (`$1::timestamptz`), so the
/// binder can pass values as text and let Postgres do the conversion.
pub struct FilterWhere<'a> {
    table: &'a TableSpec,
    params: Vec<Value>,
    max_depth: u32,
}

impl<'a> FilterWhere<'a> {
    pub fn new(table: &'a TableSpec, max_depth: u32) -> Self {
        Self {
            table,
            params: vec![],
            max_depth,
        }
    }

    /// Compile one where-object, continuing the parameter numbering of any
    /// previously compiled clauses.
    pub fn compile(&mut self, where_data: &Value) -> Result<String, FilterError> {
        self.node(where_data, 0)
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn node(&mut self, value: &Value, depth: u32) -> Result<String, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::TooDeep(self.max_depth));
        }

        let obj = match value {
            Value::Null => return Ok("TRUE".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Expected an object".to_string())),
        };

        let mut parts = Vec::with_capacity(obj.len());
        for (key, val) in obj {
            if key.starts_with('$') {
                parts.push(self.logical(key, val, depth)?);
            } else {
                parts.extend(self.field(key, val)?);
            }
        }

        Ok(match parts.len() {
            0 => "TRUE".to_string(),
            1 => parts.remove(0),
            _ => parts.join(" AND "),
        })
    }

    fn logical(&mut self, op: &str, value: &Value, depth: u32) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires an array", op)))?;
                if items.is_empty() {
                    return Ok(if op == "$and" { "TRUE" } else { "FALSE" }.to_string());
                }
                let mut clauses = Vec::with_capacity(items.len());
                for item in items {
                    clauses.push(format!("({})", self.node(item, depth + 1)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", clauses.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.node(value, depth + 1)?)),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn field(&mut self, name: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        let column = *self.table.column(name).ok_or_else(|| FilterError::UnknownColumn {
            table: self.table.name.to_string(),
            column: name.to_string(),
        })?;

        match value {
            Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                self.operators(&column, ops)
            }
            _ => Ok(vec![self.condition(&column, FilterOp::Eq, value)?]),
        }
    }

    fn operators(&mut self, column: &Column, ops: &Map<String, Value>) -> Result<Vec<String>, FilterError> {
        let mut out = Vec::with_capacity(ops.len());
        for (key, data) in ops {
            let op = FilterOp::parse(key).ok_or_else(|| FilterError::UnsupportedOperator(key.clone()))?;
            out.push(self.condition(column, op, data)?);
        }
        Ok(out)
    }

    fn condition(&mut self, column: &Column, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        let quoted = format!("\"{}\"", column.name);

        match op {
            FilterOp::Eq | FilterOp::Ne if data.is_null() => Ok(if op == FilterOp::Eq {
                format!("{} IS NULL", quoted)
            } else {
                format!("{} IS NOT NULL", quoted)
            }),
            FilterOp::Like | FilterOp::ILike => {
                let param = self.param(ColumnType::Text, data)?;
                let sql_op = op.comparison().unwrap_or("LIKE");
                Ok(format!("{}::text {} {}", quoted, sql_op, param))
            }
            FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                if column.ty.is_array() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "'{}' is an array column; use $any, $all or $size",
                        column.name
                    )));
                }
                let param = self.param(column.ty, data)?;
                let sql_op = op.comparison().unwrap_or("=");
                Ok(format!("{} {} {}", quoted, sql_op, param))
            }
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))?;
                if values.is_empty() {
                    return Ok(if op == FilterOp::In { "FALSE" } else { "TRUE" }.to_string());
                }
                let params = self.params_for(column.ty, values)?;
                let keyword = if op == FilterOp::In { "IN" } else { "NOT IN" };
                Ok(format!("{} {} ({})", quoted, keyword, params.join(", ")))
            }
            FilterOp::Between => match data.as_array().map(|a| a.as_slice()) {
                Some([low, high]) => {
                    let low = self.param(column.ty, low)?;
                    let high = self.param(column.ty, high)?;
                    Ok(format!("{} BETWEEN {} AND {}", quoted, low, high))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Any | FilterOp::All => {
                let element = column.ty.element().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("'{}' is not an array column", column.name))
                })?;
                let values = match data {
                    Value::Array(values) => values.clone(),
                    single => vec![single.clone()],
                };
                if values.is_empty() {
                    return Ok(if op == FilterOp::Any { "FALSE" } else { "TRUE" }.to_string());
                }
                let params = self.params_for(element, &values)?;
                let sql_op = if op == FilterOp::Any { "&&" } else { "@>" };
                Ok(format!("{} {} ARRAY[{}]", quoted, sql_op, params.join(", ")))
            }
            FilterOp::Size => {
                if !column.ty.is_array() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "'{}' is not an array column",
                        column.name
                    )));
                }
                let param = self.param(ColumnType::Integer, data)?;
                Ok(format!("cardinality({}) = {}", quoted, param))
            }
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", quoted)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", quoted)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        }
    }

    fn params_for(&mut self, ty: ColumnType, values: &[Value]) -> Result<Vec<String>, FilterError> {
        values.iter().map(|v| self.param(ty, v)).collect()
    }

    fn param(&mut self, ty: ColumnType, value: &Value) -> Result<String, FilterError> {
        if value.is_array() || value.is_object() {
            return Err(FilterError::InvalidOperatorData(format!(
                "expected a scalar value, got {}",
                value
            )));
        }
        self.params.push(value.clone());
        Ok(format!("${}::{}", self.params.len(), ty.sql_cast()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::Table;
    use serde_json::json;

    fn compile(table: Table, where_data: Value) -> Result<(String, Vec<Value>), FilterError> {
        let mut fw = FilterWhere::new(table.spec(), 5);
        let sql = fw.compile(&where_data)?;
        Ok((sql, fw.into_params()))
    }

    #[test]
    fn implicit_equality_casts_to_column_type() {
        let (sql, params) = compile(Table::Exams, json!({ "title": "Final" })).unwrap();
        assert_eq!(sql, "\"title\" = $1::text");
        assert_eq!(params, vec![json!("Final")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = compile(Table::Exams, json!({ "course_id": null })).unwrap();
        assert_eq!(sql, "\"course_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn range_operators_on_timestamps() {
        let (sql, params) = compile(
            Table::Exams,
            json!({ "exam_date": { "$gte": "2025-01-01T00:00:00Z", "$lt": "2025-02-01T00:00:00Z" } }),
        )
        .unwrap();
        assert_eq!(sql, "\"exam_date\" >= $1::timestamptz AND \"exam_date\" < $2::timestamptz");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn logical_operators_nest_and_keep_numbering() {
        let (sql, params) = compile(
            Table::Tutors,
            json!({ "$or": [ { "available": true }, { "hourly_rate": { "$lte": 20 } } ] }),
        )
        .unwrap();
        assert_eq!(sql, "((\"available\" = $1::boolean) OR (\"hourly_rate\" <= $2::numeric))");
        assert_eq!(params, vec![json!(true), json!(20)]);
    }

    #[test]
    fn in_with_empty_list_matches_nothing() {
        let (sql, _) = compile(Table::Courses, json!({ "id": { "$in": [] } })).unwrap();
        assert_eq!(sql, "FALSE");
    }

    #[test]
    fn array_operators_require_array_columns() {
        let (sql, _) = compile(
            Table::StudyPartners,
            json!({ "course_ids": { "$any": ["00000000-0000-0000-0000-000000000001"] } }),
        )
        .unwrap();
        assert_eq!(sql, "\"course_ids\" && ARRAY[$1::uuid]");

        let err = compile(Table::Courses, json!({ "title": { "$any": ["x"] } })).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn rejects_unknown_columns_and_operators() {
        assert!(matches!(
            compile(Table::Courses, json!({ "password_hash": "x" })),
            Err(FilterError::UnknownColumn { .. })
        ));
        assert!(matches!(
            compile(Table::Courses, json!({ "title": { "$regex": ".*" } })),
            Err(FilterError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn enforces_depth_limit() {
        let mut fw = FilterWhere::new(Table::Courses.spec(), 1);
        let deep = json!({ "$not": { "$not": { "title": "x" } } });
        assert_eq!(fw.compile(&deep), Err(FilterError::TooDeep(1)));
    }

    #[test]
    fn like_compares_as_text() {
        let (sql, _) = compile(Table::Courses, json!({ "code": { "$ilike": "MATH%" } })).unwrap();
        assert_eq!(sql, "\"code\"::text ILIKE $1::text");
    }
}
