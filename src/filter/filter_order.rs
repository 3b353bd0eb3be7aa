use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::database::schema::TableSpec;

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"created_at desc, title"`, `["created_at desc", "title"]`
    /// or `{ "created_at": "desc" }`.
    pub fn validate_and_parse(table: &TableSpec, order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let parsed = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    let s = v
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder(format!("expected string, got {}", v)))?;
                    out.extend(Self::parse_order_string(s)?);
                }
                out
            }
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (column, dir) in obj {
                    let dir = dir
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder(format!("direction for '{}' must be a string", column)))?;
                    out.push(FilterOrderInfo {
                        column: column.clone(),
                        sort: Self::parse_direction(dir)?,
                    });
                }
                out
            }
            other => return Err(FilterError::InvalidOrder(format!("unsupported order value {}", other))),
        };

        for info in &parsed {
            if table.column(&info.column).is_none() {
                return Err(FilterError::UnknownColumn {
                    table: table.name.to_string(),
                    column: info.column.clone(),
                });
            }
        }
        Ok(parsed)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut tokens = part.split_whitespace();
            let Some(column) = tokens.next() else { continue };
            let sort = match tokens.next() {
                Some(dir) => Self::parse_direction(dir)?,
                None => SortDirection::Asc,
            };
            if tokens.next().is_some() {
                return Err(FilterError::InvalidOrder(format!("unexpected tokens in '{}'", part.trim())));
            }
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        Ok(out)
    }

    fn parse_direction(dir: &str) -> Result<SortDirection, FilterError> {
        if dir.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if dir.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(FilterError::InvalidOrder(format!("unknown direction '{}'", dir)))
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::Table;
    use serde_json::json;

    #[test]
    fn parses_all_three_shapes() {
        let spec = Table::Courses.spec();
        let from_str = FilterOrder::validate_and_parse(spec, &json!("created_at desc, title")).unwrap();
        let from_arr = FilterOrder::validate_and_parse(spec, &json!(["created_at DESC", "title"])).unwrap();
        let from_obj = FilterOrder::validate_and_parse(spec, &json!({ "created_at": "desc", "title": "asc" })).unwrap();

        assert_eq!(from_str, from_arr);
        assert_eq!(from_str, from_obj);
        assert_eq!(FilterOrder::generate(&from_str), "ORDER BY \"created_at\" DESC, \"title\" ASC");
    }

    #[test]
    fn rejects_unknown_columns_and_directions() {
        let spec = Table::Courses.spec();
        assert!(FilterOrder::validate_and_parse(spec, &json!("secret desc")).is_err());
        assert!(FilterOrder::validate_and_parse(spec, &json!("title sideways")).is_err());
        assert!(FilterOrder::validate_and_parse(spec, &json!("title; DROP TABLE courses")).is_err());
    }
}
