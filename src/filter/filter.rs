use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SortDirection, SqlResult};
use crate::config::FilterConfig;
use crate::database::schema::{Table, TableSpec};

pub struct Filter {
    table: &'static TableSpec,
    select_columns: Vec<&'static str>,
    where_data: Option<Value>,
    restrictions: Vec<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: i32,
    offset: i32,
    max_limit: i32,
    max_depth: u32,
    debug_logging: bool,
}

impl Filter {
    pub fn new(table: Table) -> Self {
        Self::with_config(table, &crate::config::config().filter)
    }

    pub fn with_config(table: Table, config: &FilterConfig) -> Self {
        let spec = table.spec();
        let order_data = if spec.column("created_at").is_some() {
            vec![FilterOrderInfo {
                column: "created_at".to_string(),
                sort: SortDirection::Desc,
            }]
        } else {
            vec![]
        };

        Self {
            table: spec,
            select_columns: vec![],
            where_data: None,
            restrictions: vec![],
            order_data,
            limit: config.default_limit,
            offset: 0,
            max_limit: config.max_limit.unwrap_or(i32::MAX),
            max_depth: config.max_nested_depth,
            debug_logging: config.debug_logging,
        }
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if data.limit.is_some() || data.offset.is_some() {
            self.limit(data.limit.unwrap_or(self.limit), data.offset)?;
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        let mut resolved = Vec::with_capacity(columns.len());
        for name in &columns {
            if name == "*" {
                resolved.clear();
                break;
            }
            let column = self.table.column(name).ok_or_else(|| FilterError::UnknownColumn {
                table: self.table.name.to_string(),
                column: name.clone(),
            })?;
            resolved.push(column.name);
        }
        self.select_columns = resolved;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    /// Add a server-side condition that the client cannot override.
    pub fn restrict(&mut self, conditions: Value) -> &mut Self {
        self.restrictions.push(conditions);
        self
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(self.table, &order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }

        if limit > self.max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping", limit, self.max_limit);
        }
        self.limit = limit.min(self.max_limit);
        self.offset = offset.unwrap_or(0);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table.name),
            format!("WHERE {}", where_result.query),
            order_clause,
            format!("LIMIT {} OFFSET {}", self.limit, self.offset),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        if self.debug_logging {
            tracing::debug!(table = self.table.name, sql = %query, params = where_result.params.len(), "compiled filter");
        }
        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let mut compiler = FilterWhere::new(self.table, self.max_depth);
        let mut clauses = Vec::new();

        for restriction in &self.restrictions {
            clauses.push(format!("({})", compiler.compile(restriction)?));
        }
        if let Some(where_data) = &self.where_data {
            clauses.push(format!("({})", compiler.compile(where_data)?));
        }

        let query = if clauses.is_empty() { "TRUE".to_string() } else { clauses.join(" AND ") };
        Ok(SqlResult { query, params: compiler.into_params() })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table.name, where_result.query),
            params: where_result.params,
        })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() {
            "*".to_string()
        } else {
            let mut columns = self.select_columns.clone();
            // id is always returned so rows stay addressable
            if !columns.contains(&"id") {
                columns.insert(0, "id");
            }
            columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }
}
