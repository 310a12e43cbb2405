//! Fluent statement construction and execution.
//!
//! A [`Query`] is bound to one table on one connection and accumulates
//! clauses through chained calls; executing it renders the SQL, consults
//! the query cache, runs the statement through the connection's driver and
//! hydrates the fetched rows. Builder calls consume and return the query;
//! execution calls borrow it mutably so the same instance can be reused
//! for a follow-up query.
//!
//! After a read executes, the transient clause state (bound values and the
//! result column override) is reset to defaults. This is a documented side
//! effect of execution, relied on by the aggregate helpers.

use crate::condition::{
    any_group_fragment, placeholders, ConditionKind, ConditionSet, OperatorMap,
};
use crate::config::IdColumns;
use crate::dialect::{Dialect, LimitStyle};
use crate::error::OrmResult;
use crate::ident::quote_identifier;
use crate::ops::QueryOp;
use crate::orm::Orm;
use crate::resultset::ResultSet;
use crate::row::Row;
use crate::value::{RawRow, Value};

/// A join constraint: either raw SQL compiled in as-is, or a column triple
/// `(left, operator, right)` whose columns are quoted.
#[derive(Debug, Clone)]
pub enum JoinConstraint {
    Raw(String),
    Columns(String, String, String),
}

impl From<&str> for JoinConstraint {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<(&str, &str, &str)> for JoinConstraint {
    fn from((left, operator, right): (&str, &str, &str)) -> Self {
        Self::Columns(left.to_string(), operator.to_string(), right.to_string())
    }
}

/// A statement under construction against one table.
#[derive(Debug, Clone)]
pub struct Query {
    connection: String,
    table: String,
    table_alias: Option<String>,
    dialect: Dialect,
    id_columns: IdColumns,
    /// Parameters already bound outside the condition lists (raw joins).
    params: Vec<Value>,
    result_columns: Vec<String>,
    using_default_result_columns: bool,
    join_sources: Vec<String>,
    distinct: bool,
    raw_query: Option<(String, Vec<Value>)>,
    conditions: ConditionSet,
    limit: Option<u64>,
    offset: Option<u64>,
    order_by: Vec<String>,
    group_by: Vec<String>,
}

impl Query {
    pub(crate) fn new(
        connection: String,
        table: String,
        dialect: Dialect,
        id_columns: IdColumns,
    ) -> Self {
        Self {
            connection,
            table,
            table_alias: None,
            dialect,
            id_columns,
            params: Vec::new(),
            result_columns: vec!["*".to_string()],
            using_default_result_columns: true,
            join_sources: Vec::new(),
            distinct: false,
            raw_query: None,
            conditions: ConditionSet::default(),
            limit: None,
            offset: None,
            order_by: Vec::new(),
            group_by: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Override which column(s) identify rows, for this builder and the
    /// entities it produces. Takes precedence over per-table and
    /// connection-level configuration.
    pub fn use_id_column(mut self, columns: impl Into<IdColumns>) -> Self {
        self.id_columns = columns.into();
        self
    }

    /// Alias for the main table in SELECT queries.
    pub fn table_alias(mut self, alias: &str) -> Self {
        self.table_alias = Some(alias.to_string());
        self
    }

    /// Supply the statement verbatim. All other builder state is ignored at
    /// render time.
    pub fn raw_query(mut self, sql: &str, params: Vec<Value>) -> Self {
        self.raw_query = Some((sql.to_string(), params));
        self
    }

    // ==================== Result columns ====================

    /// Add a quoted column to the SELECT list (replaces the default `*`).
    pub fn select(mut self, column: &str) -> Self {
        let quoted = quote_identifier(&self.dialect, column);
        self.push_result_column(quoted, None);
        self
    }

    /// Add a quoted column under an alias.
    pub fn select_as(mut self, column: &str, alias: &str) -> Self {
        let quoted = quote_identifier(&self.dialect, column);
        self.push_result_column(quoted, Some(alias));
        self
    }

    /// Add an unquoted expression to the SELECT list.
    pub fn select_expr(mut self, expression: &str) -> Self {
        self.push_result_column(expression.to_string(), None);
        self
    }

    /// Add an unquoted expression under an alias.
    pub fn select_expr_as(mut self, expression: &str, alias: &str) -> Self {
        self.push_result_column(expression.to_string(), Some(alias));
        self
    }

    pub fn select_many(mut self, columns: &[&str]) -> Self {
        for column in columns {
            let quoted = quote_identifier(&self.dialect, column);
            self.push_result_column(quoted, None);
        }
        self
    }

    pub fn select_many_expr(mut self, expressions: &[&str]) -> Self {
        for expression in expressions {
            self.push_result_column(expression.to_string(), None);
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn push_result_column(&mut self, mut expression: String, alias: Option<&str>) {
        if let Some(alias) = alias {
            expression.push_str(" AS ");
            expression.push_str(&quote_identifier(&self.dialect, alias));
        }
        if self.using_default_result_columns {
            self.result_columns = vec![expression];
            self.using_default_result_columns = false;
        } else {
            self.result_columns.push(expression);
        }
    }

    // ==================== Joins ====================

    pub fn join(self, table: &str, constraint: impl Into<JoinConstraint>) -> Self {
        self.add_join_source("", table, constraint.into(), None)
    }

    pub fn inner_join(self, table: &str, constraint: impl Into<JoinConstraint>) -> Self {
        self.add_join_source("INNER", table, constraint.into(), None)
    }

    pub fn left_outer_join(self, table: &str, constraint: impl Into<JoinConstraint>) -> Self {
        self.add_join_source("LEFT OUTER", table, constraint.into(), None)
    }

    pub fn right_outer_join(self, table: &str, constraint: impl Into<JoinConstraint>) -> Self {
        self.add_join_source("RIGHT OUTER", table, constraint.into(), None)
    }

    pub fn full_outer_join(self, table: &str, constraint: impl Into<JoinConstraint>) -> Self {
        self.add_join_source("FULL OUTER", table, constraint.into(), None)
    }

    /// Join with an alias for the joined table.
    pub fn join_as(
        self,
        operator: &str,
        table: &str,
        constraint: impl Into<JoinConstraint>,
        alias: &str,
    ) -> Self {
        self.add_join_source(operator, table, constraint.into(), Some(alias))
    }

    /// Join with externally bound parameters. The table expression and
    /// constraint are compiled in without quoting; the parameters are
    /// merged into the statement's value list ahead of condition values.
    pub fn raw_join(
        mut self,
        table: &str,
        constraint: impl Into<JoinConstraint>,
        alias: Option<&str>,
        params: Vec<Value>,
    ) -> Self {
        let mut table = table.to_string();
        if let Some(alias) = alias {
            table.push(' ');
            table.push_str(&quote_identifier(&self.dialect, alias));
        }
        self.params.extend(params);
        let constraint = self.render_constraint(constraint.into());
        self.join_sources.push(format!("{table} ON {constraint}"));
        self
    }

    fn add_join_source(
        mut self,
        operator: &str,
        table: &str,
        constraint: JoinConstraint,
        alias: Option<&str>,
    ) -> Self {
        let operator = format!("{operator} JOIN");
        let operator = operator.trim();
        let mut table = quote_identifier(&self.dialect, table);
        if let Some(alias) = alias {
            table.push(' ');
            table.push_str(&quote_identifier(&self.dialect, alias));
        }
        let constraint = self.render_constraint(constraint);
        self.join_sources
            .push(format!("{operator} {table} ON {constraint}"));
        self
    }

    fn render_constraint(&self, constraint: JoinConstraint) -> String {
        match constraint {
            JoinConstraint::Raw(raw) => raw,
            JoinConstraint::Columns(left, operator, right) => format!(
                "{} {} {}",
                quote_identifier(&self.dialect, &left),
                operator,
                quote_identifier(&self.dialect, &right)
            ),
        }
    }

    // ==================== WHERE ====================

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "=", value.into());
        self
    }

    pub fn where_not_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "!=", value.into());
        self
    }

    pub fn where_like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "LIKE", value.into());
        self
    }

    pub fn where_not_like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "NOT LIKE", value.into());
        self
    }

    pub fn where_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, ">", value.into());
        self
    }

    pub fn where_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "<", value.into());
        self
    }

    pub fn where_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, ">=", value.into());
        self
    }

    pub fn where_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Where, column, "<=", value.into());
        self
    }

    /// One equality condition per pair, ANDed like every other condition.
    pub fn where_all(mut self, pairs: Vec<(String, Value)>) -> Self {
        for (column, value) in pairs {
            self.push_simple(ConditionKind::Where, &column, "=", value);
        }
        self
    }

    pub fn where_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.push_placeholder(ConditionKind::Where, column, "IN", values);
        self
    }

    pub fn where_not_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.push_placeholder(ConditionKind::Where, column, "NOT IN", values);
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.push_no_value(ConditionKind::Where, column, "IS NULL");
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.push_no_value(ConditionKind::Where, column, "IS NOT NULL");
        self
    }

    /// Raw WHERE fragment with `?` placeholders bound to `params`.
    pub fn where_raw(mut self, clause: &str, params: Vec<Value>) -> Self {
        self.conditions.add(ConditionKind::Where, clause, params);
        self
    }

    /// Match any of the given groups: each group is ANDed internally and
    /// the groups are ORed, with `=` against every column.
    pub fn where_any_is(self, groups: Vec<Vec<(String, Value)>>) -> Self {
        self.where_any_is_op(groups, OperatorMap::default())
    }

    /// [`where_any_is`](Self::where_any_is) with an operator override,
    /// uniform or per column.
    pub fn where_any_is_op(
        mut self,
        groups: Vec<Vec<(String, Value)>>,
        operators: impl Into<OperatorMap>,
    ) -> Self {
        let fragment = any_group_fragment(&self.dialect, &groups, &operators.into());
        self.conditions
            .add(ConditionKind::Where, fragment.text, fragment.values);
        self
    }

    /// Equality against the primary key column. Single-column keys only;
    /// compound keys go through [`where_id_matches`](Self::where_id_matches).
    pub fn where_id_is(mut self, id: impl Into<Value>) -> Self {
        let column = self.id_columns.first().to_string();
        self.push_simple(ConditionKind::Where, &column, "=", id.into());
        self
    }

    /// Equality on every primary key column, taking each part from `parts`
    /// (missing parts match NULL, which never matches a row).
    pub fn where_id_matches(mut self, parts: &RawRow) -> Self {
        for (column, value) in self.compound_id_values(parts) {
            self.push_simple(ConditionKind::Where, &column, "=", value);
        }
        self
    }

    /// Membership against a single-column primary key.
    pub fn where_id_in(mut self, ids: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let column = self.id_columns.first().to_string();
        self.push_placeholder(ConditionKind::Where, &column, "IN", ids);
        self
    }

    /// Membership against a compound primary key: one OR group per entry.
    pub fn where_id_in_matches(mut self, entries: &[RawRow]) -> Self {
        let groups: Vec<Vec<(String, Value)>> = entries
            .iter()
            .map(|entry| self.compound_id_values(entry))
            .collect();
        let fragment = any_group_fragment(&self.dialect, &groups, &OperatorMap::default());
        self.conditions
            .add(ConditionKind::Where, fragment.text, fragment.values);
        self
    }

    /// Filter a column/value map down to the key columns, in key order,
    /// substituting null for any column the map is missing.
    fn compound_id_values(&self, parts: &RawRow) -> Vec<(String, Value)> {
        self.id_columns
            .names()
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    parts.get(name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }

    // ==================== HAVING ====================

    pub fn having_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "=", value.into());
        self
    }

    pub fn having_not_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "!=", value.into());
        self
    }

    pub fn having_like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "LIKE", value.into());
        self
    }

    pub fn having_not_like(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "NOT LIKE", value.into());
        self
    }

    pub fn having_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, ">", value.into());
        self
    }

    pub fn having_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "<", value.into());
        self
    }

    pub fn having_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, ">=", value.into());
        self
    }

    pub fn having_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push_simple(ConditionKind::Having, column, "<=", value.into());
        self
    }

    pub fn having_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.push_placeholder(ConditionKind::Having, column, "IN", values);
        self
    }

    pub fn having_not_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.push_placeholder(ConditionKind::Having, column, "NOT IN", values);
        self
    }

    pub fn having_null(mut self, column: &str) -> Self {
        self.push_no_value(ConditionKind::Having, column, "IS NULL");
        self
    }

    pub fn having_not_null(mut self, column: &str) -> Self {
        self.push_no_value(ConditionKind::Having, column, "IS NOT NULL");
        self
    }

    pub fn having_raw(mut self, clause: &str, params: Vec<Value>) -> Self {
        self.conditions.add(ConditionKind::Having, clause, params);
        self
    }

    // ==================== Condition internals ====================

    fn push_simple(&mut self, kind: ConditionKind, column: &str, operator: &str, value: Value) {
        let column = self.qualify(column);
        let quoted = quote_identifier(&self.dialect, &column);
        self.conditions
            .add(kind, format!("{quoted} {operator} ?"), vec![value]);
    }

    fn push_placeholder(
        &mut self,
        kind: ConditionKind,
        column: &str,
        separator: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let quoted = quote_identifier(&self.dialect, column);
        let list = placeholders(values.len());
        self.conditions
            .add(kind, format!("{quoted} {separator} ({list})"), values);
    }

    fn push_no_value(&mut self, kind: ConditionKind, column: &str, operator: &str) {
        let quoted = quote_identifier(&self.dialect, column);
        self.conditions.add(kind, format!("{quoted} {operator}"), vec![]);
    }

    /// Qualify a bare column with the main table (or its alias) when joins
    /// are present, so simple conditions stay unambiguous.
    fn qualify(&self, column: &str) -> String {
        if self.join_sources.is_empty() || column.contains('.') {
            return column.to_string();
        }
        let table = self.table_alias.as_deref().unwrap_or(&self.table);
        format!("{table}.{column}")
    }

    // ==================== Ordering, grouping, pagination ====================

    pub fn order_by_asc(mut self, column: &str) -> Self {
        let quoted = quote_identifier(&self.dialect, column);
        self.order_by.push(format!("{quoted} ASC"));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        let quoted = quote_identifier(&self.dialect, column);
        self.order_by.push(format!("{quoted} DESC"));
        self
    }

    /// Unquoted ORDER BY expression.
    pub fn order_by_expr(mut self, expression: &str) -> Self {
        self.order_by.push(expression.to_string());
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        let quoted = quote_identifier(&self.dialect, column);
        self.group_by.push(quoted);
        self
    }

    /// Unquoted GROUP BY expression.
    pub fn group_by_expr(mut self, expression: &str) -> Self {
        self.group_by.push(expression.to_string());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ==================== Dynamic dispatch ====================

    /// Apply a parsed builder operation in place.
    pub fn apply(&mut self, op: QueryOp) {
        match op {
            QueryOp::WhereEq { column, value } => {
                self.push_simple(ConditionKind::Where, &column, "=", value);
            }
            QueryOp::WhereNotEq { column, value } => {
                self.push_simple(ConditionKind::Where, &column, "!=", value);
            }
            QueryOp::Limit(limit) => self.limit = Some(limit),
            QueryOp::Offset(offset) => self.offset = Some(offset),
            QueryOp::OrderByAsc(column) => {
                let quoted = quote_identifier(&self.dialect, &column);
                self.order_by.push(format!("{quoted} ASC"));
            }
            QueryOp::OrderByDesc(column) => {
                let quoted = quote_identifier(&self.dialect, &column);
                self.order_by.push(format!("{quoted} DESC"));
            }
            QueryOp::GroupBy(column) => {
                let quoted = quote_identifier(&self.dialect, &column);
                self.group_by.push(quoted);
            }
            QueryOp::Distinct => self.distinct = true,
        }
    }

    // ==================== Entity factories ====================

    /// A fresh, pending entity for this table.
    pub fn create(&self) -> Row {
        Row::fresh(
            self.connection.clone(),
            self.table.clone(),
            self.dialect,
            self.id_columns.clone(),
        )
    }

    /// A pending entity populated from `data`; every supplied field is
    /// flagged dirty so it all lands in the insert.
    pub fn create_from(&self, data: RawRow) -> Row {
        let mut row = self.create();
        row.hydrate(data);
        row.force_all_dirty();
        row
    }

    fn row_from(&self, raw: RawRow) -> Row {
        Row::hydrated(
            self.connection.clone(),
            self.table.clone(),
            self.dialect,
            self.id_columns.clone(),
            raw,
        )
    }

    // ==================== Execution ====================

    /// Run the query expecting at most one row.
    pub fn find_one(&mut self, orm: &mut Orm) -> OrmResult<Option<Row>> {
        self.limit = Some(1);
        let mut rows = self.run(orm)?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.row_from(rows.remove(0))))
        }
    }

    /// Primary key lookup shortcut (single-column keys).
    pub fn find_one_by_id(&mut self, orm: &mut Orm, id: impl Into<Value>) -> OrmResult<Option<Row>> {
        let column = self.id_columns.first().to_string();
        self.push_simple(ConditionKind::Where, &column, "=", id.into());
        self.find_one(orm)
    }

    /// Run the query and hydrate every fetched row.
    pub fn find_many(&mut self, orm: &mut Orm) -> OrmResult<Vec<Row>> {
        let rows = self.run(orm)?;
        Ok(rows.into_iter().map(|raw| self.row_from(raw)).collect())
    }

    /// Like [`find_many`](Self::find_many), wrapped in a broadcastable
    /// collection.
    pub fn find_result_set(&mut self, orm: &mut Orm) -> OrmResult<ResultSet> {
        Ok(ResultSet::new(self.find_many(orm)?))
    }

    /// Run the query and return the raw rows without hydration.
    pub fn find_rows(&mut self, orm: &mut Orm) -> OrmResult<Vec<RawRow>> {
        self.run(orm)
    }

    // ==================== Aggregates ====================

    pub fn count(&mut self, orm: &mut Orm) -> OrmResult<Value> {
        self.call_aggregate(orm, "count", "*")
    }

    pub fn max(&mut self, orm: &mut Orm, column: &str) -> OrmResult<Value> {
        self.call_aggregate(orm, "max", column)
    }

    pub fn min(&mut self, orm: &mut Orm, column: &str) -> OrmResult<Value> {
        self.call_aggregate(orm, "min", column)
    }

    pub fn avg(&mut self, orm: &mut Orm, column: &str) -> OrmResult<Value> {
        self.call_aggregate(orm, "avg", column)
    }

    pub fn sum(&mut self, orm: &mut Orm, column: &str) -> OrmResult<Value> {
        self.call_aggregate(orm, "sum", column)
    }

    /// Swap the result columns for a single aggregate expression, fetch one
    /// row, restore the columns and coerce the scalar.
    fn call_aggregate(&mut self, orm: &mut Orm, function: &str, column: &str) -> OrmResult<Value> {
        let alias = function.to_lowercase();
        let function = function.to_uppercase();
        let column = if column == "*" {
            column.to_string()
        } else {
            quote_identifier(&self.dialect, column)
        };
        let saved_columns = std::mem::take(&mut self.result_columns);
        self.using_default_result_columns = true;
        self.push_result_column(format!("{function}({column})"), Some(&alias));
        let found = self.find_one(orm)?;
        self.result_columns = saved_columns;
        let value = match found {
            Some(row) => row.get(&alias),
            None => Value::Null,
        };
        Ok(value.coerce_numeric())
    }

    // ==================== Bulk delete ====================

    /// Delete every row the accumulated WHERE conditions match. Not scoped
    /// to any primary key; this is the explicitly bulk variant.
    pub fn delete_many(&mut self, orm: &mut Orm) -> OrmResult<bool> {
        let mut values = self.params.clone();
        let where_clause = self.conditions.build_clause(ConditionKind::Where, &mut values);
        let sql = join_non_empty(&[
            format!(
                "DELETE FROM {}",
                quote_identifier(&self.dialect, &self.table)
            ),
            where_clause,
        ]);
        let executed = orm.execute(&sql, &values, &self.connection)?;
        if orm.config(&self.connection)?.caching_auto_clear {
            orm.clear_cache(Some(&self.table), &self.connection)?;
        }
        Ok(executed.success())
    }

    // ==================== Rendering ====================

    /// Render the SELECT statement and collect its bound values in order:
    /// raw-join parameters, WHERE values, HAVING values.
    fn build_select(&self) -> (String, Vec<Value>) {
        if let Some((sql, params)) = &self.raw_query {
            return (sql.clone(), params.clone());
        }
        let mut values = self.params.clone();
        let select_start = self.build_select_start();
        let joins = self.join_sources.join(" ");
        let where_clause = self.conditions.build_clause(ConditionKind::Where, &mut values);
        let group_by = self.build_group_by();
        let having_clause = self
            .conditions
            .build_clause(ConditionKind::Having, &mut values);
        let order_by = self.build_order_by();
        let limit = self.build_limit();
        let offset = self.build_offset();
        let sql = join_non_empty(&[
            select_start,
            joins,
            where_clause,
            group_by,
            having_clause,
            order_by,
            limit,
            offset,
        ]);
        (sql, values)
    }

    fn build_select_start(&self) -> String {
        let mut fragment = String::from("SELECT ");
        if let Some(limit) = self.limit {
            if self.dialect.limit_style == LimitStyle::TopN {
                fragment.push_str(&format!("TOP {limit} "));
            }
        }
        if self.distinct {
            fragment.push_str("DISTINCT ");
        }
        fragment.push_str(&self.result_columns.join(", "));
        fragment.push_str(" FROM ");
        fragment.push_str(&quote_identifier(&self.dialect, &self.table));
        if let Some(alias) = &self.table_alias {
            fragment.push(' ');
            fragment.push_str(&quote_identifier(&self.dialect, alias));
        }
        fragment
    }

    fn build_group_by(&self) -> String {
        if self.group_by.is_empty() {
            return String::new();
        }
        format!("GROUP BY {}", self.group_by.join(", "))
    }

    fn build_order_by(&self) -> String {
        if self.order_by.is_empty() {
            return String::new();
        }
        format!("ORDER BY {}", self.order_by.join(", "))
    }

    fn build_limit(&self) -> String {
        match self.limit {
            Some(limit) if self.dialect.limit_style == LimitStyle::Limit => {
                format!("{} {limit}", self.dialect.limit_keyword)
            }
            _ => String::new(),
        }
    }

    fn build_offset(&self) -> String {
        match self.offset {
            Some(offset) => format!("{} {offset}", self.dialect.offset_keyword),
            None => String::new(),
        }
    }

    /// Reset the transient clause state so the instance can be reused for
    /// an unrelated query.
    fn reset_transient(&mut self) {
        self.params.clear();
        self.result_columns = vec!["*".to_string()];
        self.using_default_result_columns = true;
    }

    /// Render, consult the cache, execute, fetch, populate the cache, and
    /// reset the transient builder state.
    pub(crate) fn run(&mut self, orm: &mut Orm) -> OrmResult<Vec<RawRow>> {
        let (sql, params) = self.build_select();
        let caching = orm.config(&self.connection)?.caching;
        let mut cache_key = None;
        if caching {
            let key = orm.cache_key(&sql, &params, &self.table, &self.connection)?;
            if let Some(rows) = orm.cache_lookup(&key, &self.table, &self.connection)? {
                self.reset_transient();
                return Ok(rows);
            }
            cache_key = Some(key);
        }
        let mut executed = orm.execute(&sql, &params, &self.connection)?;
        let rows = executed.fetch_all()?;
        if let Some(key) = cache_key {
            orm.cache_store(&key, &rows, &self.table, &self.connection)?;
        }
        self.reset_transient();
        Ok(rows)
    }
}

/// Join the non-empty pieces of a statement with single spaces, trimming
/// each piece first.
pub(crate) fn join_non_empty(pieces: &[String]) -> String {
    pieces
        .iter()
        .map(|piece| piece.trim())
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
