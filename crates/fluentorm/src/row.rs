//! Row entities and dirty-field persistence.
//!
//! A [`Row`] is one hydrated or pending database row. Mutations are tracked
//! per field so a save writes only what changed; a row created through
//! [`Query::create`](crate::Query::create) starts in the pending state and
//! is inserted on its first save, after which generated key values are
//! back-filled from the driver.

use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::IdColumns;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{quote_identifier, quote_identifier_list};
use crate::ops::EntityOp;
use crate::orm::Orm;
use crate::value::{RawRow, Value};

/// One database row, bound to a table and a named connection.
#[derive(Debug, Clone)]
pub struct Row {
    connection: String,
    table: String,
    dialect: Dialect,
    id_columns: IdColumns,
    data: RawRow,
    /// Changed fields and the values they changed to, in the order the
    /// changes were made. Insert column order comes from this map.
    dirty_fields: IndexMap<String, Value>,
    /// Dirty fields whose value is raw SQL, compiled into the statement
    /// instead of being bound.
    expr_fields: IndexSet<String>,
    is_new: bool,
}

impl Row {
    pub(crate) fn fresh(
        connection: String,
        table: String,
        dialect: Dialect,
        id_columns: IdColumns,
    ) -> Self {
        Self {
            connection,
            table,
            dialect,
            id_columns,
            data: IndexMap::new(),
            dirty_fields: IndexMap::new(),
            expr_fields: IndexSet::new(),
            is_new: true,
        }
    }

    pub(crate) fn hydrated(
        connection: String,
        table: String,
        dialect: Dialect,
        id_columns: IdColumns,
        data: RawRow,
    ) -> Self {
        Self {
            connection,
            table,
            dialect,
            id_columns,
            data,
            dirty_fields: IndexMap::new(),
            expr_fields: IndexSet::new(),
            is_new: false,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Replace this row's data wholesale. Dirty flags are untouched; use
    /// [`force_all_dirty`](Self::force_all_dirty) to schedule everything
    /// for the next save.
    pub fn hydrate(&mut self, data: RawRow) -> &mut Self {
        self.data = data;
        self
    }

    /// Flag every present field as dirty.
    pub fn force_all_dirty(&mut self) -> &mut Self {
        self.dirty_fields = self.data.clone();
        self
    }

    /// Override which column(s) identify this row. Takes precedence over
    /// per-table and connection-level configuration.
    pub fn use_id_column(&mut self, columns: impl Into<IdColumns>) -> &mut Self {
        self.id_columns = columns.into();
        self
    }

    /// Current value of a column, or null if absent.
    pub fn get(&self, column: &str) -> Value {
        self.data.get(column).cloned().unwrap_or(Value::Null)
    }

    /// The full data map, in column order.
    pub fn data(&self) -> &RawRow {
        &self.data
    }

    /// A filtered copy of the data map holding only the named columns.
    pub fn data_subset(&self, columns: &[&str]) -> RawRow {
        let mut subset = IndexMap::new();
        for column in columns {
            if let Some(value) = self.data.get(*column) {
                subset.insert((*column).to_string(), value.clone());
            }
        }
        subset
    }

    /// Set a column and flag it dirty.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        self.data.insert(column.to_string(), value.clone());
        self.dirty_fields.insert(column.to_string(), value);
        self.expr_fields.shift_remove(column);
        self
    }

    /// Set a column to a raw SQL expression. The expression text is
    /// compiled into the statement, never parameter-bound.
    pub fn set_expr(&mut self, column: &str, expression: impl Into<String>) -> &mut Self {
        let expression = Value::Text(expression.into());
        self.data.insert(column.to_string(), expression.clone());
        self.dirty_fields.insert(column.to_string(), expression);
        self.expr_fields.insert(column.to_string());
        self
    }

    /// Remove a column from the data and from the dirty set.
    pub fn unset(&mut self, column: &str) -> &mut Self {
        self.data.shift_remove(column);
        self.dirty_fields.shift_remove(column);
        self.expr_fields.shift_remove(column);
        self
    }

    /// Whether a column changed since the row was last saved or hydrated.
    pub fn is_dirty(&self, column: &str) -> bool {
        self.dirty_fields.contains_key(column)
    }

    /// Whether this row is pending its first insert.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    // ==================== Primary key ====================

    /// Value of the first key column (the id, for single-column keys).
    /// Null when unset.
    pub fn id(&self) -> Value {
        self.get(self.id_columns.first())
    }

    /// Every key column with its current value, in declared order.
    pub fn id_parts(&self) -> Vec<(String, Value)> {
        self.id_columns
            .names()
            .into_iter()
            .map(|name| (name.to_string(), self.get(name)))
            .collect()
    }

    /// Key values in column order, failing when any part is null. A row
    /// without a resolvable identity cannot be targeted for an update or
    /// delete.
    pub fn require_id(&self) -> OrmResult<Vec<Value>> {
        let parts = self.id_parts();
        if parts.iter().any(|(_, value)| value.is_null()) {
            return Err(if self.id_columns.is_compound() {
                OrmError::identity_partial(&self.table)
            } else {
                OrmError::identity_missing(&self.table)
            });
        }
        Ok(parts.into_iter().map(|(_, value)| value).collect())
    }

    /// How many key columns currently hold null.
    pub(crate) fn null_id_parts(&self) -> usize {
        self.id_parts()
            .iter()
            .filter(|(_, value)| value.is_null())
            .count()
    }

    // ==================== Persistence ====================

    /// Write dirty fields back: INSERT for a pending row, UPDATE keyed on
    /// the primary key otherwise. A persisted row with nothing dirty is a
    /// successful no-op. Clears the dirty and expression sets on success
    /// and back-fills generated key values after an insert.
    pub fn save(&mut self, orm: &mut Orm) -> OrmResult<bool> {
        let mut values: Vec<Value> = self
            .dirty_fields
            .iter()
            .filter(|(field, _)| !self.expr_fields.contains(field.as_str()))
            .map(|(_, value)| value.clone())
            .collect();

        let sql = if self.is_new {
            self.build_insert()
        } else {
            if values.is_empty() && self.expr_fields.is_empty() {
                return Ok(true);
            }
            let id = self.require_id()?;
            values.extend(id);
            self.build_update()
        };

        let mut executed = orm.execute(&sql, &values, &self.connection)?;
        if orm.config(&self.connection)?.caching_auto_clear {
            orm.clear_cache(Some(&self.table), &self.connection)?;
        }

        if self.is_new {
            self.is_new = false;
            if self.null_id_parts() != 0 {
                if self.dialect.insert_returning {
                    // The RETURNING row may carry several columns when the
                    // key is compound.
                    if let Some(returned) = executed.fetch_row()? {
                        for (column, value) in returned {
                            self.data.insert(column, value);
                        }
                    }
                } else {
                    // Only the first key column can be back-filled from the
                    // driver's single last-inserted-id value. Compound keys
                    // with more than one generated column are not supported.
                    let id = orm.last_insert_id(&self.connection)?;
                    let column = self.id_columns.first().to_string();
                    self.data.insert(column, id);
                }
            }
        }

        self.dirty_fields.clear();
        self.expr_fields.clear();
        Ok(executed.success())
    }

    /// Delete this row, keyed on its primary key.
    pub fn delete(&mut self, orm: &mut Orm) -> OrmResult<bool> {
        let values = self.require_id()?;
        let sql = format!(
            "DELETE FROM {} {}",
            quote_identifier(&self.dialect, &self.table),
            self.id_predicate()
        );
        let executed = orm.execute(&sql, &values, &self.connection)?;
        if orm.config(&self.connection)?.caching_auto_clear {
            orm.clear_cache(Some(&self.table), &self.connection)?;
        }
        Ok(executed.success())
    }

    /// Apply a parsed entity operation.
    pub fn apply(&mut self, orm: &mut Orm, op: EntityOp) -> OrmResult<()> {
        match op {
            EntityOp::Set { column, value } => {
                self.set(&column, value);
            }
            EntityOp::SetExpr { column, expression } => {
                self.set_expr(&column, expression);
            }
            EntityOp::Unset { column } => {
                self.unset(&column);
            }
            EntityOp::Save => {
                self.save(orm)?;
            }
            EntityOp::Delete => {
                self.delete(orm)?;
            }
        }
        Ok(())
    }

    // ==================== Statement building ====================

    /// `WHERE k1 = ? AND k2 = ?` over every key column in order.
    fn id_predicate(&self) -> String {
        let mut pieces = vec!["WHERE".to_string()];
        for (index, name) in self.id_columns.names().into_iter().enumerate() {
            if index > 0 {
                pieces.push("AND".to_string());
            }
            pieces.push(quote_identifier(&self.dialect, name));
            pieces.push("= ?".to_string());
        }
        pieces.join(" ")
    }

    fn build_update(&self) -> String {
        let set_list = self
            .dirty_fields
            .iter()
            .map(|(field, value)| {
                let quoted = quote_identifier(&self.dialect, field);
                if self.expr_fields.contains(field) {
                    format!("{quoted} = {value}")
                } else {
                    format!("{quoted} = ?")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {} {}",
            quote_identifier(&self.dialect, &self.table),
            set_list,
            self.id_predicate()
        )
    }

    fn build_insert(&self) -> String {
        let columns = self
            .dirty_fields
            .keys()
            .map(|field| quote_identifier(&self.dialect, field))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = self
            .dirty_fields
            .iter()
            .map(|(field, value)| {
                if self.expr_fields.contains(field) {
                    value.to_string()
                } else {
                    "?".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.dialect, &self.table),
            columns,
            placeholders
        );
        if self.dialect.insert_returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&quote_identifier_list(
                &self.dialect,
                self.id_columns.names(),
            ));
        }
        sql
    }
}

/// Rows serialize as their data map.
impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (column, value) in &self.data {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
