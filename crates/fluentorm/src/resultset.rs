//! Ordered collections of rows.

use std::ops::Index;
use std::slice;

use serde::Serialize;

use crate::error::OrmResult;
use crate::ops::EntityOp;
use crate::orm::Orm;
use crate::row::Row;
use crate::value::Value;

/// An ordered collection of [`Row`]s.
///
/// Mostly a transparent container (countable, iterable, indexable,
/// serializable); its one extra capability is broadcasting an entity
/// operation across every member.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, Row> {
        self.rows.iter_mut()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Apply one entity operation to every member, in order. The first
    /// failure aborts the broadcast and is returned.
    pub fn broadcast(&mut self, orm: &mut Orm, op: &EntityOp) -> OrmResult<()> {
        for row in &mut self.rows {
            row.apply(orm, op.clone())?;
        }
        Ok(())
    }

    /// [`broadcast`](Self::broadcast) addressed by operation name. An
    /// unrecognized name is the unknown-operation error, reported before
    /// any member is touched.
    pub fn broadcast_named(
        &mut self,
        orm: &mut Orm,
        operation: &str,
        args: Vec<Value>,
    ) -> OrmResult<()> {
        let op = EntityOp::parse(operation, args)?;
        self.broadcast(orm, &op)
    }

    /// The collection rendered as a JSON array of row data maps.
    pub fn as_json(&self) -> OrmResult<String> {
        serde_json::to_string(self)
            .map_err(|err| crate::error::OrmError::validation(err.to_string()))
    }
}

impl From<Vec<Row>> for ResultSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl Index<usize> for ResultSet {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a mut ResultSet {
    type Item = &'a mut Row;
    type IntoIter = slice::IterMut<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter_mut()
    }
}
