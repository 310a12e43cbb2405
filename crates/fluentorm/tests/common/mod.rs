//! Shared mock driver for integration tests.
//!
//! Records every executed statement with its bound values, serves queued
//! row sets in FIFO order, and exposes a configurable last-insert-id.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use fluentorm::{Driver, DriverStatement, Orm, OrmResult, RawRow, Value};

pub struct MockState {
    /// `(sql, bound values)` for every executed statement, in order.
    pub executed: Vec<(String, Vec<Value>)>,
    /// Row sets handed to executed statements, FIFO. Statements beyond the
    /// queue produce empty result sets.
    pub queued_rows: VecDeque<Vec<RawRow>>,
    pub last_insert_id: Value,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            executed: Vec::new(),
            queued_rows: VecDeque::new(),
            last_insert_id: Value::Null,
        }
    }
}

impl MockState {
    pub fn queue(&mut self, rows: Vec<RawRow>) {
        self.queued_rows.push_back(rows);
    }

    pub fn executed_sql(&self) -> Vec<&str> {
        self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

pub struct MockDriver {
    name: String,
    state: Rc<RefCell<MockState>>,
}

pub struct MockStatement {
    sql: String,
    bound: Vec<Value>,
    rows: VecDeque<RawRow>,
    state: Rc<RefCell<MockState>>,
}

impl DriverStatement for MockStatement {
    fn bind(&mut self, position: usize, value: &Value) -> OrmResult<()> {
        assert_eq!(position, self.bound.len() + 1, "bind positions must be sequential");
        self.bound.push(value.clone());
        Ok(())
    }

    fn execute(&mut self) -> OrmResult<bool> {
        let mut state = self.state.borrow_mut();
        state.executed.push((self.sql.clone(), self.bound.clone()));
        if let Some(rows) = state.queued_rows.pop_front() {
            self.rows = rows.into();
        }
        Ok(true)
    }

    fn fetch_row(&mut self) -> OrmResult<Option<RawRow>> {
        Ok(self.rows.pop_front())
    }
}

impl Driver for MockDriver {
    fn driver_name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, sql: &str) -> OrmResult<Box<dyn DriverStatement>> {
        Ok(Box::new(MockStatement {
            sql: sql.to_string(),
            bound: Vec::new(),
            rows: VecDeque::new(),
            state: self.state.clone(),
        }))
    }

    fn last_insert_id(&mut self) -> OrmResult<Value> {
        Ok(self.state.borrow().last_insert_id.clone())
    }
}

pub fn mock_driver(driver_name: &str) -> (Box<MockDriver>, Rc<RefCell<MockState>>) {
    let state = Rc::new(RefCell::new(MockState::default()));
    let driver = Box::new(MockDriver {
        name: driver_name.to_string(),
        state: Rc::clone(&state),
    });
    (driver, state)
}

/// An [`Orm`] with a mock driver installed on the default connection and
/// logging enabled.
pub fn setup(driver_name: &str) -> (Orm, Rc<RefCell<MockState>>) {
    let mut orm = Orm::new();
    orm.configure("default").logging = true;
    let (driver, state) = mock_driver(driver_name);
    orm.set_driver("default", driver);
    (orm, state)
}

/// Build a raw row from pairs.
pub fn row(pairs: &[(&str, Value)]) -> RawRow {
    let mut row = RawRow::new();
    for (column, value) in pairs {
        row.insert((*column).to_string(), value.clone());
    }
    row
}
