//! The driver collaborator contract.
//!
//! The core never talks to a database directly. A [`Driver`] wraps one open
//! connection and hands out [`DriverStatement`]s; a [`DriverConnector`]
//! opens drivers lazily from a configuration record. Everything is
//! synchronous and blocking: each call runs to completion before the next
//! builder step proceeds.
//!
//! Driver failures are surfaced to the caller unchanged (wrapped in
//! [`OrmError::Driver`](crate::OrmError::Driver) with the source preserved);
//! the core never retries or suppresses them.

use crate::config::Config;
use crate::error::OrmResult;
use crate::value::{RawRow, Value};

/// One open database connection.
pub trait Driver {
    /// Dialect tag, e.g. `"mysql"`, `"pgsql"`, `"mssql"`, `"firebird"`.
    fn driver_name(&self) -> &str;

    /// Prepare a statement. The returned statement owns whatever handle it
    /// needs; it does not borrow the driver.
    fn prepare(&mut self, sql: &str) -> OrmResult<Box<dyn DriverStatement>>;

    /// The key generated by the most recent insert on this connection.
    fn last_insert_id(&mut self) -> OrmResult<Value>;

    /// Render a value as an escaped SQL literal. Used only when writing the
    /// query log; never part of an executed statement.
    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// A prepared statement in its bind/execute/fetch lifecycle.
pub trait DriverStatement {
    /// Bind one positional parameter. Positions are 1-based.
    fn bind(&mut self, position: usize, value: &Value) -> OrmResult<()>;

    /// Run the statement. The boolean is the driver's own success flag.
    fn execute(&mut self) -> OrmResult<bool>;

    /// Pull the next result row, or `None` at the end of the result set.
    fn fetch_row(&mut self) -> OrmResult<Option<RawRow>>;
}

/// Opens a [`Driver`] from a configuration record on first use.
pub trait DriverConnector {
    fn connect(&self, config: &Config) -> OrmResult<Box<dyn Driver>>;
}
