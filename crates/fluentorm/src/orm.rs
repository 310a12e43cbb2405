//! The connection registry.
//!
//! [`Orm`] owns everything that is shared across queries: configuration
//! records, open driver handles, the query cache and the query log, all
//! keyed by connection name. It is an explicit object rather than static
//! state so tests and embedders control initialization and teardown.
//!
//! A configuration record is materialized with defaults the first time its
//! name is referenced. A driver handle is opened lazily on first use, and
//! the two autodetected dialect facts are probed once and written back into
//! the configuration record.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{default_fingerprint, QueryCache};
use crate::config::{Config, DEFAULT_CONNECTION};
use crate::dialect::Dialect;
use crate::driver::{Driver, DriverStatement};
use crate::error::{OrmError, OrmResult};
use crate::query::Query;
use crate::value::{RawRow, Value};

/// A statement that has been executed, ready for row fetching.
pub struct ExecutedStatement {
    statement: Box<dyn DriverStatement>,
    success: bool,
}

impl ExecutedStatement {
    /// The driver's success flag from `execute`.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Pull the next result row.
    pub fn fetch_row(&mut self) -> OrmResult<Option<RawRow>> {
        self.statement.fetch_row()
    }

    /// Drain the remaining result rows.
    pub fn fetch_all(&mut self) -> OrmResult<Vec<RawRow>> {
        let mut rows = Vec::new();
        while let Some(row) = self.statement.fetch_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Registry of named connections and the state shared between queries.
#[derive(Default)]
pub struct Orm {
    configs: HashMap<String, Config>,
    drivers: HashMap<String, Box<dyn Driver>>,
    cache: QueryCache,
    logs: HashMap<String, Vec<String>>,
    last_query: Option<String>,
}

impl Orm {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Configuration ====================

    /// Mutable access to a connection's configuration, materializing the
    /// default record on first touch.
    pub fn configure(&mut self, connection: &str) -> &mut Config {
        self.configs.entry(connection.to_string()).or_default()
    }

    /// Read a connection's configuration. Reading a name that was never
    /// set up is a programmer error and is surfaced, not defaulted.
    pub fn config(&self, connection: &str) -> OrmResult<&Config> {
        self.configs
            .get(connection)
            .ok_or_else(|| OrmError::UnknownConnection(connection.to_string()))
    }

    /// Drop every configuration record.
    pub fn reset_config(&mut self) {
        self.configs.clear();
    }

    // ==================== Drivers ====================

    /// Install a ready-opened driver handle under a connection name and
    /// probe its dialect facts immediately.
    pub fn set_driver(&mut self, connection: &str, driver: Box<dyn Driver>) {
        self.configs.entry(connection.to_string()).or_default();
        self.drivers.insert(connection.to_string(), driver);
        self.probe_dialect(connection);
    }

    /// Close (drop) every open driver handle. Configuration stays.
    pub fn reset_connections(&mut self) {
        self.drivers.clear();
    }

    /// Names of the connections with an open driver handle.
    pub fn connection_names(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }

    /// Make sure a driver handle is open for the connection, opening one
    /// through the configured connector when needed.
    fn ensure_driver(&mut self, connection: &str) -> OrmResult<()> {
        if !self.drivers.contains_key(connection) {
            let config = self
                .configs
                .entry(connection.to_string())
                .or_default()
                .clone();
            let connector = config
                .connector
                .clone()
                .ok_or_else(|| OrmError::MissingConnector(connection.to_string()))?;
            let driver = connector.connect(&config)?;
            self.drivers.insert(connection.to_string(), driver);
        }
        self.probe_dialect(connection);
        Ok(())
    }

    fn driver_mut(&mut self, connection: &str) -> OrmResult<&mut Box<dyn Driver>> {
        self.ensure_driver(connection)?;
        self.drivers
            .get_mut(connection)
            .ok_or_else(|| OrmError::MissingConnector(connection.to_string()))
    }

    /// Fill the autodetected dialect facts into the configuration record,
    /// once. Explicitly configured values are left alone.
    fn probe_dialect(&mut self, connection: &str) {
        let Some(driver) = self.drivers.get(connection) else {
            return;
        };
        let driver_name = driver.driver_name().to_string();
        let config = self.configs.entry(connection.to_string()).or_default();
        if config.identifier_quote_character.is_none() {
            config.identifier_quote_character =
                Some(Dialect::detect_quote_character(&driver_name));
        }
        if config.limit_clause_style.is_none() {
            config.limit_clause_style = Some(Dialect::detect_limit_style(&driver_name));
        }
    }

    fn dialect_for(&mut self, connection: &str) -> OrmResult<Dialect> {
        self.ensure_driver(connection)?;
        let driver = self
            .drivers
            .get(connection)
            .ok_or_else(|| OrmError::MissingConnector(connection.to_string()))?;
        let driver_name = driver.driver_name();
        let config = self.config(connection)?;
        Ok(Dialect::resolve(
            driver_name,
            config.identifier_quote_character,
            config.limit_clause_style,
        ))
    }

    // ==================== Query factories ====================

    /// Start a query against a table on the default connection.
    pub fn for_table(&mut self, table: &str) -> OrmResult<Query> {
        self.for_table_on(table, DEFAULT_CONNECTION)
    }

    /// Start a query against a table on a named connection.
    pub fn for_table_on(&mut self, table: &str, connection: &str) -> OrmResult<Query> {
        let dialect = self.dialect_for(connection)?;
        let config = self.config(connection)?;
        let id_columns = config.id_columns_for(table);
        Ok(Query::new(
            connection.to_string(),
            table.to_string(),
            dialect,
            id_columns,
        ))
    }

    // ==================== Execution ====================

    /// Execute a raw statement, with `?` placeholders bound positionally.
    /// For anything the builders cannot express.
    pub fn raw_execute(
        &mut self,
        sql: &str,
        params: &[Value],
        connection: &str,
    ) -> OrmResult<ExecutedStatement> {
        self.ensure_driver(connection)?;
        self.execute(sql, params, connection)
    }

    /// Prepare, bind, execute, log. Rows stay on the returned statement.
    pub(crate) fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
        connection: &str,
    ) -> OrmResult<ExecutedStatement> {
        let started = Instant::now();
        let driver = self.driver_mut(connection)?;
        let mut statement = driver.prepare(sql)?;
        for (index, value) in params.iter().enumerate() {
            statement.bind(index + 1, value)?;
        }
        let success = statement.execute()?;
        let elapsed = started.elapsed();
        self.log_statement(sql, params, connection, elapsed)?;
        Ok(ExecutedStatement { statement, success })
    }

    pub(crate) fn last_insert_id(&mut self, connection: &str) -> OrmResult<Value> {
        self.driver_mut(connection)?.last_insert_id()
    }

    // ==================== Query log ====================

    fn log_statement(
        &mut self,
        sql: &str,
        params: &[Value],
        connection: &str,
        elapsed: Duration,
    ) -> OrmResult<()> {
        tracing::debug!(
            target: "fluentorm::sql",
            connection,
            sql,
            params = params.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "statement executed"
        );
        let config = self.config(connection)?;
        if !config.logging {
            return Ok(());
        }
        let logger = config.logger.clone();
        let bound = if params.is_empty() {
            sql.to_string()
        } else {
            // Substituted with driver-quoted literals for readability; the
            // executed statement always binds.
            let literals: Vec<String> = match self.drivers.get(connection) {
                Some(driver) => params.iter().map(|v| driver.quote_literal(v)).collect(),
                None => params.iter().map(Value::to_string).collect(),
            };
            substitute_placeholders(sql, &literals)
        };
        self.logs
            .entry(connection.to_string())
            .or_default()
            .push(bound.clone());
        self.last_query = Some(bound.clone());
        if let Some(logger) = logger {
            logger(&bound, elapsed);
        }
        Ok(())
    }

    /// The most recent logged statement across all connections.
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// The most recent logged statement for one connection.
    pub fn last_query_on(&self, connection: &str) -> Option<&str> {
        self.logs.get(connection)?.last().map(String::as_str)
    }

    /// Every statement logged for a connection so far.
    pub fn query_log(&self, connection: &str) -> &[String] {
        self.logs.get(connection).map(Vec::as_slice).unwrap_or(&[])
    }

    // ==================== Cache ====================

    pub(crate) fn cache_key(
        &self,
        sql: &str,
        values: &[Value],
        table: &str,
        connection: &str,
    ) -> OrmResult<String> {
        let config = self.config(connection)?;
        Ok(match &config.cache_backend {
            Some(backend) => backend.fingerprint(sql, values, table, connection),
            None => default_fingerprint(sql, values),
        })
    }

    pub(crate) fn cache_lookup(
        &self,
        key: &str,
        table: &str,
        connection: &str,
    ) -> OrmResult<Option<Vec<RawRow>>> {
        let config = self.config(connection)?;
        Ok(match &config.cache_backend {
            Some(backend) => backend.lookup(key, table, connection),
            None => self.cache.get(connection, key),
        })
    }

    pub(crate) fn cache_store(
        &mut self,
        key: &str,
        rows: &[RawRow],
        table: &str,
        connection: &str,
    ) -> OrmResult<()> {
        let backend = self.config(connection)?.cache_backend.clone();
        match backend {
            Some(backend) => backend.store(key, rows, table, connection),
            None => self.cache.insert(connection, key.to_string(), rows.to_vec()),
        }
        Ok(())
    }

    /// Empty the built-in cache (all connections, unconditionally) and
    /// notify the connection's custom backend, when one is registered,
    /// so it can run its own invalidation.
    pub fn clear_cache(&mut self, table: Option<&str>, connection: &str) -> OrmResult<()> {
        self.cache.clear_all();
        if let Some(config) = self.configs.get(connection) {
            if let Some(backend) = &config.cache_backend {
                backend.clear(table, connection);
            }
        }
        Ok(())
    }
}

/// Replace each `?` outside of string literals with the next rendered
/// literal. `?` characters inside quoted runs are data, not placeholders.
fn substitute_placeholders(sql: &str, literals: &[String]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut next = literals.iter();
    let mut in_single = false;
    let mut in_double = false;
    for ch in sql.chars() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(ch);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(ch);
            }
            '?' if !in_single && !in_double => match next.next() {
                Some(literal) => out.push_str(literal),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders_in_order() {
        let out = substitute_placeholders(
            "SELECT * FROM t WHERE a = ? AND b = ?",
            &["1".to_string(), "'x'".to_string()],
        );
        assert_eq!(out, "SELECT * FROM t WHERE a = 1 AND b = 'x'");
    }

    #[test]
    fn ignores_placeholders_inside_literals() {
        let out = substitute_placeholders(
            "SELECT * FROM t WHERE a = 'what?' AND b = ?",
            &["2".to_string()],
        );
        assert_eq!(out, "SELECT * FROM t WHERE a = 'what?' AND b = 2");
    }

    #[test]
    fn leftover_placeholders_stay_verbatim() {
        let out = substitute_placeholders("a = ? AND b = ?", &["1".to_string()]);
        assert_eq!(out, "a = 1 AND b = ?");
    }

    #[test]
    fn reading_config_for_unknown_connection_errors() {
        let orm = Orm::new();
        let err = orm.config("nope").unwrap_err();
        assert!(err.is_unknown_connection());
    }

    #[test]
    fn configure_materializes_defaults() {
        let mut orm = Orm::new();
        orm.configure("fresh");
        let config = orm.config("fresh").unwrap();
        assert_eq!(config.id_column, "id");
        assert!(!config.caching);
    }
}
