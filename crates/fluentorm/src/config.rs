//! Per-connection configuration records.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::dialect::LimitStyle;
use crate::driver::DriverConnector;

/// Name of the connection used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// Callback invoked with the rendered statement and its execution time
/// whenever logging is enabled for the connection.
pub type QueryLogger = Arc<dyn Fn(&str, Duration)>;

/// The column (or ordered columns) that identify a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdColumns {
    Single(String),
    /// Compound key; order here is the order predicates and values use.
    Compound(Vec<String>),
}

impl IdColumns {
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    /// Key column names in declared order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Compound(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn first(&self) -> &str {
        match self {
            Self::Single(name) => name,
            Self::Compound(names) => names.first().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Compound(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for IdColumns {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for IdColumns {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<Vec<String>> for IdColumns {
    fn from(names: Vec<String>) -> Self {
        Self::Compound(names)
    }
}

impl From<&[&str]> for IdColumns {
    fn from(names: &[&str]) -> Self {
        Self::Compound(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Everything a named connection is configured with.
///
/// A record is materialized with defaults the first time a connection name
/// is referenced; fields left as `None` are autodetected from the driver
/// when the handle is first opened.
#[derive(Clone)]
pub struct Config {
    pub connection_string: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub driver_options: HashMap<String, String>,
    /// Default primary key column for every table on this connection.
    pub id_column: String,
    /// Per-table key overrides, single or compound.
    pub id_column_overrides: HashMap<String, IdColumns>,
    /// Explicit identifier quote character; autodetected when unset.
    pub identifier_quote_character: Option<char>,
    /// Explicit limit clause style; autodetected when unset.
    pub limit_clause_style: Option<LimitStyle>,
    pub logging: bool,
    pub logger: Option<QueryLogger>,
    pub caching: bool,
    /// Clear the whole query cache after every successful write.
    pub caching_auto_clear: bool,
    /// Callers that want collection wrappers from multi-row finders set
    /// this; the typed API exposes both shapes regardless.
    pub return_result_sets: bool,
    /// Replaces the built-in in-memory cache for this connection.
    pub cache_backend: Option<Arc<dyn CacheBackend>>,
    /// Opens the driver handle on first use.
    pub connector: Option<Arc<dyn DriverConnector>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: "sqlite::memory:".to_string(),
            username: None,
            password: None,
            driver_options: HashMap::new(),
            id_column: "id".to_string(),
            id_column_overrides: HashMap::new(),
            identifier_quote_character: None,
            limit_clause_style: None,
            logging: false,
            logger: None,
            caching: false,
            caching_auto_clear: false,
            return_result_sets: false,
            cache_backend: None,
            connector: None,
        }
    }
}

impl Config {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    /// Register a key override for one table.
    pub fn override_id_column(&mut self, table: impl Into<String>, columns: impl Into<IdColumns>) {
        self.id_column_overrides.insert(table.into(), columns.into());
    }

    /// Key columns for a table: the per-table override when present,
    /// the connection default otherwise.
    pub fn id_columns_for(&self, table: &str) -> IdColumns {
        self.id_column_overrides
            .get(table)
            .cloned()
            .unwrap_or_else(|| IdColumns::Single(self.id_column.clone()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("connection_string", &self.connection_string)
            .field("username", &self.username)
            .field("id_column", &self.id_column)
            .field("id_column_overrides", &self.id_column_overrides)
            .field(
                "identifier_quote_character",
                &self.identifier_quote_character,
            )
            .field("limit_clause_style", &self.limit_clause_style)
            .field("logging", &self.logging)
            .field("caching", &self.caching)
            .field("caching_auto_clear", &self.caching_auto_clear)
            .field("return_result_sets", &self.return_result_sets)
            .field("has_logger", &self.logger.is_some())
            .field("has_cache_backend", &self.cache_backend.is_some())
            .field("has_connector", &self.connector.is_some())
            .finish()
    }
}
