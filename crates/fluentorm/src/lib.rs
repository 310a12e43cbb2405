//! # fluentorm
//!
//! A fluent, dialect-aware SQL query builder and lightweight row
//! persistence layer.
//!
//! ## Features
//!
//! - **Fluent statements**: SELECT/INSERT/UPDATE/DELETE built through
//!   chained calls, rendered with positional `?` placeholders
//! - **Dialect aware**: identifier quoting, `LIMIT` vs `TOP`, firebird
//!   `ROWS`/`TO` and postgres `RETURNING` are resolved per connection,
//!   autodetected from the driver when not configured
//! - **Dirty tracking**: rows remember which fields changed, so saves
//!   write only changed columns and clean saves are no-ops
//! - **Compound keys**: single or multi-column primary keys, with
//!   per-table and per-instance overrides
//! - **Query cache**: reads are cached per connection under a fingerprint
//!   of the statement and its values; backends are pluggable
//! - **Explicit registry**: connections, configuration, cache and query
//!   log live on an [`Orm`] value you own, not in process-wide statics
//!
//! The database itself stays behind the [`Driver`] contract: prepare,
//! bind, execute, fetch, synchronous and blocking.
//!
//! ## Reading
//!
//! ```ignore
//! let mut orm = Orm::new();
//! orm.set_driver("default", driver);
//!
//! let people = orm
//!     .for_table("person")?
//!     .where_eq("name", "Fred")
//!     .where_gte("age", 18)
//!     .order_by_desc("created")
//!     .limit(10)
//!     .find_many(&mut orm)?;
//! ```
//!
//! ## Writing
//!
//! ```ignore
//! let mut person = orm.for_table("person")?.create();
//! person.set("name", "Fred").set("age", 42);
//! person.save(&mut orm)?;          // INSERT, id back-filled
//!
//! person.set("age", 43);
//! person.save(&mut orm)?;          // UPDATE of the one dirty column
//! ```

pub mod cache;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod ident;
pub mod ops;
pub mod orm;
pub mod query;
pub mod resultset;
pub mod row;
pub mod value;

pub use cache::{default_fingerprint, CacheBackend};
pub use condition::{ConditionKind, OperatorMap};
pub use config::{Config, IdColumns, QueryLogger, DEFAULT_CONNECTION};
pub use dialect::{Dialect, LimitStyle};
pub use driver::{Driver, DriverConnector, DriverStatement};
pub use error::{OrmError, OrmResult};
pub use ops::{EntityOp, QueryOp};
pub use orm::{ExecutedStatement, Orm};
pub use query::{JoinConstraint, Query};
pub use resultset::ResultSet;
pub use row::Row;
pub use value::{RawRow, Value};
