//! Registry behavior: configuration lifecycle, lazy connection opening,
//! dialect probing and the query log.

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use common::{mock_driver, row, setup};
use fluentorm::{Config, Driver, DriverConnector, Orm, OrmResult, Value};

#[test]
fn reading_an_unset_connection_is_surfaced() {
    let orm = Orm::new();
    assert!(orm.config("default").unwrap_err().is_unknown_connection());
}

#[test]
fn probing_fills_unset_dialect_facts_into_the_config() {
    let (orm, _) = setup("sqlite");
    let config = orm.config("default").unwrap();
    assert_eq!(config.identifier_quote_character, Some('`'));
    assert_eq!(config.limit_clause_style, Some(fluentorm::LimitStyle::Limit));
}

#[test]
fn explicit_dialect_facts_are_not_overwritten_by_probing() {
    let mut orm = Orm::new();
    orm.configure("default").identifier_quote_character = Some('"');
    let (driver, _) = mock_driver("sqlite");
    orm.set_driver("default", driver);
    assert_eq!(
        orm.config("default").unwrap().identifier_quote_character,
        Some('"')
    );
}

struct CountingConnector {
    driver_name: String,
    opened: Rc<RefCell<usize>>,
}

impl DriverConnector for CountingConnector {
    fn connect(&self, _config: &Config) -> OrmResult<Box<dyn Driver>> {
        *self.opened.borrow_mut() += 1;
        let (driver, _) = mock_driver(&self.driver_name);
        Ok(driver)
    }
}

#[test]
fn connector_opens_lazily_and_at_most_once() {
    let opened = Rc::new(RefCell::new(0usize));
    let mut orm = Orm::new();
    orm.configure("lazy").connector = Some(Arc::new(CountingConnector {
        driver_name: "sqlite".to_string(),
        opened: Rc::clone(&opened),
    }));

    assert_eq!(*opened.borrow(), 0);
    orm.for_table_on("widget", "lazy").unwrap();
    assert_eq!(*opened.borrow(), 1);
    orm.for_table_on("widget", "lazy").unwrap();
    assert_eq!(*opened.borrow(), 1);
    assert!(orm.connection_names().contains(&"lazy".to_string()));
}

#[test]
fn missing_connector_is_a_configuration_error() {
    let mut orm = Orm::new();
    orm.configure("adrift");
    let err = orm.for_table_on("widget", "adrift").unwrap_err();
    assert!(matches!(err, fluentorm::OrmError::MissingConnector(_)));
}

#[test]
fn resets_drop_config_and_connections_independently() {
    let (mut orm, _) = setup("sqlite");
    assert_eq!(orm.connection_names(), vec!["default".to_string()]);

    orm.reset_connections();
    assert!(orm.connection_names().is_empty());
    // Configuration survives a connection reset.
    assert!(orm.config("default").is_ok());

    orm.reset_config();
    assert!(orm.config("default").is_err());
}

#[test]
fn query_log_records_substituted_statements_per_connection() {
    let (mut orm, _) = setup("sqlite");
    orm.for_table("widget")
        .unwrap()
        .where_eq("name", "Fred")
        .find_many(&mut orm)
        .unwrap();
    orm.for_table("widget")
        .unwrap()
        .where_eq("name", "Bob")
        .find_many(&mut orm)
        .unwrap();

    let log = orm.query_log("default");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], "SELECT * FROM `widget` WHERE `name` = 'Fred'");
    assert_eq!(log[1], "SELECT * FROM `widget` WHERE `name` = 'Bob'");
    assert_eq!(orm.last_query_on("default"), Some(log[1].as_str()));
}

#[test]
fn global_last_query_spans_connections() {
    let mut orm = Orm::new();
    orm.configure("default").logging = true;
    orm.configure("alternate").logging = true;
    let (default_driver, _) = mock_driver("sqlite");
    let (alternate_driver, _) = mock_driver("sqlite");
    orm.set_driver("default", default_driver);
    orm.set_driver("alternate", alternate_driver);

    orm.for_table("widget").unwrap().find_many(&mut orm).unwrap();
    orm.for_table_on("gadget", "alternate")
        .unwrap()
        .find_many(&mut orm)
        .unwrap();

    assert_eq!(orm.last_query(), Some("SELECT * FROM `gadget`"));
    assert_eq!(orm.last_query_on("default"), Some("SELECT * FROM `widget`"));
}

#[test]
fn disabled_logging_records_nothing() {
    let mut orm = Orm::new();
    let (driver, state) = mock_driver("sqlite");
    orm.set_driver("default", driver);
    orm.for_table("widget").unwrap().find_many(&mut orm).unwrap();

    assert_eq!(state.borrow().executed.len(), 1);
    assert_eq!(orm.last_query(), None);
    assert!(orm.query_log("default").is_empty());
}

#[test]
fn logger_callback_receives_the_bound_statement() {
    let seen: Rc<RefCell<Vec<(String, Duration)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let (mut orm, _) = setup("sqlite");
    orm.configure("default").logger = Some(Arc::new(move |sql: &str, elapsed: Duration| {
        sink.borrow_mut().push((sql.to_string(), elapsed));
    }));

    orm.for_table("widget")
        .unwrap()
        .where_eq("age", 21)
        .find_many(&mut orm)
        .unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "SELECT * FROM `widget` WHERE `age` = 21");
}

#[test]
fn raw_execute_runs_verbatim_and_exposes_rows() {
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![
        row(&[("n", Value::Int(1))]),
        row(&[("n", Value::Int(2))]),
    ]);

    let mut executed = orm
        .raw_execute(
            "SELECT n FROM numbers WHERE n < ?",
            &[Value::Int(3)],
            "default",
        )
        .unwrap();
    assert!(executed.success());
    let rows = executed.fetch_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["n"], Value::Int(2));
    assert_eq!(
        state.borrow().executed[0].0,
        "SELECT n FROM numbers WHERE n < ?"
    );
}
