//! Result collection behavior: container surface, serialization and
//! broadcast of entity operations.

mod common;

use common::{row, setup};
use fluentorm::{EntityOp, QueryOp, Value};

#[test]
fn collection_is_countable_indexable_and_iterable() {
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![
        row(&[("id", Value::Int(1)), ("name", Value::from("Fred"))]),
        row(&[("id", Value::Int(2)), ("name", Value::from("Bob"))]),
    ]);

    let set = orm
        .for_table("widget")
        .unwrap()
        .find_result_set(&mut orm)
        .unwrap();

    assert_eq!(set.len(), 2);
    assert!(!set.is_empty());
    assert_eq!(set[0].get("name"), Value::from("Fred"));
    let names: Vec<Value> = set.iter().map(|r| r.get("name")).collect();
    assert_eq!(names, vec![Value::from("Fred"), Value::from("Bob")]);
}

#[test]
fn collection_serializes_as_an_array_of_rows() {
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![row(&[
        ("id", Value::Int(1)),
        ("name", Value::from("Fred")),
    ])]);

    let set = orm
        .for_table("widget")
        .unwrap()
        .find_result_set(&mut orm)
        .unwrap();
    assert_eq!(set.as_json().unwrap(), "[{\"id\":1,\"name\":\"Fred\"}]");
}

#[test]
fn broadcast_applies_an_operation_to_every_member() {
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![
        row(&[("id", Value::Int(1)), ("age", Value::Int(10))]),
        row(&[("id", Value::Int(2)), ("age", Value::Int(20))]),
    ]);

    let mut set = orm
        .for_table("widget")
        .unwrap()
        .find_result_set(&mut orm)
        .unwrap();

    set.broadcast_named(&mut orm, "set", vec![Value::from("age"), Value::Int(99)])
        .unwrap();
    set.broadcast(&mut orm, &EntityOp::Save).unwrap();

    let state = state.borrow();
    // One fetch plus one update per member.
    assert_eq!(state.executed.len(), 3);
    assert_eq!(
        state.executed[1].0,
        "UPDATE `widget` SET `age` = ? WHERE `id` = ?"
    );
    assert_eq!(state.executed[1].1, vec![Value::Int(99), Value::Int(1)]);
    assert_eq!(state.executed[2].1, vec![Value::Int(99), Value::Int(2)]);
}

#[test]
fn unknown_operations_error_instead_of_defaulting() {
    let err = EntityOp::parse("rename_table", vec![]).unwrap_err();
    assert!(err.is_unknown_operation());
    assert!(err.to_string().contains("rename_table"));

    let err = QueryOp::parse("where_soundex", vec![]).unwrap_err();
    assert!(err.is_unknown_operation());

    // A broadcast with a bad name fails up front, touching no member.
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![row(&[("id", Value::Int(1))])]);
    let mut set = orm
        .for_table("widget")
        .unwrap()
        .find_result_set(&mut orm)
        .unwrap();
    let executed_before = state.borrow().executed.len();
    let err = set
        .broadcast_named(&mut orm, "vanish", vec![])
        .unwrap_err();
    assert!(err.is_unknown_operation());
    assert_eq!(state.borrow().executed.len(), executed_before);
}

#[test]
fn query_ops_drive_the_builder_by_name() {
    let (mut orm, _) = setup("sqlite");
    let mut query = orm.for_table("widget").unwrap();
    query.apply(QueryOp::parse("where_eq", vec![Value::from("name"), Value::from("Fred")]).unwrap());
    query.apply(QueryOp::parse("order_by_desc", vec![Value::from("age")]).unwrap());
    query.apply(QueryOp::parse("limit", vec![Value::Int(2)]).unwrap());
    query.find_many(&mut orm).unwrap();
    assert_eq!(
        orm.last_query(),
        Some("SELECT * FROM `widget` WHERE `name` = 'Fred' ORDER BY `age` DESC LIMIT 2")
    );
}

#[test]
fn broadcast_delete_empties_the_table_one_row_at_a_time() {
    let (mut orm, state) = setup("sqlite");
    state.borrow_mut().queue(vec![
        row(&[("id", Value::Int(1))]),
        row(&[("id", Value::Int(2))]),
    ]);

    let mut set = orm
        .for_table("widget")
        .unwrap()
        .find_result_set(&mut orm)
        .unwrap();
    set.broadcast(&mut orm, &EntityOp::Delete).unwrap();

    let state = state.borrow();
    assert_eq!(state.executed.len(), 3);
    assert_eq!(state.executed[1].0, "DELETE FROM `widget` WHERE `id` = ?");
    assert_eq!(state.executed[2].1, vec![Value::Int(2)]);
}
