//! Bounded, name-addressable operations.
//!
//! Callers that drive the builder or an entity from dynamic input (config
//! files, wire requests, broadcast over a collection) go through these
//! enums instead of open-ended dispatch. Parsing an operation name that is
//! not in the set yields [`OrmError::UnknownOperation`], so typos surface
//! as errors instead of silently doing nothing.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// An operation applicable to a row entity (and broadcastable across a
/// result collection).
#[derive(Debug, Clone)]
pub enum EntityOp {
    Set { column: String, value: Value },
    SetExpr { column: String, expression: String },
    Unset { column: String },
    Save,
    Delete,
}

impl EntityOp {
    /// Parse an operation by name with positional arguments.
    pub fn parse(name: &str, args: Vec<Value>) -> OrmResult<Self> {
        match name {
            "set" => {
                expect_args(name, &args, 2)?;
                Ok(Self::Set {
                    column: text_arg(name, &args, 0)?,
                    value: args[1].clone(),
                })
            }
            "set_expr" => {
                expect_args(name, &args, 2)?;
                Ok(Self::SetExpr {
                    column: text_arg(name, &args, 0)?,
                    expression: text_arg(name, &args, 1)?,
                })
            }
            "unset" => {
                expect_args(name, &args, 1)?;
                Ok(Self::Unset {
                    column: text_arg(name, &args, 0)?,
                })
            }
            "save" => {
                expect_args(name, &args, 0)?;
                Ok(Self::Save)
            }
            "delete" => {
                expect_args(name, &args, 0)?;
                Ok(Self::Delete)
            }
            other => Err(OrmError::UnknownOperation(other.to_string())),
        }
    }
}

/// An operation applicable to a query builder.
#[derive(Debug, Clone)]
pub enum QueryOp {
    WhereEq { column: String, value: Value },
    WhereNotEq { column: String, value: Value },
    Limit(u64),
    Offset(u64),
    OrderByAsc(String),
    OrderByDesc(String),
    GroupBy(String),
    Distinct,
}

impl QueryOp {
    /// Parse an operation by name with positional arguments.
    pub fn parse(name: &str, args: Vec<Value>) -> OrmResult<Self> {
        match name {
            "where_eq" => {
                expect_args(name, &args, 2)?;
                Ok(Self::WhereEq {
                    column: text_arg(name, &args, 0)?,
                    value: args[1].clone(),
                })
            }
            "where_not_eq" => {
                expect_args(name, &args, 2)?;
                Ok(Self::WhereNotEq {
                    column: text_arg(name, &args, 0)?,
                    value: args[1].clone(),
                })
            }
            "limit" => {
                expect_args(name, &args, 1)?;
                Ok(Self::Limit(int_arg(name, &args, 0)? as u64))
            }
            "offset" => {
                expect_args(name, &args, 1)?;
                Ok(Self::Offset(int_arg(name, &args, 0)? as u64))
            }
            "order_by_asc" => {
                expect_args(name, &args, 1)?;
                Ok(Self::OrderByAsc(text_arg(name, &args, 0)?))
            }
            "order_by_desc" => {
                expect_args(name, &args, 1)?;
                Ok(Self::OrderByDesc(text_arg(name, &args, 0)?))
            }
            "group_by" => {
                expect_args(name, &args, 1)?;
                Ok(Self::GroupBy(text_arg(name, &args, 0)?))
            }
            "distinct" => {
                expect_args(name, &args, 0)?;
                Ok(Self::Distinct)
            }
            other => Err(OrmError::UnknownOperation(other.to_string())),
        }
    }
}

fn expect_args(op: &str, args: &[Value], count: usize) -> OrmResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(OrmError::validation(format!(
            "operation '{op}' takes {count} argument(s), got {}",
            args.len()
        )))
    }
}

fn text_arg(op: &str, args: &[Value], index: usize) -> OrmResult<String> {
    match args.get(index) {
        Some(Value::Text(s)) => Ok(s.clone()),
        _ => Err(OrmError::validation(format!(
            "operation '{op}' expects a text argument at position {index}"
        ))),
    }
}

fn int_arg(op: &str, args: &[Value], index: usize) -> OrmResult<i64> {
    match args.get(index) {
        Some(Value::Int(i)) => Ok(*i),
        _ => Err(OrmError::validation(format!(
            "operation '{op}' expects an integer argument at position {index}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_operation_is_an_error() {
        let err = EntityOp::parse("explode", vec![]).unwrap_err();
        assert!(err.is_unknown_operation());
    }

    #[test]
    fn unknown_query_operation_is_an_error() {
        let err = QueryOp::parse("where_fuzzy", vec![]).unwrap_err();
        assert!(err.is_unknown_operation());
    }

    #[test]
    fn parses_set_with_column_and_value() {
        let op = EntityOp::parse("set", vec![Value::from("name"), Value::from("Fred")]).unwrap();
        match op {
            EntityOp::Set { column, value } => {
                assert_eq!(column, "name");
                assert_eq!(value, Value::from("Fred"));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(EntityOp::parse("save", vec![Value::Int(1)]).is_err());
        assert!(QueryOp::parse("limit", vec![]).is_err());
    }
}
