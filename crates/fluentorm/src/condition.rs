//! WHERE and HAVING condition accumulation.
//!
//! Conditions are stored as rendered SQL fragments paired with the values
//! they bind, in insertion order. Rendering joins the stored fragments with
//! `AND`; any OR grouping is baked into a single fragment up front.

use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::ident::quote_identifier;
use crate::value::Value;

/// Which condition list a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Where,
    Having,
}

impl ConditionKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::Having => "HAVING",
        }
    }
}

/// One rendered condition and its bound values.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub text: String,
    pub values: Vec<Value>,
}

/// Ordered WHERE and HAVING fragments for one statement under construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConditionSet {
    where_conditions: Vec<Fragment>,
    having_conditions: Vec<Fragment>,
}

impl ConditionSet {
    fn list(&self, kind: ConditionKind) -> &Vec<Fragment> {
        match kind {
            ConditionKind::Where => &self.where_conditions,
            ConditionKind::Having => &self.having_conditions,
        }
    }

    fn list_mut(&mut self, kind: ConditionKind) -> &mut Vec<Fragment> {
        match kind {
            ConditionKind::Where => &mut self.where_conditions,
            ConditionKind::Having => &mut self.having_conditions,
        }
    }

    /// Append a fragment. Insertion order is render order.
    pub fn add(&mut self, kind: ConditionKind, text: impl Into<String>, values: Vec<Value>) {
        self.list_mut(kind).push(Fragment {
            text: text.into(),
            values,
        });
    }

    /// Render one clause (`WHERE ...` / `HAVING ...`), appending the bound
    /// values to `values` in fragment order. Empty lists render as "".
    pub fn build_clause(&self, kind: ConditionKind, values: &mut Vec<Value>) -> String {
        let fragments = self.list(kind);
        if fragments.is_empty() {
            return String::new();
        }
        let mut texts = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            texts.push(fragment.text.as_str());
            values.extend(fragment.values.iter().cloned());
        }
        format!("{} {}", kind.keyword(), texts.join(" AND "))
    }
}

/// Operator selection for [`where_any_is`](crate::Query::where_any_is)
/// groups: one operator for every column, or a per-column map. Columns
/// absent from the map fall back to `=`.
#[derive(Debug, Clone)]
pub enum OperatorMap {
    Uniform(String),
    PerColumn(HashMap<String, String>),
}

impl Default for OperatorMap {
    fn default() -> Self {
        Self::Uniform("=".to_string())
    }
}

impl OperatorMap {
    fn operator_for(&self, column: &str) -> &str {
        match self {
            Self::Uniform(op) => op,
            Self::PerColumn(map) => map.get(column).map(String::as_str).unwrap_or("="),
        }
    }
}

impl From<&str> for OperatorMap {
    fn from(op: &str) -> Self {
        Self::Uniform(op.to_string())
    }
}

impl From<HashMap<String, String>> for OperatorMap {
    fn from(map: HashMap<String, String>) -> Self {
        Self::PerColumn(map)
    }
}

/// `"?, ?, ?"` for n values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Build the OR-of-ANDs group fragment: each inner pair list becomes one
/// parenthesized AND group, groups are ORed, and the whole thing lands in
/// the condition list as a single raw fragment.
pub(crate) fn any_group_fragment(
    dialect: &Dialect,
    groups: &[Vec<(String, Value)>],
    operators: &OperatorMap,
) -> Fragment {
    let mut tokens: Vec<String> = vec!["((".to_string()];
    let mut values = Vec::new();
    let mut first_group = true;
    for group in groups {
        if first_group {
            first_group = false;
        } else {
            tokens.push(") OR (".to_string());
        }
        let mut first_column = true;
        for (column, value) in group {
            if first_column {
                first_column = false;
            } else {
                tokens.push("AND".to_string());
            }
            tokens.push(quote_identifier(dialect, column));
            tokens.push(format!("{} ?", operators.operator_for(column)));
            values.push(value.clone());
        }
    }
    tokens.push("))".to_string());
    Fragment {
        text: tokens.join(" "),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> Dialect {
        Dialect::resolve("mysql", None, None)
    }

    #[test]
    fn fragments_render_in_insertion_order() {
        let mut set = ConditionSet::default();
        set.add(ConditionKind::Where, "`a` = ?", vec![Value::Int(1)]);
        set.add(ConditionKind::Where, "`b` > ?", vec![Value::Int(2)]);
        let mut values = Vec::new();
        let clause = set.build_clause(ConditionKind::Where, &mut values);
        assert_eq!(clause, "WHERE `a` = ? AND `b` > ?");
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn empty_list_renders_nothing() {
        let set = ConditionSet::default();
        let mut values = Vec::new();
        assert_eq!(set.build_clause(ConditionKind::Having, &mut values), "");
        assert!(values.is_empty());
    }

    #[test]
    fn any_group_single() {
        let groups = vec![vec![
            ("name".to_string(), Value::from("Fred")),
            ("age".to_string(), Value::Int(20)),
        ]];
        let fragment = any_group_fragment(&dialect(), &groups, &OperatorMap::default());
        assert_eq!(fragment.text, "(( `name` = ? AND `age` = ? ))");
        assert_eq!(fragment.values.len(), 2);
    }

    #[test]
    fn any_group_ors_between_groups() {
        let groups = vec![
            vec![("name".to_string(), Value::from("Fred"))],
            vec![("name".to_string(), Value::from("Bob"))],
        ];
        let fragment = any_group_fragment(&dialect(), &groups, &OperatorMap::default());
        assert_eq!(fragment.text, "(( `name` = ? ) OR ( `name` = ? ))");
    }

    #[test]
    fn per_column_operator_falls_back_to_equals() {
        let mut operators = HashMap::new();
        operators.insert("age".to_string(), ">".to_string());
        let groups = vec![vec![
            ("name".to_string(), Value::from("Fred")),
            ("age".to_string(), Value::Int(20)),
        ]];
        let fragment =
            any_group_fragment(&dialect(), &groups, &OperatorMap::PerColumn(operators));
        assert_eq!(fragment.text, "(( `name` = ? AND `age` > ? ))");
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(0), "");
    }
}
