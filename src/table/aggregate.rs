//! Grouping and aggregation.
//!
//! One pass over the rows builds an ordered map from a composite group key
//! to an accumulator row. Groups appear in the order their key was first
//! seen. Columns that are neither grouped nor aggregated come from the first
//! row of the group, except that a `min`/`max` replacement drags the whole
//! winning row along.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tql_core::executor::{
    add_values, compare_values, integral_or_float, is_numeric, to_f64_lossy, value_to_string,
};

use super::{Row, Table};
use crate::error::{TableError, TableResult};

/// Joins group column values into one key. Never expected in real data.
const GROUP_KEY_SEPARATOR: char = '\u{2}';

/// Aggregate function applied to one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Min,
    Max,
    Sum,
    Avg,
    Count,
    /// Stringified values joined with the delimiter.
    Concat,
    /// Values collected into a list.
    Array,
    /// Values collected into a list, encoded as JSON text.
    Json,
}

impl AggregateFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Count => "count",
            AggregateFn::Concat => "concat",
            AggregateFn::Array => "array",
            AggregateFn::Json => "json",
        }
    }

    /// Value stored when a group is first seen.
    fn initial(&self, value: &Value) -> Value {
        match self {
            AggregateFn::Min | AggregateFn::Max => value.clone(),
            AggregateFn::Sum | AggregateFn::Avg | AggregateFn::Count => Value::from(0),
            AggregateFn::Concat => Value::String(String::new()),
            AggregateFn::Array | AggregateFn::Json => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateFn {
    type Err = TableError;

    /// Case-insensitive tag lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "min" => Ok(AggregateFn::Min),
            "max" => Ok(AggregateFn::Max),
            "sum" => Ok(AggregateFn::Sum),
            "avg" => Ok(AggregateFn::Avg),
            "count" => Ok(AggregateFn::Count),
            "concat" => Ok(AggregateFn::Concat),
            "array" => Ok(AggregateFn::Array),
            "json" => Ok(AggregateFn::Json),
            _ => Err(TableError::InvalidAggregateSpec(format!(
                "aggregate function '{}' is not implemented",
                s
            ))),
        }
    }
}

/// Accumulator for one group.
struct GroupState {
    row: Row,
    /// Numeric values seen, per aggregate. Only read for `avg`.
    counts: Vec<usize>,
    /// Whether a value was appended yet, per aggregate. Only read for `concat`.
    started: Vec<bool>,
}

impl Table {
    /// Group rows by `groups` and fold each aggregate column.
    ///
    /// `aggregates` maps a column to a tag (`min`, `max`, `sum`, `avg`,
    /// `count`, `concat`, `array`, `json`; any case). Without groups all
    /// rows form one group. `delimiter` separates `concat` values. The
    /// result has one row per group, keyed 0..n. An empty table is left
    /// as is without looking at the aggregates.
    pub fn filter_group_aggregate<A, C, F, G>(
        &mut self,
        aggregates: A,
        groups: &[G],
        delimiter: &str,
    ) -> TableResult<&mut Self>
    where
        A: IntoIterator<Item = (C, F)>,
        C: Into<String>,
        F: AsRef<str>,
        G: AsRef<str>,
    {
        if self.is_empty() {
            return Ok(self);
        }
        let folds = aggregates
            .into_iter()
            .map(|(column, tag)| Ok((column.into(), tag.as_ref().parse::<AggregateFn>()?)))
            .collect::<TableResult<Vec<(String, AggregateFn)>>>()?;
        let groups: Vec<&str> = groups.iter().map(|g| g.as_ref()).collect();

        if let Some((column, _)) = folds.iter().find(|(c, _)| groups.contains(&c.as_str())) {
            return Err(TableError::InvalidAggregateSpec(format!(
                "group column '{}' cannot be aggregated",
                column
            )));
        }
        let mut required: Vec<&str> = groups.clone();
        required.extend(folds.iter().map(|(c, _)| c.as_str()));
        self.require_raw_columns(&required)?;

        let before = self.store.len();
        let mut states: Vec<GroupState> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in self.store.rows() {
            let key = group_key(row, &groups);
            let pos = *positions.entry(key).or_insert_with(|| {
                let mut start = row.clone();
                for (column, function) in &folds {
                    let value = row.get(column).unwrap_or(&Value::Null);
                    start.insert(column.clone(), function.initial(value));
                }
                states.push(GroupState {
                    row: start,
                    counts: vec![0; folds.len()],
                    started: vec![false; folds.len()],
                });
                states.len() - 1
            });
            fold_row(&mut states[pos], row, &folds, &required, delimiter);
        }

        let rows = states.into_iter().map(|state| finalize(state, &folds));
        self.store = super::RowStore::from_rows(rows);
        tracing::debug!(
            "AGGREGATE: {} row(s) folded into {} group(s) on [{}]",
            before,
            self.store.len(),
            groups.join(", ")
        );
        Ok(self)
    }
}

fn group_key(row: &Row, groups: &[&str]) -> String {
    let mut key = String::new();
    for (i, column) in groups.iter().enumerate() {
        if i > 0 {
            key.push(GROUP_KEY_SEPARATOR);
        }
        key.push_str(&value_to_string(row.get(*column).unwrap_or(&Value::Null)));
    }
    key
}

fn fold_row(
    state: &mut GroupState,
    row: &Row,
    folds: &[(String, AggregateFn)],
    fixed: &[&str],
    delimiter: &str,
) {
    for (i, (column, function)) in folds.iter().enumerate() {
        let value = row.get(column).unwrap_or(&Value::Null);
        let current = state.row.get(column).cloned().unwrap_or(Value::Null);
        match function {
            AggregateFn::Sum | AggregateFn::Avg => {
                if is_numeric(value) {
                    state.row.insert(column.clone(), add_values(&current, value));
                    state.counts[i] += 1;
                }
            }
            AggregateFn::Max | AggregateFn::Min => {
                let wanted = if *function == AggregateFn::Max {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                if compare_values(value, &current) == wanted {
                    for (name, v) in row {
                        if !fixed.contains(&name.as_str()) {
                            state.row.insert(name.clone(), v.clone());
                        }
                    }
                    state.row.insert(column.clone(), value.clone());
                }
            }
            AggregateFn::Count => {
                state.row.insert(column.clone(), add_values(&current, &Value::from(1)));
            }
            AggregateFn::Concat => {
                let mut text = value_to_string(&current);
                if state.started[i] {
                    text.push_str(delimiter);
                }
                text.push_str(&value_to_string(value));
                state.started[i] = true;
                state.row.insert(column.clone(), Value::String(text));
            }
            AggregateFn::Array | AggregateFn::Json => {
                if let Some(Value::Array(items)) = state.row.get_mut(column) {
                    items.push(value.clone());
                }
            }
        }
    }
}

fn finalize(mut state: GroupState, folds: &[(String, AggregateFn)]) -> Row {
    for (i, (column, function)) in folds.iter().enumerate() {
        match function {
            AggregateFn::Avg => {
                let count = state.counts[i];
                let value = if count > 0 {
                    let sum = state.row.get(column).map(to_f64_lossy).unwrap_or(0.0);
                    integral_or_float(sum / count as f64)
                } else {
                    Value::from(0.0)
                };
                state.row.insert(column.clone(), value);
            }
            AggregateFn::Json => {
                let items = state.row.get(column).cloned().unwrap_or(Value::Array(Vec::new()));
                state.row.insert(column.clone(), Value::String(items.to_string()));
            }
            _ => {}
        }
    }
    state.row
}
