//! ORDER BY: stable multi-key sorting.

use std::cmp::Ordering;

use serde_json::Value;
use tql_core::executor::{compare_values, natural_compare_values};
use tql_core::{parse_order_terms, CompareMode, Evaluator, Term};

use super::Table;
use crate::error::TableResult;

impl Table {
    /// Sort rows by a term list such as `"name ASC, likes DESC"` or
    /// `"DATEFORMAT('Y-m-d', date) DESC, name NATURAL"`.
    ///
    /// Terms are validated against the raw first row before any row moves.
    /// Ties on every term keep their previous relative order. Row keys are
    /// renumbered 0..n afterwards.
    pub fn order_by(&mut self, order: &str) -> TableResult<&mut Self> {
        let Some(first) = self.first_raw() else {
            return Ok(self);
        };
        let terms = parse_order_terms(order);
        let evaluator = Evaluator::new(&self.functions);
        for term in &terms {
            evaluator.validate(term, first)?;
        }

        // Sort keys are computed up front so a failing function leaves the
        // order untouched.
        let keys = self
            .store
            .rows()
            .map(|row| {
                terms
                    .iter()
                    .map(|term| evaluator.evaluate(term, row))
                    .collect::<Result<Vec<Value>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut order_idx: Vec<usize> = (0..keys.len()).collect();
        order_idx.sort_by(|&a, &b| compare_keys(&terms, &keys[a], &keys[b]));

        tracing::debug!(
            "ORDER BY: sorted {} row(s) on {} term(s)",
            order_idx.len(),
            terms.len()
        );
        self.store.reorder(&order_idx);
        self.store.reindex();
        Ok(self)
    }
}

/// Compare two key tuples term by term; the first non-equal term decides.
fn compare_keys(terms: &[Term], a: &[Value], b: &[Value]) -> Ordering {
    for ((term, va), vb) in terms.iter().zip(a).zip(b) {
        let ordering = match term.mode {
            CompareMode::Default => compare_values(va, vb),
            CompareMode::Natural => natural_compare_values(va, vb),
        };
        let ordering = if term.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
