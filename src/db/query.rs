//! Small helpers for building filtered SQL with `QueryBuilder`.

use sqlx::{QueryBuilder, Sqlite};

use crate::entities::Filter;

/// Accumulates `WHERE col IN (...)` clauses joined with `AND`.
pub(crate) struct Conditions {
    clauses: Vec<(&'static str, Vec<String>)>,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Add `column IN (values)`; empty value lists add nothing.
    pub(crate) fn any_of<I, T>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        if !values.is_empty() {
            self.clauses.push((column, values));
        }
        self
    }

    /// Append the WHERE clause to `qb`.
    pub(crate) fn push_to(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for (i, (column, values)) in self.clauses.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(*column).push(" IN (");
            let mut separated = qb.separated(", ");
            for value in values {
                separated.push_bind(value.clone());
            }
            separated.push_unseparated(")");
        }
    }

    /// `SELECT COUNT(*) FROM table WHERE ...`.
    pub(crate) fn count_query(&self, table: &str) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {table}"));
        self.push_to(&mut qb);
        qb
    }

    /// `SELECT columns FROM table WHERE ... ORDER BY order [LIMIT .. OFFSET ..]`.
    pub(crate) fn select_query(
        &self,
        columns: &str,
        table: &str,
        order_by: &str,
        filter: &Filter,
    ) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(format!("SELECT {columns} FROM {table}"));
        self.push_to(&mut qb);
        qb.push(format!(" ORDER BY {order_by}"));
        if filter.is_paged() {
            qb.push(" LIMIT ")
                .push_bind(i64::from(filter.page_size))
                .push(" OFFSET ")
                .push_bind(filter.offset());
        }
        qb
    }
}

/// `DELETE FROM table WHERE column IN (...)`, or `None` for an empty list.
pub(crate) fn delete_in<T: ToString>(
    table: &str,
    column: &'static str,
    values: &[T],
) -> Option<QueryBuilder<'static, Sqlite>> {
    if values.is_empty() {
        return None;
    }
    let mut qb = QueryBuilder::new(format!("DELETE FROM {table}"));
    Conditions::new().any_of(column, values.iter().map(|v| v.to_string())).push_to(&mut qb);
    Some(qb)
}
