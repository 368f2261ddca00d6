//! Row queries understood by every [`crate::RemoteStore`].
//!
//! The vocabulary is intentionally small: equality filters, a single ordering
//! column and an optional "exactly one row" flag. That is all the client ever
//! asks of the backend.

use serde::Serialize;
use serde_json::Value;

/// Sort direction for [`Order`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering by a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Equality filter: `column = value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// Build an equality filter from any serializable value.
    /// Values that fail to serialize become `null`, which matches nothing.
    pub fn eq(column: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            column: column.into(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    /// Whether a JSON row satisfies this filter.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column).is_some_and(|v| *v == self.value)
    }

    /// The filter value as it appears in a URL (`3`, not `"3"`).
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A select against one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    /// Expect exactly one row.
    pub single: bool,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            single: false,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Serialize) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn order(self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by(Order::new(column, direction))
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Whether a row passes every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_typed_values() {
        let row = json!({ "id": 3, "title": "Globe" });
        assert!(Filter::eq("id", 3).matches(&row));
        assert!(!Filter::eq("id", "3").matches(&row));
        assert!(!Filter::eq("missing", 3).matches(&row));
    }

    #[test]
    fn test_value_text_unquotes_strings() {
        assert_eq!(Filter::eq("id", "abc").value_text(), "abc");
        assert_eq!(Filter::eq("id", 42).value_text(), "42");
    }

    #[test]
    fn test_query_builder() {
        let q = Query::table("profiles")
            .eq("id", "u1")
            .order("created_at", Direction::Descending)
            .single();
        assert_eq!(q.table, "profiles");
        assert_eq!(q.filters.len(), 1);
        assert!(q.single);
        assert!(q.matches(&json!({ "id": "u1" })));
        assert!(!q.matches(&json!({ "id": "u2" })));
    }
}
