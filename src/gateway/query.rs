//! Filter and ordering description for remote selects.

use std::cmp::Ordering;

use serde_json::Value;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    /// PostgREST operator name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
        }
    }
}

/// `column <op> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Lte,
            value: value.into(),
        }
    }

    /// Whether `row` satisfies this filter. A missing column never matches.
    pub fn matches(&self, row: &Value) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match (self.op, compare_values(actual, &self.value)) {
            (FilterOp::Eq, Some(ord)) => ord == Ordering::Equal,
            (FilterOp::Gte, Some(ord)) => ord != Ordering::Less,
            (FilterOp::Lte, Some(ord)) => ord != Ordering::Greater,
            (_, None) => false,
        }
    }

    /// Renders the filter value the way PostgREST expects it in a query string.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}

/// One ordering column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filters and ordering for a select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::gte(column, value));
        self
    }

    pub fn lte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::lte(column, value));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Compares two rows by the ordering columns, in sequence.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for order in &self.order {
            let ord = match (a.get(&order.column), b.get(&order.column)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ord = if order.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_filters() {
        let query = Query::new().eq("surah", 2).gte("ayah", 3).lte("ayah", 5);
        assert!(query.matches(&json!({"surah": 2, "ayah": 3})));
        assert!(query.matches(&json!({"surah": 2, "ayah": 5})));
        assert!(!query.matches(&json!({"surah": 2, "ayah": 6})));
        assert!(!query.matches(&json!({"surah": 1, "ayah": 4})));
        assert!(!query.matches(&json!({"ayah": 4})));
    }

    #[test]
    fn test_string_equality() {
        let filter = Filter::eq("user_id", "abc");
        assert!(filter.matches(&json!({"user_id": "abc"})));
        assert!(!filter.matches(&json!({"user_id": "abd"})));
        assert!(!filter.matches(&json!({"user_id": 1})));
    }

    #[test]
    fn test_compare_multiple_columns() {
        let query = Query::new().order("surah", true).order("ayah", false);
        let mut rows = vec![
            json!({"surah": 2, "ayah": 1}),
            json!({"surah": 1, "ayah": 1}),
            json!({"surah": 1, "ayah": 3}),
        ];
        rows.sort_by(|a, b| query.compare(a, b));
        assert_eq!(
            rows,
            vec![
                json!({"surah": 1, "ayah": 3}),
                json!({"surah": 1, "ayah": 1}),
                json!({"surah": 2, "ayah": 1}),
            ]
        );
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Filter::eq("surah", 7).value_text(), "7");
        assert_eq!(Filter::eq("user_id", "x-y").value_text(), "x-y");
    }
}
