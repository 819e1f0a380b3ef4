//! Table query builder and filter DSL.
//!
//! A `Query` names a table, a select expression, conjunctive filters, and
//! sort terms. It encodes to PostgREST query-string pairs
//! and can also be evaluated against JSON rows on the client, which the
//! realtime channel guard relies on.

use std::cmp::Ordering;
use serde::Serialize;
use serde_json::Value;

/// Comparison operators understood by the backend filter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    /// Parse a wire operator name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Neq => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row predicate.
///
/// Columns may be dotted paths into embedded resources, e.g.
/// `listing.homeowner_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    /// Matches when any of the nested filters matches.
    Or(Vec<Filter>),
}

impl Filter {
    /// Build a comparison filter.
    pub fn compare(column: &str, op: Operator, value: impl Serialize) -> Self {
        Self::Compare {
            column: column.to_string(),
            op,
            value: to_value(value),
        }
    }

    /// Shorthand for an equality filter.
    pub fn equals(column: &str, value: impl Serialize) -> Self {
        Self::compare(column, Operator::Eq, value)
    }

    /// Encode as a `(key, value)` query-string pair.
    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Self::Compare { column, op, value } => {
                (column.clone(), format!("{op}.{}", encode_value(value)))
            }
            Self::In { column, values } => (column.clone(), format!("in.({})", encode_list(values))),
            Self::Or(filters) => ("or".to_string(), format!("({})", encode_inline(filters))),
        }
    }

    /// Encode in the `column.op.value` form used inside `or=(...)`.
    fn to_inline(&self) -> String {
        match self {
            Self::Compare { column, op, value } => {
                format!("{column}.{op}.{}", encode_list_item(value))
            }
            Self::In { column, values } => format!("{column}.in.({})", encode_list(values)),
            Self::Or(filters) => format!("or({})", encode_inline(filters)),
        }
    }

    /// Render as a realtime `postgres_changes` filter (`column=op.value`).
    ///
    /// Realtime accepts a single comparison or `in` list; anything else
    /// returns `None`.
    pub fn to_realtime(&self) -> Option<String> {
        match self {
            Self::Compare { column, op, value } => {
                Some(format!("{column}={op}.{}", encode_value(value)))
            }
            Self::In { column, values } => Some(format!("{column}=in.({})", encode_list(values))),
            Self::Or(_) => None,
        }
    }

    /// Parse a realtime filter expression. Values are kept as strings.
    pub fn parse_realtime(expr: &str) -> Option<Self> {
        let (column, rest) = expr.split_once('=')?;
        let (op, raw) = rest.split_once('.')?;
        if column.is_empty() {
            return None;
        }

        if op == "in" {
            let inner = raw.strip_prefix('(')?.strip_suffix(')')?;
            let values = inner
                .split(',')
                .map(|v| Value::String(v.trim().trim_matches('"').to_string()))
                .collect();
            return Some(Self::In {
                column: column.to_string(),
                values,
            });
        }

        Some(Self::Compare {
            column: column.to_string(),
            op: Operator::parse(op)?,
            value: Value::String(raw.to_string()),
        })
    }

    /// Evaluate this filter against a JSON row.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Compare { column, op, value } => match lookup(row, column) {
                Some(actual) if !actual.is_null() => compare_values(actual, value)
                    .map(|ordering| op.accepts(ordering))
                    .unwrap_or(false),
                _ => false,
            },
            Self::In { column, values } => match lookup(row, column) {
                Some(actual) if !actual.is_null() => values
                    .iter()
                    .any(|v| compare_values(actual, v) == Some(Ordering::Equal)),
                _ => false,
            },
            Self::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

/// A sort term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    fn to_param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.column)
    }
}

/// A read (or the row scope of a write) against one table.
#[derive(Debug, Clone)]
pub struct Query {
    pub table: String,
    /// Select expression, using the backend's embedding syntax.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
}

impl Query {
    /// Start a query selecting `*` from `table`.
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Set the select expression.
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Add an arbitrary filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::compare(column, Operator::Eq, value))
    }

    pub fn gt(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::compare(column, Operator::Gt, value))
    }

    pub fn lte(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::compare(column, Operator::Lte, value))
    }

    /// Restrict `column` to any of `values`.
    pub fn in_list<T: Serialize>(self, column: &str, values: &[T]) -> Self {
        self.filter(Filter::In {
            column: column.to_string(),
            values: values.iter().map(to_value).collect(),
        })
    }

    /// Add a disjunction of `filters`.
    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    /// Append a sort term.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Only the filter pairs, for writes that must not carry a select or sort.
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::to_query_pair).collect()
    }

    /// Full query-string pairs: select, filters, order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), normalize_select(&self.columns))];
        pairs.extend(self.filter_pairs());
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(Order::to_param)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        pairs
    }

    /// Whether every filter matches `row`.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// Strip whitespace from a select expression, except inside double quotes.
pub fn normalize_select(columns: &str) -> String {
    let mut quoted = false;
    columns
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}

/// Resolve a dotted path inside a JSON row.
pub fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |current, key| current.get(key))
}

/// Compare two JSON scalars the way the backend would.
///
/// Numbers compare numerically, strings lexically, booleans as booleans.
/// A string compared with a number or boolean is parsed first, since
/// realtime filters carry every value as text. Anything else is unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::String(y)) => Some(x.cmp(&y.parse::<bool>().ok()?)),
        (Value::String(x), Value::Bool(y)) => Some(x.parse::<bool>().ok()?.cmp(y)),
        _ => None,
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

const RESERVED_LIST_CHARS: &[char] = &[',', '(', ')', '"', ':', '.'];

/// Encode a value inside a parenthesised list, quoting reserved characters.
fn encode_list_item(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(RESERVED_LIST_CHARS) => {
            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
        }
        other => encode_value(other),
    }
}

fn encode_list(values: &[Value]) -> String {
    values
        .iter()
        .map(encode_list_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_inline(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_inline)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_query_pairs_for_filtered_search() {
        let q = Query::table("room_listings")
            .select("*, homeowner:profiles!homeowner_id(\n  id,\n  first_name\n)")
            .eq("is_active", true)
            .lte("monthly_rent", 1000)
            .order("created_at", false);

        assert_eq!(
            q.to_query_pairs(),
            vec![
                pair("select", "*,homeowner:profiles!homeowner_id(id,first_name)"),
                pair("is_active", "eq.true"),
                pair("monthly_rent", "lte.1000"),
                pair("order", "created_at.desc"),
            ]
        );
    }

    #[test]
    fn test_or_and_in_encoding() {
        let q = Query::table("conversations")
            .or(vec![
                Filter::equals("user1_id", "u-1"),
                Filter::equals("user2_id", "u-1"),
            ])
            .in_list("listing_id", &["a", "b,c"]);

        let pairs = q.to_query_pairs();
        assert!(pairs.contains(&pair("or", "(user1_id.eq.u-1,user2_id.eq.u-1)")));
        assert!(pairs.contains(&pair("listing_id", "in.(a,\"b,c\")")));
    }

    #[test]
    fn test_empty_in_list_encodes_empty_parens() {
        let q = Query::table("applications").in_list::<String>("listing_id", &[]);
        assert_eq!(q.filter_pairs(), vec![pair("listing_id", "in.()")]);
    }

    #[test]
    fn test_normalize_select_keeps_quoted_whitespace() {
        assert_eq!(normalize_select("id, \"my col\" , name"), "id,\"my col\",name");
    }

    #[test]
    fn test_lte_includes_boundary() {
        let f = Filter::compare("monthly_rent", Operator::Lte, 1000);
        assert!(f.matches(&json!({"monthly_rent": 1000})));
        assert!(f.matches(&json!({"monthly_rent": 999.5})));
        assert!(!f.matches(&json!({"monthly_rent": 1000.01})));
        assert!(!f.matches(&json!({"monthly_rent": null})));
        assert!(!f.matches(&json!({})));
    }

    #[test]
    fn test_dotted_path_into_embedded_row() {
        let f = Filter::equals("listing.homeowner_id", "h-1");
        assert!(f.matches(&json!({"listing": {"homeowner_id": "h-1"}})));
        assert!(!f.matches(&json!({"listing": {"homeowner_id": "h-2"}})));
        assert!(!f.matches(&json!({"listing": null})));
    }

    #[test]
    fn test_or_matching() {
        let f = Filter::Or(vec![
            Filter::equals("user1_id", "a"),
            Filter::equals("user2_id", "a"),
        ]);
        assert!(f.matches(&json!({"user1_id": "b", "user2_id": "a"})));
        assert!(!f.matches(&json!({"user1_id": "b", "user2_id": "c"})));
    }

    #[test]
    fn test_realtime_filter_roundtrip() {
        let f = Filter::equals("conversation_id", "c-42");
        let rendered = f.to_realtime().unwrap();
        assert_eq!(rendered, "conversation_id=eq.c-42");
        assert_eq!(Filter::parse_realtime(&rendered).unwrap(), f);

        let parsed = Filter::parse_realtime("status=in.(pending,accepted)").unwrap();
        assert!(parsed.matches(&json!({"status": "accepted"})));
        assert!(!parsed.matches(&json!({"status": "rejected"})));

        assert!(Filter::parse_realtime("no-operator").is_none());
        assert!(Filter::parse_realtime("col=like.x").is_none());
        assert!(Filter::Or(vec![]).to_realtime().is_none());
    }

    #[test]
    fn test_string_filter_values_compare_with_numbers() {
        let f = Filter::parse_realtime("view_count=gt.10").unwrap();
        assert!(f.matches(&json!({"view_count": 11})));
        assert!(!f.matches(&json!({"view_count": 10})));
    }
}
