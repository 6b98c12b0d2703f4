//! Dialect-neutral query model
//!
//! The engine describes every lookup as a `SelectQuery`; data sources either
//! render it to SQL (`PgSource`) or evaluate it in process (`MemorySource`).
//! Identifiers come from trusted configuration, all values travel as bind
//! parameters through [`SqlSink::push_value`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::value::Value;

static ALIAS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\.").expect("valid alias regex"));

/// Strip a leading `alias.` qualifier and surrounding double quotes from a
/// column reference, giving the name the data source reports for it.
pub fn strip_alias(column: &str) -> &str {
    let bare = match ALIAS_PREFIX.find(column) {
        Some(m) => &column[m.end()..],
        None => column,
    };
    bare.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(bare)
}

/// Escape `LIKE` metacharacters so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Quote a bare column name for use as an output alias
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One projected column
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// The column in its stored type
    Column(String),
    /// The column cast to text, reported under its bare name
    Text(String),
}

impl SelectItem {
    pub fn column(&self) -> &str {
        match self {
            SelectItem::Column(c) | SelectItem::Text(c) => c,
        }
    }

    fn render(&self) -> String {
        match self {
            SelectItem::Column(c) => c.clone(),
            SelectItem::Text(c) => format!("{c}::text AS {}", quote_ident(strip_alias(c))),
        }
    }
}

impl From<&str> for SelectItem {
    fn from(column: &str) -> Self {
        SelectItem::Column(column.to_string())
    }
}

impl From<String> for SelectItem {
    fn from(column: String) -> Self {
        SelectItem::Column(column)
    }
}

/// What a query returns
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<SelectItem>),
    /// `COUNT(*)` of the filtered rows
    Count,
}

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column contains the term, case-insensitively
    Contains { column: String, term: String },
    /// Column equals the value exactly
    Equals { column: String, value: Value },
    /// Text form of the column equals `value`, whatever the column type
    TextEquals { column: String, value: String },
    /// Any of the predicates holds (an empty list matches nothing)
    Any(Vec<Predicate>),
    /// All of the predicates hold
    All(Vec<Predicate>),
}

/// One `ORDER BY` key
#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    /// Four-tier relevance of `column` against `term`, best tier first
    Relevance { column: String, term: String },
    Ascending(String),
}

/// A single-table select
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub projection: Projection,
    pub filter: Option<Predicate>,
    pub order: Vec<OrderKey>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SelectQuery {
    pub fn select(table: impl Into<String>, columns: Vec<SelectItem>) -> Self {
        Self::new(table.into(), Projection::Columns(columns))
    }

    pub fn count(table: impl Into<String>) -> Self {
        Self::new(table.into(), Projection::Count)
    }

    fn new(table: String, projection: Projection) -> Self {
        Self {
            table,
            projection,
            filter: None,
            order: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    /// AND a predicate onto the current filter
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(Predicate::All(mut all)) => {
                all.push(predicate);
                Predicate::All(all)
            }
            Some(existing) => Predicate::All(vec![existing, predicate]),
        });
        self
    }

    pub fn order_by(&mut self, key: OrderKey) -> &mut Self {
        self.order.push(key);
        self
    }

    pub fn limit(&mut self, limit: usize, offset: usize) -> &mut Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Write this query as Postgres-dialect SQL into `sink`
    pub fn render<S: SqlSink>(&self, sink: &mut S) {
        sink.push_sql("SELECT ");
        match &self.projection {
            Projection::Columns(columns) => {
                let rendered: Vec<String> = columns.iter().map(SelectItem::render).collect();
                sink.push_sql(&rendered.join(", "));
            }
            Projection::Count => sink.push_sql("COUNT(*)"),
        }
        sink.push_sql(" FROM ");
        sink.push_sql(&self.table);

        if let Some(filter) = &self.filter {
            sink.push_sql(" WHERE ");
            render_predicate(filter, sink);
        }

        for (i, key) in self.order.iter().enumerate() {
            sink.push_sql(if i == 0 { " ORDER BY " } else { ", " });
            render_order_key(key, sink);
        }

        if let Some(limit) = self.limit {
            sink.push_sql(&format!(" LIMIT {limit}"));
            if self.offset > 0 {
                sink.push_sql(&format!(" OFFSET {}", self.offset));
            }
        }
    }
}

/// Shows the SQL with `?` in place of bound values
impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = PlaceholderSql::default();
        self.render(&mut text);
        f.write_str(&text.0)
    }
}

/// Target of [`SelectQuery::render`]
pub trait SqlSink {
    /// Append trusted SQL text
    fn push_sql(&mut self, sql: &str);
    /// Append a value as a bind parameter
    fn push_value(&mut self, value: Value);
}

#[derive(Default)]
struct PlaceholderSql(String);

impl SqlSink for PlaceholderSql {
    fn push_sql(&mut self, sql: &str) {
        self.0.push_str(sql);
    }

    fn push_value(&mut self, _value: Value) {
        self.0.push('?');
    }
}

fn render_predicate<S: SqlSink>(predicate: &Predicate, sink: &mut S) {
    match predicate {
        Predicate::Contains { column, term } => {
            sink.push_sql(&format!("{column}::text ILIKE "));
            sink.push_value(Value::Text(format!("%{}%", escape_like(term))));
        }
        Predicate::Equals { column, value } => {
            sink.push_sql(&format!("{column} = "));
            sink.push_value(value.clone());
        }
        Predicate::TextEquals { column, value } => {
            sink.push_sql(&format!("{column}::text = "));
            sink.push_value(Value::Text(value.clone()));
        }
        Predicate::Any(preds) => render_group(preds, " OR ", "FALSE", sink),
        Predicate::All(preds) => render_group(preds, " AND ", "TRUE", sink),
    }
}

fn render_group<S: SqlSink>(preds: &[Predicate], joiner: &str, empty: &str, sink: &mut S) {
    match preds {
        [] => sink.push_sql(empty),
        [single] => render_predicate(single, sink),
        _ => {
            sink.push_sql("(");
            for (i, p) in preds.iter().enumerate() {
                if i > 0 {
                    sink.push_sql(joiner);
                }
                render_predicate(p, sink);
            }
            sink.push_sql(")");
        }
    }
}

fn render_order_key<S: SqlSink>(key: &OrderKey, sink: &mut S) {
    match key {
        OrderKey::Relevance { column, term } => {
            let escaped = escape_like(term);
            sink.push_sql(&format!("CASE WHEN lower({column}::text) = lower("));
            sink.push_value(Value::Text(term.clone()));
            sink.push_sql(&format!(") THEN 1 WHEN {column}::text ILIKE "));
            sink.push_value(Value::Text(format!("% {escaped}%")));
            sink.push_sql(&format!(" THEN 2 WHEN {column}::text ILIKE "));
            sink.push_value(Value::Text(format!("{escaped}%")));
            sink.push_sql(" THEN 3 ELSE 4 END");
        }
        OrderKey::Ascending(column) => sink.push_sql(column),
    }
}
