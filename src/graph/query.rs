//! Query builder for fluent Cypher query construction.
//!
//! [`QueryBuilder`] assembles a clause list and renders it into a
//! [`Statement`]: Cypher text, a parameter map and the RETURN column names.
//! Property values are always bound as parameters, never interpolated.
//!
//! # Example
//!
//! ```ignore
//! let statement = QueryBuilder::new()
//!     .match_path(NodePattern::new("u", "User").with_property("name", "Alice"))
//!     .return_items(["u.name", "u.email AS email"])
//!     .build()?;
//!
//! assert_eq!(
//!     statement.text(),
//!     "MATCH (u:User {name: $p0}) RETURN u.name, u.email AS email"
//! );
//! ```

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::graph::cypher::extract_return_columns;
use crate::graph::row::Params;

/// Property filters and values attached to a pattern, in declaration order.
pub type PropertyMap = IndexMap<String, JsonValue>;

// ----------------------------------------------------------------------------
// Statement
// ----------------------------------------------------------------------------

/// A ready-to-run query: text, parameters and declared result columns.
///
/// Statements built by [`QueryBuilder`] also keep their clause list, which
/// backends that do not parse Cypher (the in-memory graph) execute directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: Params,
    columns: Vec<String>,
    clauses: Option<Vec<Clause>>,
}

impl Statement {
    /// Creates a raw statement from Cypher text.
    ///
    /// Columns are read from the final RETURN clause. When they cannot be
    /// determined (`RETURN *`, unbalanced text) the list stays empty; declare
    /// it with [`with_columns`](Statement::with_columns).
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let columns = extract_return_columns(&text).unwrap_or_default();
        Self {
            text,
            params: Params::new(),
            columns,
            clauses: None,
        }
    }

    /// Adds a parameter, referenced in Cypher as `$name`.
    pub fn param(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Declares the RETURN column names of a raw statement.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The clause list, for statements produced by [`QueryBuilder`].
    pub fn clauses(&self) -> Option<&[Clause]> {
        self.clauses.as_deref()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Anything that can become a [`Statement`].
///
/// Repository and manager operations accept either a finished statement or
/// an unbuilt [`QueryBuilder`]; build failures surface as
/// [`AppError::Build`](crate::error::AppError::Build).
pub trait IntoStatement {
    fn into_statement(self) -> Result<Statement, BuildError>;
}

impl IntoStatement for Statement {
    fn into_statement(self) -> Result<Statement, BuildError> {
        Ok(self)
    }
}

impl IntoStatement for &Statement {
    fn into_statement(self) -> Result<Statement, BuildError> {
        Ok(self.clone())
    }
}

impl IntoStatement for QueryBuilder {
    fn into_statement(self) -> Result<Statement, BuildError> {
        self.build()
    }
}

/// Errors raised while building a statement. Never retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("query has no clauses")]
    Empty,

    #[error("invalid {kind} '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("variable '{0}' is not bound by a preceding MATCH, MERGE or CREATE")]
    UnboundVariable(String),

    #[error("misplaced clause: {0}")]
    MisplacedClause(&'static str),

    #[error("invalid return item '{0}'")]
    InvalidReturnItem(String),
}

// ----------------------------------------------------------------------------
// Patterns
// ----------------------------------------------------------------------------

/// A node pattern: `(alias:Label {key: $param})`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub alias: String,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl NodePattern {
    /// Pattern with one label. An empty label matches any node.
    pub fn new(alias: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            alias: alias.into(),
            labels: if label.is_empty() { Vec::new() } else { vec![label] },
            properties: PropertyMap::new(),
        }
    }

    /// Refers to a node already bound under `alias`.
    pub fn bound(alias: impl Into<String>) -> Self {
        Self::new(alias, "")
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Extends this node into a one-hop path.
    pub fn relates_to(self, rel: RelPattern, to: NodePattern) -> PathPattern {
        PathPattern::from(self).then(rel, to)
    }
}

/// Relationship direction relative to the pattern's reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Either,
}

/// A relationship pattern: `-[alias:TYPE {key: $param}]->`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelPattern {
    pub alias: String,
    pub rel_type: String,
    pub direction: Direction,
    pub properties: PropertyMap,
}

impl RelPattern {
    /// Outgoing relationship pattern. An empty type matches any relationship.
    pub fn new(alias: impl Into<String>, rel_type: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            rel_type: rel_type.into(),
            direction: Direction::Outgoing,
            properties: PropertyMap::new(),
        }
    }

    pub fn outgoing(mut self) -> Self {
        self.direction = Direction::Outgoing;
        self
    }

    pub fn incoming(mut self) -> Self {
        self.direction = Direction::Incoming;
        self
    }

    pub fn undirected(mut self) -> Self {
        self.direction = Direction::Either;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties.extend(properties);
        self
    }
}

/// A node followed by zero or more `(relationship, node)` hops.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub start: NodePattern,
    pub hops: Vec<(RelPattern, NodePattern)>,
}

impl PathPattern {
    pub fn then(mut self, rel: RelPattern, to: NodePattern) -> Self {
        self.hops.push((rel, to));
        self
    }
}

impl From<NodePattern> for PathPattern {
    fn from(start: NodePattern) -> Self {
        Self {
            start,
            hops: Vec::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Clauses
// ----------------------------------------------------------------------------

/// An expression usable in RETURN and ORDER BY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `n`
    Variable(String),
    /// `n.name`
    Property(String, String),
    /// `count(n)`, or `count(*)` when `None`
    Count(Option<String>),
    /// Any other expression, passed through verbatim.
    Raw(String),
}

impl Expr {
    /// Parses the common shapes; anything else is kept as [`Expr::Raw`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(inner) = text
            .strip_prefix("count(")
            .or_else(|| text.strip_prefix("COUNT("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let inner = inner.trim();
            if inner == "*" {
                return Expr::Count(None);
            }
            if is_identifier(inner) {
                return Expr::Count(Some(inner.to_string()));
            }
        }
        if is_identifier(text) {
            return Expr::Variable(text.to_string());
        }
        if let Some((var, prop)) = text.split_once('.') {
            if is_identifier(var) && is_identifier(prop) {
                return Expr::Property(var.to_string(), prop.to_string());
            }
        }
        Expr::Raw(text.to_string())
    }

    /// The variable this expression reads, if it reads exactly one.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Expr::Variable(v) | Expr::Property(v, _) | Expr::Count(Some(v)) => Some(v),
            Expr::Count(None) | Expr::Raw(_) => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Count(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(v) => write!(f, "{}", v),
            Expr::Property(v, p) => write!(f, "{}.{}", v, p),
            Expr::Count(Some(v)) => write!(f, "count({})", v),
            Expr::Count(None) => write!(f, "count(*)"),
            Expr::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

/// One RETURN projection, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Result column name: the alias, or the expression text.
    pub fn column(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.expr.to_string())
    }
}

impl From<&str> for ReturnItem {
    /// Parses `expr` or `expr AS alias`.
    fn from(text: &str) -> Self {
        let text = text.trim();
        let split = text
            .rfind(" AS ")
            .or_else(|| text.rfind(" as "))
            .map(|idx| (&text[..idx], &text[idx + 4..]));
        match split {
            Some((expr, alias)) => ReturnItem::aliased(Expr::parse(expr), alias.trim()),
            None => ReturnItem::new(Expr::parse(text)),
        }
    }
}

impl From<Expr> for ReturnItem {
    fn from(expr: Expr) -> Self {
        ReturnItem::new(expr)
    }
}

/// One `SET alias.property = value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub alias: String,
    pub property: String,
    pub value: JsonValue,
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub expr: Expr,
    pub descending: bool,
}

/// A single clause of a built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(PathPattern),
    Merge(NodePattern),
    Create(PathPattern),
    Where(String),
    Set(Vec<SetItem>),
    DetachDelete(Vec<String>),
    Return {
        items: Vec<ReturnItem>,
        distinct: bool,
    },
    OrderBy(Vec<SortItem>),
    Skip(u64),
    Limit(u64),
}

// ----------------------------------------------------------------------------
// Builder
// ----------------------------------------------------------------------------

/// Fluent builder producing a [`Statement`].
///
/// Validation is deferred to [`build`](QueryBuilder::build): identifiers
/// must be plain Cypher names, variables must be bound before use, and
/// ORDER BY / SKIP / LIMIT may only follow RETURN.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a MATCH clause for a node or path.
    pub fn match_path(mut self, path: impl Into<PathPattern>) -> Self {
        self.clauses.push(Clause::Match(path.into()));
        self
    }

    /// Adds a MERGE clause for a single node.
    pub fn merge(mut self, node: NodePattern) -> Self {
        self.clauses.push(Clause::Merge(node));
        self
    }

    /// Adds a CREATE clause. Nodes whose alias is already bound are reused.
    pub fn create(mut self, path: impl Into<PathPattern>) -> Self {
        self.clauses.push(Clause::Create(path.into()));
        self
    }

    /// Adds a raw WHERE predicate after the preceding MATCH.
    pub fn where_raw(mut self, predicate: &str) -> Self {
        self.clauses.push(Clause::Where(predicate.trim().to_string()));
        self
    }

    /// Sets one property; consecutive calls share a single SET clause.
    pub fn set(mut self, alias: &str, property: &str, value: impl Into<JsonValue>) -> Self {
        let item = SetItem {
            alias: alias.to_string(),
            property: property.to_string(),
            value: value.into(),
        };
        match self.clauses.last_mut() {
            Some(Clause::Set(items)) => items.push(item),
            _ => self.clauses.push(Clause::Set(vec![item])),
        }
        self
    }

    /// Sets every property in the map on `alias`.
    pub fn set_properties(self, alias: &str, properties: PropertyMap) -> Self {
        properties
            .into_iter()
            .fold(self, |builder, (property, value)| {
                builder.set(alias, &property, value)
            })
    }

    /// Deletes a node together with its relationships.
    pub fn detach_delete(mut self, alias: &str) -> Self {
        match self.clauses.last_mut() {
            Some(Clause::DetachDelete(aliases)) => aliases.push(alias.to_string()),
            _ => self
                .clauses
                .push(Clause::DetachDelete(vec![alias.to_string()])),
        }
        self
    }

    pub fn return_items<I, R>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReturnItem>,
    {
        self.clauses.push(Clause::Return {
            items: items.into_iter().map(Into::into).collect(),
            distinct: false,
        });
        self
    }

    pub fn return_distinct<I, R>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReturnItem>,
    {
        self.clauses.push(Clause::Return {
            items: items.into_iter().map(Into::into).collect(),
            distinct: true,
        });
        self
    }

    pub fn order_by(self, expr: &str) -> Self {
        self.push_sort(expr, false)
    }

    pub fn order_by_desc(self, expr: &str) -> Self {
        self.push_sort(expr, true)
    }

    fn push_sort(mut self, expr: &str, descending: bool) -> Self {
        let item = SortItem {
            expr: Expr::parse(expr),
            descending,
        };
        match self.clauses.last_mut() {
            Some(Clause::OrderBy(items)) => items.push(item),
            _ => self.clauses.push(Clause::OrderBy(vec![item])),
        }
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.clauses.push(Clause::Skip(count));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.clauses.push(Clause::Limit(count));
        self
    }

    /// Validates the clause list and renders the statement.
    pub fn build(self) -> Result<Statement, BuildError> {
        if self.clauses.is_empty() {
            return Err(BuildError::Empty);
        }
        validate(&self.clauses)?;

        let mut renderer = Renderer::default();
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| renderer.clause(clause))
            .collect();

        let columns = self
            .clauses
            .iter()
            .find_map(|clause| match clause {
                Clause::Return { items, .. } => {
                    Some(items.iter().map(ReturnItem::column).collect())
                }
                _ => None,
            })
            .unwrap_or_default();

        Ok(Statement {
            text: parts.join(" "),
            params: renderer.params,
            columns,
            clauses: Some(self.clauses),
        })
    }
}

/// Checks identifiers, variable binding and clause ordering.
fn validate(clauses: &[Clause]) -> Result<(), BuildError> {
    let mut bound: HashSet<&str> = HashSet::new();
    let mut returned = false;
    let mut previous: Option<&Clause> = None;

    for clause in clauses {
        match clause {
            Clause::Match(path) | Clause::Create(path) => {
                if returned {
                    return Err(BuildError::MisplacedClause("reading or writing after RETURN"));
                }
                let creating = matches!(clause, Clause::Create(_));
                check_node(&path.start, creating, &bound)?;
                for (rel, node) in &path.hops {
                    check_rel(rel, creating)?;
                    check_node(node, creating, &bound)?;
                }
                bind_path(path, &mut bound);
            }
            Clause::Merge(node) => {
                if returned {
                    return Err(BuildError::MisplacedClause("MERGE after RETURN"));
                }
                check_node(node, false, &bound)?;
                if !node.alias.is_empty() {
                    bound.insert(node.alias.as_str());
                }
            }
            Clause::Where(predicate) => {
                if !matches!(previous, Some(Clause::Match(_))) {
                    return Err(BuildError::MisplacedClause("WHERE must follow MATCH"));
                }
                if predicate.is_empty() {
                    return Err(BuildError::MisplacedClause("empty WHERE predicate"));
                }
            }
            Clause::Set(items) => {
                if returned {
                    return Err(BuildError::MisplacedClause("SET after RETURN"));
                }
                for item in items {
                    check_bound(&item.alias, &bound)?;
                    check_identifier("property", &item.property)?;
                }
            }
            Clause::DetachDelete(aliases) => {
                if returned {
                    return Err(BuildError::MisplacedClause("DETACH DELETE after RETURN"));
                }
                for alias in aliases {
                    check_bound(alias, &bound)?;
                }
            }
            Clause::Return { items, .. } => {
                if returned {
                    return Err(BuildError::MisplacedClause("more than one RETURN"));
                }
                if items.is_empty() {
                    return Err(BuildError::MisplacedClause("RETURN without items"));
                }
                for item in items {
                    check_expr(&item.expr, &bound)?;
                    if let Some(alias) = &item.alias {
                        if !is_identifier(alias) {
                            return Err(BuildError::InvalidReturnItem(item.column()));
                        }
                    }
                }
                // ORDER BY may refer to projected aliases
                bound.extend(items.iter().filter_map(|item| item.alias.as_deref()));
                returned = true;
            }
            Clause::OrderBy(items) => {
                if !returned {
                    return Err(BuildError::MisplacedClause("ORDER BY must follow RETURN"));
                }
                for item in items {
                    check_expr(&item.expr, &bound)?;
                }
            }
            Clause::Skip(_) | Clause::Limit(_) => {
                if !returned {
                    return Err(BuildError::MisplacedClause("SKIP/LIMIT must follow RETURN"));
                }
            }
        }
        previous = Some(clause);
    }
    Ok(())
}

fn check_node(node: &NodePattern, creating: bool, bound: &HashSet<&str>) -> Result<(), BuildError> {
    if !node.alias.is_empty() {
        check_identifier("variable", &node.alias)?;
    } else if creating && node.labels.is_empty() {
        return Err(BuildError::InvalidIdentifier {
            kind: "node pattern",
            value: "()".to_string(),
        });
    }
    for label in &node.labels {
        check_identifier("label", label)?;
    }
    for key in node.properties.keys() {
        check_identifier("property", key)?;
    }
    // Re-using a bound variable in CREATE must not redeclare it
    if creating
        && bound.contains(node.alias.as_str())
        && (!node.labels.is_empty() || !node.properties.is_empty())
    {
        return Err(BuildError::MisplacedClause(
            "CREATE cannot redeclare a bound variable",
        ));
    }
    Ok(())
}

fn check_rel(rel: &RelPattern, creating: bool) -> Result<(), BuildError> {
    if !rel.alias.is_empty() {
        check_identifier("variable", &rel.alias)?;
    }
    if creating || !rel.rel_type.is_empty() {
        check_identifier("relationship type", &rel.rel_type)?;
    }
    if creating && rel.direction == Direction::Either {
        return Err(BuildError::MisplacedClause(
            "CREATE requires a directed relationship",
        ));
    }
    for key in rel.properties.keys() {
        check_identifier("property", key)?;
    }
    Ok(())
}

fn check_expr(expr: &Expr, bound: &HashSet<&str>) -> Result<(), BuildError> {
    match expr {
        Expr::Raw(raw) if raw.is_empty() => Err(BuildError::InvalidReturnItem(String::new())),
        _ => match expr.variable() {
            Some(var) => check_bound(var, bound),
            None => Ok(()),
        },
    }
}

fn check_bound(alias: &str, bound: &HashSet<&str>) -> Result<(), BuildError> {
    if bound.contains(alias) {
        Ok(())
    } else {
        Err(BuildError::UnboundVariable(alias.to_string()))
    }
}

fn check_identifier(kind: &'static str, value: &str) -> Result<(), BuildError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(BuildError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

fn bind_path<'a>(path: &'a PathPattern, bound: &mut HashSet<&'a str>) {
    if !path.start.alias.is_empty() {
        bound.insert(path.start.alias.as_str());
    }
    for (rel, node) in &path.hops {
        if !rel.alias.is_empty() {
            bound.insert(rel.alias.as_str());
        }
        if !node.alias.is_empty() {
            bound.insert(node.alias.as_str());
        }
    }
}

/// Plain Cypher name: letter or underscore, then letters, digits, underscores.
pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Renders clauses to Cypher text, allocating `$pN` parameters.
#[derive(Default)]
struct Renderer {
    params: Params,
}

impl Renderer {
    fn bind(&mut self, value: &JsonValue) -> String {
        let name = format!("p{}", self.params.len());
        self.params.insert(name.clone(), value.clone());
        format!("${}", name)
    }

    fn properties(&mut self, properties: &PropertyMap) -> String {
        if properties.is_empty() {
            return String::new();
        }
        let entries: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{}: {}", key, self.bind(value)))
            .collect();
        format!(" {{{}}}", entries.join(", "))
    }

    fn node(&mut self, node: &NodePattern) -> String {
        let labels: String = node.labels.iter().map(|l| format!(":{}", l)).collect();
        let props = self.properties(&node.properties);
        format!("({}{}{})", node.alias, labels, props)
    }

    fn rel(&mut self, rel: &RelPattern) -> String {
        let rel_type = if rel.rel_type.is_empty() {
            String::new()
        } else {
            format!(":{}", rel.rel_type)
        };
        let props = self.properties(&rel.properties);
        let body = format!("[{}{}{}]", rel.alias, rel_type, props);
        match rel.direction {
            Direction::Outgoing => format!("-{}->", body),
            Direction::Incoming => format!("<-{}-", body),
            Direction::Either => format!("-{}-", body),
        }
    }

    fn path(&mut self, path: &PathPattern) -> String {
        let mut out = self.node(&path.start);
        for (rel, node) in &path.hops {
            out.push_str(&self.rel(rel));
            out.push_str(&self.node(node));
        }
        out
    }

    fn clause(&mut self, clause: &Clause) -> String {
        match clause {
            Clause::Match(path) => format!("MATCH {}", self.path(path)),
            Clause::Merge(node) => format!("MERGE {}", self.node(node)),
            Clause::Create(path) => format!("CREATE {}", self.path(path)),
            Clause::Where(predicate) => format!("WHERE {}", predicate),
            Clause::Set(items) => {
                let assignments: Vec<String> = items
                    .iter()
                    .map(|item| {
                        format!("{}.{} = {}", item.alias, item.property, self.bind(&item.value))
                    })
                    .collect();
                format!("SET {}", assignments.join(", "))
            }
            Clause::DetachDelete(aliases) => format!("DETACH DELETE {}", aliases.join(", ")),
            Clause::Return { items, distinct } => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| match &item.alias {
                        Some(alias) => format!("{} AS {}", item.expr, alias),
                        None => item.expr.to_string(),
                    })
                    .collect();
                let keyword = if *distinct { "RETURN DISTINCT" } else { "RETURN" };
                format!("{} {}", keyword, rendered.join(", "))
            }
            Clause::OrderBy(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| {
                        if item.descending {
                            format!("{} DESC", item.expr)
                        } else {
                            item.expr.to_string()
                        }
                    })
                    .collect();
                format!("ORDER BY {}", rendered.join(", "))
            }
            Clause::Skip(count) => format!("SKIP {}", count),
            Clause::Limit(count) => format!("LIMIT {}", count),
        }
    }
}
