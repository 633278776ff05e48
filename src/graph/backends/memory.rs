//! In-process graph backend.
//!
//! [`MemoryGraph`] executes statements produced by
//! [`QueryBuilder`](crate::graph::QueryBuilder) directly against an
//! in-memory property graph, without parsing Cypher. It supports the clause
//! set the builder emits (MATCH, MERGE, CREATE, SET, DETACH DELETE, RETURN
//! with `count`, ORDER BY, SKIP, LIMIT). Raw text statements and raw WHERE
//! predicates are rejected with [`AppError::Query`].
//!
//! # Example
//!
//! ```ignore
//! use neopersist::graph::backends::memory::MemoryGraph;
//! use neopersist::PersistenceManager;
//!
//! let manager = PersistenceManager::new(MemoryGraph::new());
//! let users = manager.repository_for::<User>()?;
//! users.save(&alice).await?;
//! ```

use std::cmp::Ordering;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::graph::query::{
    Clause, Direction, Expr, NodePattern, PathPattern, PropertyMap, RelPattern, ReturnItem,
    SetItem, SortItem, Statement,
};
use crate::graph::row::Row;
use crate::graph::traits::QueryRunner;
use crate::graph::value::{Node, Relationship, Value};

/// Thread-safe in-memory property graph.
#[derive(Default)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

#[derive(Default)]
struct GraphState {
    nodes: IndexMap<String, Node>,
    relationships: IndexMap<String, Relationship>,
    next_id: u64,
}

/// What a variable is bound to while a statement runs.
#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Node(String),
    Relationship(String),
}

type Binding = IndexMap<String, Bound>;

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    pub async fn relationship_count(&self) -> usize {
        self.state.read().await.relationships.len()
    }

    /// All nodes carrying `label`, in creation order.
    pub async fn nodes_with_label(&self, label: &str) -> Vec<Node> {
        self.state
            .read()
            .await
            .nodes
            .values()
            .filter(|n| n.has_label(label))
            .cloned()
            .collect()
    }

    /// Removes every node and relationship.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.nodes.clear();
        state.relationships.clear();
    }
}

#[async_trait]
impl QueryRunner for MemoryGraph {
    async fn run(&self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        let clauses = statement.clauses().ok_or_else(|| AppError::Query {
            message: "raw Cypher text is not supported by the in-memory graph".to_string(),
            query: statement.text().to_string(),
        })?;

        tracing::debug!(query = %statement, "running statement in memory");
        let mut state = self.state.write().await;
        state.execute(clauses).map_err(|message| AppError::Query {
            message,
            query: statement.text().to_string(),
        })
    }
}

impl GraphState {
    fn execute(&mut self, clauses: &[Clause]) -> Result<Vec<Row>, String> {
        let mut bindings: Vec<Binding> = vec![Binding::new()];
        let mut output: Option<Vec<(Row, Option<Binding>)>> = None;

        for clause in clauses {
            match clause {
                Clause::Match(path) => {
                    bindings = bindings
                        .iter()
                        .flat_map(|binding| self.match_path(path, binding))
                        .collect();
                }
                Clause::Merge(node) => {
                    let mut merged = Vec::new();
                    for binding in bindings {
                        let matches = self.match_path(&PathPattern::from(node.clone()), &binding);
                        if matches.is_empty() {
                            let mut binding = binding;
                            let id = self.create_node(node);
                            binding.insert(node.alias.clone(), Bound::Node(id));
                            merged.push(binding);
                        } else {
                            merged.extend(matches);
                        }
                    }
                    bindings = merged;
                }
                Clause::Create(path) => {
                    for binding in bindings.iter_mut() {
                        self.create_path(path, binding)?;
                    }
                }
                Clause::Where(_) => {
                    return Err("WHERE predicates are not supported by the in-memory graph".into())
                }
                Clause::Set(items) => {
                    for binding in &bindings {
                        for item in items {
                            self.set_property(item, binding)?;
                        }
                    }
                }
                Clause::DetachDelete(aliases) => {
                    for binding in &bindings {
                        for alias in aliases {
                            match binding.get(alias) {
                                Some(Bound::Node(id)) => self.detach_delete(id),
                                Some(Bound::Relationship(id)) => {
                                    self.relationships.shift_remove(id);
                                }
                                None => return Err(format!("variable '{}' is not bound", alias)),
                            }
                        }
                    }
                }
                Clause::Return { items, distinct } => {
                    let mut rows = self.project(items, &bindings)?;
                    if *distinct {
                        let mut unique: Vec<(Row, Option<Binding>)> = Vec::new();
                        for entry in rows {
                            if !unique.iter().any(|(row, _)| *row == entry.0) {
                                unique.push(entry);
                            }
                        }
                        rows = unique;
                    }
                    output = Some(rows);
                }
                Clause::OrderBy(keys) => {
                    let rows = output.as_mut().ok_or("ORDER BY without RETURN")?;
                    self.sort(rows, keys)?;
                }
                Clause::Skip(count) => {
                    let rows = output.as_mut().ok_or("SKIP without RETURN")?;
                    let count = (*count as usize).min(rows.len());
                    rows.drain(..count);
                }
                Clause::Limit(count) => {
                    let rows = output.as_mut().ok_or("LIMIT without RETURN")?;
                    rows.truncate(*count as usize);
                }
            }
        }

        Ok(output
            .map(|rows| rows.into_iter().map(|(row, _)| row).collect())
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------------

    fn match_path(&self, path: &PathPattern, binding: &Binding) -> Vec<Binding> {
        let starts: Vec<&Node> = match binding.get(&path.start.alias) {
            Some(Bound::Node(id)) => self.nodes.get(id).into_iter().collect(),
            Some(Bound::Relationship(_)) => Vec::new(),
            None => self.nodes.values().collect(),
        };

        let mut results = Vec::new();
        for node in starts {
            if !node_matches(node, &path.start) {
                continue;
            }
            let mut next = binding.clone();
            if !path.start.alias.is_empty() {
                next.insert(path.start.alias.clone(), Bound::Node(node.id.clone()));
            }
            self.extend_hops(&node.id, &path.hops, next, &mut results);
        }
        results
    }

    fn extend_hops(
        &self,
        from: &str,
        hops: &[(RelPattern, NodePattern)],
        binding: Binding,
        results: &mut Vec<Binding>,
    ) {
        let Some(((rel_pattern, node_pattern), rest)) = hops.split_first() else {
            results.push(binding);
            return;
        };

        for rel in self.relationships.values() {
            if !rel_matches(rel, rel_pattern) {
                continue;
            }
            if let Some(bound) = binding.get(&rel_pattern.alias) {
                if *bound != Bound::Relationship(rel.id.clone()) {
                    continue;
                }
            }
            // An undirected self-loop is traversed once in each direction
            let ends = match rel_pattern.direction {
                Direction::Outgoing if rel.start_id == from => vec![&rel.end_id],
                Direction::Incoming if rel.end_id == from => vec![&rel.start_id],
                Direction::Either => {
                    let mut ends = Vec::new();
                    if rel.start_id == from {
                        ends.push(&rel.end_id);
                    }
                    if rel.end_id == from {
                        ends.push(&rel.start_id);
                    }
                    ends
                }
                _ => Vec::new(),
            };

            for other in ends.into_iter().filter_map(|id| self.nodes.get(id)) {
                if !node_matches(other, node_pattern) {
                    continue;
                }
                if let Some(bound) = binding.get(&node_pattern.alias) {
                    if *bound != Bound::Node(other.id.clone()) {
                        continue;
                    }
                }

                let mut next = binding.clone();
                if !rel_pattern.alias.is_empty() {
                    next.insert(rel_pattern.alias.clone(), Bound::Relationship(rel.id.clone()));
                }
                if !node_pattern.alias.is_empty() {
                    next.insert(node_pattern.alias.clone(), Bound::Node(other.id.clone()));
                }
                self.extend_hops(&other.id, rest, next, results);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    fn allocate_id(&mut self, prefix: char) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn create_node(&mut self, pattern: &NodePattern) -> String {
        let id = self.allocate_id('n');
        let node = Node {
            id: id.clone(),
            labels: pattern.labels.clone(),
            properties: to_properties(&pattern.properties),
        };
        self.nodes.insert(id.clone(), node);
        id
    }

    fn bind_or_create(&mut self, pattern: &NodePattern, binding: &mut Binding) -> Result<String, String> {
        match binding.get(&pattern.alias) {
            Some(Bound::Node(id)) => Ok(id.clone()),
            Some(Bound::Relationship(_)) => Err(format!(
                "variable '{}' is bound to a relationship",
                pattern.alias
            )),
            None => {
                let id = self.create_node(pattern);
                if !pattern.alias.is_empty() {
                    binding.insert(pattern.alias.clone(), Bound::Node(id.clone()));
                }
                Ok(id)
            }
        }
    }

    fn create_path(&mut self, path: &PathPattern, binding: &mut Binding) -> Result<(), String> {
        let mut current = self.bind_or_create(&path.start, binding)?;
        for (rel_pattern, node_pattern) in &path.hops {
            let next = self.bind_or_create(node_pattern, binding)?;
            let (start_id, end_id) = match rel_pattern.direction {
                Direction::Incoming => (next.clone(), current.clone()),
                _ => (current.clone(), next.clone()),
            };
            let id = self.allocate_id('r');
            self.relationships.insert(
                id.clone(),
                Relationship {
                    id: id.clone(),
                    start_id,
                    end_id,
                    rel_type: rel_pattern.rel_type.clone(),
                    properties: to_properties(&rel_pattern.properties),
                },
            );
            if !rel_pattern.alias.is_empty() {
                binding.insert(rel_pattern.alias.clone(), Bound::Relationship(id));
            }
            current = next;
        }
        Ok(())
    }

    fn set_property(&mut self, item: &SetItem, binding: &Binding) -> Result<(), String> {
        let properties = match binding.get(&item.alias) {
            Some(Bound::Node(id)) => self.nodes.get_mut(id).map(|n| &mut n.properties),
            Some(Bound::Relationship(id)) => self.relationships.get_mut(id).map(|r| &mut r.properties),
            None => return Err(format!("variable '{}' is not bound", item.alias)),
        };
        // Target deleted earlier in the same statement
        let Some(properties) = properties else {
            return Ok(());
        };
        if item.value.is_null() {
            properties.shift_remove(&item.property);
        } else {
            properties.insert(item.property.clone(), Value::from(item.value.clone()));
        }
        Ok(())
    }

    fn detach_delete(&mut self, node_id: &str) {
        self.relationships
            .retain(|_, rel| rel.start_id != node_id && rel.end_id != node_id);
        self.nodes.shift_remove(node_id);
    }

    // ------------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------------

    fn project(
        &self,
        items: &[ReturnItem],
        bindings: &[Binding],
    ) -> Result<Vec<(Row, Option<Binding>)>, String> {
        if !items.iter().any(|item| item.expr.is_aggregate()) {
            return bindings
                .iter()
                .map(|binding| {
                    let row = items
                        .iter()
                        .map(|item| Ok::<_, String>((item.column(), self.eval(&item.expr, binding)?)))
                        .collect::<Result<Row, String>>()?;
                    Ok::<_, String>((row, Some(binding.clone())))
                })
                .collect();
        }

        // Group by the non-aggregate items, counting bindings per group
        let keys: Vec<&ReturnItem> = items.iter().filter(|i| !i.expr.is_aggregate()).collect();
        let mut groups: Vec<(Vec<Value>, Vec<&Binding>)> = Vec::new();
        for binding in bindings {
            let key = keys
                .iter()
                .map(|item| self.eval(&item.expr, binding))
                .collect::<Result<Vec<_>, _>>()?;
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(binding),
                None => groups.push((key, vec![binding])),
            }
        }
        if groups.is_empty() && keys.is_empty() {
            groups.push((Vec::new(), Vec::new()));
        }

        Ok(groups
            .into_iter()
            .map(|(key, members)| {
                let mut key_values = key.into_iter();
                let row = items
                    .iter()
                    .map(|item| {
                        let value = match &item.expr {
                            Expr::Count(Some(var)) => Value::Int(
                                members.iter().filter(|b| b.contains_key(var)).count() as i64,
                            ),
                            Expr::Count(None) => Value::Int(members.len() as i64),
                            _ => key_values.next().unwrap_or_default(),
                        };
                        (item.column(), value)
                    })
                    .collect::<Row>();
                (row, None)
            })
            .collect())
    }

    fn eval(&self, expr: &Expr, binding: &Binding) -> Result<Value, String> {
        match expr {
            Expr::Variable(var) => Ok(self.resolve(var, binding)?.unwrap_or_default()),
            Expr::Property(var, prop) => Ok(match self.resolve(var, binding)? {
                Some(Value::Node(node)) => node.properties.get(prop).cloned().unwrap_or_default(),
                Some(Value::Relationship(rel)) => {
                    rel.properties.get(prop).cloned().unwrap_or_default()
                }
                _ => Value::Null,
            }),
            Expr::Count(_) => Err("count() is only supported as a RETURN item".into()),
            Expr::Raw(raw) => Err(format!(
                "expression '{}' is not supported by the in-memory graph",
                raw
            )),
        }
    }

    /// Current value of a bound variable; `None` once it has been deleted.
    fn resolve(&self, var: &str, binding: &Binding) -> Result<Option<Value>, String> {
        match binding.get(var) {
            Some(Bound::Node(id)) => Ok(self.nodes.get(id).cloned().map(Value::Node)),
            Some(Bound::Relationship(id)) => {
                Ok(self.relationships.get(id).cloned().map(Value::Relationship))
            }
            None => Err(format!("variable '{}' is not bound", var)),
        }
    }

    fn sort(&self, rows: &mut [(Row, Option<Binding>)], keys: &[SortItem]) -> Result<(), String> {
        let mut keyed = Vec::with_capacity(rows.len());
        for (row, binding) in rows.iter() {
            let values = keys
                .iter()
                .map(|key| {
                    let column = key.expr.to_string();
                    match (row.get_value(&column), binding) {
                        (Some(value), _) => Ok(value.clone()),
                        (None, Some(binding)) => self.eval(&key.expr, binding),
                        (None, None) => Err(format!("cannot order by '{}'", column)),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            keyed.push(values);
        }

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| {
            keys.iter()
                .zip(keyed[a].iter().zip(keyed[b].iter()))
                .map(|(key, (left, right))| {
                    let ordering = compare_values(left, right);
                    if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let sorted: Vec<(Row, Option<Binding>)> = order.iter().map(|&i| rows[i].clone()).collect();
        for (slot, entry) in rows.iter_mut().zip(sorted) {
            *slot = entry;
        }
        Ok(())
    }
}

fn to_properties(map: &PropertyMap) -> IndexMap<String, Value> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
        .collect()
}

fn properties_match(actual: &IndexMap<String, Value>, expected: &PropertyMap) -> bool {
    expected.iter().all(|(key, value)| match value {
        JsonValue::Null => false,
        _ => actual.get(key) == Some(&Value::from(value.clone())),
    })
}

fn node_matches(node: &Node, pattern: &NodePattern) -> bool {
    pattern.labels.iter().all(|l| node.has_label(l))
        && properties_match(&node.properties, &pattern.properties)
}

fn rel_matches(rel: &Relationship, pattern: &RelPattern) -> bool {
    (pattern.rel_type.is_empty() || rel.rel_type == pattern.rel_type)
        && properties_match(&rel.properties, &pattern.properties)
}

/// Cypher-style ordering: numbers, then strings, then booleans; nulls last.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Int(_) | Value::Float(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            Value::Null => 4,
            _ => 3,
        }
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}
