//! Relationship Graph Analysis
//!
//! Directed graph of object types connected by their relationships, with
//! strongly connected components for cycle reporting and DOT export.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::types::Cardinality;
use super::Schema;
use crate::error::{Result, SchemaError};
use crate::model::TypeKey;

/// Edge weight: one relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub name: String,
    pub cardinality: Cardinality,
}

/// A set of object types that reach each other through relationships
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleGroup {
    /// Object type names, sorted
    pub members: Vec<String>,
    /// Single type relating to itself
    pub is_self_referential: bool,
}

fn node_of(nodes: &HashMap<TypeKey, NodeIndex>, key: &TypeKey) -> Result<NodeIndex> {
    nodes
        .get(key)
        .copied()
        .ok_or_else(|| SchemaError::Internal(format!("object type `{}` missing from graph", key)))
}

pub struct RelationshipGraph {
    graph: DiGraph<String, RelationshipEdge>,
    nodes: HashMap<TypeKey, NodeIndex>,
    resources: HashMap<NodeIndex, bool>,
}

impl RelationshipGraph {
    /// Build the graph by resolving every relationship of the schema
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let mut resources = HashMap::new();

        for object in schema.objects() {
            let index = graph.add_node(object.name.clone());
            nodes.insert(object.key.clone(), index);
            resources.insert(index, object.is_resource());
        }

        for object in schema.objects() {
            let from = node_of(&nodes, &object.key)?;
            for relationship in &object.relationships {
                let target = schema.resolve_relationship(relationship)?;
                let to = node_of(&nodes, &target.key)?;
                graph.add_edge(
                    from,
                    to,
                    RelationshipEdge {
                        name: relationship.name.clone(),
                        cardinality: relationship.cardinality,
                    },
                );
            }
        }

        Ok(Self {
            graph,
            nodes,
            resources,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Names of the types `name` relates to, sorted
    pub fn related(&self, name: &str) -> Vec<&str> {
        let Some(index) = self.graph.node_indices().find(|i| self.graph[*i] == name) else {
            return Vec::new();
        };
        let mut related: Vec<&str> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| self.graph[edge.target()].as_str())
            .collect();
        related.sort_unstable();
        related.dedup();
        related
    }

    /// Strongly connected groups that form cycles, sorted by first member
    pub fn cycles(&self) -> Vec<CycleGroup> {
        let mut groups: Vec<CycleGroup> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter_map(|scc| {
                if scc.len() == 1 {
                    let index = scc[0];
                    let self_ref = self
                        .graph
                        .edges_directed(index, Direction::Outgoing)
                        .any(|e| e.target() == index);
                    if !self_ref {
                        return None;
                    }
                }
                let mut members: Vec<String> =
                    scc.iter().map(|index| self.graph[*index].clone()).collect();
                members.sort();
                Some(CycleGroup {
                    is_self_referential: members.len() == 1,
                    members,
                })
            })
            .collect();
        groups.sort_by(|a, b| a.members.cmp(&b.members));
        groups
    }

    pub fn is_cyclic(&self, name: &str) -> bool {
        self.cycles().iter().any(|g| g.members.iter().any(|m| m == name))
    }

    /// Graphviz rendering; resource types are highlighted
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph Relationships {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n");
        output.push('\n');

        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for index in &indices {
            let color = if self.resources.get(index).copied().unwrap_or(false) {
                "#00BCD4"
            } else {
                "#9E9E9E"
            };
            output.push_str(&format!(
                "  \"{}\" [fillcolor=\"{}\"];\n",
                self.graph[*index], color
            ));
        }

        output.push('\n');

        let mut edges: Vec<(String, String, String, Cardinality)> = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].clone(),
                    self.graph[e.target()].clone(),
                    e.weight().name.clone(),
                    e.weight().cardinality,
                )
            })
            .collect();
        edges.sort_by(|a, b| (&a.0, &a.2).cmp(&(&b.0, &b.2)));

        for (from, to, name, cardinality) in edges {
            let style = match cardinality {
                Cardinality::ToOne => "solid",
                Cardinality::ToMany => "bold",
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{} ({})\", style={}];\n",
                from, to, name, cardinality, style
            ));
        }

        output.push_str("}\n");
        output
    }
}
