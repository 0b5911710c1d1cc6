//! # Dependency Resolver
//!
//! Computes a valid initialization order from declared dependencies and
//! priorities, plus an optional partition into dependency levels for
//! parallel startup. The graph is transient: built per resolution call from
//! component snapshots, never stored.
//!
//! A dependency identifier matches a component by id, or by a capability tag
//! the component carries; a tag shared by several components creates an edge
//! to each carrier. A dependency matching nothing in the set, or any cycle,
//! aborts resolution before any component is touched.

use super::errors::{ResolutionError, ResolutionResult};
use crate::component::Component;
use crate::priority::{OrderingProfile, Priority};
use std::collections::HashMap;
use tracing::debug;

/// Point-in-time ordering inputs for one component
#[derive(Debug, Clone)]
pub struct ComponentSnapshot {
    pub id: String,
    pub name: String,
    pub dependencies: Vec<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl ComponentSnapshot {
    pub fn from_component(component: &dyn Component) -> Self {
        Self {
            id: component.id().to_string(),
            name: component.name().to_string(),
            dependencies: component.dependencies(),
            priority: component.priority(),
            tags: component.tags(),
        }
    }

    pub fn ordering_profile(&self) -> OrderingProfile {
        OrderingProfile {
            priority: self.priority.clone(),
            tags: self.tags.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VisitMark {
    Visiting,
    Visited,
}

/// Resolver producing total orders and level partitions
#[derive(Debug, Default)]
pub struct DependencyResolver {
    /// Execution context applied when ranking priorities
    context: Option<String>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    /// Resolve a total initialization order: every component appears after
    /// all of its dependencies.
    ///
    /// Traversal seed order is fixed by effective priority rank (ties broken
    /// by case-insensitive name), making the result stable across calls.
    pub fn resolve_order(&self, components: &[ComponentSnapshot]) -> ResolutionResult<Vec<String>> {
        let graph = self.build_graph(components)?;

        let mut marks: HashMap<&str, VisitMark> = HashMap::with_capacity(components.len());
        let mut order: Vec<String> = Vec::with_capacity(components.len());
        let mut path: Vec<String> = Vec::new();

        for id in &graph.seed_order {
            Self::visit(id, &graph, &mut marks, &mut path, &mut order)?;
        }

        debug!(count = order.len(), "Resolved initialization order");
        Ok(order)
    }

    /// Partition components into dependency levels: level 0 has no in-set
    /// dependencies; each later level depends only on earlier ones.
    /// Components sharing a level have no dependency path between them and
    /// may run concurrently.
    pub fn resolve_levels(
        &self,
        components: &[ComponentSnapshot],
    ) -> ResolutionResult<Vec<Vec<String>>> {
        // The order pass validates the graph (missing ids, cycles) up front
        let order = self.resolve_order(components)?;
        let graph = self.build_graph(components)?;

        let mut depth: HashMap<&str, usize> = HashMap::new();
        for id in &order {
            let edges = &graph.edges[id.as_str()];
            let level = edges.iter().map(|dep| depth[*dep] + 1).max().unwrap_or(0);
            depth.insert(graph.intern(id), level);
        }

        let level_count = depth.values().max().map_or(0, |max| max + 1);
        let mut levels: Vec<Vec<String>> = vec![Vec::new(); level_count];
        for id in &order {
            levels[depth[id.as_str()]].push(id.clone());
        }
        Ok(levels)
    }

    /// Teardown order: the forward order reversed verbatim, never recomputed
    pub fn reverse_order(order: &[String]) -> Vec<String> {
        order.iter().rev().cloned().collect()
    }

    fn visit<'a>(
        id: &str,
        graph: &Graph<'a>,
        marks: &mut HashMap<&'a str, VisitMark>,
        path: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> ResolutionResult<()> {
        match marks.get(id) {
            Some(VisitMark::Visited) => return Ok(()),
            Some(VisitMark::Visiting) => {
                // Close the loop in the reported path so the cycle is
                // readable: a -> b -> a
                let start = path.iter().position(|p| p == id).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(id.to_string());
                return Err(ResolutionError::cycle(&cycle));
            }
            None => {}
        }

        let interned = graph.intern(id);
        marks.insert(interned, VisitMark::Visiting);
        path.push(id.to_string());

        for dependency in &graph.edges[id] {
            Self::visit(dependency, graph, marks, path, order)?;
        }

        path.pop();
        marks.insert(interned, VisitMark::Visited);
        order.push(id.to_string());
        Ok(())
    }

    fn build_graph<'a>(
        &self,
        components: &'a [ComponentSnapshot],
    ) -> ResolutionResult<Graph<'a>> {
        let mut index: HashMap<&'a str, &'a ComponentSnapshot> = HashMap::new();
        for component in components {
            if index.insert(component.id.as_str(), component).is_some() {
                return Err(ResolutionError::DuplicateId {
                    component_id: component.id.clone(),
                });
            }
        }

        let context = self.context.as_deref();
        let mut seed: Vec<&'a ComponentSnapshot> = components.iter().collect();
        seed.sort_by(|a, b| {
            a.priority
                .effective_rank(context)
                .cmp(&b.priority.effective_rank(context))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        let seed_order: Vec<&'a str> = seed.iter().map(|c| c.id.as_str()).collect();
        let seed_position: HashMap<&'a str, usize> = seed_order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();

        // Expand each declared dependency into the ids carrying it, keeping
        // carrier order deterministic via the seed positions
        let mut edges: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        for component in components {
            let mut resolved: Vec<&'a str> = Vec::new();
            for dependency in &component.dependencies {
                let mut carriers: Vec<&'a str> = if index.contains_key(dependency.as_str()) {
                    vec![index[dependency.as_str()].id.as_str()]
                } else {
                    components
                        .iter()
                        .filter(|candidate| candidate.tags.iter().any(|tag| tag == dependency))
                        .map(|candidate| candidate.id.as_str())
                        .collect()
                };
                if carriers.is_empty() {
                    return Err(ResolutionError::missing_dependency(
                        &component.id,
                        dependency,
                    ));
                }
                carriers.sort_by_key(|id| seed_position[id]);
                for carrier in carriers {
                    if !resolved.contains(&carrier) {
                        resolved.push(carrier);
                    }
                }
            }
            edges.insert(component.id.as_str(), resolved);
        }

        Ok(Graph {
            seed_order,
            edges,
            index,
        })
    }
}

struct Graph<'a> {
    seed_order: Vec<&'a str>,
    edges: HashMap<&'a str, Vec<&'a str>>,
    index: HashMap<&'a str, &'a ComponentSnapshot>,
}

impl<'a> Graph<'a> {
    /// Borrow the interned id string owned by the snapshot set
    fn intern(&self, id: &str) -> &'a str {
        self.index[id].id.as_str()
    }
}
