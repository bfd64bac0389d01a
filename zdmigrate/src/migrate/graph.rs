//! Dependency graph over source entities
//!
//! Derives the partial order a migration must respect: a custom object type
//! before any lookup field that targets it, and every referenced field
//! before the condition-bearing field that names it. Produces a
//! topologically sorted plan with a stable tie-break (original source
//! listing order) so repeated runs are deterministic and diff-friendly.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::error::CycleError;
use super::types::{Catalog, EntityRef, MigrationPlan, MigrationStep};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// All nodes in source listing order: object types first, then fields
    nodes: Vec<EntityRef>,
    index: HashMap<EntityRef, usize>,
    /// node -> entities it depends on (must exist at the destination first)
    dependencies: HashMap<EntityRef, HashSet<EntityRef>>,
    /// reverse adjacency: node -> entities that depend on it
    dependents: HashMap<EntityRef, HashSet<EntityRef>>,
}

impl DependencyGraph {
    pub fn build(catalog: &Catalog) -> Self {
        let mut graph = DependencyGraph::default();

        for object in &catalog.object_types {
            graph.add_node(object.entity_ref());
        }
        for field in &catalog.fields {
            graph.add_node(field.entity_ref());
        }

        for field in &catalog.fields {
            let entity = field.entity_ref();

            // Lookup fields depend on their custom object target
            if let Some(target) = &field.relationship_target
                && let Some(key) = target.custom_object_key()
            {
                graph.add_edge(&entity, EntityRef::object(key));
            }

            // Condition-bearing fields depend on every field they reference.
            // References outside the catalog would already have failed the
            // read, so each target is a known node.
            for key in field.referenced_field_keys() {
                graph.add_edge(&entity, EntityRef::field(key));
            }
        }

        graph
    }

    fn add_node(&mut self, entity: EntityRef) {
        if self.index.contains_key(&entity) {
            return;
        }
        self.index.insert(entity.clone(), self.nodes.len());
        self.dependencies.entry(entity.clone()).or_default();
        self.dependents.entry(entity.clone()).or_default();
        self.nodes.push(entity);
    }

    /// Edge `from -> to`: `to` must exist before `from`. Edges to entities
    /// outside the graph are ignored (builtin targets have no node). A
    /// self-edge is kept: the node can never become ready, so the sort
    /// reports it as a cycle.
    fn add_edge(&mut self, from: &EntityRef, to: EntityRef) {
        if !self.index.contains_key(&to) {
            return;
        }
        self.dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.dependents.entry(to).or_default().insert(from.clone());
    }

    pub fn dependencies_of(&self, entity: &EntityRef) -> Vec<EntityRef> {
        let mut deps: Vec<EntityRef> = self
            .dependencies
            .get(entity)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort_by_key(|d| self.index[d]);
        deps
    }

    /// Kahn's algorithm; among ready nodes the one listed first in the
    /// source always wins, keeping runs deterministic.
    pub fn topological_sort(&self) -> Result<Vec<EntityRef>, CycleError> {
        let mut remaining: HashMap<&EntityRef, usize> = self
            .nodes
            .iter()
            .map(|n| (n, self.dependencies[n].len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = self
            .nodes
            .iter()
            .filter(|n| remaining[*n] == 0)
            .map(|n| Reverse(self.index[n]))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(idx)) = ready.pop() {
            let entity = &self.nodes[idx];
            order.push(entity.clone());

            for dependent in &self.dependents[entity] {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(Reverse(self.index[dependent]));
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let mut entities: Vec<EntityRef> = self
                .nodes
                .iter()
                .filter(|n| remaining[*n] > 0)
                .cloned()
                .collect();
            entities.sort_by_key(|e| self.index[e]);
            return Err(CycleError { entities });
        }

        Ok(order)
    }

    /// Build the ordered migration plan for a source catalog
    pub fn build_plan(catalog: &Catalog) -> Result<MigrationPlan, CycleError> {
        let graph = Self::build(catalog);
        let order = graph.topological_sort()?;

        let steps = order
            .into_iter()
            .map(|entity| MigrationStep {
                dependencies: graph.dependencies_of(&entity),
                entity,
            })
            .collect();

        Ok(MigrationPlan { steps })
    }
}
