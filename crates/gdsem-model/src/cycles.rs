//! Inference cycle detection.
//!
//! Methods whose return types consult each other form a dependency graph;
//! Tarjan's strongly-connected-components algorithm produces a safe visit
//! order: non-cyclic methods first in topological order, cycle members last.
//! Cycle members fall back to `Variant` on the first inference pass.

use gdsem_checker::MethodKey;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// One entry of the inference schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduledMethod {
    pub key: MethodKey,
    pub is_in_cycle: bool,
}

/// Tarjan SCC over the method dependency graph.
#[derive(Debug, Default)]
pub struct CycleDetector {
    nodes: Vec<MethodKey>,
    index_of: FxHashMap<MethodKey, usize>,
    edges: Vec<Vec<usize>>,
}

impl CycleDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, key: MethodKey) -> usize {
        if let Some(&index) = self.index_of.get(&key) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(key);
        self.index_of.insert(key, index);
        self.edges.push(Vec::new());
        index
    }

    /// Record that `from`'s return type depends on `to`'s return type.
    pub fn add_dependency(&mut self, from: MethodKey, to: MethodKey) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.edges[from].contains(&to) {
            self.edges[from].push(to);
        }
    }

    /// Compute the inference schedule.
    ///
    /// Tarjan emits components in reverse topological order of the
    /// condensation, which is exactly dependency-first order. Acyclic
    /// methods keep that order; cycle members are moved to the back.
    #[must_use]
    pub fn schedule(&self) -> Vec<ScheduledMethod> {
        let components = self.strongly_connected_components();
        let mut acyclic = Vec::new();
        let mut cyclic = Vec::new();
        for component in components {
            let in_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| self.edges[n].contains(&n));
            for node in component {
                let entry = ScheduledMethod {
                    key: self.nodes[node],
                    is_in_cycle: in_cycle,
                };
                if in_cycle {
                    cyclic.push(entry);
                } else {
                    acyclic.push(entry);
                }
            }
        }
        acyclic.extend(cyclic);
        acyclic
    }

    /// Iterative Tarjan; recursion depth is not bounded by user input.
    fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        const UNVISITED: usize = usize::MAX;

        let n = self.nodes.len();
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut components: Vec<Vec<usize>> = Vec::new();

        // Explicit DFS frames: (node, next edge position).
        let mut frames: Vec<(usize, usize)> = Vec::new();

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }
            frames.push((start, 0));
            index[start] = next_index;
            lowlink[start] = next_index;
            next_index += 1;
            stack.push(start);
            on_stack[start] = true;

            loop {
                let Some(&(node, edge_pos)) = frames.last() else {
                    break;
                };
                if edge_pos < self.edges[node].len() {
                    if let Some(frame) = frames.last_mut() {
                        frame.1 += 1;
                    }
                    let target = self.edges[node][edge_pos];
                    if index[target] == UNVISITED {
                        index[target] = next_index;
                        lowlink[target] = next_index;
                        next_index += 1;
                        stack.push(target);
                        on_stack[target] = true;
                        frames.push((target, 0));
                    } else if on_stack[target] {
                        lowlink[node] = lowlink[node].min(index[target]);
                    }
                } else {
                    frames.pop();
                    if let Some(&(parent, _)) = frames.last() {
                        lowlink[parent] = lowlink[parent].min(lowlink[node]);
                    }
                    if lowlink[node] == index[node] {
                        let mut component = Vec::new();
                        while let Some(member) = stack.pop() {
                            on_stack[member] = false;
                            component.push(member);
                            if member == node {
                                break;
                            }
                        }
                        components.push(component);
                    }
                }
            }
        }
        components
    }
}

#[cfg(test)]
#[path = "../tests/cycle_unit_tests.rs"]
mod tests;
