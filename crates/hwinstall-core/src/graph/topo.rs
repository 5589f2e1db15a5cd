//! Node arena and iterative topological ordering.
//!
//! Names are interned into dense indices; edges are adjacency lists over
//! those indices. Ordering is a depth-first post-order driven by an
//! explicit stack, so deep chains never hit recursion limits and a cycle
//! is reported with the exact edge that closes it.

use indexmap::IndexMap;

use crate::errors::{ConfigResult, ConfigurationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Interned component names with dependency edges.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    nodes: IndexMap<String, Vec<usize>>,
}

impl NodeArena {
    /// Index for `name`, adding a node with no edges if it is new.
    pub(crate) fn intern(&mut self, name: &str) -> usize {
        if let Some(index) = self.nodes.get_index_of(name) {
            return index;
        }
        self.nodes.insert_full(name.to_string(), Vec::new()).0
    }

    /// Record that `from` depends on `to`. Repeated edges are kept once.
    pub(crate) fn add_edge(&mut self, from: usize, to: usize) {
        if let Some((_, edges)) = self.nodes.get_index_mut(from)
            && !edges.contains(&to)
        {
            edges.push(to);
        }
    }

    #[cfg(test)]
    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.get_index_of(name)
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        self.nodes
            .get_index(index)
            .map_or("", |(name, _)| name.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Names `index` depends on, in declaration order.
    pub(crate) fn dependency_names(&self, index: usize) -> impl Iterator<Item = &str> {
        self.edges(index).iter().map(|&i| self.name(i))
    }

    fn edges(&self, index: usize) -> &[usize] {
        self.nodes
            .get_index(index)
            .map_or(&[], |(_, edges)| edges.as_slice())
    }

    /// Dependencies-first order of everything reachable from `roots`.
    ///
    /// Roots are visited in the given order and each node's dependencies
    /// in declaration order, so the result is deterministic.
    pub(crate) fn topo_order(&self, roots: &[usize]) -> ConfigResult<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        let mut order = Vec::new();

        for &root in roots {
            if marks[root] != Mark::Unvisited {
                continue;
            }

            // (node, index of the next edge to follow)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::InProgress;

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&child) = self.edges(node).get(frame.1) {
                    frame.1 += 1;
                    match marks[child] {
                        Mark::Unvisited => {
                            marks[child] = Mark::InProgress;
                            stack.push((child, 0));
                        }
                        Mark::InProgress => return Err(self.cycle_error(&stack, node, child)),
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                }
            }
        }

        Ok(order)
    }

    /// Order every node in the arena.
    pub(crate) fn topo_order_all(&self) -> ConfigResult<Vec<usize>> {
        let roots: Vec<usize> = (0..self.len()).collect();
        self.topo_order(&roots)
    }

    fn cycle_error(&self, stack: &[(usize, usize)], from: usize, to: usize) -> ConfigurationError {
        let start = stack.iter().position(|&(n, _)| n == to).unwrap_or(0);
        let mut path: Vec<String> = stack[start..]
            .iter()
            .map(|&(n, _)| self.name(n).to_string())
            .collect();
        path.push(self.name(to).to_string());

        ConfigurationError::Cycle {
            from: self.name(from).to_string(),
            to: self.name(to).to_string(),
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(edges: &[(&str, &str)]) -> NodeArena {
        let mut arena = NodeArena::default();
        for (from, to) in edges {
            let f = arena.intern(from);
            let t = arena.intern(to);
            arena.add_edge(f, t);
        }
        arena
    }

    fn names(arena: &NodeArena, order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| arena.name(i).to_string()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let a = arena(&[("app", "lib"), ("lib", "base"), ("app", "base")]);
        let root = a.index_of("app").unwrap();
        let order = a.topo_order(&[root]).unwrap();
        assert_eq!(names(&a, &order), vec!["base", "lib", "app"]);
    }

    #[test]
    fn test_only_reachable_nodes() {
        let a = arena(&[("x", "y"), ("z", "w")]);
        let order = a.topo_order(&[a.index_of("x").unwrap()]).unwrap();
        assert_eq!(names(&a, &order), vec!["y", "x"]);
    }

    #[test]
    fn test_cycle_reports_closing_edge() {
        let a = arena(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let err = a.topo_order(&[a.index_of("a").unwrap()]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::Cycle {
                from: "c".to_string(),
                to: "a".to_string(),
                path: vec![
                    "a".to_string(),
                    "b".to_string(),
                    "c".to_string(),
                    "a".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_self_edge_is_cycle() {
        let a = arena(&[("solo", "solo")]);
        let err = a.topo_order_all().unwrap_err();
        assert!(matches!(err, ConfigurationError::Cycle { ref from, ref to, .. } if from == "solo" && to == "solo"));
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut a = NodeArena::default();
        let mut prev = a.intern("n0");
        for i in 1..50_000 {
            let next = a.intern(&format!("n{i}"));
            a.add_edge(prev, next);
            prev = next;
        }
        let order = a.topo_order(&[0]).unwrap();
        assert_eq!(order.len(), 50_000);
        assert_eq!(a.name(order[0]), "n49999");
        assert_eq!(a.name(*order.last().unwrap()), "n0");
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let a = arena(&[("a", "b"), ("a", "b")]);
        assert_eq!(a.edges(a.index_of("a").unwrap()).len(), 1);
    }
}
