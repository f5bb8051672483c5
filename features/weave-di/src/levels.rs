use std::collections::{BTreeSet, HashMap};

use crate::dependency_graph::{DependencyGraph, DependencyIter};

/// Services grouped by construction level
///
/// Level 0 holds every service without dependencies, a service at level `k`
/// only depends on services at levels below `k`.
/// Within a level names keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels(Vec<Vec<String>>);

impl Levels {
    /// Assigns each name of the graph to its longest-path depth
    ///
    /// Dependencies which are not part of the graph are ignored.
    /// The graph should have passed [`DependencyGraph::check`].
    pub fn assign(graph: &DependencyGraph) -> Self {
        let mut depths = HashMap::new();
        let mut levels: Vec<Vec<String>> = Vec::new();

        for name in graph.names() {
            let depth = depth_of(graph, &mut depths, name);
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(name.to_string());
        }

        return Levels(levels);

        struct Frame<'g> {
            name: &'g str,
            dependencies: DependencyIter<'g>,
            depth: usize,
        }

        fn depth_of<'g>(
            graph: &'g DependencyGraph,
            depths: &mut HashMap<&'g str, usize>,
            name: &'g str,
        ) -> usize {
            if let Some(depth) = depths.get(name) {
                return *depth;
            }

            let frame = |name: &'g str| Frame {
                name,
                dependencies: graph.dependency_iter(name),
                depth: 0,
            };
            // Provisional entries keep a cyclic graph from walking forever
            depths.insert(name, 0);
            let mut stack = vec![frame(name)];

            while let Some(top) = stack.last_mut() {
                match top.dependencies.next() {
                    Some(dependency) if !graph.contains(dependency) => {}
                    Some(dependency) => match depths.get(dependency.as_str()) {
                        Some(depth) => top.depth = top.depth.max(depth + 1),
                        None => {
                            depths.insert(dependency.as_str(), 0);
                            stack.push(frame(dependency.as_str()));
                        }
                    },
                    None => {
                        let Some(done) = stack.pop() else { break };
                        depths.insert(done.name, done.depth);
                        if let Some(parent) = stack.last_mut() {
                            parent.depth = parent.depth.max(done.depth + 1);
                        }
                    }
                }
            }

            depths.get(name).copied().unwrap_or_default()
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, level: usize) -> Option<&[String]> {
        self.0.get(level).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.0.iter().map(Vec::as_slice)
    }

    /// Level the service was assigned to
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|level| level.iter().any(|entry| entry == name))
    }

    pub fn into_inner(self) -> Vec<Vec<String>> {
        self.0
    }
}

impl IntoIterator for Levels {
    type Item = Vec<String>;
    type IntoIter = std::vec::IntoIter<Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A checked graph together with its levels
///
/// Works as a cursor, [`Solution::free`] returns the services which can be
/// built at the current level.
#[derive(Debug, Clone)]
pub struct Solution<'g> {
    graph: &'g DependencyGraph,
    levels: Levels,
    current: usize,
}

impl<'g> Solution<'g> {
    pub(crate) fn new(graph: &'g DependencyGraph, levels: Levels) -> Self {
        Self {
            graph,
            levels,
            current: 0,
        }
    }

    /// Services at the current level, empty once past the last level
    pub fn free(&self) -> &[String] {
        self.levels.get(self.current).unwrap_or_default()
    }

    /// Moves to the next level
    pub fn forward(&mut self) -> &mut Self {
        if self.current < self.levels.len() {
            self.current += 1;
        }
        self
    }

    /// Moves to the previous level, stays at the first one
    pub fn backward(&mut self) -> &mut Self {
        self.current = self.current.saturating_sub(1);
        self
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn dependencies(&self, name: &str) -> Option<&'g BTreeSet<String>> {
        self.graph.dependencies(name)
    }

    pub fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn into_levels(self) -> Levels {
        self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn levels(value: Value) -> Vec<Vec<String>> {
        DependencyGraph::from_value(&value)
            .unwrap()
            .levels()
            .into_inner()
    }

    #[test]
    fn test_simple_levels() {
        let levels = levels(json!({ "a": ["b", "c"], "b": [], "c": ["b"] }));
        assert_eq!(levels, [vec!["b"], vec!["c"], vec!["a"]]);
    }

    #[test]
    fn test_levels_keep_declaration_order() {
        let levels = levels(json!({
            "a": ["b", "c"],
            "b": [],
            "c": ["b", "d"],
            "d": [],
            "e": ["d"],
        }));
        assert_eq!(levels, [vec!["b", "d"], vec!["c", "e"], vec!["a"]]);
    }

    #[test]
    fn test_uneven_depths() {
        // a depends on a deep chain and a leaf, it goes above the chain
        let levels = levels(json!({
            "a": ["leaf", "c3"],
            "c3": ["c2"],
            "c2": ["c1"],
            "c1": [],
            "leaf": [],
        }));
        assert_eq!(
            levels,
            [vec!["c1", "leaf"], vec!["c2"], vec!["c3"], vec!["a"]]
        );
    }

    #[test]
    fn test_missing_dependencies_do_not_count() {
        let levels = levels(json!({ "a": ["ghost"], "b": ["a"] }));
        assert_eq!(levels, [vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_levels_are_complete_and_ordered() {
        let graph = DependencyGraph::from_value(&json!({
            "app": ["db", "cache", "log"],
            "db": ["log", "config"],
            "cache": ["config"],
            "log": ["config"],
            "config": [],
            "metrics": ["log"],
        }))
        .unwrap();
        let levels = graph.levels();

        let mut seen: Vec<&str> = levels.iter().flatten().map(String::as_str).collect();
        seen.sort_unstable();
        let mut expected: Vec<&str> = graph.names().collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);

        for name in graph.names() {
            let level = levels.level_of(name).unwrap();
            for dependency in graph.dependencies(name).unwrap() {
                assert!(levels.level_of(dependency).unwrap() < level);
            }
        }
    }

    #[test]
    fn test_long_chain_levels() {
        // Declared top first, so the first name walks the whole chain
        let mut graph = DependencyGraph::new();
        for index in 0..20_000 {
            graph.add(format!("s{index}"), [format!("s{}", index + 1)]).unwrap();
        }
        graph.add("s20000", Vec::<String>::new()).unwrap();

        let levels = graph.levels();
        assert_eq!(levels.len(), 20_001);
        assert_eq!(levels.level_of("s20000"), Some(0));
        assert_eq!(levels.get(20_000), Some(&["s0".to_string()][..]));
    }

    #[test]
    fn test_solution_walk() {
        let graph = DependencyGraph::from_value(&json!({
            "a": ["b", "c"],
            "b": [],
            "c": ["b", "d"],
            "d": [],
            "e": ["d"],
        }))
        .unwrap();
        let mut solution = graph.solve().unwrap();

        assert_eq!(solution.num_levels(), 3);
        assert_eq!(solution.current_level(), 0);
        assert_eq!(solution.free(), ["b", "d"]);

        solution.forward();
        assert_eq!(solution.free(), ["c", "e"]);
        assert_eq!(
            solution.dependencies("c").unwrap().iter().collect::<Vec<_>>(),
            ["b", "d"]
        );

        solution.forward();
        assert_eq!(solution.free(), ["a"]);

        solution.forward();
        assert!(solution.free().is_empty());
        solution.forward();
        assert_eq!(solution.current_level(), 3);

        solution.backward().backward().backward().backward();
        assert_eq!(solution.current_level(), 0);
        assert_eq!(solution.free(), ["b", "d"]);
    }

    #[test]
    fn test_solve_rejects_cycles() {
        let graph = DependencyGraph::from_value(&json!({ "a": ["b"], "b": ["a"] })).unwrap();
        assert!(graph.solve().is_err());
    }
}
