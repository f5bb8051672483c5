use std::{collections::HashSet, fmt::Display};

use crate::dependency_graph::{DependencyGraph, DependencyGraphError};

/// Index of a node inside its [`DependencyTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    value: String,
    children: Vec<NodeId>,
}
impl TreeNode {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Services as trees of their dependencies
///
/// Each head is a service, its children are the services it depends on.
/// A service shared by several consumers shows up once below each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    nodes: Vec<TreeNode>,
    heads: Vec<NodeId>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// One head per service nothing else depends on, in declaration order
    pub fn from_graph(graph: &DependencyGraph) -> Result<Self, DependencyGraphError> {
        Self::for_roots(graph, Self::heads_of(graph))
    }

    /// Heads are exactly the given roots
    pub fn for_roots<'a>(
        graph: &DependencyGraph,
        roots: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, DependencyGraphError> {
        // Expanding a cycle would never end
        graph.check()?;

        let mut tree = Self::new();
        for root in roots {
            if !graph.contains(root) {
                return Err(DependencyGraphError::Missing(root.to_string()));
            }
            let head = tree.expand(graph, root);
            tree.add_head(head);
        }

        Ok(tree)
    }

    /// Names nothing else in the graph depends on, in declaration order
    pub fn heads_of(graph: &DependencyGraph) -> Vec<&str> {
        let consumed: HashSet<&str> = graph
            .names()
            .flat_map(|name| graph.dependency_iter(name))
            .map(String::as_str)
            .collect();

        graph
            .names()
            .filter(|name| !consumed.contains(name))
            .collect()
    }

    /// Walks the trees below `roots` without building them
    ///
    /// Yields the same order as [`DependencyTree::post_order`] with every name
    /// after its first occurrence left out. A subtree which was walked once is
    /// not entered again, so shared dependencies cost nothing extra.
    pub fn walk<'g>(
        graph: &'g DependencyGraph,
        roots: impl IntoIterator<Item = &'g str>,
    ) -> Result<Vec<&'g str>, DependencyGraphError> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(graph.len());

        for root in roots {
            if !graph.contains(root) {
                return Err(DependencyGraphError::Missing(root.to_string()));
            }
            if !visited.insert(root) {
                continue;
            }

            let mut stack = vec![(root, graph.dependency_iter(root))];
            while let Some((_, dependencies)) = stack.last_mut() {
                match dependencies.next() {
                    Some(dependency) => {
                        let dependency = dependency.as_str();
                        if visited.insert(dependency) {
                            stack.push((dependency, graph.dependency_iter(dependency)));
                        }
                    }
                    None => {
                        if let Some((done, _)) = stack.pop() {
                            order.push(done);
                        }
                    }
                }
            }
        }

        Ok(order)
    }

    fn expand(&mut self, graph: &DependencyGraph, name: &str) -> NodeId {
        let head = self.add_node(name);
        let mut pending = vec![(head, name)];
        while let Some((node, name)) = pending.pop() {
            for dependency in graph.dependency_iter(name) {
                let child = self.add_node(dependency.as_str());
                self.add_child(node, child);
                pending.push((child, dependency.as_str()));
            }
        }
        head
    }

    pub fn add_node(&mut self, value: impl Into<String>) -> NodeId {
        self.nodes.push(TreeNode {
            value: value.into(),
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn add_children(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        self.nodes[parent.0].children.extend(children);
    }

    pub fn add_head(&mut self, head: NodeId) {
        self.heads.push(head);
    }

    pub fn heads(&self) -> &[NodeId] {
        &self.heads
    }

    /// Names of all heads, in order
    pub fn head_values(&self) -> Vec<&str> {
        self.heads.iter().map(|head| self.node(*head).value()).collect()
    }

    pub fn head_count(&self) -> usize {
        self.heads.len()
    }

    /// # Panics
    /// If the id belongs to another tree
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Every node value, dependencies before their consumer
    ///
    /// Shared dependencies are yielded once per occurrence.
    pub fn post_order(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for head in &self.heads {
            // Node and the index of its next child
            let mut stack = vec![(*head, 0)];
            while let Some((id, next)) = stack.last_mut() {
                let node = &self.nodes[id.0];
                match node.children.get(*next) {
                    Some(child) => {
                        *next += 1;
                        stack.push((*child, 0));
                    }
                    None => {
                        order.push(node.value.as_str());
                        stack.pop();
                    }
                }
            }
        }
        order
    }
}

enum Step {
    Node(NodeId),
    Text(&'static str),
}

impl Display for DependencyTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, head) in self.heads.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str("H")?;

            let mut steps = vec![Step::Node(*head)];
            while let Some(step) = steps.pop() {
                let id = match step {
                    Step::Text(text) => {
                        f.write_str(text)?;
                        continue;
                    }
                    Step::Node(id) => id,
                };

                let node = self.node(id);
                if node.children.is_empty() {
                    write!(f, "({})", node.value)?;
                    continue;
                }

                write!(f, "({}, [", node.value)?;
                steps.push(Step::Text("])"));
                for (index, child) in node.children.iter().enumerate().rev() {
                    steps.push(Step::Node(*child));
                    if index > 0 {
                        steps.push(Step::Text(", "));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> DependencyGraph {
        DependencyGraph::from_value(&value).unwrap()
    }

    #[test]
    fn test_manual_tree() {
        let mut tree = DependencyTree::new();
        let a = tree.add_node("a");
        let b = tree.add_node("b");
        let c = tree.add_node("c");
        let shared_b = tree.add_node("b");
        tree.add_child(c, shared_b);
        tree.add_children(a, [b, c]);
        tree.add_head(a);
        let d = tree.add_node("d");
        tree.add_head(d);

        assert_eq!(tree.head_count(), 2);
        assert_eq!(tree.head_values(), ["a", "d"]);
        assert_eq!(tree.node(a).child_count(), 2);
        assert_eq!(tree.to_string(), "H(a, [(b), (c, [(b)])]), H(d)");
        assert_eq!(tree.post_order(), ["b", "b", "c", "a", "d"]);
    }

    #[test]
    fn test_from_graph_heads() {
        let graph = graph(json!({
            "a": ["b", "c"],
            "b": [],
            "c": ["b"],
            "d": [],
        }));
        let tree = DependencyTree::from_graph(&graph).unwrap();

        assert_eq!(tree.head_values(), ["a", "d"]);
        assert_eq!(tree.to_string(), "H(a, [(b), (c, [(b)])]), H(d)");
    }

    #[test]
    fn test_post_order_puts_dependencies_first() {
        let graph = graph(json!({
            "app": ["db", "log"],
            "db": ["log"],
            "log": [],
        }));
        let tree = DependencyTree::from_graph(&graph).unwrap();
        let order = tree.post_order();

        let position = |name: &str| order.iter().position(|entry| *entry == name).unwrap();
        assert!(position("log") < position("db"));
        assert!(position("db") < position("app"));
        assert_eq!(order.last(), Some(&"app"));
    }

    #[test]
    fn test_for_roots() {
        let graph = graph(json!({
            "a": ["b"],
            "b": [],
            "c": ["d"],
            "d": [],
        }));
        let tree = DependencyTree::for_roots(&graph, ["c"]).unwrap();
        assert_eq!(tree.to_string(), "H(c, [(d)])");

        assert_eq!(
            DependencyTree::for_roots(&graph, ["ghost"]),
            Err(DependencyGraphError::Missing("ghost".to_string()))
        );
    }

    #[test]
    fn test_cyclic_graph_is_rejected() {
        let graph = graph(json!({ "a": ["b"], "b": ["a"], "c": ["a"] }));
        assert!(matches!(
            DependencyTree::from_graph(&graph),
            Err(DependencyGraphError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_walk_skips_walked_subtrees() {
        let graph = graph(json!({
            "a": ["b", "c"],
            "b": [],
            "c": ["b"],
            "d": [],
        }));
        let tree = DependencyTree::from_graph(&graph).unwrap();

        let mut expected = Vec::new();
        for name in tree.post_order() {
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        let walked = DependencyTree::walk(&graph, DependencyTree::heads_of(&graph)).unwrap();
        assert_eq!(walked, expected);
        assert_eq!(walked, ["b", "c", "a", "d"]);

        assert_eq!(
            DependencyTree::walk(&graph, ["ghost"]),
            Err(DependencyGraphError::Missing("ghost".to_string()))
        );
    }

    #[test]
    fn test_walk_of_a_ladder() {
        // Every rung depends on both nodes of the rung below, the expanded
        // trees would double in size with each rung
        let mut graph = DependencyGraph::new();
        graph.add("x0", Vec::<String>::new()).unwrap();
        graph.add("y0", Vec::<String>::new()).unwrap();
        for rung in 1..100 {
            let below = [format!("x{}", rung - 1), format!("y{}", rung - 1)];
            graph.add(format!("x{rung}"), below.clone()).unwrap();
            graph.add(format!("y{rung}"), below).unwrap();
        }

        let heads = DependencyTree::heads_of(&graph);
        assert_eq!(heads, ["x99", "y99"]);

        let walked = DependencyTree::walk(&graph, heads).unwrap();
        assert_eq!(walked.len(), 200);
        assert_eq!(&walked[..2], ["x0", "y0"]);
        assert_eq!(walked.last(), Some(&"y99"));
    }

    #[test]
    fn test_long_chain_tree() {
        let mut graph = DependencyGraph::new();
        for index in 0..20_000 {
            graph.add(format!("s{index}"), [format!("s{}", index + 1)]).unwrap();
        }
        graph.add("s20000", Vec::<String>::new()).unwrap();

        let tree = DependencyTree::from_graph(&graph).unwrap();
        assert_eq!(tree.head_values(), ["s0"]);

        let order = tree.post_order();
        assert_eq!(order.len(), 20_001);
        assert_eq!(order.first(), Some(&"s20000"));
        assert_eq!(order.last(), Some(&"s0"));
        assert!(tree.to_string().ends_with(&"])".repeat(20_000)));
    }

    #[test]
    fn test_empty_tree() {
        let tree = DependencyTree::from_graph(&DependencyGraph::new()).unwrap();
        assert_eq!(tree.head_count(), 0);
        assert_eq!(tree.to_string(), "");
        assert!(tree.post_order().is_empty());
    }
}
