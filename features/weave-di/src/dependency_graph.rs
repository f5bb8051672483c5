use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;
use weave_config::ServiceDefinition;

use crate::levels::{Levels, Solution};

/// Graph of all services
/// Used to check circular dependencies and to order construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    map: HashMap<String, DependencyGraphEntry>,
    /// Declaration order, used wherever ties need breaking
    order: Vec<String>,
}
impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the graph from service definitions, a service depends on every
    /// `@name` in its arguments
    pub fn from_definitions<'a>(
        definitions: impl IntoIterator<Item = (&'a str, &'a ServiceDefinition)>,
    ) -> Result<Self, DependencyGraphError> {
        let mut graph = Self::new();
        for (name, definition) in definitions {
            graph.add(name, definition.dependencies())?;
        }

        Ok(graph)
    }

    /// Reads a mapping of name to dependency names
    ///
    /// A single string stands for one dependency, `null` for none.
    pub fn from_value(value: &Value) -> Result<Self, DependencyGraphError> {
        let Value::Object(nodes) = value else {
            return Err(DependencyGraphError::Validation(format!(
                "expected a mapping of name to dependencies, got {}",
                kind(value)
            )));
        };

        let mut graph = Self::new();
        for (name, dependencies) in nodes {
            let dependencies = match dependencies {
                Value::Null => Vec::new(),
                Value::String(single) => vec![single.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            DependencyGraphError::Validation(format!(
                                "dependencies of '{name}' must be names, got {}",
                                kind(item)
                            ))
                        })
                    })
                    .collect::<Result<_, _>>()?,
                other => {
                    return Err(DependencyGraphError::Validation(format!(
                        "dependencies of '{name}' must be a sequence of names, got {}",
                        kind(other)
                    )))
                }
            };

            graph.add(name.clone(), dependencies)?;
        }

        Ok(graph)
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), DependencyGraphError> {
        let name = name.into();
        if self.map.contains_key(&name) {
            return Err(DependencyGraphError::Duplicate(name));
        }

        let entry = DependencyGraphEntry {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        };
        self.order.push(name.clone());
        self.map.insert(name, entry);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// All names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Direct dependencies of `name`
    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.map.get(name).map(|entry| &entry.dependencies)
    }

    /// Direct dependencies of `name`, nothing for unknown names
    pub(crate) fn dependency_iter(&self, name: &str) -> DependencyIter<'_> {
        self.dependencies(name).into_iter().flatten()
    }

    /// Names which directly depend on `name`, in declaration order
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.names()
            .filter(|candidate| {
                self.dependencies(candidate)
                    .is_some_and(|dependencies| dependencies.contains(name))
            })
            .collect()
    }

    /// Checks for circular dependencies
    ///
    /// Returns the first cycle found, walking names in declaration order.
    pub fn check(&self) -> Result<(), DependencyGraphError> {
        let mut checked = HashSet::new();
        for name in self.names() {
            if !checked.insert(name) {
                continue;
            }

            // The chain keeps the walk order for the error path, the set answers lookups
            let mut dependency_chain = vec![name];
            let mut on_chain = HashSet::from([name]);
            let mut stack = vec![self.dependency_iter(name)];

            while let Some(dependencies) = stack.last_mut() {
                let Some(dependency) = dependencies.next() else {
                    stack.pop();
                    if let Some(done) = dependency_chain.pop() {
                        on_chain.remove(done);
                    }
                    continue;
                };
                let dependency = dependency.as_str();

                // Circular Dependency Check
                if on_chain.contains(dependency) {
                    let start = dependency_chain
                        .iter()
                        .position(|entry| *entry == dependency)
                        .unwrap_or_default();
                    let mut path: Vec<String> = dependency_chain[start..]
                        .iter()
                        .map(|entry| entry.to_string())
                        .collect();
                    path.push(dependency.to_string()); // Add current so the path is closed

                    return Err(DependencyGraphError::CircularDependency { path });
                }

                // Shared dependency, already walked from elsewhere
                if !checked.insert(dependency) {
                    continue;
                }

                // Unknown names are reported by `check_missing`
                if !self.contains(dependency) {
                    continue;
                }

                dependency_chain.push(dependency);
                on_chain.insert(dependency);
                stack.push(self.dependency_iter(dependency));
            }
        }

        Ok(())
    }

    /// Checks that every dependency is itself part of the graph
    pub fn check_missing(&self) -> Result<(), DependencyGraphError> {
        for name in self.names() {
            for dependency in self.dependency_iter(name) {
                if !self.contains(dependency) {
                    return Err(DependencyGraphError::MissingDependency {
                        dependency: dependency.clone(),
                        required_by: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Groups the names into construction levels
    ///
    /// The graph must be acyclic, see [`DependencyGraph::check`].
    pub fn levels(&self) -> Levels {
        Levels::assign(self)
    }

    /// Checks the graph and returns a cursor over its levels
    pub fn solve(&self) -> Result<Solution<'_>, DependencyGraphError> {
        self.check()?;
        Ok(Solution::new(self, self.levels()))
    }
}

pub(crate) type DependencyIter<'g> =
    std::iter::Flatten<std::option::IntoIter<&'g BTreeSet<String>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct DependencyGraphEntry {
    dependencies: BTreeSet<String>,
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("A service has been registered twice: '{0}'")]
    Duplicate(String),
    #[error("Malformed dependency graph: {0}")]
    Validation(String),
    #[error("'{required_by}' needs '{dependency}' but it is not defined")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("'{0}' is not part of the dependency graph")]
    Missing(String),
    #[error("Circular dependency detected: {}", .path.join("->"))]
    CircularDependency { path: Vec<String> },
}
