use std::{any::type_name, collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    dependency_graph::DependencyGraph,
    errors::RequireError,
    levels::Levels,
    types::{Injectable, Instance},
};

/// Container holding all initiated services by name
#[derive(Clone)]
pub struct DiContainer(pub Arc<DiContainerInner>);
pub struct DiContainerInner {
    instances: HashMap<String, Instance>,
    graph: DependencyGraph,
    levels: Levels,
}
impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("DiContainer");
        for name in self.names() {
            if let Some(instance) = self.get(name) {
                map.field(name, &instance.info.type_name);
            }
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(
        instances: HashMap<String, Instance>,
        graph: DependencyGraph,
        levels: Levels,
    ) -> Self {
        Self(Arc::new(DiContainerInner {
            instances,
            graph,
            levels,
        }))
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.0.instances.get(name)
    }

    /// Attempts to get the service `name` as `T`
    pub fn require<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        let instance = self
            .get(name)
            .ok_or_else(|| RequireError::Missing(name.to_string()))?;

        instance
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                name: name.to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.instances.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.instances.is_empty()
    }

    /// Names of all built services, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.graph.names().filter(|name| self.contains(name))
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }

    pub fn levels(&self) -> &Levels {
        &self.0.levels
    }
}
