use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
    thread::{self, sleep},
    time::Duration,
};

use futures::{stream::FuturesUnordered, FutureExt, StreamExt};
use futures_channel::oneshot;
use weave_config::{ScalarProvider, ServiceDefinition};

use crate::{
    arguments::CallArgs,
    builder::BuildOrder,
    container::DiContainer,
    dependency_graph::{DependencyGraph, DependencyGraphError},
    errors::InitError,
    reference::ReferenceResolver,
    registry::{ConstructorRegistry, Symbol},
    tree::DependencyTree,
    types::Instance,
};

/// Initiates the DiContainer
pub(crate) struct DiInitiator {
    registry: Arc<dyn ConstructorRegistry>,
    scalars: ScalarProvider,

    /// All produced instances, each name is written once
    instances: HashMap<String, Instance>,
}
impl DiInitiator {
    pub(crate) fn new(registry: Arc<dyn ConstructorRegistry>, scalars: ScalarProvider) -> Self {
        DiInitiator {
            registry,
            scalars,
            instances: HashMap::new(),
        }
    }

    pub async fn initiate(
        mut self,
        registered_definitions: Vec<(String, ServiceDefinition)>,
        order: BuildOrder,
        timeout: Option<Duration>,
    ) -> Result<DiContainer, InitError> {
        for (name, definition) in &registered_definitions {
            definition.validate(name)?;
        }

        // Build and check Graph
        let graph = DependencyGraph::from_definitions(
            registered_definitions
                .iter()
                .map(|(name, definition)| (name.as_str(), definition)),
        )?;
        let levels = graph.solve()?.into_levels();
        graph.check_missing()?;

        // If we have a timeout - spawn a thread to signal once it's done
        let (timeout_tx, mut timeout_rx) = oneshot::channel::<()>();
        // Without a timeout the sender is kept alive, so the receiver never completes
        let _pending_timeout = match timeout {
            Some(timeout) => {
                // We don't join the thread - it will just die after the timeout
                thread::spawn(move || {
                    sleep(timeout);
                    let _ = timeout_tx.send(());
                });
                None
            }
            None => Some(timeout_tx),
        };

        let definitions: HashMap<&str, &ServiceDefinition> = registered_definitions
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
            .collect();

        tracing::debug!(
            "Initializing {} services in {} levels",
            definitions.len(),
            levels.len()
        );

        match order {
            BuildOrder::Levels => {
                for (index, level) in levels.iter().enumerate() {
                    tracing::debug!(
                        "Building level {} of {} [{} services]",
                        index + 1,
                        levels.len(),
                        level.len()
                    );
                    let built = self.build_level(level, &definitions, &mut timeout_rx).await?;
                    for (name, instance) in built {
                        self.record(name, instance)?;
                    }
                }
            }
            BuildOrder::Tree { roots } => {
                let heads: Vec<&str> = match &roots {
                    Some(roots) => roots.iter().map(String::as_str).collect(),
                    None => DependencyTree::heads_of(&graph),
                };
                tracing::debug!("Building {} dependency trees", heads.len());

                for name in DependencyTree::walk(&graph, heads)? {
                    let instance = self.build_one(name, &definitions, &mut timeout_rx).await?;
                    self.record(name, instance)?;
                }
            }
        }

        tracing::debug!("All {} services are built", self.instances.len());

        Ok(DiContainer::new(self.instances, graph, levels))
    }

    /// Builds all services of one level at the same time
    ///
    /// Nothing is recorded here, the level only reads the instances of earlier levels.
    async fn build_level<'l>(
        &self,
        level: &'l [String],
        definitions: &HashMap<&str, &ServiceDefinition>,
        mut timeout: &mut oneshot::Receiver<()>,
    ) -> Result<Vec<(&'l str, Instance)>, InitError> {
        let run = Run {
            registry: &*self.registry,
            scalars: &self.scalars,
            instances: &self.instances,
        };
        let run = &run;

        let mut constructions: FuturesUnordered<_> = level
            .iter()
            .map(|name| async move {
                let definition = definition_of(definitions, name)?;
                let instance = run.construct(name, definition).await?;
                Ok::<_, InitError>((name.as_str(), instance))
            })
            .collect();

        let mut built = Vec::with_capacity(level.len());
        loop {
            let left = constructions.len();
            tracing::debug!(
                "Waiting for services to finish [{} of {} complete]",
                level.len() - left,
                level.len()
            );

            futures::select! {
                result = constructions.next() => match result {
                    Some(Ok(done)) => built.push(done),
                    Some(Err(error)) => {
                        // If one service fails - abort DI
                        tracing::error!("Initiation aborted: {error}");
                        return Err(error);
                    }
                    None => break,
                },
                _ = timeout => {
                    return Err(InitError::Timeout)
                }
            }
        }

        Ok(built)
    }

    async fn build_one(
        &self,
        name: &str,
        definitions: &HashMap<&str, &ServiceDefinition>,
        mut timeout: &mut oneshot::Receiver<()>,
    ) -> Result<Instance, InitError> {
        let run = Run {
            registry: &*self.registry,
            scalars: &self.scalars,
            instances: &self.instances,
        };

        let definition = definition_of(definitions, name)?;
        let construction = run.construct(name, definition).fuse();
        futures::pin_mut!(construction);

        futures::select! {
            result = construction => result.inspect_err(|error| {
                tracing::error!("Initiation aborted: {error}");
            }),
            _ = timeout => Err(InitError::Timeout),
        }
    }

    fn record(&mut self, name: &str, instance: Instance) -> Result<(), InitError> {
        match self.instances.entry(name.to_string()) {
            Entry::Occupied(_) => Err(InitError::AlreadyInstantiated(name.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(instance);
                Ok(())
            }
        }
    }
}

fn definition_of<'d>(
    definitions: &HashMap<&str, &'d ServiceDefinition>,
    name: &str,
) -> Result<&'d ServiceDefinition, InitError> {
    definitions
        .get(name)
        .copied()
        .ok_or_else(|| DependencyGraphError::Missing(name.to_string()).into())
}

/// Everything one service construction reads
struct Run<'r> {
    registry: &'r dyn ConstructorRegistry,
    scalars: &'r ScalarProvider,
    instances: &'r HashMap<String, Instance>,
}
impl Run<'_> {
    async fn construct(
        &self,
        name: &str,
        definition: &ServiceDefinition,
    ) -> Result<Instance, InitError> {
        let resolver = ReferenceResolver::new(self.scalars, self.instances);
        let unresolvable = |source| InitError::Reference {
            component: name.to_string(),
            source,
        };

        let args = resolver
            .resolve_call(&definition.args, &definition.kwargs)
            .map_err(unresolvable)?;

        let symbol = self
            .registry
            .lookup(definition.module_name(), definition.class.as_deref())
            .map_err(|source| InitError::MissingConstructor {
                component: name.to_string(),
                source,
            })?;

        let mut instance = match (definition.is_static, symbol) {
            (true, Symbol::Value(value)) => value,
            (true, Symbol::Constructor(constructor)) => Instance::new(constructor),
            (false, Symbol::Value(_)) => {
                return Err(InitError::NotConstructible {
                    component: name.to_string(),
                })
            }
            (false, Symbol::Constructor(constructor)) => Box::into_pin(constructor.construct(args))
                .await
                .map_err(|error| InitError::ConstructionFailed {
                    component: name.to_string(),
                    error: Arc::new(error),
                })?,
        };

        if let Some(method) = &definition.factory_method {
            let args = resolver
                .resolve_call(&definition.factory_args, &definition.factory_kwargs)
                .map_err(unresolvable)?;

            instance = invoke(name, &instance, method, args)?.ok_or_else(|| {
                InitError::FactoryReturnedNothing {
                    component: name.to_string(),
                    method: method.clone(),
                }
            })?;
        }

        for call in &definition.calls {
            let method = call.method_name(name)?;
            let args = resolver
                .resolve_call(&call.args, &call.kwargs)
                .map_err(unresolvable)?;

            invoke(name, &instance, method, args)?;
        }

        tracing::debug!("Constructed '{name}' ({})", instance.info);
        Ok(instance)
    }
}

fn invoke(
    component: &str,
    instance: &Instance,
    method: &str,
    args: CallArgs,
) -> Result<Option<Instance>, InitError> {
    let methods = instance.methods().ok_or_else(|| InitError::NotInvocable {
        component: component.to_string(),
        method: method.to_string(),
        type_name: instance.info.type_name,
    })?;

    methods
        .invoke(method, args)
        .map_err(|error| InitError::CallFailed {
            component: component.to_string(),
            method: method.to_string(),
            error: Arc::new(error),
        })
}
