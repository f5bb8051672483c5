use std::{sync::Arc, time::Duration};

use serde_json::Value;
use weave_config::{Definitions, ScalarProvider, ServiceDefinition};

use crate::{
    container::DiContainer, errors::InitError, initiator::DiInitiator,
    registry::ConstructorRegistry,
};

/// The order services are constructed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuildOrder {
    /// Level by level, all services of a level at the same time
    #[default]
    Levels,
    /// One dependency tree after the other, dependencies first
    ///
    /// With `roots` only those services and what they depend on are built,
    /// otherwise every service nothing else depends on is a root.
    Tree { roots: Option<Vec<String>> },
}

/// Collects everything needed to build a service graph
///
/// 1. The registry resolving `module` / `class` references
/// 2. The service definitions
/// 3. The scalars referenced by `$name`
///
/// [`DiBuilder::build`] then checks the graph and constructs every service.
pub struct DiBuilder {
    pub(crate) registry: Arc<dyn ConstructorRegistry>,
    /// Registered definitions, in declaration order
    pub(crate) registered_definitions: Vec<(String, ServiceDefinition)>,
    pub(crate) scalars: ScalarProvider,
    pub(crate) order: BuildOrder,
}

impl DiBuilder {
    pub fn new(registry: impl ConstructorRegistry + 'static) -> Self {
        DiBuilder {
            registry: Arc::new(registry),
            registered_definitions: Vec::new(),
            scalars: ScalarProvider::initialize(),
            order: BuildOrder::default(),
        }
    }

    /// Reads a whole configuration
    ///
    /// ```json
    /// { "scalars": { "host": "localhost" }, "services": { "mailer": { "module": "app.mail", "class": "Mailer" } } }
    /// ```
    /// Both sections are optional.
    pub fn from_value(
        registry: impl ConstructorRegistry + 'static,
        config: &Value,
    ) -> Result<Self, InitError> {
        let mut builder = Self::new(registry);

        if let Some(scalars) = config.get("scalars") {
            builder = builder.with_scalars(ScalarProvider::from_value(scalars)?);
        }
        if let Some(services) = config.get("services") {
            builder = builder.add_definitions(Definitions::from_value(services)?);
        }

        Ok(builder)
    }
}
impl DiBuilder {
    pub fn add_definition(mut self, name: impl Into<String>, definition: ServiceDefinition) -> Self {
        self.registered_definitions.push((name.into(), definition));
        self
    }

    pub fn add_definitions(
        mut self,
        definitions: impl IntoIterator<Item = (impl Into<String>, ServiceDefinition)>,
    ) -> Self {
        self.registered_definitions.extend(
            definitions
                .into_iter()
                .map(|(name, definition)| (name.into(), definition)),
        );
        self
    }

    /// Sets the scalars, replacing earlier ones
    pub fn with_scalars(mut self, scalars: ScalarProvider) -> Self {
        self.scalars = scalars;
        self
    }

    pub fn order(mut self, order: BuildOrder) -> Self {
        self.order = order;
        self
    }

    pub async fn build(self) -> Result<DiContainer, InitError> {
        self.initiate(None).await
    }

    pub async fn build_timeout(self, timeout: Duration) -> Result<DiContainer, InitError> {
        self.initiate(Some(timeout)).await
    }

    async fn initiate(self, timeout: Option<Duration>) -> Result<DiContainer, InitError> {
        let DiBuilder {
            registry,
            registered_definitions,
            scalars,
            order,
        } = self;

        DiInitiator::new(registry, scalars)
            .initiate(registered_definitions, order, timeout)
            .await
    }
}
