use std::{collections::HashMap, fmt::Debug, sync::Arc};

use crate::{
    errors::ConstructorNotFound,
    factories::{Constructible, Constructor},
    types::Instance,
};

/// What a `module` / `class` reference resolves to
#[derive(Clone)]
pub enum Symbol {
    /// Something that can be called with arguments
    Constructor(Constructor),
    /// A plain value, only usable by `static` services
    Value(Instance),
}
impl Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Constructor(_) => f.write_str("Symbol::Constructor"),
            Symbol::Value(instance) => f.debug_tuple("Symbol::Value").field(instance).finish(),
        }
    }
}

/// Looks up constructible symbols by name
///
/// Called once per service. Implementations must be safe for concurrent lookups,
/// as all services of a level are built at the same time.
pub trait ConstructorRegistry: Send + Sync {
    fn lookup(&self, module: &str, symbol: Option<&str>) -> Result<Symbol, ConstructorNotFound>;
}

impl<R: ConstructorRegistry + ?Sized> ConstructorRegistry for Arc<R> {
    fn lookup(&self, module: &str, symbol: Option<&str>) -> Result<Symbol, ConstructorNotFound> {
        (**self).lookup(module, symbol)
    }
}

/// Registry backed by a fixed table of symbols
#[derive(Clone, Default)]
pub struct StaticRegistry {
    symbols: HashMap<(String, Option<String>), Symbol>,
}
impl Debug for StaticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for (module, symbol) in self.symbols.keys() {
            match symbol {
                Some(symbol) => list.entry(&format_args!("{module}.{symbol}")),
                None => list.entry(module),
            };
        }
        list.finish()
    }
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `module.class`
    pub fn add_constructor<C: Constructible>(
        mut self,
        module: impl Into<String>,
        class: impl Into<String>,
        constructor: C,
    ) -> Self {
        self.symbols.insert(
            (module.into(), Some(class.into())),
            Symbol::Constructor(Arc::new(constructor)),
        );
        self
    }

    /// Registers a plain value for `module.symbol`, or for the module itself if `symbol` is `None`
    pub fn add_symbol(
        mut self,
        module: impl Into<String>,
        symbol: Option<&str>,
        value: Instance,
    ) -> Self {
        self.symbols.insert(
            (module.into(), symbol.map(str::to_string)),
            Symbol::Value(value),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl ConstructorRegistry for StaticRegistry {
    fn lookup(&self, module: &str, symbol: Option<&str>) -> Result<Symbol, ConstructorNotFound> {
        let key = (module.to_string(), symbol.map(str::to_string));
        self.symbols
            .get(&key)
            .cloned()
            .ok_or_else(|| ConstructorNotFound {
                module: key.0,
                symbol: key.1,
            })
    }
}
