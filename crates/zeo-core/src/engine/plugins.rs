use super::action::Action;
use super::cache::CachePlugin;
use crate::core::io::traits::{DumpFilter, LoadFilter};
use crate::core::models::kind::{KindCatalog, KindError, NodeKind};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("A {category} named '{name}' is already registered")]
    Duplicate { category: &'static str, name: String },
    #[error("No {category} named '{name}' is registered")]
    NotFound { category: &'static str, name: String },
    #[error("Invalid node kind: {0}")]
    Kind(#[from] KindError),
}

/// Something that contributes kinds, actions, filters or cache plugins.
pub trait Plugin {
    fn name(&self) -> &str;

    fn register(&self, builder: &mut PluginRegistryBuilder) -> Result<(), PluginError>;
}

/// Everything registered at startup, one map per category.
///
/// The registry is immutable once built; a session holds it for its whole
/// lifetime.
pub struct PluginRegistry {
    kinds: KindCatalog,
    actions: BTreeMap<String, Rc<dyn Action>>,
    load_filters: HashMap<String, Box<dyn LoadFilter>>,
    dump_filters: HashMap<String, Box<dyn DumpFilter>>,
    cache_plugins: BTreeMap<String, Rc<dyn CachePlugin>>,
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    pub fn kinds(&self) -> &KindCatalog {
        &self.kinds
    }

    pub fn kind(&self, name: &str) -> Result<Arc<NodeKind>, PluginError> {
        self.kinds.get(name).map_err(|_| PluginError::NotFound {
            category: "node kind",
            name: name.to_string(),
        })
    }

    pub fn action(&self, name: &str) -> Result<Rc<dyn Action>, PluginError> {
        self.actions
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound {
                category: "action",
                name: name.to_string(),
            })
    }

    /// Action names in sorted order.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Looks up the load filter for a file extension, ignoring case.
    pub fn load_filter(&self, extension: &str) -> Result<&dyn LoadFilter, PluginError> {
        self.load_filters
            .get(&extension.to_ascii_lowercase())
            .map(|f| f.as_ref())
            .ok_or_else(|| PluginError::NotFound {
                category: "load filter",
                name: extension.to_string(),
            })
    }

    pub fn dump_filter(&self, extension: &str) -> Result<&dyn DumpFilter, PluginError> {
        self.dump_filters
            .get(&extension.to_ascii_lowercase())
            .map(|f| f.as_ref())
            .ok_or_else(|| PluginError::NotFound {
                category: "dump filter",
                name: extension.to_string(),
            })
    }

    pub fn load_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.load_filters.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn dump_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.dump_filters.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn cache_plugin(&self, name: &str) -> Result<Rc<dyn CachePlugin>, PluginError> {
        self.cache_plugins
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound {
                category: "cache plugin",
                name: name.to_string(),
            })
    }

    pub fn cache_plugin_names(&self) -> impl Iterator<Item = &str> {
        self.cache_plugins.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kinds", &self.kinds.names().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("load_filters", &self.load_extensions())
            .field("dump_filters", &self.dump_extensions())
            .field("cache_plugins", &self.cache_plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registrations; every category rejects duplicate names.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    kinds: KindCatalog,
    actions: BTreeMap<String, Rc<dyn Action>>,
    load_filters: HashMap<String, Box<dyn LoadFilter>>,
    dump_filters: HashMap<String, Box<dyn DumpFilter>>,
    cache_plugins: BTreeMap<String, Rc<dyn CachePlugin>>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_kind(&mut self, kind: NodeKind) -> Result<&mut Self, PluginError> {
        let name = kind.name().to_string();
        self.kinds.insert(kind).map_err(|e| match e {
            KindError::DuplicateKind(_) => PluginError::Duplicate {
                category: "node kind",
                name,
            },
            other => PluginError::Kind(other),
        })?;
        Ok(self)
    }

    pub fn register_action(&mut self, action: Rc<dyn Action>) -> Result<&mut Self, PluginError> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            return Err(PluginError::Duplicate {
                category: "action",
                name,
            });
        }
        self.actions.insert(name, action);
        Ok(self)
    }

    /// Registers a load filter under each of `extensions`.
    pub fn register_load_filter<F>(
        &mut self,
        extensions: &[&str],
        make: impl Fn() -> F,
    ) -> Result<&mut Self, PluginError>
    where
        F: LoadFilter + 'static,
    {
        for ext in extensions {
            let ext = ext.to_ascii_lowercase();
            if self.load_filters.contains_key(&ext) {
                return Err(PluginError::Duplicate {
                    category: "load filter",
                    name: ext,
                });
            }
            self.load_filters.insert(ext, Box::new(make()));
        }
        Ok(self)
    }

    /// Registers a dump filter under each of `extensions`.
    pub fn register_dump_filter<F>(
        &mut self,
        extensions: &[&str],
        make: impl Fn() -> F,
    ) -> Result<&mut Self, PluginError>
    where
        F: DumpFilter + 'static,
    {
        for ext in extensions {
            let ext = ext.to_ascii_lowercase();
            if self.dump_filters.contains_key(&ext) {
                return Err(PluginError::Duplicate {
                    category: "dump filter",
                    name: ext,
                });
            }
            self.dump_filters.insert(ext, Box::new(make()));
        }
        Ok(self)
    }

    pub fn register_cache_plugin(
        &mut self,
        plugin: Rc<dyn CachePlugin>,
    ) -> Result<&mut Self, PluginError> {
        let name = plugin.name().to_string();
        if self.cache_plugins.contains_key(&name) {
            return Err(PluginError::Duplicate {
                category: "cache plugin",
                name,
            });
        }
        self.cache_plugins.insert(name, plugin);
        Ok(self)
    }

    /// Lets `plugin` register everything it provides.
    pub fn plugin(&mut self, plugin: &dyn Plugin) -> Result<&mut Self, PluginError> {
        debug!(plugin = plugin.name(), "Registering plugin");
        plugin.register(self)?;
        Ok(self)
    }

    pub fn build(self) -> PluginRegistry {
        debug!(
            kinds = self.kinds.len(),
            actions = self.actions.len(),
            "Plugin registry built"
        );
        PluginRegistry {
            kinds: self.kinds,
            actions: self.actions,
            load_filters: self.load_filters,
            dump_filters: self.dump_filters,
            cache_plugins: self.cache_plugins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::xyz::XyzFilter;
    use crate::core::kinds::molecular::ATOM;
    use crate::engine::cache::{FactValue, SelectionView};
    use crate::engine::error::EngineError;
    use crate::engine::model::Model;
    use crate::engine::transaction::Transaction;
    use crate::workflows::builtin::builtin_registry;

    struct Noop;

    impl Action for Noop {
        fn name(&self) -> &str {
            "delete"
        }

        fn analyze(&self, _view: &SelectionView<'_>) -> bool {
            true
        }

        fn run(&self, _tx: &mut Transaction<'_>) -> Result<(), EngineError> {
            Ok(())
        }
    }

    struct Zero;

    impl CachePlugin for Zero {
        fn name(&self) -> &str {
            "zero"
        }

        fn compute(&self, _model: &Model) -> FactValue {
            FactValue::Count(0)
        }
    }

    #[test]
    fn builtin_registry_has_every_category() {
        let registry = builtin_registry().unwrap();
        assert!(registry.kind(ATOM).is_ok());
        assert!(registry.action("delete").is_ok());
        assert!(registry.load_filter("xyz").is_ok());
        assert!(registry.dump_filter("xyz").is_ok());
        assert!(registry.cache_plugin_names().count() >= 1);
    }

    #[test]
    fn duplicates_are_rejected_per_category() {
        let mut builder = PluginRegistry::builder();
        builder.register_action(Rc::new(Noop)).unwrap();
        assert_eq!(
            builder.register_action(Rc::new(Noop)).err(),
            Some(PluginError::Duplicate {
                category: "action",
                name: "delete".into()
            })
        );

        builder.register_load_filter(&["xyz"], || XyzFilter).unwrap();
        assert!(builder.register_load_filter(&["XYZ"], || XyzFilter).is_err());
        // Same name in a different category is fine.
        builder.register_dump_filter(&["xyz"], || XyzFilter).unwrap();

        builder.register_cache_plugin(Rc::new(Zero)).unwrap();
        assert!(builder.register_cache_plugin(Rc::new(Zero)).is_err());
    }

    #[test]
    fn duplicate_kind_is_reported_as_duplicate() {
        let mut builder = PluginRegistry::builder();
        builder
            .register_kind(NodeKind::builder("thing").build().unwrap())
            .unwrap();
        let err = builder
            .register_kind(NodeKind::builder("thing").build().unwrap())
            .err();
        assert!(matches!(err, Some(PluginError::Duplicate { category: "node kind", .. })));
    }

    #[test]
    fn lookups_of_unknown_names_fail() {
        let registry = PluginRegistry::builder().build();
        assert!(matches!(
            registry.load_filter("pdb"),
            Err(PluginError::NotFound { category: "load filter", .. })
        ));
        assert!(registry.action("nope").is_err());
        assert!(registry.kind("nope").is_err());
    }
}
