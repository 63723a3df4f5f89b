use super::edit::{CopyNodes, CutNodes, Delete, Duplicate, PasteNodes};
use crate::core::io::xyz::XyzFilter;
use crate::core::kinds::molecular::{self, ATOM};
use crate::engine::cache::{CachePlugin, FactValue};
use crate::engine::model::Model;
use crate::engine::plugins::{Plugin, PluginError, PluginRegistry, PluginRegistryBuilder};
use std::rc::Rc;
use tracing::instrument;

/// Number of atoms in the current selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectedAtomCount;

impl CachePlugin for SelectedAtomCount {
    fn name(&self) -> &str {
        "selected_atom_count"
    }

    fn compute(&self, model: &Model) -> FactValue {
        let count = model
            .selection()
            .iter()
            .filter_map(|&id| model.tree().node(id))
            .filter(|node| node.kind().name() == ATOM)
            .count();
        FactValue::Count(count)
    }
}

/// Molecular node kinds, the generic edit actions, the XYZ filter and the
/// stock cache plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPlugin;

impl Plugin for BuiltinPlugin {
    fn name(&self) -> &str {
        "builtin"
    }

    fn register(&self, builder: &mut PluginRegistryBuilder) -> Result<(), PluginError> {
        for kind in molecular::molecular_kinds()? {
            builder.register_kind(kind)?;
        }
        builder
            .register_action(Rc::new(Delete))?
            .register_action(Rc::new(Duplicate))?
            .register_action(Rc::new(CutNodes))?
            .register_action(Rc::new(CopyNodes))?
            .register_action(Rc::new(PasteNodes))?
            .register_load_filter(&["xyz"], || XyzFilter)?
            .register_dump_filter(&["xyz"], || XyzFilter)?
            .register_cache_plugin(Rc::new(SelectedAtomCount))?;
        Ok(())
    }
}

/// Registry with only the built-in plugin installed.
#[instrument(name = "builtin_registry")]
pub fn builtin_registry() -> Result<PluginRegistry, PluginError> {
    let mut builder = PluginRegistry::builder();
    builder.plugin(&BuiltinPlugin)?;
    Ok(builder.build())
}
