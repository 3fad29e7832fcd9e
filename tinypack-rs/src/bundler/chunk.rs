//! Groups built modules into one chunk per entry.

use indexmap::{IndexMap, IndexSet};

use super::graph::Module;

/// An entry point and the id of its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub module_id: String,
}

#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub name: String,
    pub entry_module: &'a Module,
    /// Modules embedded in this chunk, in build order.
    pub modules: Vec<&'a Module>,
}

/// Forms one chunk per entry.
///
/// A chunk holds the modules owned by its entry plus any module owned by
/// another entry that it reaches through `requires`, so a module shared by
/// several entries is embedded in each of their chunks.
pub fn assemble<'a>(modules: &'a IndexMap<String, Module>, entries: &[Entry]) -> Vec<Chunk<'a>> {
    entries
        .iter()
        .filter_map(|entry| {
            let entry_module = modules.get(&entry.module_id)?;
            let reachable = reachable_ids(modules, entry_module);
            let chunk_modules = modules
                .values()
                .filter(|module| {
                    module.entry_name == entry.name || reachable.contains(module.id.as_str())
                })
                .collect();
            Some(Chunk {
                name: entry.name.clone(),
                entry_module,
                modules: chunk_modules,
            })
        })
        .collect()
}

fn reachable_ids<'a>(modules: &'a IndexMap<String, Module>, from: &'a Module) -> IndexSet<&'a str> {
    let mut reachable = IndexSet::new();
    let mut pending = vec![from];
    while let Some(module) = pending.pop() {
        if !reachable.insert(module.id.as_str()) {
            continue;
        }
        pending.extend(module.requires.iter().filter_map(|id| modules.get(id)));
    }
    reachable
}
