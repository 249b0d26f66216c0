//! Module dependency graph.
//!
//! Tracks modules discovered while walking imports from the entry point.
//! Ids are strings: canonical URLs for remote modules, absolute paths for
//! local ones, so one graph covers both sides of the plugin boundary.

use super::scan::Import;
use crate::content::ContentKind;
use rustc_hash::FxHashMap as HashMap;

/// Index of a module in the graph.
pub type ModuleId = usize;

/// Where an import resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Bundled module in this graph.
    Internal(ModuleId),
    /// External module; its import statement stays in the output.
    External,
}

/// A module in the dependency graph.
#[derive(Debug)]
pub struct Module {
    /// Canonical URL or absolute filesystem path.
    pub id: String,
    /// Source text.
    pub source: String,
    /// Content kind.
    pub kind: ContentKind,
    /// Imports found in the source, with spans.
    pub imports: Vec<Import>,
    /// Resolution of each import, parallel to `imports`.
    pub resolutions: Vec<Resolution>,
}

impl Module {
    /// Internal dependency ids.
    pub fn dependencies(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.resolutions.iter().filter_map(|r| match r {
            Resolution::Internal(id) => Some(*id),
            Resolution::External => None,
        })
    }
}

/// The module dependency graph.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    id_index: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, returning its id.
    pub fn add(&mut self, module: Module) -> ModuleId {
        let id = self.modules.len();
        self.id_index.insert(module.id.clone(), id);
        self.modules.push(module);
        id
    }

    /// Get a module.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Mutable access, used while the walk fills in resolutions.
    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    /// Look up a module by its string id (dedup point for the walk).
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<ModuleId> {
        self.id_index.get(id).copied()
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in topological order, dependencies before dependents.
    ///
    /// Kahn's algorithm; members of import cycles are appended in insertion
    /// order after the acyclic part.
    #[must_use]
    pub fn toposort(&self) -> Vec<ModuleId> {
        let n = self.modules.len();
        if n == 0 {
            return Vec::new();
        }

        let mut in_degree = vec![0usize; n];
        let mut adj: Vec<Vec<ModuleId>> = vec![Vec::new(); n];

        for (id, module) in self.modules.iter().enumerate() {
            for dep in module.dependencies() {
                adj[dep].push(id);
                in_degree[id] += 1;
            }
        }

        let mut queue: std::collections::VecDeque<ModuleId> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &next in &adj[id] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        // Cycle members never reach in-degree zero.
        if order.len() < n {
            let placed: std::collections::HashSet<ModuleId> = order.iter().copied().collect();
            order.extend((0..n).filter(|id| !placed.contains(id)));
        }

        order
    }
}
