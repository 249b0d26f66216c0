//! Minimal bundling host.
//!
//! Just enough host to exercise module-provider plugins the way a real
//! bundler does: walk imports breadth-first from a local entry file, ask the
//! plugin container to resolve and load each specifier, fall back to local
//! filesystem resolution, and concatenate the result.
//!
//! ## Architecture
//!
//! 1. **Scan** — find import specifiers in each module's source
//! 2. **Resolve** — plugins first, then local relative paths
//! 3. **Load** — plugins first, then the filesystem
//! 4. **Emit** — topological concatenation

mod emit;
mod graph;
mod scan;

pub use emit::emit_bundle;
pub use graph::{Module, ModuleGraph, ModuleId, Resolution};
pub use scan::{scan_imports, Import};

use crate::content::ContentKind;
use crate::plugin::{Plugin, PluginContainer};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Error during a bundle run.
#[derive(Debug)]
pub struct BundleError {
    /// Stable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Module id or path involved, if known.
    pub path: Option<String>,
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {} ({})", self.code, self.message, path),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for BundleError {}

impl From<crate::plugin::PluginError> for BundleError {
    fn from(e: crate::plugin::PluginError) -> Self {
        Self {
            code: "PLUGIN_ERROR",
            message: e.to_string(),
            path: None,
        }
    }
}

/// Result of a bundle run.
#[derive(Debug)]
pub struct BundleOutput {
    /// The bundled source text.
    pub code: String,
    /// Number of modules included.
    pub module_count: usize,
}

/// The bundling host.
///
/// Owns a [`PluginContainer`]; plugins get first refusal on every resolve
/// and load, the host's defaults (local relative paths, filesystem reads)
/// apply when all plugins decline.
#[derive(Default)]
pub struct Bundler {
    plugins: PluginContainer,
}

enum Resolved {
    Internal(String),
    External,
}

impl Bundler {
    /// Create a bundler with no plugins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin.
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.add(plugin);
    }

    /// Bundle from a local entry file.
    ///
    /// # Errors
    /// Fails when the entry is missing, a specifier cannot be resolved, a
    /// plugin load fails (network errors surface here), or emission fails.
    pub async fn bundle(&self, entry: &Path) -> Result<BundleOutput, BundleError> {
        let entry_path = std::fs::canonicalize(entry).map_err(|e| BundleError {
            code: "ENTRY_NOT_FOUND",
            message: e.to_string(),
            path: Some(entry.display().to_string()),
        })?;
        let entry_id = entry_path.display().to_string();

        let mut graph = ModuleGraph::new();
        let entry_module = self.load_into_graph(&mut graph, &entry_id).await?;

        let mut queue = VecDeque::from([entry_module]);
        while let Some(current) = queue.pop_front() {
            let (importer_id, imports) = {
                let module = graph.get(current).expect("walk enqueued unknown module");
                (module.id.clone(), module.imports.clone())
            };

            let mut resolutions = Vec::with_capacity(imports.len());
            for import in &imports {
                // Dynamic imports stay as runtime expressions; code
                // splitting is out of scope for this host.
                if import.dynamic {
                    resolutions.push(Resolution::External);
                    continue;
                }

                match self.resolve_specifier(&import.specifier, &importer_id)? {
                    Resolved::External => resolutions.push(Resolution::External),
                    Resolved::Internal(id) => {
                        let module = match graph.lookup(&id) {
                            Some(existing) => existing,
                            None => {
                                let added = self.load_into_graph(&mut graph, &id).await?;
                                queue.push_back(added);
                                added
                            }
                        };
                        resolutions.push(Resolution::Internal(module));
                    }
                }
            }

            graph
                .get_mut(current)
                .expect("walk enqueued unknown module")
                .resolutions = resolutions;
        }

        tracing::debug!(modules = graph.len(), "module graph complete");

        let code = emit_bundle(&graph, entry_module)?;
        Ok(BundleOutput {
            code,
            module_count: graph.len(),
        })
    }

    /// Resolve one specifier: plugins first, then local relative paths.
    fn resolve_specifier(
        &self,
        specifier: &str,
        importer: &str,
    ) -> Result<Resolved, BundleError> {
        if let Some(result) = self.plugins.resolve_id(specifier, Some(importer))? {
            return Ok(if result.external {
                Resolved::External
            } else {
                Resolved::Internal(result.id)
            });
        }

        // Default resolution: relative paths against a local importer,
        // root-relative paths against the filesystem root.
        if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/')
        {
            let target = if specifier.starts_with('/') {
                PathBuf::from(specifier)
            } else {
                let importer_dir = Path::new(importer).parent().unwrap_or(Path::new("."));
                importer_dir.join(specifier)
            };
            let resolved = resolve_local_file(&target).ok_or_else(|| BundleError {
                code: "MODULE_NOT_FOUND",
                message: format!("cannot resolve '{specifier}' from '{importer}'"),
                path: Some(target.display().to_string()),
            })?;
            return Ok(Resolved::Internal(resolved.display().to_string()));
        }

        // Bare specifier nobody claimed; this host does not do package
        // resolution.
        Err(BundleError {
            code: "CANNOT_RESOLVE",
            message: format!("cannot resolve bare specifier '{specifier}' from '{importer}'"),
            path: None,
        })
    }

    /// Load one module body: plugins first, then the filesystem.
    async fn load_into_graph(
        &self,
        graph: &mut ModuleGraph,
        id: &str,
    ) -> Result<ModuleId, BundleError> {
        let (source, kind) = match self.plugins.load(id).await? {
            Some(loaded) => (loaded.code, loaded.kind),
            None => {
                let source = std::fs::read_to_string(id).map_err(|e| BundleError {
                    code: "MODULE_NOT_FOUND",
                    message: e.to_string(),
                    path: Some(id.to_string()),
                })?;
                let kind = Path::new(id)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ContentKind::from_extension)
                    .unwrap_or_default();
                (source, kind)
            }
        };

        // Only script modules pull in further dependencies.
        let imports = match kind {
            ContentKind::Script => scan_imports(&source),
            _ => Vec::new(),
        };

        Ok(graph.add(Module {
            id: id.to_string(),
            source,
            kind,
            imports,
            resolutions: Vec::new(),
        }))
    }
}

/// Resolve a local import target: exact file, then extension guessing, then
/// directory index.
fn resolve_local_file(target: &Path) -> Option<PathBuf> {
    if target.is_file() {
        return std::fs::canonicalize(target).ok();
    }

    for ext in ["mjs", "js", "cjs", "jsx", "ts", "tsx", "json", "css"] {
        let with_ext = PathBuf::from(format!("{}.{ext}", target.display()));
        if with_ext.is_file() {
            return std::fs::canonicalize(with_ext).ok();
        }
    }

    if target.is_dir() {
        for index in ["index.mjs", "index.js", "index.ts"] {
            let index_path = target.join(index);
            if index_path.is_file() {
                return std::fs::canonicalize(index_path).ok();
            }
        }
    }

    None
}
