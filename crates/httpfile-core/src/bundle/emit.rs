//! Bundle output emission.
//!
//! Concatenates modules in topological order. Internal static imports are
//! spliced out by span; non-entry modules get their export keywords stripped
//! so the concatenation stays parseable. Non-script modules are re-emitted
//! as ES modules (`export default …`). No tree-shaking, minification, or
//! source maps.

use super::graph::{ModuleGraph, ModuleId, Resolution};
use super::BundleError;
use crate::content::ContentKind;

/// Emit the final bundle text.
///
/// # Errors
/// Fails on content that has no textual module form (wasm) and on JSON
/// modules that do not parse.
pub fn emit_bundle(graph: &ModuleGraph, entry: ModuleId) -> Result<String, BundleError> {
    let mut out = String::new();

    for (position, id) in graph.toposort().into_iter().enumerate() {
        let module = graph.get(id).ok_or_else(|| BundleError {
            code: "GRAPH_CORRUPT",
            message: format!("module {id} missing from graph"),
            path: None,
        })?;

        let body = match module.kind {
            ContentKind::Script => splice_internal_imports(module),
            ContentKind::Json => {
                // Validate before splicing the text into the output.
                let value: serde_json::Value =
                    serde_json::from_str(&module.source).map_err(|e| BundleError {
                        code: "INVALID_JSON",
                        message: format!("invalid JSON module: {e}"),
                        path: Some(module.id.clone()),
                    })?;
                format!("export default {value};\n")
            }
            ContentKind::Style | ContentKind::Text => {
                // Default-export the raw content as a string literal; JSON
                // string escaping is valid JS string escaping.
                let literal =
                    serde_json::to_string(&module.source).map_err(|e| BundleError {
                        code: "EMIT_FAILED",
                        message: e.to_string(),
                        path: Some(module.id.clone()),
                    })?;
                format!("export default {literal};\n")
            }
            ContentKind::Wasm => {
                return Err(BundleError {
                    code: "UNSUPPORTED_CONTENT",
                    message: "wasm modules cannot be inlined into a text bundle".to_string(),
                    path: Some(module.id.clone()),
                })
            }
        };

        let body = if id == entry {
            body
        } else {
            strip_exports(&body, position)
        };

        out.push_str("// ");
        out.push_str(&module.id);
        out.push('\n');
        out.push_str(body.trim_end());
        out.push_str("\n\n");
    }

    Ok(out)
}

/// Remove statically-imported internal statements from a module's source.
///
/// External imports and dynamic `import()` expressions stay: the former are
/// imports the bundle intentionally leaves to the runtime, the latter are
/// expressions that cannot be removed without breaking surrounding code.
fn splice_internal_imports(module: &super::graph::Module) -> String {
    let mut spans: Vec<(usize, usize)> = module
        .imports
        .iter()
        .zip(&module.resolutions)
        .filter(|(import, resolution)| {
            !import.dynamic && matches!(resolution, Resolution::Internal(_))
        })
        .map(|(import, _)| (import.start, import.end))
        .collect();
    spans.sort_unstable();

    let mut out = String::with_capacity(module.source.len());
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&module.source[cursor..start]);
        cursor = end;
        // Swallow the newline the statement sat on.
        if module.source.as_bytes().get(cursor) == Some(&b'\n') {
            cursor += 1;
        }
    }
    out.push_str(&module.source[cursor..]);
    out
}

/// Best-effort removal of export keywords from a non-entry module.
///
/// `export const x` becomes `const x`; `export default expr` is bound to a
/// per-module name; a local `export { … };` list is dropped. Line-based,
/// like the rest of the emitter.
fn strip_exports(source: &str, module_index: usize) -> String {
    const DECLS: [&str; 7] = [
        "const ", "let ", "var ", "function ", "class ", "async ", "function*",
    ];

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let indent_len = line.len() - line.trim_start().len();
        let (indent, trimmed) = line.split_at(indent_len);

        if let Some(rest) = trimmed.strip_prefix("export default ") {
            out.push_str(indent);
            out.push_str(&format!("const __httpfile_default_{module_index} = {rest}"));
        } else if let Some(rest) = trimmed.strip_prefix("export ") {
            if DECLS.iter().any(|d| rest.starts_with(d)) {
                out.push_str(indent);
                out.push_str(rest);
            } else if rest.starts_with('{') && !rest.contains(" from ") {
                // Local export list; nothing to re-export in a flat bundle.
                continue;
            } else {
                out.push_str(line);
            }
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
