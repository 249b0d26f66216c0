//! Content-kind inference.
//!
//! The host bundler needs to know how to parse fetched content. The kind is
//! inferred from the response's content-type header first, then from the URL
//! path extension, and defaults to `Script` when both are ambiguous.

use crate::canon::ModuleUrl;

/// Semantic type of fetched module content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentKind {
    /// JavaScript (or anything the host should parse as script).
    #[default]
    Script,
    /// JSON data.
    Json,
    /// CSS.
    Style,
    /// Plain text.
    Text,
    /// WebAssembly binary.
    Wasm,
}

impl ContentKind {
    /// Short lowercase name, used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Json => "json",
            Self::Style => "style",
            Self::Text => "text",
            Self::Wasm => "wasm",
        }
    }

    /// Infer from a content-type header value.
    ///
    /// Returns `None` for generic types (`application/octet-stream`,
    /// `text/plain`) so the URL extension can decide; raw file hosts serve
    /// scripts as `text/plain`.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Strip parameters: "text/javascript; charset=utf-8" -> "text/javascript"
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/javascript"
            | "application/x-javascript"
            | "text/javascript"
            | "application/ecmascript"
            | "text/ecmascript"
            | "application/typescript"
            | "text/typescript"
            | "text/jsx"
            | "text/tsx" => Some(Self::Script),
            "application/json" | "text/json" => Some(Self::Json),
            "text/css" => Some(Self::Style),
            "application/wasm" => Some(Self::Wasm),
            _ => None,
        }
    }

    /// Infer from a URL path extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "mts" | "cts" | "tsx" => Some(Self::Script),
            "json" => Some(Self::Json),
            "css" => Some(Self::Style),
            "txt" => Some(Self::Text),
            "wasm" => Some(Self::Wasm),
            _ => None,
        }
    }
}

/// Infer the content kind for a fetched module.
///
/// Header wins over extension; when both are absent or generic the content is
/// treated as script text (best-effort, never a hard failure).
#[must_use]
pub fn infer_kind(url: &ModuleUrl, content_type: Option<&str>) -> ContentKind {
    content_type
        .and_then(ContentKind::from_content_type)
        .or_else(|| url.path_extension().and_then(ContentKind::from_extension))
        .unwrap_or_default()
}
