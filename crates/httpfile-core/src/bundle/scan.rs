//! Import specifier scanner.
//!
//! Scans JavaScript source for import/export-from specifiers without full
//! parsing. Comment- and string-aware, best-effort on the rest. Each hit
//! records the byte span of the whole statement so the emitter can splice
//! internal imports out of the bundled output.

/// An import discovered in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Specifier exactly as written.
    pub specifier: String,
    /// Byte range of the full statement (trailing `;` included).
    pub start: usize,
    pub end: usize,
    /// `import("x")` rather than a static form.
    pub dynamic: bool,
}

/// Scan source code for import/export-from specifiers, in appearance order.
///
/// Recognized forms: `import d from "x"`, `import { a } from "x"`,
/// `import * as ns from "x"`, `import "x"`, `export { a } from "x"`,
/// `export * from "x"`, and dynamic `import("x")`.
#[must_use]
pub fn scan_imports(source: &str) -> Vec<Import> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut results = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            // Line comment
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            // Block comment
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            // String literal outside an import clause: skip it whole so
            // "import" inside a string is never treated as a keyword.
            b'"' | b'\'' | b'`' => match string_at(bytes, i) {
                Some((_, end)) => i = end,
                None => i += 1,
            },
            _ => {
                if at_keyword(bytes, i, b"import") {
                    if let Some((import, next)) = scan_import(bytes, i) {
                        results.push(import);
                        i = next;
                        continue;
                    }
                    i += 6;
                } else if at_keyword(bytes, i, b"export") {
                    if let Some((import, next)) = scan_export_from(bytes, i) {
                        results.push(import);
                        i = next;
                        continue;
                    }
                    i += 6;
                } else {
                    i += 1;
                }
            }
        }
    }

    results
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// `word` at position `i`, delimited on both sides.
fn at_keyword(bytes: &[u8], i: usize, word: &[u8]) -> bool {
    if i + word.len() > bytes.len() || &bytes[i..i + word.len()] != word {
        return false;
    }
    if i > 0 && is_ident(bytes[i - 1]) {
        return false;
    }
    bytes.get(i + word.len()).map_or(true, |b| !is_ident(*b))
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse a string literal starting at a quote; returns (contents, index past
/// the closing quote). Escapes are skipped, not interpreted — specifiers with
/// escape sequences in them are not something we splice.
fn string_at(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => {
                let contents = std::str::from_utf8(&bytes[start + 1..i]).ok()?;
                return Some((contents.to_string(), i + 1));
            }
            _ => i += 1,
        }
    }
    None
}

/// Swallow optional whitespace and one `;` after a statement.
fn statement_end(bytes: &[u8], mut i: usize) -> usize {
    let after = skip_ws(bytes, i);
    if bytes.get(after) == Some(&b';') {
        i = after + 1;
    }
    i
}

/// Scan an `import` starting at the keyword. Returns the import and the
/// index to resume scanning from.
fn scan_import(bytes: &[u8], start: usize) -> Option<(Import, usize)> {
    let j = skip_ws(bytes, start + 6);

    // Dynamic import: import("x"). Non-literal arguments are left alone.
    if bytes.get(j) == Some(&b'(') {
        let k = skip_ws(bytes, j + 1);
        if !matches!(bytes.get(k), Some(b'"' | b'\'' | b'`')) {
            return None;
        }
        let (specifier, str_end) = string_at(bytes, k)?;
        let close = skip_ws(bytes, str_end);
        if bytes.get(close) != Some(&b')') {
            return None;
        }
        let end = statement_end(bytes, close + 1);
        return Some((
            Import {
                specifier,
                start,
                end,
                dynamic: true,
            },
            end,
        ));
    }

    // import.meta
    if bytes.get(j) == Some(&b'.') {
        return None;
    }

    // Side-effect import: import "x";
    if matches!(bytes.get(j), Some(b'"' | b'\'')) {
        let (specifier, str_end) = string_at(bytes, j)?;
        let end = statement_end(bytes, str_end);
        return Some((
            Import {
                specifier,
                start,
                end,
                dynamic: false,
            },
            end,
        ));
    }

    // import … from "x"
    clause_with_source(bytes, start, j)
}

/// Scan `export … from "x"` starting at the keyword.
fn scan_export_from(bytes: &[u8], start: usize) -> Option<(Import, usize)> {
    let j = skip_ws(bytes, start + 6);
    clause_with_source(bytes, start, j)
}

/// Scan an import/export clause forward to its source string.
///
/// Only identifier characters, whitespace, `{ } , *` may appear in a clause;
/// anything else (an `=`, a `(`, …) means this is not a form with a module
/// source. The string must directly follow a `from` keyword, which keeps
/// `export class A { … }` bodies from matching.
fn clause_with_source(bytes: &[u8], start: usize, mut i: usize) -> Option<(Import, usize)> {
    let mut last_ident_was_from = false;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' => {
                if !last_ident_was_from {
                    return None;
                }
                let (specifier, str_end) = string_at(bytes, i)?;
                let end = statement_end(bytes, str_end);
                return Some((
                    Import {
                        specifier,
                        start,
                        end,
                        dynamic: false,
                    },
                    end,
                ));
            }
            b'{' | b'}' | b',' | b'*' => {
                last_ident_was_from = false;
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            b if is_ident(b) => {
                let word_start = i;
                while i < bytes.len() && is_ident(bytes[i]) {
                    i += 1;
                }
                last_ident_was_from = &bytes[word_start..i] == b"from";
            }
            _ => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(source: &str) -> Vec<String> {
        scan_imports(source)
            .into_iter()
            .map(|i| i.specifier)
            .collect()
    }

    #[test]
    fn test_static_import_forms() {
        let source = r#"
import def from "https://a.test/lib.mjs";
import { a, b } from './util.mjs';
import * as ns from "../ns.mjs";
import "./side-effect.mjs";
"#;
        assert_eq!(
            specs(source),
            vec![
                "https://a.test/lib.mjs",
                "./util.mjs",
                "../ns.mjs",
                "./side-effect.mjs"
            ]
        );
    }

    #[test]
    fn test_export_from() {
        let source = r#"
export { x } from "./x.mjs";
export * from './all.mjs';
export const local = 1;
export function f() { return "not-a-specifier"; }
"#;
        assert_eq!(specs(source), vec!["./x.mjs", "./all.mjs"]);
    }

    #[test]
    fn test_dynamic_import() {
        let imports = scan_imports(r#"const m = await import("./lazy.mjs");"#);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].specifier, "./lazy.mjs");
        assert!(imports[0].dynamic);
    }

    #[test]
    fn test_ignores_comments_and_strings() {
        let source = r#"
// import fake from "./comment.mjs";
/* import fake2 from "./block.mjs"; */
const s = 'import x from "./string.mjs";';
import real from "./real.mjs";
"#;
        assert_eq!(specs(source), vec!["./real.mjs"]);
    }

    #[test]
    fn test_spans_cover_statement() {
        let source = r#"const x = 1;
import { a } from "./a.mjs";
const y = 2;"#;
        let imports = scan_imports(source);
        assert_eq!(imports.len(), 1);
        let import = &imports[0];
        assert_eq!(
            &source[import.start..import.end],
            r#"import { a } from "./a.mjs";"#
        );
    }

    #[test]
    fn test_multiline_clause() {
        let source = "import {\n  a,\n  b,\n} from './multi.mjs';";
        assert_eq!(specs(source), vec!["./multi.mjs"]);
    }

    #[test]
    fn test_import_meta_is_not_an_import() {
        assert!(specs("const base = import.meta.url;").is_empty());
    }

    #[test]
    fn test_non_literal_dynamic_import_skipped() {
        assert!(specs("const m = await import(specifier);").is_empty());
    }
}
