//! Built-in text loaders and JS string helpers.
//!
//! Provides the `strip-bom` and `json` loaders registered by default, and the
//! string-literal escaping shared with the runtime emitter.

use anyhow::Context;
use std::path::Path;

use super::loader::Loader;

/// Strips the UTF-8 BOM (U+FEFF) from the beginning of text if present.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Turns a JSON document into a CommonJS module exporting the parsed value:
/// `module.exports = JSON.parse("...");`
pub fn transform_json_source(source: &str) -> String {
    format!("module.exports = JSON.parse({});", js_string_literal(source))
}

/// Double-quoted JavaScript string literal for `s`.
pub fn js_string_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            // Line terminators inside literals are only legal since ES2019
            '\u{2028}' => result.push_str("\\u2028"),
            '\u{2029}' => result.push_str("\\u2029"),
            c if c < '\x20' => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// `strip-bom`: removes a leading byte order mark.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripBomLoader;

impl Loader for StripBomLoader {
    fn name(&self) -> &str {
        "strip-bom"
    }

    fn transform(&self, source: &str, _path: &Path) -> anyhow::Result<String> {
        Ok(strip_bom(source).to_string())
    }
}

/// `json`: wraps a JSON file so that requiring it yields the parsed value.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn transform(&self, source: &str, path: &Path) -> anyhow::Result<String> {
        let source = strip_bom(source);
        serde_json::from_str::<serde_json::Value>(source)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        Ok(transform_json_source(source))
    }
}
