//! Runtime emitter.
//!
//! Renders a chunk as a self-executing script: a registry of module
//! functions, a cache of instantiated modules, a `require` that instantiates
//! each id at most once, and a direct invocation of the entry module's source.

use itertools::Itertools;

use super::chunk::Chunk;
use super::text::js_string_literal;

/// Renders `chunk` into the text of its output asset.
pub fn render_chunk(chunk: &Chunk) -> String {
    let registry = chunk
        .modules
        .iter()
        .map(|module| {
            format!(
                "    {}: (module, exports, require) => {{\n{}\n    }}",
                js_string_literal(&module.id),
                module.source.trim_end()
            )
        })
        .join(",\n");

    let entry_id = js_string_literal(&chunk.entry_module.id);
    let entry_source = chunk.entry_module.source.trim_end();

    format!(
        r#"(() => {{
  var modules = {{
{registry}
  }};
  var cache = {{}};
  function require(moduleId) {{
    var cachedModule = cache[moduleId];
    if (cachedModule !== undefined) {{
      return cachedModule.exports;
    }}
    if (!Object.prototype.hasOwnProperty.call(modules, moduleId)) {{
      throw new Error("Cannot find module '" + moduleId + "'");
    }}
    var module = (cache[moduleId] = {{
      exports: {{}},
    }});
    modules[moduleId](module, module.exports, require);
    return module.exports;
  }}
  var module = (cache[{entry_id}] = {{
    exports: {{}},
  }});
  var exports = module.exports;
  (() => {{
{entry_source}
  }})();
}})();
"#
    )
}
