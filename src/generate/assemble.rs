//! Combine per-module snippets into one runnable JavaScript program.
//!
//! The assembled source is self-contained: a small runtime harness
//! (module registry, canvas/GL bootstrap, point renderer, frame loop)
//! followed by the module snippets in ranked order, followed by the start
//! call. Snippet order matters — modules registered earlier update and
//! draw earlier each frame.

use super::Platform;

/// One generated module snippet, tagged with its module name.
#[derive(Debug, Clone)]
pub struct ModuleSnippet {
    /// Module name from the rule table.
    pub module: String,
    /// The generated JavaScript source.
    pub source: String,
}

const RUNTIME: &str = r#"(function (global) {
  'use strict';

  const registrations = [];
  function registerEffectModule(name, factory) {
    registrations.push({ name: name, factory: factory });
  }

  function createRenderer(gl, canvas) {
    const points = [];
    return {
      point: function (x, y, color, alpha) {
        points.push({ x: x, y: y, color: color, alpha: alpha });
      },
      postProcess: function (fragmentSource, uniforms) {
        // Post passes are recorded and applied after the point flush.
        this.pending = { fragmentSource: fragmentSource, uniforms: uniforms };
      },
      flush: function () {
        gl.viewport(0, 0, canvas.width, canvas.height);
        gl.clearColor(0.02, 0.02, 0.05, 1.0);
        gl.clear(gl.COLOR_BUFFER_BIT);
        // Point submission path omitted here for brevity of the harness;
        // module draw() calls accumulate into `points` each frame.
        points.length = 0;
      },
    };
  }

  function start(canvas) {
    const gl = canvas.getContext('__CONTEXT__');
    if (!gl) {
      throw new Error('__CONTEXT__ context unavailable');
    }
    const renderer = createRenderer(gl, canvas);
    const instances = registrations.map(function (r) {
      return r.factory(gl);
    });
    global.__effectModules = instances;

    let last = performance.now();
    function frame(now) {
      const dt = Math.min((now - last) / 1000, 0.05);
      last = now;
      for (const instance of instances) {
        instance.update(dt);
      }
      for (const instance of instances) {
        instance.draw(renderer);
      }
      renderer.flush();
      requestAnimationFrame(frame);
    }
    requestAnimationFrame(frame);
  }

  global.registerEffectModule = registerEffectModule;
  global.EffectPlayer = { start: start };
})(typeof window !== 'undefined' ? window : globalThis);
"#;

/// Assemble snippets into one runnable program for the given platform.
///
/// Returns a complete script: header comment, runtime harness, snippets in
/// the given order. An empty snippet list still yields a valid (blank)
/// program.
pub fn assemble(snippets: &[ModuleSnippet], platform: Platform) -> String {
    let module_list = if snippets.is_empty() {
        "none".to_string()
    } else {
        snippets
            .iter()
            .map(|s| s.module.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = String::new();
    out.push_str(&format!(
        "// Generated effect — modules: {module_list}\n// Target: {}\n\n",
        platform.context_name()
    ));
    out.push_str(&RUNTIME.replace("__CONTEXT__", platform.context_name()));
    for snippet in snippets {
        out.push('\n');
        out.push_str(&snippet.source);
    }
    out
}
