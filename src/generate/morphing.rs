//! Shape-morphing snippet generator: blends vertex positions between two
//! target shapes with an eased oscillation.

use async_trait::async_trait;

use super::{CodeGenerator, GenerationRequest};
use crate::EffectError;

/// Generator for the `morphing` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct MorphingGenerator;

const TEMPLATE: &str = r#"// ── module: morphing ───────────────────────────────────────────────
class MorphBlend {
  constructor(gl) {
    this.gl = gl;
    this.resolution = __RESOLUTION__;
    this.speed = __SPEED__;
    this.phase = 0;
    this.from = MorphBlend.shape('__FROM__', this.resolution);
    this.to = MorphBlend.shape('__TO__', this.resolution);
  }

  static shape(name, resolution) {
    const points = [];
    for (let i = 0; i < resolution; i++) {
      const t = (i / resolution) * Math.PI * 2;
      if (name === 'cube') {
        const k = Math.max(Math.abs(Math.cos(t)), Math.abs(Math.sin(t)));
        points.push({ x: Math.cos(t) / k * 0.7, y: Math.sin(t) / k * 0.7 });
      } else {
        points.push({ x: Math.cos(t) * 0.7, y: Math.sin(t) * 0.7 });
      }
    }
    return points;
  }

  update(dt) {
    this.phase += dt * this.speed;
  }

  draw(renderer) {
    const blend = 0.5 - 0.5 * Math.cos(this.phase);
    for (let i = 0; i < this.resolution; i++) {
      const a = this.from[i];
      const b = this.to[i];
      renderer.point(
        a.x + (b.x - a.x) * blend,
        a.y + (b.y - a.y) * blend,
        '#e8eaed',
        1.0
      );
    }
  }
}

registerEffectModule('morphing', function (gl) {
  return new MorphBlend(gl);
});
"#;

#[async_trait]
impl CodeGenerator for MorphingGenerator {
    fn module(&self) -> &str {
        "morphing"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        let speed = 0.5 + 1.5 * request
            .concept_confidence("morph")
            .max(request.concept_confidence("transform"));
        let resolution = (128.0 * request.options.quality.scale()).round() as usize;

        Ok(TEMPLATE
            .replace("__RESOLUTION__", &resolution.to_string())
            .replace("__SPEED__", &format!("{speed:.2}"))
            .replace("__FROM__", "sphere")
            .replace("__TO__", "cube"))
    }
}
