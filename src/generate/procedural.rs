//! Procedural-texture snippet generator.
//!
//! Emits a hash-based value-noise field rendered as a moving point grid.
//! The noise is fully deterministic (integer hash, fixed seed) so the same
//! request always produces the same visual.

use async_trait::async_trait;

use super::{CodeGenerator, GenerationRequest};
use crate::EffectError;

/// Generator for the `procedural` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralGenerator;

/// Fixed seed for the integer hash; keeps output reproducible.
const NOISE_SEED: u32 = 1337;

const TEMPLATE: &str = r#"// ── module: procedural ─────────────────────────────────────────────
class NoiseField {
  constructor(gl) {
    this.gl = gl;
    this.grid = __GRID__;
    this.octaves = __OCTAVES__;
    this.seed = __SEED__;
    this.time = 0;
  }

  hash(x, y) {
    let h = (x * 374761393 + y * 668265263 + this.seed) | 0;
    h = ((h ^ (h >> 13)) * 1274126177) | 0;
    return ((h ^ (h >> 16)) >>> 0) / 4294967295;
  }

  noise(x, y) {
    let value = 0;
    let amplitude = 0.5;
    for (let o = 0; o < this.octaves; o++) {
      const scale = 1 << o;
      value += this.hash(Math.floor(x * scale), Math.floor(y * scale)) * amplitude;
      amplitude /= 2;
    }
    return value;
  }

  update(dt) {
    this.time += dt * 0.25;
  }

  draw(renderer) {
    for (let i = 0; i < this.grid; i++) {
      for (let j = 0; j < this.grid; j++) {
        const x = (i / (this.grid - 1)) * 2 - 1;
        const y = (j / (this.grid - 1)) * 2 - 1;
        const v = this.noise(i + this.time, j);
        renderer.point(x, y, '#8ab4f8', v);
      }
    }
  }
}

registerEffectModule('procedural', function (gl) {
  return new NoiseField(gl);
});
"#;

#[async_trait]
impl CodeGenerator for ProceduralGenerator {
    fn module(&self) -> &str {
        "procedural"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        // Fractal requests want more octave detail.
        let octaves = if request.mentions("fractal") { 5 } else { 3 };
        let grid = (32.0 * request.options.quality.scale()).round() as usize;

        Ok(TEMPLATE
            .replace("__GRID__", &grid.to_string())
            .replace("__OCTAVES__", &octaves.to_string())
            .replace("__SEED__", &NOISE_SEED.to_string()))
    }
}
