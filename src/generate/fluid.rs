//! Fluid-surface snippet generator: a damped heightfield wave simulation
//! over a fixed grid. Amplitude follows the "wave"/"splash" concepts.

use async_trait::async_trait;

use super::{palette_for, palette_literal, CodeGenerator, GenerationRequest};
use crate::EffectError;

/// Generator for the `fluid` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluidGenerator;

const TEMPLATE: &str = r#"// ── module: fluid ──────────────────────────────────────────────────
class FluidSurface {
  constructor(gl) {
    this.gl = gl;
    this.cols = __COLS__;
    this.amplitude = __AMPLITUDE__;
    this.damping = __DAMPING__;
    this.palette = __PALETTE__;
    this.heights = new Float32Array(this.cols);
    this.velocities = new Float32Array(this.cols);
    this.time = 0;
  }

  disturb(column, strength) {
    if (column >= 0 && column < this.cols) {
      this.velocities[column] += strength;
    }
  }

  update(dt) {
    this.time += dt;
    // Periodic disturbance keeps the surface alive without input.
    if (Math.floor(this.time * 2) !== Math.floor((this.time - dt) * 2)) {
      this.disturb((Math.floor(this.time * 7) % this.cols), this.amplitude);
    }
    for (let i = 0; i < this.cols; i++) {
      const left = this.heights[i > 0 ? i - 1 : i];
      const right = this.heights[i < this.cols - 1 ? i + 1 : i];
      const pull = (left + right) / 2 - this.heights[i];
      this.velocities[i] = (this.velocities[i] + pull * 8 * dt) * this.damping;
    }
    for (let i = 0; i < this.cols; i++) {
      this.heights[i] += this.velocities[i] * dt;
    }
  }

  draw(renderer) {
    for (let i = 0; i < this.cols; i++) {
      const x = (i / (this.cols - 1)) * 2 - 1;
      renderer.point(x, this.heights[i] - 0.5, this.palette[0], 1.0);
    }
  }
}

registerEffectModule('fluid', function (gl) {
  return new FluidSurface(gl);
});
"#;

#[async_trait]
impl CodeGenerator for FluidGenerator {
    fn module(&self) -> &str {
        "fluid"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        let cols = (96.0 * request.options.quality.scale()).round() as usize;
        let amplitude = 0.2 + 0.6 * request
            .concept_confidence("wave")
            .max(request.concept_confidence("splash"));
        // Splashy water settles faster than a calm flow.
        let damping = if request.mentions("splash") { 0.96 } else { 0.99 };

        Ok(TEMPLATE
            .replace("__COLS__", &cols.to_string())
            .replace("__AMPLITUDE__", &format!("{amplitude:.2}"))
            .replace("__DAMPING__", &format!("{damping:.2}"))
            .replace("__PALETTE__", &palette_literal(palette_for(request))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Concept;
    use crate::generate::{GenerationOptions, Platform, QualityTier};

    fn request(names: &[&str]) -> GenerationRequest {
        GenerationRequest {
            concepts: names
                .iter()
                .map(|n| Concept {
                    name: n.to_string(),
                    confidence: 0.8,
                    kind: "element".to_string(),
                })
                .collect(),
            platform: Platform::default(),
            options: GenerationOptions {
                quality: QualityTier::Medium,
                ..GenerationOptions::default()
            },
        }
    }

    #[tokio::test]
    async fn test_emits_surface_and_registration() {
        let source = FluidGenerator.generate(&request(&["water"])).await.unwrap();
        assert!(source.contains("class FluidSurface"));
        assert!(source.contains("registerEffectModule('fluid'"));
    }

    #[tokio::test]
    async fn test_water_concepts_pick_blue_palette() {
        let source = FluidGenerator.generate(&request(&["water"])).await.unwrap();
        assert!(source.contains("#2e78ff"));
    }

    #[tokio::test]
    async fn test_splash_lowers_damping() {
        let splashy = FluidGenerator.generate(&request(&["splash"])).await.unwrap();
        let calm = FluidGenerator.generate(&request(&["flow"])).await.unwrap();
        assert!(splashy.contains("this.damping = 0.96;"));
        assert!(calm.contains("this.damping = 0.99;"));
    }
}
