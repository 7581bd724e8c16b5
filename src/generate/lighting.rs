//! Lighting/glow snippet generator.
//!
//! Emits a full-screen additive glow pass. The fragment shader source is
//! platform-specific: GLSL ES 3.00 (`in`/`out`) for WebGL 2, ES 1.00
//! (`varying`/`gl_FragColor`) for WebGL 1. Bloom intensity follows the
//! "glow" concept.

use async_trait::async_trait;

use super::{CodeGenerator, GenerationRequest, Platform};
use crate::EffectError;

/// Generator for the `lighting` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightingGenerator;

const TEMPLATE: &str = r#"// ── module: lighting ───────────────────────────────────────────────
const GLOW_FRAGMENT_SHADER = `__FRAGMENT__`;

class GlowPass {
  constructor(gl) {
    this.gl = gl;
    this.intensity = __INTENSITY__;
    this.radius = __RADIUS__;
    this.shadowStrength = __SHADOW__;
    this.fragmentSource = GLOW_FRAGMENT_SHADER;
  }

  update(dt) {
    // Glow is a post pass; nothing to integrate per frame.
  }

  draw(renderer) {
    renderer.postProcess(this.fragmentSource, {
      uIntensity: this.intensity,
      uRadius: this.radius,
      uShadow: this.shadowStrength,
    });
  }
}

registerEffectModule('lighting', function (gl) {
  return new GlowPass(gl);
});
"#;

const FRAGMENT_ES3: &str = "#version 300 es\n\
precision mediump float;\n\
uniform sampler2D uScene;\n\
uniform float uIntensity;\n\
uniform float uRadius;\n\
uniform float uShadow;\n\
in vec2 vUv;\n\
out vec4 fragColor;\n\
void main() {\n\
  vec4 base = texture(uScene, vUv);\n\
  vec4 blur = vec4(0.0);\n\
  for (int i = -2; i <= 2; i++) {\n\
    blur += texture(uScene, vUv + vec2(float(i)) * uRadius);\n\
  }\n\
  blur /= 5.0;\n\
  fragColor = base * (1.0 - uShadow) + blur * uIntensity;\n\
}";

const FRAGMENT_ES1: &str = "precision mediump float;\n\
uniform sampler2D uScene;\n\
uniform float uIntensity;\n\
uniform float uRadius;\n\
uniform float uShadow;\n\
varying vec2 vUv;\n\
void main() {\n\
  vec4 base = texture2D(uScene, vUv);\n\
  vec4 blur = vec4(0.0);\n\
  for (int i = -2; i <= 2; i++) {\n\
    blur += texture2D(uScene, vUv + vec2(float(i)) * uRadius);\n\
  }\n\
  blur /= 5.0;\n\
  gl_FragColor = base * (1.0 - uShadow) + blur * uIntensity;\n\
}";

#[async_trait]
impl CodeGenerator for LightingGenerator {
    fn module(&self) -> &str {
        "lighting"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        let fragment = match request.platform {
            Platform::Webgl2 => FRAGMENT_ES3,
            Platform::Webgl1 => FRAGMENT_ES1,
        };
        let intensity = 0.6 + 0.8 * request.concept_confidence("glow");
        let shadow = 0.4 * request.concept_confidence("shadow");
        let radius = 0.004 * request.options.quality.scale();

        Ok(TEMPLATE
            .replace("__FRAGMENT__", fragment)
            .replace("__INTENSITY__", &format!("{intensity:.2}"))
            .replace("__RADIUS__", &format!("{radius:.4}"))
            .replace("__SHADOW__", &format!("{shadow:.2}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Concept;
    use crate::generate::GenerationOptions;

    fn request(names: &[&str], platform: Platform) -> GenerationRequest {
        GenerationRequest {
            concepts: names
                .iter()
                .map(|n| Concept {
                    name: n.to_string(),
                    confidence: 0.8,
                    kind: "appearance".to_string(),
                })
                .collect(),
            platform,
            options: GenerationOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_webgl2_uses_es3_shader() {
        let source = LightingGenerator
            .generate(&request(&["glow"], Platform::Webgl2))
            .await
            .unwrap();
        assert!(source.contains("#version 300 es"));
        assert!(source.contains("fragColor"));
    }

    #[tokio::test]
    async fn test_webgl1_uses_es1_shader() {
        let source = LightingGenerator
            .generate(&request(&["glow"], Platform::Webgl1))
            .await
            .unwrap();
        assert!(!source.contains("#version 300 es"));
        assert!(source.contains("gl_FragColor"));
    }

    #[tokio::test]
    async fn test_glow_concept_raises_intensity() {
        let with = LightingGenerator
            .generate(&request(&["glow"], Platform::Webgl2))
            .await
            .unwrap();
        let without = LightingGenerator
            .generate(&request(&["light"], Platform::Webgl2))
            .await
            .unwrap();
        assert!(with.contains("this.intensity = 1.24;"));
        assert!(without.contains("this.intensity = 0.60;"));
    }
}
