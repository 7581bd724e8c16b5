//! Particle-system snippet generator.
//!
//! Emits a `ParticleSystem` class plus its module registration. Burst size,
//! capacity, gravity pull, and palette are chosen from the request: an
//! "explosion" concept shortens particle life and enlarges the initial
//! burst, a "gravity" concept strengthens the downward pull.

use async_trait::async_trait;

use super::{palette_for, palette_literal, CodeGenerator, GenerationRequest};
use crate::EffectError;

/// Generator for the `particles` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticlesGenerator;

const TEMPLATE: &str = r#"// ── module: particles ──────────────────────────────────────────────
class ParticleSystem {
  constructor(gl) {
    this.gl = gl;
    this.capacity = __CAPACITY__;
    this.gravity = __GRAVITY__;
    this.palette = __PALETTE__;
    this.particles = [];
  }

  spawnBurst(x, y, count) {
    for (let i = 0; i < count; i++) {
      const angle = (i / count) * Math.PI * 2;
      const speed = 0.35 + 0.65 * ((i * 2654435761 % 1024) / 1024);
      this.particles.push({
        x: x,
        y: y,
        vx: Math.cos(angle) * speed,
        vy: Math.sin(angle) * speed,
        life: 1.0,
        color: this.palette[i % this.palette.length],
      });
    }
    if (this.particles.length > this.capacity) {
      this.particles.splice(0, this.particles.length - this.capacity);
    }
  }

  update(dt) {
    for (const p of this.particles) {
      p.vy -= this.gravity * dt;
      p.x += p.vx * dt;
      p.y += p.vy * dt;
      p.life -= dt * __DECAY__;
    }
    this.particles = this.particles.filter((p) => p.life > 0);
    if (this.particles.length === 0) {
      this.spawnBurst(0, 0, __BURST__);
    }
  }

  draw(renderer) {
    for (const p of this.particles) {
      renderer.point(p.x, p.y, p.color, p.life);
    }
  }
}

registerEffectModule('particles', function (gl) {
  const system = new ParticleSystem(gl);
  system.spawnBurst(0, 0, __BURST__);
  return system;
});
"#;

#[async_trait]
impl CodeGenerator for ParticlesGenerator {
    fn module(&self) -> &str {
        "particles"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        let scale = request.options.quality.scale();
        let capacity = ((request.options.max_particles as f64) * scale).round() as usize;

        // Explosions burn fast and big; gentle effects linger.
        let explosion = request.concept_confidence("explosion");
        let decay = 0.4 + 0.6 * explosion;
        let burst = ((64.0 + 192.0 * explosion) * scale).round() as usize;

        let gravity = 0.2 + 0.8 * request.concept_confidence("gravity");

        Ok(TEMPLATE
            .replace("__CAPACITY__", &capacity.to_string())
            .replace("__GRAVITY__", &format!("{gravity:.2}"))
            .replace("__PALETTE__", &palette_literal(palette_for(request)))
            .replace("__DECAY__", &format!("{decay:.2}"))
            .replace("__BURST__", &burst.to_string()))
    }
}
