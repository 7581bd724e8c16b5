//! Physics-integration snippet generator.
//!
//! Emits a `PhysicsWorld` with semi-implicit Euler integration. Gravity
//! strength follows the "gravity" concept; a "collision" or "bounce"
//! concept enables the floor plane with a matching restitution.

use async_trait::async_trait;

use super::{CodeGenerator, GenerationRequest};
use crate::EffectError;

/// Generator for the `physics` module.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsGenerator;

const TEMPLATE: &str = r#"// ── module: physics ────────────────────────────────────────────────
class PhysicsWorld {
  constructor() {
    this.gravity = { x: 0, y: -__GRAVITY__ };
    this.drag = __DRAG__;
    this.floorEnabled = __FLOOR__;
    this.restitution = __RESTITUTION__;
    this.bodies = [];
  }

  attach(body) {
    this.bodies.push(body);
  }

  update(dt) {
    for (const b of this.bodies) {
      b.vx = (b.vx + this.gravity.x * dt) * (1 - this.drag * dt);
      b.vy = (b.vy + this.gravity.y * dt) * (1 - this.drag * dt);
      b.x += b.vx * dt;
      b.y += b.vy * dt;
      if (this.floorEnabled && b.y < -1) {
        b.y = -1;
        b.vy = -b.vy * this.restitution;
      }
    }
  }

  draw(renderer) {
    // Physics is a pure simulation pass; other modules render the bodies.
  }
}

registerEffectModule('physics', function (gl) {
  const world = new PhysicsWorld();
  const shared = globalThis.__effectModules || [];
  for (const instance of shared) {
    if (instance.particles) {
      for (const p of instance.particles) world.attach(p);
    }
  }
  return world;
});
"#;

#[async_trait]
impl CodeGenerator for PhysicsGenerator {
    fn module(&self) -> &str {
        "physics"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, EffectError> {
        let gravity = 4.0 + 8.0 * request.concept_confidence("gravity");
        let bounces = request.mentions("collision") || request.mentions("bounce");
        let restitution = if bounces {
            0.3 + 0.5 * request
                .concept_confidence("bounce")
                .max(request.concept_confidence("collision"))
        } else {
            0.0
        };

        Ok(TEMPLATE
            .replace("__GRAVITY__", &format!("{gravity:.2}"))
            .replace("__DRAG__", "0.02")
            .replace("__FLOOR__", if bounces { "true" } else { "false" })
            .replace("__RESTITUTION__", &format!("{restitution:.2}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Concept;
    use crate::generate::{GenerationOptions, Platform};

    fn request(names: &[&str]) -> GenerationRequest {
        GenerationRequest {
            concepts: names
                .iter()
                .map(|n| Concept {
                    name: n.to_string(),
                    confidence: 0.8,
                    kind: "motion".to_string(),
                })
                .collect(),
            platform: Platform::default(),
            options: GenerationOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_emits_world_and_registration() {
        let source = PhysicsGenerator.generate(&request(&["gravity"])).await.unwrap();
        assert!(source.contains("class PhysicsWorld"));
        assert!(source.contains("registerEffectModule('physics'"));
    }

    #[tokio::test]
    async fn test_gravity_concept_strengthens_pull() {
        let with = PhysicsGenerator.generate(&request(&["gravity"])).await.unwrap();
        let without = PhysicsGenerator.generate(&request(&["force"])).await.unwrap();
        assert!(with.contains("y: -10.40"));
        assert!(without.contains("y: -4.00"));
    }

    #[tokio::test]
    async fn test_collision_enables_floor() {
        let with = PhysicsGenerator
            .generate(&request(&["collision"]))
            .await
            .unwrap();
        let without = PhysicsGenerator.generate(&request(&["gravity"])).await.unwrap();
        assert!(with.contains("this.floorEnabled = true;"));
        assert!(without.contains("this.floorEnabled = false;"));
    }
}
