use eframe::egui::Vec2;

use crate::config::Tuning;

use super::super::physics::Body;

const SETTLE_EPSILON: f32 = 0.01;

/// Pointer-driven radius response, applied per tick before collisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ProximityConfig {
    pub(in crate::app) influence_radius: f32,
    pub(in crate::app) falloff_power: f32,
    pub(in crate::app) max_expansion: f32,
    pub(in crate::app) smoothing: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            influence_radius: 150.0,
            falloff_power: 2.0,
            max_expansion: 1.4,
            smoothing: 0.15,
        }
    }
}

impl From<&Tuning> for ProximityConfig {
    fn from(tuning: &Tuning) -> Self {
        Self {
            influence_radius: tuning.influence_radius,
            falloff_power: tuning.falloff_power,
            max_expansion: tuning.max_expansion,
            smoothing: tuning.smoothing,
        }
    }
}

impl ProximityConfig {
    pub(in crate::app) fn target_radius(&self, base_radius: f32, distance: Option<f32>) -> f32 {
        let Some(distance) = distance.filter(|distance| *distance < self.influence_radius) else {
            return base_radius;
        };

        let proximity = 1.0 - (distance / self.influence_radius).powf(self.falloff_power);
        base_radius * (1.0 + (self.max_expansion - 1.0) * proximity)
    }
}

/// Moves every body's radius one low-pass step toward its pointer target.
/// Returns true while any radius is still visibly converging.
pub(in crate::app) fn update_radii(
    bodies: &mut [Body],
    pointer: Option<Vec2>,
    config: &ProximityConfig,
) -> bool {
    let smoothing = config.smoothing.clamp(f32::EPSILON, 1.0);
    let mut converging = false;

    for body in bodies.iter_mut() {
        let distance = pointer.map(|pointer| (pointer - body.position).length());
        body.target_radius = config.target_radius(body.base_radius, distance);

        let gap = body.target_radius - body.current_radius;
        body.current_radius = if gap.abs() < SETTLE_EPSILON * 0.1 {
            body.target_radius
        } else {
            body.current_radius + gap * smoothing
        };
        body.current_radius = body
            .current_radius
            .clamp(body.base_radius, body.base_radius * config.max_expansion);

        converging |= (body.target_radius - body.current_radius).abs() > SETTLE_EPSILON;
    }

    converging
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn bodies() -> Vec<Body> {
        (0..6)
            .map(|index| Body::new(vec2(index as f32 * 40.0, 100.0), 6.0 + index as f32))
            .collect()
    }

    #[test]
    fn target_radius_follows_quadratic_falloff() {
        let config = ProximityConfig::default();
        assert_eq!(config.target_radius(10.0, None), 10.0);
        assert_eq!(config.target_radius(10.0, Some(150.0)), 10.0);
        assert_eq!(config.target_radius(10.0, Some(400.0)), 10.0);
        assert!((config.target_radius(10.0, Some(0.0)) - 14.0).abs() < 1e-5);
        // d = 75 -> proximity 0.75 -> 1 + 0.4 * 0.75
        assert!((config.target_radius(10.0, Some(75.0)) - 13.0).abs() < 1e-5);

        let near = config.target_radius(10.0, Some(30.0));
        let far = config.target_radius(10.0, Some(90.0));
        assert!(near > far);
    }

    #[test]
    fn radii_converge_monotonically_and_stay_bounded() {
        let config = ProximityConfig::default();
        let mut bodies = bodies();
        let pointers = [
            Some(vec2(0.0, 100.0)),
            Some(vec2(120.0, 90.0)),
            None,
            Some(vec2(200.0, 140.0)),
        ];

        for pointer in pointers {
            for _ in 0..80 {
                let before = bodies.clone();
                update_radii(&mut bodies, pointer, &config);

                for (previous, body) in before.iter().zip(&bodies) {
                    let old_gap = (previous.current_radius - body.target_radius).abs();
                    let new_gap = (body.current_radius - body.target_radius).abs();
                    assert!(new_gap <= old_gap + 1e-6);
                    assert!(body.current_radius >= body.base_radius);
                    assert!(body.current_radius <= body.base_radius * 1.4 + 1e-5);
                }
            }
        }
    }

    #[test]
    fn leaving_pointer_restores_base_radius() {
        let config = ProximityConfig::default();
        let mut bodies = bodies();

        for _ in 0..60 {
            update_radii(&mut bodies, Some(vec2(0.0, 100.0)), &config);
        }
        assert!(bodies[0].current_radius > bodies[0].base_radius * 1.35);

        let mut converging = true;
        for _ in 0..200 {
            converging = update_radii(&mut bodies, None, &config);
        }
        assert!(!converging);
        for body in &bodies {
            assert!((body.current_radius - body.base_radius).abs() < 1e-3);
        }
    }
}
