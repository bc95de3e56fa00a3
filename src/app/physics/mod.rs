mod forces;
mod quadtree;
mod targets;

use eframe::egui::{Vec2, vec2};

use forces::{accumulate_repulsion_for_node, collect_candidate_pairs};
use quadtree::QuadNode;
pub(in crate::app) use targets::{FilterSet, LayoutTarget, layout_targets};

const BARNES_HUT_THETA: f32 = 0.9;
const ALPHA_MIN: f32 = 0.001;
const SEPARATION_EPSILON: f32 = 0.0001;

/// Engine-owned simulation state of one item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Body {
    pub(in crate::app) position: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) base_radius: f32,
    pub(in crate::app) target_radius: f32,
    pub(in crate::app) current_radius: f32,
}

impl Body {
    pub(in crate::app) fn new(position: Vec2, base_radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            base_radius,
            target_radius: base_radius,
            current_radius: base_radius,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct EngineConfig {
    pub(in crate::app) velocity_decay: f32,
    pub(in crate::app) alpha_decay: f32,
    pub(in crate::app) repulsion: f32,
    pub(in crate::app) collision_padding: f32,
    pub(in crate::app) collision_strength: f32,
    pub(in crate::app) collision_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            velocity_decay: 0.3,
            alpha_decay: 0.015,
            repulsion: 4.0,
            collision_padding: 12.0,
            collision_strength: 0.9,
            collision_iterations: 2,
        }
    }
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    pairs: Vec<(usize, usize)>,
}

impl PhysicsScratch {
    fn load_positions(&mut self, bodies: &[Body]) {
        self.positions.clear();
        self.positions.extend(bodies.iter().map(|body| body.position));
    }
}

/// Iterative force relaxation: springs toward per-body targets, a mild
/// many-body repulsion, and a positional collision pass. Excitation (`alpha`)
/// decays geometrically; once below `ALPHA_MIN` ticks do nothing until the
/// engine is re-excited.
pub(in crate::app) struct LayoutEngine {
    config: EngineConfig,
    alpha: f32,
    running: bool,
    scratch: PhysicsScratch,
}

impl LayoutEngine {
    pub(in crate::app) fn new(config: EngineConfig) -> Self {
        Self {
            config,
            alpha: 1.0,
            running: true,
            scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn config(&self) -> EngineConfig {
        self.config
    }

    pub(in crate::app) fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.running
    }

    /// True while a tick would still move bodies.
    pub(in crate::app) fn is_active(&self, body_count: usize) -> bool {
        self.running && body_count > 0 && self.alpha >= ALPHA_MIN
    }

    /// Freezes positions. Stopping a stopped engine is a no-op.
    pub(in crate::app) fn stop(&mut self) {
        if self.running {
            log::trace!("layout engine stopped at alpha {:.3}", self.alpha);
        }
        self.running = false;
    }

    pub(in crate::app) fn restart(&mut self, alpha: f32) {
        self.running = true;
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Raises excitation to at least `alpha` without touching the run flag.
    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub(in crate::app) fn tick(&mut self, bodies: &mut [Body], targets: &[LayoutTarget]) -> bool {
        if !self.is_active(bodies.len()) {
            return false;
        }

        self.alpha -= self.alpha * self.config.alpha_decay;
        let alpha = self.alpha;

        for (body, target) in bodies.iter_mut().zip(targets) {
            body.velocity.x += (target.x - body.position.x) * target.strength_x * alpha;
            body.velocity.y += (target.y - body.position.y) * target.strength_y * alpha;
        }

        self.apply_repulsion(bodies, alpha);

        let keep = 1.0 - self.config.velocity_decay.clamp(0.0, 1.0);
        for body in bodies.iter_mut() {
            body.velocity *= keep;
            body.position += body.velocity;
        }

        for _ in 0..self.config.collision_iterations {
            resolve_collisions(
                bodies,
                self.config.collision_padding,
                self.config.collision_strength,
                &mut self.scratch,
            );
        }

        true
    }

    fn apply_repulsion(&mut self, bodies: &mut [Body], alpha: f32) {
        if bodies.len() < 2 || self.config.repulsion <= 0.0 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.load_positions(bodies);
        let Some(tree) = QuadNode::build(&scratch.positions) else {
            return;
        };

        scratch.forces.clear();
        scratch.forces.resize(bodies.len(), Vec2::ZERO);
        let strength = self.config.repulsion * alpha;
        for (index, force) in scratch.forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(
                &tree,
                index,
                &scratch.positions,
                strength,
                BARNES_HUT_THETA,
                force,
            );
        }

        for (body, force) in bodies.iter_mut().zip(&scratch.forces) {
            body.velocity += *force;
        }
    }
}

fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// One Gauss-Seidel sweep pushing overlapping circles apart, split evenly
/// between both bodies. Returns how many pairs were overlapping.
fn resolve_collisions(
    bodies: &mut [Body],
    padding: f32,
    strength: f32,
    scratch: &mut PhysicsScratch,
) -> usize {
    if bodies.len() < 2 {
        return 0;
    }

    scratch.load_positions(bodies);
    let Some(tree) = QuadNode::build(&scratch.positions) else {
        return 0;
    };

    let max_radius = bodies
        .iter()
        .map(|body| body.current_radius)
        .fold(0.0_f32, f32::max);
    let reach = (max_radius * 2.0) + padding;
    scratch.pairs.clear();
    collect_candidate_pairs(&tree, &tree, true, reach * reach, &mut scratch.pairs);

    let mut overlapping = 0usize;
    for &(from, to) in &scratch.pairs {
        let delta = bodies[from].position - bodies[to].position;
        let min_distance = bodies[from].current_radius + bodies[to].current_radius + padding;
        let distance_sq = delta.length_sq();
        if distance_sq >= min_distance * min_distance {
            continue;
        }

        let distance = distance_sq.sqrt();
        let direction = if distance > SEPARATION_EPSILON {
            delta / distance
        } else {
            fallback_direction(from, to)
        };

        let shift = direction * ((min_distance - distance) * 0.5 * strength);
        bodies[from].position += shift;
        bodies[to].position -= shift;
        overlapping += 1;
    }

    overlapping
}
