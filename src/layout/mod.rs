//! Bounded-iteration force layout.
//!
//! Bodies live in coordinates relative to the viewport center while the
//! simulation runs; `Simulation::positions` hands them out in surface
//! coordinates with the origin at the top-left corner.

mod forces;
mod quadtree;

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use tracing::debug;

use forces::{
    CollisionParams, LinkParams, RepulsionParams, accumulate_collision_pairs,
    accumulate_collision_pairwise, accumulate_link_springs, accumulate_repulsion_for_node,
    accumulate_repulsion_pairwise, fallback_direction,
};
use quadtree::QuadNode;

const GOLDEN_ANGLE: f32 = 2.399_963;
const INITIAL_SPACING: f32 = 10.0;
const SETTLE_SLACK: f32 = 0.01;
const REHEAT_ALPHA: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        let clean = |value: f32| if value.is_finite() { value.max(1.0) } else { 1.0 };
        Self {
            width: clean(width),
            height: clean(height),
        }
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    fn half_extent(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    #[cfg(test)]
    pub fn contains(&self, point: Pos2, tolerance: f32) -> bool {
        point.x >= -tolerance
            && point.x <= self.width + tolerance
            && point.y >= -tolerance
            && point.y <= self.height + tolerance
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceConfig {
    pub iterations: usize,
    pub repulsion: f32,
    pub softening: f32,
    pub center_strength: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub link_damping: f32,
    pub velocity_damping: f32,
    pub step_scale: f32,
    pub max_speed: f32,
    pub alpha_min: f32,
    pub settle_passes: usize,
    pub barnes_hut_threshold: usize,
    pub theta: f32,
}

impl ForceConfig {
    /// Static summary map: short fixed budget, no links, weak spreading.
    pub fn pool_map() -> Self {
        Self {
            iterations: 200,
            repulsion: 1_800.0,
            softening: 400.0,
            center_strength: 0.01,
            collision_padding: 4.0,
            collision_strength: 0.7,
            link_distance: 0.0,
            link_strength: 0.0,
            link_damping: 0.0,
            velocity_damping: 0.6,
            step_scale: 1.0,
            max_speed: 40.0,
            alpha_min: 0.001,
            settle_passes: 300,
            barnes_hut_threshold: 96,
            theta: 0.8,
        }
    }

    /// Exploratory trade graph: longer budget plus maker/taker springs.
    pub fn wallet_graph() -> Self {
        Self {
            iterations: 300,
            repulsion: 9_000.0,
            softening: 600.0,
            center_strength: 0.01,
            collision_padding: 2.0,
            collision_strength: 0.7,
            link_distance: 40.0,
            link_strength: 0.04,
            link_damping: 0.2,
            velocity_damping: 0.6,
            step_scale: 1.0,
            max_speed: 30.0,
            alpha_min: 0.001,
            settle_passes: 300,
            barnes_hut_threshold: 96,
            theta: 0.8,
        }
    }

    fn alpha_decay(&self) -> f32 {
        let iterations = self.iterations.max(1) as f32;
        1.0 - self.alpha_min.clamp(1e-6, 1.0).powf(1.0 / iterations)
    }
}

struct Scratch {
    forces: Vec<Vec2>,
}

pub struct Simulation {
    config: ForceConfig,
    viewport: Viewport,
    radii: Vec<f32>,
    edges: Vec<(usize, usize)>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pinned: Option<(usize, Vec2)>,
    alpha: f32,
    alpha_decay: f32,
    budget: usize,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(
        radii: &[f32],
        edges: &[(usize, usize)],
        config: ForceConfig,
        viewport: Viewport,
    ) -> Self {
        let count = radii.len();
        let radii = radii
            .iter()
            .map(|radius| if radius.is_finite() { radius.max(0.0) } else { 0.0 })
            .collect::<Vec<_>>();
        let edges = edges
            .iter()
            .copied()
            .filter(|&(from, to)| from < count && to < count && from != to)
            .collect::<Vec<_>>();

        // Phyllotaxis spiral: every body starts near the center, none coincide.
        let positions = (0..count)
            .map(|index| {
                let distance = INITIAL_SPACING * (0.5 + index as f32).sqrt();
                let angle = index as f32 * GOLDEN_ANGLE;
                vec2(angle.cos(), angle.sin()) * distance
            })
            .collect::<Vec<_>>();

        Self {
            config,
            viewport,
            radii,
            edges,
            positions,
            velocities: vec![Vec2::ZERO; count],
            pinned: None,
            alpha: 1.0,
            alpha_decay: config.alpha_decay(),
            budget: config.iterations,
            scratch: Scratch {
                forces: vec![Vec2::ZERO; count],
            },
        }
    }

    pub fn is_running(&self) -> bool {
        self.budget > 0
    }

    /// Runs the remaining tick budget and settles. This is the whole layout
    /// pass; nothing moves afterwards unless the simulation is reheated.
    pub fn run_to_end(&mut self) {
        while self.budget > 0 {
            self.tick();
        }
        self.settle();
    }

    /// One frame of continuation after a reheat. Returns `true` while there is
    /// budget left.
    pub fn advance(&mut self) -> bool {
        if self.budget == 0 {
            return false;
        }

        self.tick();
        if self.budget == 0 {
            self.settle();
        }
        self.budget > 0
    }

    pub fn reheat(&mut self, ticks: usize) {
        self.alpha = self.alpha.max(REHEAT_ALPHA);
        self.budget = self.budget.max(ticks);
    }

    pub fn pin(&mut self, index: usize, surface_pos: Pos2) {
        if index >= self.positions.len() || !surface_pos.x.is_finite() || !surface_pos.y.is_finite()
        {
            return;
        }

        let world = surface_pos - self.viewport.center();
        self.positions[index] = world;
        self.velocities[index] = Vec2::ZERO;
        self.pinned = Some((index, world));
    }

    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    pub fn positions(&self) -> Vec<Pos2> {
        let center = self.viewport.center();
        self.positions
            .iter()
            .map(|world| {
                let point = center + *world;
                if point.x.is_finite() && point.y.is_finite() {
                    point
                } else {
                    center
                }
            })
            .collect()
    }

    fn tick(&mut self) {
        self.budget = self.budget.saturating_sub(1);
        let count = self.positions.len();
        if count == 0 {
            return;
        }

        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;
        let config = self.config;

        let forces = &mut self.scratch.forces;
        forces.clear();
        forces.resize(count, Vec2::ZERO);

        let repulsion = RepulsionParams {
            strength: config.repulsion,
            softening: config.softening.max(1.0),
            theta: config.theta,
        };
        let collision = CollisionParams {
            strength: config.collision_strength,
            padding: config.collision_padding,
        };

        if count > config.barnes_hut_threshold {
            if let Some(tree) = QuadNode::build(&self.positions, &self.radii) {
                for (index, force) in forces.iter_mut().enumerate() {
                    accumulate_repulsion_for_node(&tree, index, &self.positions, repulsion, force);
                }
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    &self.positions,
                    &self.radii,
                    collision,
                    forces,
                );
            }
        } else if count > 1 {
            accumulate_repulsion_pairwise(&self.positions, repulsion, forces);
            accumulate_collision_pairwise(&self.positions, &self.radii, collision, forces);
        }

        if config.link_strength > 0.0 {
            accumulate_link_springs(
                &self.positions,
                &self.velocities,
                &self.radii,
                &self.edges,
                LinkParams {
                    distance: config.link_distance,
                    strength: config.link_strength,
                    damping: config.link_damping,
                },
                forces,
            );
        }

        for (force, position) in forces.iter_mut().zip(&self.positions) {
            *force -= *position * config.center_strength;
        }

        let max_speed = config.max_speed.max(0.1);
        for index in 0..count {
            let mut velocity = (self.velocities[index] + forces[index] * (alpha * config.step_scale))
                * config.velocity_damping;
            let speed = velocity.length();
            if !speed.is_finite() {
                velocity = Vec2::ZERO;
            } else if speed > max_speed {
                velocity *= max_speed / speed;
            }

            self.velocities[index] = velocity;
            self.positions[index] += velocity;
        }

        if let Some((index, world)) = self.pinned {
            self.positions[index] = world;
            self.velocities[index] = Vec2::ZERO;
        } else {
            self.recenter();
        }

        self.confine();
    }

    fn recenter(&mut self) {
        let count = self.positions.len();
        if count == 0 {
            return;
        }

        let centroid = self.positions.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / count as f32;
        if centroid.x.is_finite() && centroid.y.is_finite() && centroid.length_sq() > 1e-6 {
            for position in &mut self.positions {
                *position -= centroid;
            }
        }
    }

    /// Keeps each body inside the viewport, inset by its radius when the
    /// viewport is large enough for that. Returns whether anything moved.
    fn confine(&mut self) -> bool {
        let half = self.viewport.half_extent();
        let mut moved = false;

        for index in 0..self.positions.len() {
            let radius = self.radii[index];
            let limit = vec2(
                (half.x - radius.min(half.x)).max(0.0),
                (half.y - radius.min(half.y)).max(0.0),
            );

            let position = &mut self.positions[index];
            if !position.x.is_finite() || !position.y.is_finite() {
                *position = Vec2::ZERO;
                self.velocities[index] = Vec2::ZERO;
                moved = true;
                continue;
            }

            let clamped = vec2(
                position.x.clamp(-limit.x, limit.x),
                position.y.clamp(-limit.y, limit.y),
            );
            if clamped != *position {
                if clamped.x != position.x {
                    self.velocities[index].x = 0.0;
                }
                if clamped.y != position.y {
                    self.velocities[index].y = 0.0;
                }
                *position = clamped;
                moved = true;
            }
        }

        moved
    }

    /// Positional relaxation that enforces `distance >= r_i + r_j + padding`
    /// exactly, alternating with viewport confinement.
    fn settle(&mut self) {
        let count = self.positions.len();
        let padding = self.config.collision_padding.max(0.0);
        let pinned = self.pinned.map(|(index, _)| index);

        let mut passes = 0usize;
        while passes < self.config.settle_passes {
            passes += 1;
            let mut separated = false;

            for i in 0..count {
                for j in (i + 1)..count {
                    let delta = self.positions[i] - self.positions[j];
                    let distance = delta.length();
                    let min_distance = self.radii[i] + self.radii[j] + padding;
                    if distance >= min_distance {
                        continue;
                    }

                    let direction = if distance > 0.0001 {
                        delta / distance
                    } else {
                        fallback_direction(i, j)
                    };
                    let push = (min_distance - distance) + SETTLE_SLACK;

                    // Larger bubbles move less.
                    let area_i = self.radii[i] * self.radii[i];
                    let area_j = self.radii[j] * self.radii[j];
                    let mut share_i = if area_i + area_j > 0.0 {
                        area_j / (area_i + area_j)
                    } else {
                        0.5
                    };
                    if pinned == Some(i) {
                        share_i = 0.0;
                    } else if pinned == Some(j) {
                        share_i = 1.0;
                    }

                    self.positions[i] += direction * push * share_i;
                    self.positions[j] -= direction * push * (1.0 - share_i);
                    separated = true;
                }
            }

            let confined = self.confine();
            if !separated && !confined {
                break;
            }
        }

        for velocity in &mut self.velocities {
            *velocity = Vec2::ZERO;
        }
        debug!(bodies = count, passes, "layout settled");
    }
}

/// Pure layout pass: fresh simulation, full budget, frozen result.
pub fn layout(
    radii: &[f32],
    edges: &[(usize, usize)],
    config: ForceConfig,
    viewport: Viewport,
) -> Vec<Pos2> {
    let mut simulation = Simulation::new(radii, edges, config, viewport);
    simulation.run_to_end();
    simulation.positions()
}
