use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) damping: f32,
}

/// Deterministic unit vector for two bodies sitting on the same point.
pub(super) fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn direction_between(delta: Vec2, distance: f32, from: usize, to: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        fallback_direction(from, to)
    }
}

fn repulsion_between(
    positions: &[Vec2],
    from: usize,
    to: usize,
    params: RepulsionParams,
) -> Vec2 {
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    let direction = direction_between(delta, distance_sq.sqrt(), from, to);
    direction * (params.strength / (distance_sq + params.softening))
}

pub(super) fn accumulate_repulsion_pairwise(
    positions: &[Vec2],
    params: RepulsionParams,
    forces: &mut [Vec2],
) {
    let count = positions.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let push = repulsion_between(positions, i, j, params);
            forces[i] += push;
            forces[j] -= push;
        }
    }
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *force += repulsion_between(positions, index, other, params);
            }
        }
        return;
    }

    let point = positions[index];
    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let far_enough = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta
        && node.mass > 1.0;

    if far_enough {
        *force += (delta / distance) * (params.strength * node.mass)
            / (distance_sq + params.softening);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

fn collide(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = radii[from] + radii[to] + params.padding;
    if distance >= min_distance {
        return;
    }

    let direction = direction_between(delta, distance, from, to);
    let push = direction * (min_distance - distance) * params.strength;
    forces[from] += push;
    forces[to] -= push;
}

pub(super) fn accumulate_collision_pairwise(
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let count = positions.len();
    for i in 0..count {
        for j in (i + 1)..count {
            collide(i, j, positions, radii, params, forces);
        }
    }
}

/// Dual-tree walk: cell pairs further apart than their largest radii plus the
/// padding cannot contain a colliding pair and are skipped.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let reach = node_a.max_radius + node_b.max_radius + params.padding;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[(offset + 1)..] {
                    collide(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);
            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}

pub(super) fn accumulate_link_springs(
    positions: &[Vec2],
    velocities: &[Vec2],
    radii: &[f32],
    edges: &[(usize, usize)],
    params: LinkParams,
    forces: &mut [Vec2],
) {
    let count = positions.len();
    for &(from, to) in edges {
        if from >= count || to >= count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let preferred = params.distance + radii[from] + radii[to];
        let spring = (distance - preferred) * params.strength;
        let relative_velocity = velocities[from] - velocities[to];
        let damping = relative_velocity.dot(direction) * params.damping;
        let correction = direction * (spring + damping);

        forces[from] -= correction;
        forces[to] += correction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_collision_matches_pairwise() {
        let positions = (0..60)
            .map(|index| {
                let angle = index as f32 * 2.399_963;
                vec2(angle.cos(), angle.sin()) * (index as f32).sqrt() * 9.0
            })
            .collect::<Vec<_>>();
        let radii = (0..60).map(|index| 4.0 + (index % 5) as f32).collect::<Vec<_>>();
        let params = CollisionParams {
            strength: 0.7,
            padding: 4.0,
        };

        let mut pairwise = vec![Vec2::ZERO; positions.len()];
        accumulate_collision_pairwise(&positions, &radii, params, &mut pairwise);

        let tree = QuadNode::build(&positions, &radii).expect("finite positions");
        let mut walked = vec![Vec2::ZERO; positions.len()];
        accumulate_collision_pairs(&tree, &tree, true, &positions, &radii, params, &mut walked);

        for (a, b) in pairwise.iter().zip(&walked) {
            assert!((*a - *b).length() < 1e-3, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn repulsion_pushes_apart_symmetrically() {
        let positions = [vec2(-5.0, 0.0), vec2(5.0, 0.0)];
        let params = RepulsionParams {
            strength: 100.0,
            softening: 0.0,
            theta: 0.7,
        };
        let mut forces = [Vec2::ZERO; 2];
        accumulate_repulsion_pairwise(&positions, params, &mut forces);
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-6);
    }

    #[test]
    fn spring_pulls_distant_pair_together() {
        let positions = [vec2(0.0, 0.0), vec2(500.0, 0.0)];
        let velocities = [Vec2::ZERO; 2];
        let params = LinkParams {
            distance: 30.0,
            strength: 0.05,
            damping: 0.2,
        };
        let mut forces = [Vec2::ZERO; 2];
        accumulate_link_springs(&positions, &velocities, &[5.0, 5.0], &[(0, 1)], params, &mut forces);
        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
    }
}
