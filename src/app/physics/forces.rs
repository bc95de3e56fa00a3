use eframe::egui::Vec2;

use super::quadtree::QuadNode;

/// Pairs closer than this share a position and get no many-body push.
const COINCIDENT_DISTANCE_SQ: f32 = 1e-8;
const MIN_DISTANCE_SQ: f32 = 1.0;

fn inverse_distance_push(delta: Vec2, distance_sq: f32, strength: f32) -> Vec2 {
    delta * (strength / distance_sq.max(MIN_DISTANCE_SQ))
}

/// Barnes-Hut accumulation of the mild inverse-distance repulsion acting on
/// `index`.
pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            let delta = point - positions[other_index];
            let distance_sq = delta.length_sq();
            if distance_sq <= COINCIDENT_DISTANCE_SQ {
                continue;
            }
            *force += inverse_distance_push(delta, distance_sq, strength);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq();
    let can_approximate = !node.bounds.contains(point)
        && distance_sq > COINCIDENT_DISTANCE_SQ
        && (node.bounds.side_length() / distance_sq.sqrt()) < theta;

    if can_approximate {
        *force += inverse_distance_push(delta, distance_sq, strength * node.mass);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, strength, theta, force);
    }
}

/// Collects index pairs whose cells lie within `reach_sq` of each other.
/// Every pair appears once, ordered by traversal.
pub(super) fn collect_candidate_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    reach_sq: f32,
    pairs: &mut Vec<(usize, usize)>,
) {
    if !same_node && node_a.bounds.distance_sq_to(node_b.bounds) > reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    pairs.push((from, to));
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    pairs.push((from, to));
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

            collect_candidate_pairs(child_a, child_a, true, reach_sq, pairs);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                collect_candidate_pairs(child_a, child_b, false, reach_sq, pairs);
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
            collect_candidate_pairs(child, node_b, false, reach_sq, pairs);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            collect_candidate_pairs(node_a, child, false, reach_sq, pairs);
        }
    }
}
