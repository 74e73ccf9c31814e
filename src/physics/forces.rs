use eframe::egui::{Vec2, vec2};

use super::quadtree::Quadtree;

/// Squared distance below which charge interactions are clamped.
const DISTANCE_MIN_SQ: f32 = 1.0;
/// Length of the separation vector used when two bodies coincide.
const COINCIDENT_OFFSET: f32 = 1e-3;

/// Deterministic unit vector for bodies sitting exactly on top of each other.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn charge_between(point: Vec2, other: Vec2, strength: f32, alpha: f32, ids: (usize, usize)) -> Vec2 {
    let mut delta = other - point;
    if delta.length_sq() <= f32::EPSILON {
        delta = fallback_direction(ids.0, ids.1) * COINCIDENT_OFFSET;
    }
    let distance_sq = delta.length_sq().max(DISTANCE_MIN_SQ);
    delta * (strength * alpha / distance_sq)
}

/// Many-body velocity change on body `index`. Negative strengths repel.
pub(super) fn charge_on(
    tree: &Quadtree,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    alpha: f32,
    theta: f32,
) -> Vec2 {
    let point = positions[index];
    let mut delta_v = Vec2::ZERO;
    let mut pending = vec![Quadtree::ROOT];

    while let Some(cell_index) = pending.pop() {
        let cell = tree.cell(cell_index);
        if cell.charge == 0.0 {
            continue;
        }

        if cell.is_leaf() {
            for &other in cell.bodies.iter().filter(|&&other| other != index) {
                delta_v += charge_between(point, positions[other], charges[other], alpha, (index, other));
            }
            continue;
        }

        let delta = cell.center_of_charge - point;
        let distance = delta.length().max(COINCIDENT_OFFSET);
        if !cell.square.contains(point) && cell.square.size / distance < theta {
            delta_v += delta * (cell.charge * alpha / (distance * distance).max(DISTANCE_MIN_SQ));
        } else {
            pending.extend(tree.children(cell_index));
        }
    }

    delta_v
}

/// Pushes an overlapping pair apart, the smaller body taking the larger share.
fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = positions[from] - positions[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    if distance_sq <= f32::EPSILON {
        delta = fallback_direction(from, to) * COINCIDENT_OFFSET;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

/// Resolves every overlapping pair once. `positions` are the predicted
/// positions the tree was built from; cells out of reach of a body are skipped.
pub(super) fn collide(
    tree: &Quadtree,
    positions: &[Vec2],
    radii: &[f32],
    max_radius: f32,
    strength: f32,
    deltas: &mut [Vec2],
) {
    let mut pending = Vec::new();
    for index in 0..positions.len() {
        let reach = radii[index] + max_radius;
        pending.clear();
        pending.push(Quadtree::ROOT);

        while let Some(cell_index) = pending.pop() {
            let cell = tree.cell(cell_index);
            if !cell.square.reaches(positions[index], reach) {
                continue;
            }
            if !cell.is_leaf() {
                pending.extend(tree.children(cell_index));
                continue;
            }
            for &other in cell.bodies.iter().filter(|&&other| other > index) {
                collide_pair(index, other, positions, radii, strength, deltas);
            }
        }
    }
}

/// A bound link: arena indices plus the spring parameters resolved at bind
/// time. `bias` is the share of the correction taken by the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct SpringTerm {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Applied link by link so later springs see earlier velocity changes.
pub(super) fn apply_springs(
    springs: &[SpringTerm],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    let count = positions.len();
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        if source >= count || target >= count || source == target {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() <= f32::EPSILON {
            delta = fallback_direction(source, target) * COINCIDENT_OFFSET;
        }
        let length = delta.length();
        let correction = delta * ((length - spring.distance) / length * alpha * spring.strength);

        velocities[target] -= correction * spring.bias;
        velocities[source] += correction * (1.0 - spring.bias);
    }
}

/// Translates every body so the centroid moves toward `center`.
pub(super) fn apply_centering(positions: &mut [Vec2], center: Vec2, strength: f32) {
    if positions.is_empty() || strength <= 0.0 {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for position in positions.iter() {
        centroid += *position;
    }
    centroid /= positions.len() as f32;

    let shift = (centroid - center) * strength;
    for position in positions.iter_mut() {
        *position -= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let charges = [-100.0, -100.0];
        let tree = Quadtree::build(&positions, &charges).unwrap();

        let left = charge_on(&tree, 0, &positions, &charges, 1.0, 0.9);
        let right = charge_on(&tree, 1, &positions, &charges, 1.0, 0.9);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        // dx * strength * alpha / l² = 10 * -100 / 100
        assert!((left.x + 10.0).abs() < 1e-4);
    }

    #[test]
    fn far_clusters_are_approximated() {
        let mut positions = (0..20)
            .map(|index| vec2(1000.0 + (index % 5) as f32 * 200.0, (index / 5) as f32 * 200.0))
            .collect::<Vec<_>>();
        positions.push(vec2(0.0, 0.0));
        let charges = vec![-10.0; positions.len()];
        let tree = Quadtree::build(&positions, &charges).unwrap();

        let exact = positions[..20]
            .iter()
            .enumerate()
            .map(|(other, &position)| charge_between(positions[20], position, -10.0, 1.0, (20, other)))
            .fold(Vec2::ZERO, |sum, delta| sum + delta);
        let approximated = charge_on(&tree, 20, &positions, &charges, 1.0, 0.9);

        assert!(approximated.x < 0.0);
        assert!((approximated - exact).length() < exact.length() * 0.05);
    }

    #[test]
    fn coincident_bodies_still_separate() {
        let positions = [vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let radii = [5.0, 5.0];
        let tree = Quadtree::build(&positions, &[]).unwrap();
        let mut deltas = vec![Vec2::ZERO; 2];

        collide(&tree, &positions, &radii, 5.0, 0.7, &mut deltas);

        assert!(deltas[0].length() > 0.0);
        assert!((deltas[0] + deltas[1]).length() < 1e-4);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];
        let spring = SpringTerm {
            source: 0,
            target: 1,
            distance: 30.0,
            strength: 1.0,
            bias: 0.5,
        };

        apply_springs(&[spring], &positions, &mut velocities, 1.0);

        assert!((velocities[0].x - 35.0).abs() < 1e-3);
        assert!((velocities[1].x + 35.0).abs() < 1e-3);
    }

    #[test]
    fn centering_moves_the_centroid() {
        let mut positions = [vec2(0.0, 0.0), vec2(20.0, 40.0)];
        apply_centering(&mut positions, vec2(500.0, 500.0), 1.0);
        let centroid = (positions[0] + positions[1]) / 2.0;
        assert!((centroid - vec2(500.0, 500.0)).length() < 1e-3);
        assert_eq!(positions[1] - positions[0], vec2(20.0, 40.0));
    }
}
