use eframe::egui::{Vec2, vec2};

/// Bodies a cell holds before it is split.
const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square given by its top-left corner and side length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
    pub(super) min: Vec2,
    pub(super) size: f32,
}

impl Square {
    /// Smallest padded square around `points`; `None` when empty or non-finite.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min, mut max) = (*first, *first);
        for point in rest {
            min = min.min(*point);
            max = max.max(*point);
        }
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let size = (max - min).max_elem().max(1.0) + 2.0;
        Some(Self {
            min: min - Vec2::splat(1.0),
            size,
        })
    }

    pub(super) fn center(self) -> Vec2 {
        self.min + Vec2::splat(self.size * 0.5)
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let max = self.min + Vec2::splat(self.size);
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }

    /// Whether the square touches the box of half-width `reach` around `point`.
    pub(super) fn reaches(self, point: Vec2, reach: f32) -> bool {
        let max = self.min + Vec2::splat(self.size);
        point.x + reach >= self.min.x
            && point.x - reach <= max.x
            && point.y + reach >= self.min.y
            && point.y - reach <= max.y
    }

    /// Quadrant bit 0 is east, bit 1 is south.
    fn quadrant_of(self, point: Vec2) -> usize {
        let center = self.center();
        usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
    }

    fn quarter(self, quadrant: usize) -> Self {
        let half = self.size * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { 0.0 } else { half },
            if quadrant & 2 == 0 { 0.0 } else { half },
        );
        Self {
            min: self.min + offset,
            size: half,
        }
    }
}

/// One square of the tree. Internal cells keep no bodies of their own.
#[derive(Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    /// Summed strength of every body below the cell.
    pub(super) charge: f32,
    /// Body centre weighted by `|strength|`.
    pub(super) center_of_charge: Vec2,
    pub(super) bodies: Vec<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Flattened cell geometry for the debug overlay.
#[derive(Clone, Debug)]
pub struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Barnes–Hut quadtree stored as an arena of cells; the root is cell 0.
#[derive(Debug)]
pub(super) struct Quadtree {
    cells: Vec<Cell>,
}

impl Quadtree {
    pub(super) const ROOT: usize = 0;

    /// `charges` may be shorter than `positions`; missing strengths count as 0.
    pub(super) fn build(positions: &[Vec2], charges: &[f32]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let mut tree = Self { cells: Vec::new() };
        tree.push_cell(square, (0..positions.len()).collect(), positions, charges);

        let mut pending = vec![(Self::ROOT, 0usize)];
        while let Some((index, depth)) = pending.pop() {
            if depth >= MAX_DEPTH || tree.cells[index].bodies.len() <= LEAF_CAPACITY {
                continue;
            }

            let square = tree.cells[index].square;
            let mut buckets: [Vec<usize>; 4] = Default::default();
            for &body in &tree.cells[index].bodies {
                buckets[square.quadrant_of(positions[body])].push(body);
            }
            if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
                continue;
            }

            tree.cells[index].bodies.clear();
            for (quadrant, bucket) in buckets.into_iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }
                let child = tree.push_cell(square.quarter(quadrant), bucket, positions, charges);
                tree.cells[index].children[quadrant] = Some(child);
                pending.push((child, depth + 1));
            }
        }

        Some(tree)
    }

    fn push_cell(
        &mut self,
        square: Square,
        bodies: Vec<usize>,
        positions: &[Vec2],
        charges: &[f32],
    ) -> usize {
        let mut charge = 0.0_f32;
        let mut weight = 0.0_f32;
        let mut weighted = Vec2::ZERO;
        for &body in &bodies {
            let strength = charges.get(body).copied().unwrap_or(0.0);
            charge += strength;
            weight += strength.abs();
            weighted += positions[body] * strength.abs();
        }

        self.cells.push(Cell {
            square,
            charge,
            center_of_charge: if weight > 0.0 {
                weighted / weight
            } else {
                square.center()
            },
            bodies,
            children: [None; 4],
        });
        self.cells.len() - 1
    }

    pub(super) fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(super) fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells[index].children.iter().flatten().copied()
    }

    /// Appends every cell, parents before children.
    pub(super) fn overlay(&self, out: &mut Vec<QuadtreeCell>) {
        let mut pending = vec![(Self::ROOT, 0usize)];
        while let Some((index, depth)) = pending.pop() {
            let cell = &self.cells[index];
            out.push(QuadtreeCell {
                center: cell.square.center(),
                half_extent: cell.square.size * 0.5,
                depth,
                is_leaf: cell.is_leaf(),
            });
            pending.extend(self.children(index).map(|child| (child, depth + 1)));
        }
    }
}
