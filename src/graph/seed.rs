use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::snapshot::NodeRecord;

/// Fraction of the canvas extent left empty on each side when placing
/// nodes at random.
const SEED_MARGIN: f32 = 0.3;

/// Layout bounds in world units. The origin is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(1000.0, 1000.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seeding {
    Inherited,
    Hinted,
    Random,
}

pub struct PositionSeeder {
    canvas: Canvas,
    rng: StdRng,
}

impl PositionSeeder {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(canvas: Canvas, seed: u64) -> Self {
        Self {
            canvas,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// `prior` holds the positions of the nodes that survive the current
    /// reconciliation.
    pub fn seed(&mut self, record: &NodeRecord, prior: &HashMap<String, Vec2>) -> (Vec2, Seeding) {
        if let Some(predecessor) = record.inherit.as_deref()
            && let Some(position) = prior.get(predecessor)
        {
            return (*position, Seeding::Inherited);
        }

        if record.ix.is_some() || record.iy.is_some() {
            let x = match record.ix {
                Some(x) => x,
                None => self.central(self.canvas.width),
            };
            let y = match record.iy {
                Some(y) => y,
                None => self.central(self.canvas.height),
            };
            return (vec2(x, y), Seeding::Hinted);
        }

        let x = self.central(self.canvas.width);
        let y = self.central(self.canvas.height);
        (vec2(x, y), Seeding::Random)
    }

    fn central(&mut self, extent: f32) -> f32 {
        let span = 1.0 - (SEED_MARGIN * 2.0);
        (self.rng.random::<f32>() * span + SEED_MARGIN) * extent
    }
}
