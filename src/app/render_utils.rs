use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

/// Samples per curved link.
const ARC_SEGMENTS: usize = 16;

/// Maps world coordinates to the canvas. The layout centre sits at the
/// centre of the canvas rect before panning.
#[derive(Clone, Copy, Debug)]
pub(super) struct ViewTransform {
    pub(super) rect: Rect,
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
    pub(super) origin: Vec2,
}

impl ViewTransform {
    pub(super) fn world_to_screen(self, world: Vec2) -> Pos2 {
        self.rect.center() + self.pan + (world - self.origin) * self.zoom
    }

    pub(super) fn screen_to_world(self, screen: Pos2) -> Vec2 {
        (screen - self.rect.center() - self.pan) / self.zoom + self.origin
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, view: ViewTransform) {
    let rect = view.rect;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * view.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = view.world_to_screen(view.origin);
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Points along the clockwise arc from `start` to `end` whose radius equals
/// the chord length, so every link bends by the same sixty degrees.
pub(super) fn arc_points(start: Pos2, end: Pos2) -> Vec<Pos2> {
    let chord = end - start;
    let length = chord.length();
    if length <= f32::EPSILON {
        return vec![start, end];
    }

    let direction = chord / length;
    // Clockwise on screen puts the centre to the right of the chord.
    let normal = vec2(-direction.y, direction.x);
    let apothem = length * 3.0_f32.sqrt() * 0.5;
    let center = start + chord * 0.5 + normal * apothem;

    let from = (start - center).angle();
    let mut to = (end - center).angle();
    if to < from {
        to += std::f32::consts::TAU;
    }
    if to - from > std::f32::consts::PI {
        to -= std::f32::consts::TAU;
    }

    (0..=ARC_SEGMENTS)
        .map(|step| {
            let angle = from + (to - from) * step as f32 / ARC_SEGMENTS as f32;
            center + Vec2::angled(angle) * length
        })
        .collect()
}

/// Drops the tail of `points` that lies inside a circle of `radius` around
/// the final point, leaving the path ending on the circle's edge.
pub(super) fn trim_to_radius(points: &mut Vec<Pos2>, radius: f32) {
    let Some(&tip) = points.last() else {
        return;
    };
    while points.len() > 2 && points[points.len() - 2].distance(tip) < radius {
        points.pop();
    }
    let len = points.len();
    if len < 2 {
        return;
    }

    let previous = points[len - 2];
    let segment = tip - previous;
    let segment_length = segment.length();
    if segment_length <= f32::EPSILON || previous.distance(tip) < radius {
        return;
    }
    points[len - 1] = tip - segment / segment_length * radius;
}

/// Filled arrow head ending at the last point of `points`.
pub(super) fn arrow_head(points: &[Pos2], size: f32, color: Color32) -> Option<Shape> {
    let [.., previous, tip] = points else {
        return None;
    };
    let direction = (*tip - *previous).normalized();
    if !direction.x.is_finite() || !direction.y.is_finite() {
        return None;
    }

    let normal = vec2(-direction.y, direction.x);
    let base = *tip - direction * size;
    Some(Shape::convex_polygon(
        vec![*tip, base + normal * size * 0.5, base - normal * size * 0.5],
        color,
        Stroke::NONE,
    ))
}
