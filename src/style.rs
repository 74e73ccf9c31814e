//! Visual encoding shared by the renderers: group colour bands, status
//! darkening, text contrast, node radius and link stroke weight.

use eframe::egui::Color32;

use crate::graph::{Measure, Node};

/// Groups cycle through the palette with this period.
pub const GROUP_BANDS: i64 = 16;
pub const DEFAULT_NODE_RADIUS: f32 = 5.0;

const PALETTE_STOPS: [(f32, [u8; 3]); 7] = [
    (0.0, [255, 0, 0]),
    (0.165, [255, 255, 0]),
    (0.33, [0, 128, 0]),
    (0.5, [0, 0, 255]),
    (0.665, [0, 255, 255]),
    (0.81, [255, 0, 255]),
    (1.0, [255, 0, 0]),
];

/// Lightness multiplier for darkened nodes (`0.7^1.5`).
const DARKEN_FACTOR: f32 = 0.585_662;

fn palette(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    for pair in PALETTE_STOPS.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        if t <= end {
            let local = if end > start { (t - start) / (end - start) } else { 0.0 };
            return std::array::from_fn(|channel| {
                let a = from[channel] as f32;
                let b = to[channel] as f32;
                (a + (b - a) * local).round() as u8
            });
        }
    }
    PALETTE_STOPS[PALETTE_STOPS.len() - 1].1
}

fn rgb_to_hsl([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;
    let chroma = max - min;
    if chroma <= f32::EPSILON {
        return (0.0, 0.0, lightness);
    }

    let saturation = if lightness < 0.5 {
        chroma / (max + min)
    } else {
        chroma / (2.0 - max - min)
    };
    let sector = if max == r {
        (g - b) / chroma + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };
    let hue = sector * 60.0;
    (hue, saturation, lightness)
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let m2 = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let m1 = 2.0 * lightness - m2;
    let channel = |h: f32| {
        let h = h.rem_euclid(360.0);
        let value = if h < 60.0 {
            m1 + (m2 - m1) * h / 60.0
        } else if h < 180.0 {
            m2
        } else if h < 240.0 {
            m1 + (m2 - m1) * (240.0 - h) / 60.0
        } else {
            m1
        };
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    };
    [channel(hue + 120.0), channel(hue), channel(hue - 120.0)]
}

fn darker(rgb: [u8; 3]) -> [u8; 3] {
    let (hue, saturation, lightness) = rgb_to_hsl(rgb);
    hsl_to_rgb(hue, saturation, lightness * DARKEN_FACTOR)
}

/// Band colour for `group`, darkened and faded as requested.
pub fn group_color(group: i64, darken: bool, opacity: Option<f32>) -> Color32 {
    let band = group.rem_euclid(GROUP_BANDS) as f32 / GROUP_BANDS as f32;
    let mut rgb = palette(band);
    if darken {
        rgb = darker(rgb);
    }
    let alpha = opacity
        .filter(|opacity| *opacity > 0.0)
        .map_or(255, |opacity| (opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], alpha)
}

pub fn node_color(node: &Node) -> Color32 {
    group_color(node.group, node.is_darkened(), node.opacity)
}

/// Black or white, whichever reads better on `fill`.
pub fn text_color(fill: Color32) -> Color32 {
    let luma = 0.299 * (fill.r() as f32 / 255.0)
        + 0.587 * (fill.g() as f32 / 255.0)
        + 0.114 * (fill.b() as f32 / 255.0);
    if luma < 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

pub fn node_radius(node: &Node) -> f32 {
    node.value
        .filter(|value| *value > 0.0)
        .map_or(DEFAULT_NODE_RADIUS, |value| value as f32)
}

/// Zero draws nothing, anything unusable draws a unit line, otherwise the
/// square root of the value.
pub fn link_stroke_weight(value: Option<&Measure>) -> f32 {
    let Some(value) = value.and_then(Measure::as_f64) else {
        return 1.0;
    };
    if value == 0.0 {
        0.0
    } else if value < 0.0 {
        1.0
    } else {
        value.sqrt() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_weight_follows_the_value_rules() {
        assert_eq!(link_stroke_weight(Some(&Measure::Number(0.0))), 0.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Text("0".into()))), 0.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Number(-1.0))), 1.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Number(9.0))), 3.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Number(4.0))), 2.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Text("16".into()))), 4.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Text("heavy".into()))), 1.0);
        assert_eq!(link_stroke_weight(Some(&Measure::Invalid)), 1.0);
        assert_eq!(link_stroke_weight(None), 1.0);
    }

    #[test]
    fn palette_hits_its_stops() {
        assert_eq!(group_color(0, false, None), Color32::from_rgb(255, 0, 0));
        assert_eq!(group_color(8, false, None), Color32::from_rgb(0, 0, 255));
        assert_eq!(group_color(16, false, None), group_color(0, false, None));
        assert_eq!(group_color(-8, false, None), group_color(8, false, None));
    }

    #[test]
    fn darkening_keeps_hue_and_lowers_lightness() {
        let dark = group_color(8, true, None);
        assert_eq!(dark.r(), 0);
        assert_eq!(dark.g(), 0);
        assert_eq!(dark.b(), 149);
    }

    #[test]
    fn opacity_becomes_alpha() {
        assert_eq!(group_color(0, false, Some(0.5)).a(), 128);
        assert_eq!(group_color(0, false, Some(0.0)).a(), 255);
    }

    #[test]
    fn text_contrast() {
        assert_eq!(text_color(Color32::from_rgb(0, 0, 255)), Color32::WHITE);
        assert_eq!(text_color(Color32::from_rgb(255, 255, 0)), Color32::BLACK);
    }
}
