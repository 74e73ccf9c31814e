use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::Node;
use crate::style::{link_stroke_weight, node_color, node_radius, text_color};

use super::super::render_utils::{
    ViewTransform, arc_points, arrow_head, blend_color, dim_color, draw_background, edge_visible,
    trim_to_radius,
};
use super::super::{RenderStyle, SearchMatchCache, ViewModel};

const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(150, 150, 150, 200);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn node_matches(matcher: &SkimMatcherV2, node: &Node, query: &str) -> bool {
    fuzzy_match_score(matcher, node.display_name(), query).is_some()
        || fuzzy_match_score(matcher, &node.id, query).is_some()
}

impl ViewModel {
    pub(in crate::app) fn view_transform(&self, rect: Rect) -> ViewTransform {
        ViewTransform {
            rect,
            pan: self.pan,
            zoom: self.zoom,
            origin: self.config.canvas.center(),
        }
    }

    pub(in crate::app) fn update_screen_space(&mut self, view: ViewTransform) {
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in self.store.nodes() {
            scratch
                .screen_positions
                .push(view.world_to_screen(node.position()));
            scratch
                .screen_radii
                .push((node_radius(node) * view.zoom).max(1.5));
        }

        Self::visible_indices_into(
            view.rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(scratch.screen_positions.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
        self.visible_node_count = scratch.visible_indices.len();
        scratch.revision = Some(self.store.revision());
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.store.revision()
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .store
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node_matches(&matcher, node, search_query))
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: self.store.revision(),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn draw_quadtree_overlay(&mut self, painter: &egui::Painter, view: ViewTransform) {
        let cells = &mut self.view_scratch.quadtree_cells;
        self.simulation.quadtree_cells(&self.store, cells);
        for cell in cells.iter() {
            let min = cell.center - vec2(cell.half_extent, cell.half_extent);
            let max = cell.center + vec2(cell.half_extent, cell.half_extent);
            let top_left = view.world_to_screen(vec2(min.x, min.y));
            let top_right = view.world_to_screen(vec2(max.x, min.y));
            let bottom_right = view.world_to_screen(vec2(max.x, max.y));
            let bottom_left = view.world_to_screen(vec2(min.x, max.y));

            let alpha = if cell.is_leaf { 110 } else { 55 };
            let line_width: f32 =
                (1.4_f32 - (cell.depth as f32 * 0.09_f32)).clamp(0.45_f32, 1.4_f32);
            let stroke = Stroke::new(
                line_width,
                Color32::from_rgba_unmultiplied(106, 198, 255, alpha),
            );

            painter.line_segment([top_left, top_right], stroke);
            painter.line_segment([top_right, bottom_right], stroke);
            painter.line_segment([bottom_right, bottom_left], stroke);
            painter.line_segment([bottom_left, top_left], stroke);
        }
    }

    fn draw_links(&mut self, painter: &egui::Painter, view: ViewTransform) {
        let zoom_sqrt = view.zoom.sqrt();
        let arrow_size = (7.0 * zoom_sqrt).clamp(3.0, 12.0);
        let scratch = &self.view_scratch;
        let mut visible_link_count = 0usize;

        for link in self.store.links() {
            let (Some(source), Some(target)) = (
                self.store.index_of(link.endpoints.source_id()),
                self.store.index_of(link.endpoints.target_id()),
            ) else {
                continue;
            };
            let (Some(&start), Some(&end)) = (
                scratch.screen_positions.get(source),
                scratch.screen_positions.get(target),
            ) else {
                continue;
            };

            let weight = link_stroke_weight(link.value.as_ref());
            if weight <= 0.0 {
                continue;
            }

            let visible = scratch.visible_mask.get(source).copied().unwrap_or(false)
                || scratch.visible_mask.get(target).copied().unwrap_or(false);
            let reach = (end - start).length() * 0.2;
            if !visible && !edge_visible(view.rect, start, end, reach + 2.5) {
                continue;
            }

            let stroke = Stroke::new((weight * zoom_sqrt).clamp(0.4, 24.0), LINK_COLOR);
            match self.style {
                RenderStyle::Bubble => {
                    let mut points = arc_points(start, end);
                    let target_radius = scratch.screen_radii.get(target).copied().unwrap_or(0.0);
                    trim_to_radius(&mut points, target_radius + 1.0);
                    if let Some(head) = arrow_head(&points, arrow_size, LINK_COLOR) {
                        painter.add(head);
                    }
                    painter.add(Shape::line(points, stroke));
                }
                RenderStyle::Lines => {
                    painter.line_segment([start, end], stroke);
                }
            }
            visible_link_count += 1;
        }

        self.visible_link_count = visible_link_count;
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        let view = self.view_transform(rect);
        draw_background(&painter, view);

        // Snapshots drained this frame may have shifted arena indices.
        self.update_screen_space(view);
        self.handle_node_drag(ui, view, &response);

        let mut ticking = false;
        if self.live_physics {
            ticking = self.simulation.tick(&mut self.store).is_some();
        }
        if ticking || self.dragged.is_some() {
            ui.ctx().request_repaint();
            self.update_screen_space(view);
        }

        if self.show_quadtree_overlay {
            self.draw_quadtree_overlay(&painter, view);
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        self.draw_links(&painter, view);

        let hovered = self.hovered_index(ui);
        if hovered.is_some() || self.dragged.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.dragged.is_some() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::Grab
                };
            });
        }
        let hovered_index = hovered.map(|(index, _)| index);

        let scratch = &self.view_scratch;
        for (index, node) in self.store.nodes().iter().enumerate() {
            if !scratch.visible_mask.get(index).copied().unwrap_or(false) {
                continue;
            }

            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            let is_hovered = hovered_index == Some(index);
            let is_dragged = self.dragged.as_deref() == Some(node.id.as_str());
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = node_color(node);
            let fill = if is_hovered || is_dragged {
                blend_color(base_color, Color32::WHITE, 0.25)
            } else if search_active && !is_match {
                dim_color(base_color, 0.38)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, fill);
            let outline = match self.style {
                RenderStyle::Bubble => Stroke::new(1.5, Color32::from_rgba_unmultiplied(255, 255, 255, 170)),
                RenderStyle::Lines => Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            };
            painter.circle_stroke(position, radius, outline);
            if is_match {
                painter.circle_stroke(
                    position,
                    radius + 3.0,
                    Stroke::new(1.6, Color32::from_rgb(103, 196, 255)),
                );
            }

            let should_draw_label = is_hovered
                || is_dragged
                || (is_match && self.zoom > 0.35)
                || (self.show_labels && (radius > 9.0 || self.zoom > 1.2));
            if !should_draw_label {
                continue;
            }

            match self.style {
                RenderStyle::Bubble => {
                    painter.text(
                        position,
                        Align2::CENTER_CENTER,
                        node.display_name(),
                        FontId::proportional((radius * 0.7).clamp(9.0, 16.0)),
                        text_color(fill),
                    );
                }
                RenderStyle::Lines => {
                    painter.text(
                        position + vec2(radius + 5.0, 0.0),
                        Align2::LEFT_CENTER,
                        node.display_name(),
                        FontId::proportional(12.0),
                        Color32::from_gray(238),
                    );
                }
            }
        }

        if let Some((index, _)) = hovered
            && let Some(node) = self.store.nodes().get(index)
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                self.hover_readout(node),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    fn hover_readout(&self, node: &Node) -> String {
        let degree = self
            .store
            .links()
            .iter()
            .filter(|link| {
                link.endpoints.source_id() == node.id || link.endpoints.target_id() == node.id
            })
            .count();
        let value = node
            .value
            .map_or_else(|| "-".to_owned(), |value| format!("{value}"));
        format!(
            "{}  |  group {}  |  {}  |  value {}  |  links {}",
            node.display_name(),
            node.group,
            node.status.label(),
            value,
            degree
        )
    }
}
