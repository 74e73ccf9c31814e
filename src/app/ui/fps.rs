use std::collections::VecDeque;

use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 180;

/// Which readouts the header shows.
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct FpsReadouts {
    pub(in crate::app) enabled: bool,
    pub(in crate::app) current: bool,
    pub(in crate::app) average: bool,
    pub(in crate::app) low: bool,
    pub(in crate::app) high: bool,
    pub(in crate::app) frame_time: bool,
}

impl Default for FpsReadouts {
    fn default() -> Self {
        Self {
            enabled: true,
            current: true,
            average: true,
            low: false,
            high: false,
            frame_time: true,
        }
    }
}

/// Rolling window of frame rates.
#[derive(Debug, Default)]
pub(in crate::app) struct FrameStats {
    current: f32,
    samples: VecDeque<f32>,
}

impl FrameStats {
    pub(in crate::app) fn record(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.current = (1.0 / dt).clamp(0.0, 1000.0);
        self.samples.push_back(self.current);
        while self.samples.len() > FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    fn average(&self) -> Option<f32> {
        (!self.samples.is_empty())
            .then(|| self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub(in crate::app) fn text(&self, readouts: FpsReadouts) -> Option<String> {
        if !readouts.enabled {
            return None;
        }

        let mut parts = Vec::new();
        if readouts.current {
            parts.push(format!("FPS {:.0}", self.current));
        }
        if readouts.average
            && let Some(average) = self.average()
        {
            parts.push(format!("avg {average:.1}"));
        }
        if readouts.low
            && let Some(low) = self.samples.iter().copied().reduce(f32::min)
        {
            parts.push(format!("low {low:.0}"));
        }
        if readouts.high
            && let Some(high) = self.samples.iter().copied().reduce(f32::max)
        {
            parts.push(format!("high {high:.0}"));
        }
        if readouts.frame_time && self.current > f32::EPSILON {
            parts.push(format!("{:.1} ms", 1000.0 / self.current));
        }

        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.frame_stats.record(dt);
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        self.frame_stats.text(self.fps_readouts)
    }

    pub(in crate::app) fn visible_graph_text(&self) -> String {
        format!(
            "on screen: {} / {} nodes, {} / {} links",
            self.visible_node_count.min(self.store.node_count()),
            self.store.node_count(),
            self.visible_link_count.min(self.store.link_count()),
            self.store.link_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_bounded_and_averaged() {
        let mut stats = FrameStats::default();
        for _ in 0..(FPS_SAMPLE_WINDOW + 20) {
            stats.record(1.0 / 50.0);
        }
        stats.record(0.0);

        assert_eq!(stats.samples.len(), FPS_SAMPLE_WINDOW);
        assert!((stats.average().unwrap() - 50.0).abs() < 0.01);
        assert_eq!(
            stats.text(FpsReadouts::default()).as_deref(),
            Some("FPS 50 | avg 50.0 | 20.0 ms")
        );
    }

    #[test]
    fn disabled_readout_shows_nothing() {
        let mut stats = FrameStats::default();
        stats.record(0.01);
        let readouts = FpsReadouts {
            enabled: false,
            ..FpsReadouts::default()
        };
        assert_eq!(stats.text(readouts), None);
    }
}
