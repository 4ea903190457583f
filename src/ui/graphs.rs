use egui;

use crate::stats::{RingBuffer, TrainingStats};

const BEST_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 200, 100);
const MEAN_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 200, 100);

/// Fitness history across generations plus the live population curve.
pub fn draw_graphs(ctx: &egui::Context, stats: &TrainingStats) {
    egui::Window::new("Training")
        .default_pos(egui::pos2(560.0, 90.0))
        .default_size(egui::vec2(360.0, 300.0))
        .resizable(true)
        .show(ctx, |ui| {
            ui.collapsing("Fitness per generation", |ui| {
                let size = egui::vec2(ui.available_width(), 80.0);
                let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
                let rect = response.rect;
                painter.rect_filled(rect, 2.0, egui::Color32::from_gray(20));

                // Shared scale so best always sits above mean.
                let (lo, hi) = bounds([&stats.best_fitness, &stats.mean_fitness]);
                draw_line_in_rect(&painter, &stats.best_fitness, rect, lo, hi, BEST_COLOR);
                draw_line_in_rect(&painter, &stats.mean_fitness, rect, lo, hi, MEAN_COLOR);

                ui.horizontal(|ui| {
                    ui.colored_label(BEST_COLOR, "Best");
                    ui.colored_label(MEAN_COLOR, "Mean");
                });
            });

            ui.collapsing("Score per generation", |ui| {
                draw_line_graph(ui, &stats.score, egui::Color32::from_rgb(100, 180, 255));
            });

            ui.collapsing("Alive this generation", |ui| {
                draw_line_graph(ui, &stats.alive, egui::Color32::from_rgb(255, 120, 100));
            });
        });
}

fn draw_line_graph(ui: &mut egui::Ui, buffer: &RingBuffer, color: egui::Color32) {
    let size = egui::vec2(ui.available_width(), 80.0);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let rect = response.rect;

    painter.rect_filled(rect, 2.0, egui::Color32::from_gray(20));

    let (lo, hi) = bounds([buffer]);
    draw_line_in_rect(&painter, buffer, rect, lo, hi, color);

    if let Some(val) = buffer.last() {
        painter.text(
            egui::pos2(rect.right() - 4.0, rect.top() + 2.0),
            egui::Align2::RIGHT_TOP,
            format!("{val:.0}"),
            egui::FontId::proportional(10.0),
            egui::Color32::from_gray(200),
        );
    }
}

fn bounds<const N: usize>(buffers: [&RingBuffer; N]) -> (f32, f32) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for v in buffers.iter().flat_map(|b| b.iter()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return (0.0, 1.0);
    }
    (lo, hi.max(lo + 1.0))
}

fn draw_line_in_rect(
    painter: &egui::Painter,
    buffer: &RingBuffer,
    rect: egui::Rect,
    lo: f32,
    hi: f32,
    color: egui::Color32,
) {
    let len = buffer.len();
    if len < 2 {
        return;
    }
    let range = hi - lo;

    let points: Vec<egui::Pos2> = buffer
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = rect.left() + (i as f32 / (len - 1) as f32) * rect.width();
            let y = rect.bottom() - ((v - lo) / range) * rect.height();
            egui::pos2(x, y)
        })
        .collect();

    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], egui::Stroke::new(1.5, color));
    }
}
