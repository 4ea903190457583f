use egui;

use super::{Readout, UiState};
use crate::stats::TrainingStats;

/// Status strip + compact controls.
pub fn draw_toolbar(
    ctx: &egui::Context,
    ui_state: &mut UiState,
    readout: &Readout,
    stats: &TrainingStats,
) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.add_space(3.0);
        ui.horizontal_wrapped(|ui| {
            title_badge(ui, "UPDRAFT");

            ui.separator();
            compact_group(ui, "Sim", |ui| {
                let pause_label = if ui_state.paused { "Play" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    ui_state.paused = !ui_state.paused;
                }
                if ui.button("Step").clicked() {
                    ui_state.step_requested = true;
                }
            });

            compact_group(ui, "Speed", |ui| {
                for speed in [1.0, 2.0, 5.0, 10.0, 50.0] {
                    speed_button(ui, ui_state, speed);
                }
            });

            compact_group(ui, "Panels", |ui| {
                ui.toggle_value(&mut ui_state.show_graphs, "Graphs");
            });

            ui.separator();
            metric_chip(ui, "Gen", format!("{}", readout.generation));
            metric_chip(ui, "Score", format!("{}", readout.score));
            metric_chip(ui, "Alive", format!("{}", readout.alive));
            metric_chip(ui, "Tick", format!("{}", readout.tick));
            if let Some(best) = stats.best_ever {
                metric_chip(ui, "Best", format!("{best:.1}"));
            }
        });
        ui.add_space(3.0);
    });
}

fn speed_button(ui: &mut egui::Ui, ui_state: &mut UiState, speed: f32) {
    let label = format!("{speed}x");
    let selected = (ui_state.speed_multiplier - speed).abs() < 0.01;
    if ui.selectable_label(selected, label).clicked() {
        ui_state.speed_multiplier = speed;
    }
}

fn title_badge(ui: &mut egui::Ui, label: &str) {
    let text = egui::RichText::new(label)
        .strong()
        .color(egui::Color32::from_rgb(190, 220, 255));
    ui.label(text);
}

fn compact_group(ui: &mut egui::Ui, heading: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(heading)
                    .small()
                    .color(egui::Color32::from_rgb(150, 170, 185)),
            );
            add_contents(ui);
        });
    });
}

fn metric_chip(ui: &mut egui::Ui, key: &str, value: String) {
    let text = egui::RichText::new(format!("{key}: {value}"))
        .small()
        .color(egui::Color32::from_rgb(205, 215, 225));
    ui.group(|ui| {
        ui.label(text);
    });
}
