pub mod graphs;
pub mod toolbar;

use crate::stats::TrainingStats;

/// Viewer controls shared by the toolbar, the keyboard and the main loop.
pub struct UiState {
    pub paused: bool,
    pub speed_multiplier: f32,
    pub step_requested: bool,
    pub show_graphs: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            paused: false,
            speed_multiplier: 1.0,
            step_requested: false,
            show_graphs: true,
        }
    }
}

/// Read-only numbers the toolbar shows.
pub struct Readout {
    pub generation: u32,
    pub score: u32,
    pub alive: usize,
    pub tick: u64,
}

/// Draw all egui UI panels.
pub fn draw_ui(ui_state: &mut UiState, readout: &Readout, stats: &TrainingStats) {
    egui_macroquad::ui(|ctx| {
        toolbar::draw_toolbar(ctx, ui_state, readout, stats);

        if ui_state.show_graphs {
            graphs::draw_graphs(ctx, stats);
        }
    });

    egui_macroquad::draw();
}
