use macroquad::prelude::*;

use crate::config::SimConfig;
use crate::snapshot::{FlyerView, ObstacleView, Snapshot};

const BG_COLOR: Color = Color::new(0.02, 0.03, 0.08, 1.0);
const SKY_COLOR: Color = Color::new(0.05, 0.08, 0.16, 1.0);
const OBSTACLE_COLOR: Color = Color::new(0.2, 0.7, 0.35, 1.0);
const PASSED_COLOR: Color = Color::new(0.15, 0.4, 0.25, 1.0);
const FLOOR_COLOR: Color = Color::new(0.35, 0.3, 0.2, 1.0);

/// Screen margin reserved for the egui toolbar.
const TOOLBAR_HEIGHT: f32 = 64.0;

/// Field geometry the renderer needs, taken from the simulation config.
#[derive(Clone, Copy, Debug)]
pub struct FieldView {
    pub width: f32,
    pub floor_y: f32,
    pub flyer_size: Vec2,
    pub obstacle_size: Vec2,
}

impl FieldView {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            width: config.field.width,
            floor_y: config.field.floor_y,
            flyer_size: vec2(
                config.shapes.flyer_width as f32,
                config.shapes.flyer_height as f32,
            ),
            obstacle_size: vec2(
                config.shapes.obstacle_width as f32,
                config.shapes.obstacle_height as f32,
            ),
        }
    }

    /// Everything down to a strip of ground below the floor line.
    fn height(&self) -> f32 {
        self.floor_y + 40.0
    }

    /// Fit the whole field below the toolbar, centred horizontally.
    fn camera(&self) -> Camera2D {
        let avail_h = (screen_height() - TOOLBAR_HEIGHT).max(1.0);
        let scale = (screen_width() / self.width).min(avail_h / self.height());
        // Shift the target up so the field sits under the toolbar.
        let offset = TOOLBAR_HEIGHT * 0.5 / scale;
        Camera2D {
            target: vec2(self.width * 0.5, self.height() * 0.5 - offset),
            zoom: vec2(
                scale / screen_width() * 2.0,
                -scale / screen_height() * 2.0,
            ),
            ..Default::default()
        }
    }
}

/// HUD values that live outside the snapshot.
pub struct Hud {
    pub generation: u32,
    pub paused: bool,
    pub speed_multiplier: f32,
}

pub fn draw(snapshot: &Snapshot, field: &FieldView, hud: &Hud) {
    clear_background(BG_COLOR);

    set_camera(&field.camera());
    draw_rectangle(0.0, 0.0, field.width, field.floor_y, SKY_COLOR);

    for obstacle in &snapshot.obstacles {
        draw_obstacle(obstacle, field);
    }
    for flyer in &snapshot.flyers {
        draw_flyer(flyer, field.flyer_size);
    }

    draw_rectangle(
        0.0,
        field.floor_y,
        field.width,
        field.height() - field.floor_y,
        FLOOR_COLOR,
    );
    draw_line(0.0, field.floor_y, field.width, field.floor_y, 2.0, WHITE);

    set_default_camera();
    draw_hud(snapshot, hud);
}

fn draw_obstacle(obstacle: &ObstacleView, field: &FieldView) {
    let color = if obstacle.passed {
        PASSED_COLOR
    } else {
        OBSTACLE_COLOR
    };
    let size = field.obstacle_size;
    draw_rectangle(obstacle.x, obstacle.top, size.x, size.y, color);
    draw_rectangle(obstacle.x, obstacle.bottom, size.x, size.y, color);
    // Lip on each gap edge.
    let lip = Color::new(color.r * 1.3, color.g * 1.3, color.b * 1.3, 1.0);
    draw_rectangle(obstacle.x - 4.0, obstacle.gap_center - 16.0, size.x + 8.0, 16.0, lip);
    draw_rectangle(obstacle.x - 4.0, obstacle.bottom, size.x + 8.0, 16.0, lip);
}

/// Oval body with a beak, rotated by the cosmetic tilt (positive is nose up).
fn draw_flyer(flyer: &FlyerView, size: Vec2) {
    let center = vec2(flyer.x, flyer.y) + size * 0.5;
    let heading = -flyer.tilt.to_radians();
    let dir = Vec2::from_angle(heading);
    let perp = vec2(-dir.y, dir.x);

    let body = Color::new(0.95, 0.8, 0.2, 0.85);
    draw_ellipse(center.x, center.y, size.x * 0.5, size.y * 0.5, -flyer.tilt, body);

    let front = center + dir * size.x * 0.65;
    let beak_l = center + dir * size.x * 0.4 + perp * size.y * 0.15;
    let beak_r = center + dir * size.x * 0.4 - perp * size.y * 0.15;
    draw_triangle(front, beak_l, beak_r, Color::new(0.95, 0.45, 0.15, 1.0));

    let eye = center + dir * size.x * 0.2 - perp * size.y * 0.15;
    draw_circle(eye.x, eye.y, size.y * 0.1, Color::new(0.9, 0.95, 1.0, 0.9));
}

fn draw_hud(snapshot: &Snapshot, hud: &Hud) {
    let tc = Color::new(0.7, 0.75, 0.8, 1.0);
    let sh = Color::new(0.0, 0.0, 0.0, 0.5);

    let lines = [
        format!("Gen: {}", hud.generation),
        format!("Score: {}", snapshot.score),
        format!("Alive: {}", snapshot.alive()),
        format!("Tick: {}  ({}x)", snapshot.tick, hud.speed_multiplier),
    ];
    for (i, text) in lines.iter().enumerate() {
        let y = TOOLBAR_HEIGHT + 20.0 + i as f32 * 20.0;
        draw_text(text, 11.0, y + 1.0, 18.0, sh);
        draw_text(text, 10.0, y, 18.0, tc);
    }

    if hud.paused {
        let pause_text = "PAUSED (Space to resume)";
        let tw = measure_text(pause_text, None, 24, 1.0).width;
        let x = screen_width() * 0.5 - tw * 0.5;
        let y = TOOLBAR_HEIGHT + 30.0;
        draw_text(pause_text, x + 1.0, y + 1.0, 24.0, sh);
        draw_text(pause_text, x, y, 24.0, Color::new(1.0, 0.8, 0.2, 0.9));
    }
}
