use crate::app::{SonoliftApp, SPAWN_HEIGHT};
use egui::{pos2, remap, vec2, Align2, Color32, FontId, Rect, Sense, Stroke, Ui};

const PLATFORM_SIZE: egui::Vec2 = vec2(160.0, 18.0);
const METER_WIDTH: f32 = 24.0;
const MARGIN: f32 = 30.0;

/// Draws the platform in its travel range and a loudness meter with the
/// threshold mark.
pub fn draw_platform_view(app: &SonoliftApp, ui: &mut Ui) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let area = response.rect.shrink(MARGIN);
    let config = app.actuator.as_ref().map_or(&app.settings.actuator, |a| a.config());

    let rest = app
        .actuator
        .as_ref()
        .and_then(|a| a.state())
        .map_or(SPAWN_HEIGHT, |s| s.rest_position);
    let lower = rest + config.min_offset;
    let upper = rest + config.max_offset;
    let span = (upper - lower).abs().max(1.0);
    let world_min = lower - span * 0.25;
    let world_max = upper + span * 0.25;
    let to_screen_y = |y: f32| remap(y, world_min..=world_max, area.bottom()..=area.top());

    let guide = Stroke::new(1.0, Color32::from_gray(90));
    let bound = Stroke::new(1.5, Color32::from_rgb(200, 120, 60));
    let track_x = area.left()..=(area.right() - METER_WIDTH - MARGIN);

    painter.hline(track_x.clone(), to_screen_y(upper), bound);
    painter.hline(track_x.clone(), to_screen_y(lower), bound);
    painter.hline(track_x.clone(), to_screen_y(rest), guide);
    painter.text(
        pos2(*track_x.start(), to_screen_y(rest) - 2.0),
        Align2::LEFT_BOTTOM,
        "rest",
        FontId::monospace(11.0),
        Color32::GRAY,
    );

    let center_x = (*track_x.start() + *track_x.end()) * 0.5;
    let platform_rect = Rect::from_center_size(
        pos2(center_x, to_screen_y(app.platform.position.y)),
        PLATFORM_SIZE,
    );
    let fill = if app.is_running() {
        Color32::from_rgb(80, 160, 220)
    } else {
        Color32::from_gray(120)
    };
    painter.rect_filled(platform_rect, 3.0, fill);

    // Meter: full height is twice the threshold so the mark sits halfway.
    let meter_rect = Rect::from_min_max(
        pos2(area.right() - METER_WIDTH, area.top()),
        pos2(area.right(), area.bottom()),
    );
    let full_scale = (config.volume_threshold * 2.0).max(1e-3);
    let level = (app.displayed_loudness / full_scale).clamp(0.0, 1.0);
    painter.rect_filled(meter_rect, 2.0, Color32::from_gray(40));
    let filled = Rect::from_min_max(
        pos2(meter_rect.left(), remap(level, 0.0..=1.0, meter_rect.bottom()..=meter_rect.top())),
        meter_rect.max,
    );
    let loud = app.displayed_loudness > config.volume_threshold;
    let meter_color = if loud {
        Color32::from_rgb(230, 80, 80)
    } else {
        Color32::from_rgb(90, 200, 120)
    };
    painter.rect_filled(filled, 2.0, meter_color);
    painter.hline(
        meter_rect.x_range(),
        meter_rect.center().y,
        Stroke::new(2.0, Color32::WHITE),
    );
}
