use eframe::egui;
use log::Level;
use pdf_viewer_runtime::{AppLogger, LogEntry};

fn level_color(ui: &egui::Ui, level: Level) -> egui::Color32 {
    match level {
        Level::Error => ui.visuals().error_fg_color,
        Level::Warn => ui.visuals().warn_fg_color,
        _ => ui.visuals().text_color(),
    }
}

fn entry_label(ui: &mut egui::Ui, entry: &LogEntry) {
    ui.colored_label(
        level_color(ui, entry.level),
        format!(
            "{} {:<5} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.level,
            entry.message
        ),
    );
}

pub fn show_status_bar(ui: &mut egui::Ui, logger: &AppLogger) {
    ui.horizontal(|ui| match logger.latest() {
        Some(entry) => {
            ui.colored_label(level_color(ui, entry.level), entry.message);
        }
        None => {
            ui.weak("Ready");
        }
    });
}

pub fn show_log_window(ctx: &egui::Context, logger: &AppLogger, open: &mut bool) {
    egui::Window::new("Log")
        .open(open)
        .default_size([520.0, 300.0])
        .show(ctx, |ui| {
            if ui.button("Clear").clicked() {
                logger.clear();
            }
            ui.separator();
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in logger.entries() {
                        entry_label(ui, &entry);
                    }
                });
        });
}
