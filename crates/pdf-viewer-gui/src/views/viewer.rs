use eframe::egui;
use pdf_viewer_runtime::{CommittedFrame, RegionSize, ToolbarState};

/// Toolbar clicks for the app to turn into viewer commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Open,
    Previous,
    Next,
    Close,
    ToggleLog,
}

pub fn show_toolbar(ui: &mut egui::Ui, toolbar: &ToolbarState) -> Option<ToolbarAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        if ui.button("📂 Open…").clicked() {
            action = Some(ToolbarAction::Open);
        }

        ui.separator();

        if ui
            .add_enabled(toolbar.can_previous, egui::Button::new("◀ Previous"))
            .clicked()
        {
            action = Some(ToolbarAction::Previous);
        }

        ui.label(toolbar.label());

        if ui
            .add_enabled(toolbar.can_next, egui::Button::new("Next ▶"))
            .clicked()
        {
            action = Some(ToolbarAction::Next);
        }

        ui.separator();

        let has_document = toolbar.document_name.is_some();
        if ui
            .add_enabled(has_document, egui::Button::new("Close"))
            .clicked()
        {
            action = Some(ToolbarAction::Close);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("📋 Log").clicked() {
                action = Some(ToolbarAction::ToggleLog);
            }
            if let Some(name) = &toolbar.document_name {
                ui.weak(name);
            }
        });
    });

    action
}

/// The texture currently shown in the display region
#[derive(Default)]
pub struct PageView {
    texture: Option<egui::TextureHandle>,
    page: Option<usize>,
}

impl PageView {
    pub fn show_frame(&mut self, ctx: &egui::Context, frame: &CommittedFrame) {
        let surface = &frame.surface;
        let size = [surface.width as usize, surface.height as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &surface.rgba);

        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("pdf_page", image, egui::TextureOptions::LINEAR));
            }
        }
        self.page = Some(frame.request.page);
    }

    pub fn clear(&mut self) {
        self.texture = None;
        self.page = None;
    }
}

/// Fill the remaining space with the display region and return its size in pixels
pub fn show_page(ui: &mut egui::Ui, view: &PageView, loading: bool) -> RegionSize {
    let available = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(available, egui::Sense::hover());
    let pixels_per_point = ui.ctx().pixels_per_point();

    // Surfaces are rendered in physical pixels
    if let Some(texture) = &view.texture {
        let size = texture.size_vec2() / pixels_per_point;
        let image_rect = egui::Rect::from_center_size(rect.center(), size);
        egui::Image::new((texture.id(), size)).paint_at(ui, image_rect);
        if let Some(page) = view.page {
            response.on_hover_text(format!("Page {}", page));
        }
    } else if loading {
        let spinner_rect = egui::Rect::from_center_size(rect.center(), egui::vec2(32.0, 32.0));
        egui::Spinner::new().paint_at(ui, spinner_rect);
    } else {
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Drop a PDF file here or click Open…",
            egui::FontId::proportional(16.0),
            ui.visuals().weak_text_color(),
        );
    }

    RegionSize::new(
        (rect.width() * pixels_per_point).floor(),
        (rect.height() * pixels_per_point).floor(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_viewer_core::{DocumentId, Generation, PageSize, RasterSurface, RenderRequest};
    use std::sync::Arc;

    fn frame(page: usize) -> CommittedFrame {
        CommittedFrame {
            request: RenderRequest {
                generation: Generation(page as u64),
                document: DocumentId(1),
                page,
                region: RegionSize::new(4.0, 4.0),
            },
            scale: 0.01,
            natural_size: PageSize::new(400.0, 400.0),
            surface: Arc::new(RasterSurface::filled(4, 4, [255, 255, 255, 255])),
        }
    }

    #[test]
    fn test_page_view_tracks_shown_page() {
        let ctx = egui::Context::default();
        let mut view = PageView::default();

        view.show_frame(&ctx, &frame(3));
        assert_eq!(view.page, Some(3));
        assert_eq!(view.texture.as_ref().unwrap().size(), [4, 4]);

        view.show_frame(&ctx, &frame(4));
        assert_eq!(view.page, Some(4));

        view.clear();
        assert!(view.page.is_none());
        assert!(view.texture.is_none());
    }
}
