//! Interactive window showing the rendered figure.

use anyhow::Result;
use convplot::Figure;

#[cfg(feature = "gui")]
pub const WINDOW_SIZE: (u32, u32) = (820, 820);

/// Blocks until the window is closed.
#[cfg(feature = "gui")]
pub fn show_figure(figure: &Figure, title: &str) -> Result<()> {
    use anyhow::anyhow;
    use eframe::egui;
    use tracing::debug;

    let (width, height) = WINDOW_SIZE;
    let rgb = crate::render::render_rgb(figure, WINDOW_SIZE)?;
    let image = egui::ColorImage::from_rgb([width as usize, height as usize], &rgb);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([width as f32, height as f32]),
        ..Default::default()
    };
    debug!("Opening display window ({}x{})", width, height);
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(FigureWindow {
                image: Some(image),
                texture: None,
            }))
        }),
    )
    .map_err(|err| anyhow!("display window failed: {}", err))
}

#[cfg(not(feature = "gui"))]
pub fn show_figure(_figure: &Figure, _title: &str) -> Result<()> {
    tracing::warn!("built without the `gui` feature; skipping display window");
    Ok(())
}

#[cfg(feature = "gui")]
struct FigureWindow {
    image: Option<eframe::egui::ColorImage>,
    texture: Option<eframe::egui::TextureHandle>,
}

#[cfg(feature = "gui")]
impl eframe::App for FigureWindow {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        use eframe::egui;

        if let Some(image) = self.image.take() {
            self.texture = Some(ctx.load_texture("figure", image, egui::TextureOptions::LINEAR));
        }
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = self.texture.as_ref() {
                ui.add(
                    egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                        .shrink_to_fit(),
                );
            }
        });
    }
}

#[cfg(all(test, feature = "gui"))]
mod tests {
    use super::*;
    use convplot::{Panel, Scale};

    #[test]
    fn window_image_matches_window_size() {
        let figure = Figure {
            title: Some("empty".to_string()),
            panels: vec![Panel::new(Scale::Linear, Scale::Log)],
        };
        let (width, height) = WINDOW_SIZE;
        let rgb = crate::render::render_rgb(&figure, WINDOW_SIZE).unwrap();
        let image = eframe::egui::ColorImage::from_rgb([width as usize, height as usize], &rgb);
        assert_eq!(image.size, [820, 820]);
    }
}
