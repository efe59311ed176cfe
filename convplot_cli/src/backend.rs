use std::cell::Cell;
use std::panic;

use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use tracing::warn;

/// Wraps a backend so that a missing or broken font drops the affected text
/// instead of failing the whole figure.
pub struct FontSafeBackend<DB> {
    inner: DB,
    dropped: Cell<usize>,
}

impl<DB> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            dropped: Cell::new(0),
        }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let dropped = self.dropped.replace(0);
        if dropped > 0 {
            warn!("{} text labels were skipped: no usable font", dropped);
        }
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let inner = &mut self.inner;
        match panic::catch_unwind(panic::AssertUnwindSafe(|| inner.draw_text(text, style, pos))) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                self.dropped.set(self.dropped.get() + 1);
                Ok(())
            }
            Ok(result) => result,
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                Ok(approximate_text_size(text, style.size()))
            }
            Ok(result) => result,
        }
    }
}

/// Monospace guess at the extent of `text` set at `size` pixels.
fn approximate_text_size(text: &str, size: f64) -> (u32, u32) {
    let size = if size.is_finite() && size > 0.0 { size } else { 12.0 };
    let width = text.chars().count() as f64 * size * 3.0 / 5.0;
    (width.ceil() as u32, size.ceil() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::style::{FontDesc, FontFamily, FontStyle, TextStyle};
    use std::io;

    /// Backend whose font rasterizer errors on "error" and panics on "panic".
    struct BrokenFonts {
        drawn: Vec<String>,
    }

    fn font_error() -> DrawingErrorKind<io::Error> {
        DrawingErrorKind::FontError(Box::new(io::Error::new(
            io::ErrorKind::NotFound,
            "no font",
        )))
    }

    impl DrawingBackend for BrokenFonts {
        type ErrorType = io::Error;

        fn get_size(&self) -> (u32, u32) {
            (64, 64)
        }

        fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), DrawingErrorKind<io::Error>> {
            Ok(())
        }

        fn draw_pixel(
            &mut self,
            _point: BackendCoord,
            _color: BackendColor,
        ) -> Result<(), DrawingErrorKind<io::Error>> {
            Ok(())
        }

        fn draw_text<TStyle: BackendTextStyle>(
            &mut self,
            text: &str,
            _style: &TStyle,
            _pos: BackendCoord,
        ) -> Result<(), DrawingErrorKind<io::Error>> {
            match text {
                "error" => Err(font_error()),
                "panic" => panic!("rasterizer blew up"),
                _ => {
                    self.drawn.push(text.to_string());
                    Ok(())
                }
            }
        }

        fn estimate_text_size<TStyle: BackendTextStyle>(
            &self,
            text: &str,
            _style: &TStyle,
        ) -> Result<(u32, u32), DrawingErrorKind<io::Error>> {
            match text {
                "panic" => panic!("rasterizer blew up"),
                _ => Err(font_error()),
            }
        }
    }

    fn style() -> TextStyle<'static> {
        TextStyle::from(FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Normal))
    }

    #[test]
    fn broken_fonts_drop_text_and_reset_on_present() {
        let mut backend = FontSafeBackend::new(BrokenFonts { drawn: Vec::new() });
        let style = style();

        assert!(backend.draw_text("error", &style, (1, 1)).is_ok());
        assert!(backend.draw_text("panic", &style, (1, 1)).is_ok());
        assert!(backend.draw_text("kept", &style, (1, 1)).is_ok());
        assert_eq!(backend.dropped.get(), 2);
        assert_eq!(backend.inner.drawn, vec!["kept".to_string()]);

        backend.present().unwrap();
        assert_eq!(backend.dropped.get(), 0);
    }

    #[test]
    fn text_size_falls_back_to_estimate() {
        let backend = FontSafeBackend::new(BrokenFonts { drawn: Vec::new() });
        let style = style();
        assert_eq!(
            backend.estimate_text_size("abcd", &style).unwrap(),
            approximate_text_size("abcd", 20.0)
        );
        assert_eq!(
            backend.estimate_text_size("panic", &style).unwrap(),
            (60, 20)
        );
    }

    #[test]
    fn approximate_size_scales_with_length() {
        assert_eq!(approximate_text_size("", 20.0), (0, 20));
        assert_eq!(approximate_text_size("abcd", 10.0), (24, 10));
        assert_eq!(approximate_text_size("π", f64::NAN), (8, 12));
    }
}
