use std::fs;
use std::panic;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use convplot::{Figure, LineStyle, Panel, Rgb, Scale};
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::backend::FontSafeBackend;

pub const FIGURE_SIZE: (u32, u32) = (960, 960);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bitmap,
    Svg,
}

impl ChartKind {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartKind::Svg,
            _ => ChartKind::Bitmap,
        }
    }
}

/// Output path with `.png` appended when no extension was given.
pub fn output_path(path: &Path) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("png")
    } else {
        path.to_path_buf()
    }
}

pub fn save_figure(figure: &Figure, path: &Path, size: (u32, u32)) -> Result<PathBuf> {
    let path = output_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    guarded(|| match ChartKind::for_path(&path) {
        ChartKind::Bitmap => {
            let backend = BitMapBackend::new(&path, size);
            draw_figure(FontSafeBackend::new(backend).into_drawing_area(), figure)
        }
        ChartKind::Svg => {
            let backend = SVGBackend::new(&path, size);
            draw_figure(FontSafeBackend::new(backend).into_drawing_area(), figure)
        }
    })
    .with_context(|| format!("failed to render {}", path.display()))?;
    Ok(path)
}

/// Renders into a packed RGB buffer of `size.0 * size.1 * 3` bytes.
pub fn render_rgb(figure: &Figure, size: (u32, u32)) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size.0 as usize * size.1 as usize * 3];
    guarded(|| {
        let backend = BitMapBackend::with_buffer(&mut buffer, size);
        draw_figure(FontSafeBackend::new(backend).into_drawing_area(), figure)
    })?;
    Ok(buffer)
}

fn guarded<F>(render: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| anyhow!("plotting backend panicked"))?
}

pub fn draw_figure<DB>(root: DrawingArea<DB, Shift>, figure: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let area = match figure.title.as_deref() {
        Some(title) => root.titled(
            title,
            FontDesc::new(FontFamily::SansSerif, 26.0, FontStyle::Normal),
        )?,
        None => root.clone(),
    };

    let rows = figure.panels.len().max(1);
    let cells = area.split_evenly((rows, 1));
    for (cell, panel) in cells.iter().zip(figure.panels.iter()) {
        draw_panel(cell, panel)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bounds = panel.bounds();
    let (x0, x1) = bounds.x;
    let (y0, y1) = bounds.y;
    match (panel.x_scale, panel.y_scale) {
        (Scale::Linear, Scale::Linear) => draw_panel_in(area, panel, x0..x1, y0..y1),
        (Scale::Log, Scale::Linear) => draw_panel_in(area, panel, (x0..x1).log_scale(), y0..y1),
        (Scale::Linear, Scale::Log) => draw_panel_in(area, panel, x0..x1, (y0..y1).log_scale()),
        (Scale::Log, Scale::Log) => {
            draw_panel_in(area, panel, (x0..x1).log_scale(), (y0..y1).log_scale())
        }
    }
}

fn draw_panel_in<DB, X, Y>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    x_spec: X,
    y_spec: Y,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
    X: AsRangedCoord<Value = f64>,
    Y: AsRangedCoord<Value = f64>,
    X::CoordDescType: ValueFormatter<f64>,
    Y::CoordDescType: ValueFormatter<f64>,
{
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50);
    if let Some(title) = panel.title.as_deref() {
        builder.caption(
            title,
            FontDesc::new(FontFamily::SansSerif, 22.0, FontStyle::Normal),
        );
    }
    let mut chart = builder.build_cartesian_2d(x_spec, y_spec)?;

    let x_ticks = |v: &f64| format_tick(*v, panel.x_scale);
    let y_ticks = |v: &f64| format_tick(*v, panel.y_scale);
    let axis_font = FontDesc::new(FontFamily::SansSerif, 16.0, FontStyle::Normal);
    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_ticks)
        .y_label_formatter(&y_ticks)
        .light_line_style(&BLACK.mix(0.05))
        .label_style(axis_font.clone().color(&BLACK.mix(0.85)))
        .axis_desc_style(axis_font);
    if let Some(label) = panel.x_label.as_deref() {
        mesh.x_desc(label);
    }
    if let Some(label) = panel.y_label.as_deref() {
        mesh.y_desc(label);
    }
    mesh.draw()?;

    if let Some(bars) = panel.error_bars.as_ref() {
        let visible = panel.plottable_bars();
        if !visible.is_empty() {
            let color = rgb(bars.color).mix(bars.alpha);
            chart.draw_series(LineSeries::new(
                visible.iter().map(|&(x, _, center, _)| (x, center)),
                color.stroke_width(2),
            ))?;
            chart
                .draw_series(visible.into_iter().map(|(x, lo, center, hi)| {
                    ErrorBar::new_vertical(x, lo, center, hi, color.filled(), 8)
                }))?
                .label(bars.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
        }
    }

    for series in &panel.series {
        let points: Vec<(f64, f64)> = panel.plottable(series).collect();
        if points.is_empty() {
            continue;
        }
        let color = series.color;
        let anno = match series.style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points, stroke(color)))?,
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(points, 10, 6, stroke(color)))?
            }
            LineStyle::Markers => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, 4, rgb(color).filled())),
                )?;
                chart.draw_series(LineSeries::new(points, stroke(color)))?
            }
        };
        anno.label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], stroke(color)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .label_font(FontDesc::new(
            FontFamily::SansSerif,
            16.0,
            FontStyle::Normal,
        ))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn stroke(color: Rgb) -> ShapeStyle {
    ShapeStyle {
        color: rgb(color).to_rgba(),
        filled: false,
        stroke_width: 2,
    }
}

fn format_tick(v: f64, scale: Scale) -> String {
    match scale {
        Scale::Log => {
            let exp = v.log10();
            if (exp - exp.round()).abs() < 1e-9 {
                format!("1e{}", exp.round() as i32)
            } else {
                format!("{:.1e}", v)
            }
        }
        Scale::Linear => {
            if v == 0.0 || (1e-3..1e5).contains(&v.abs()) {
                let s = format!("{:.4}", v);
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                format!("{:.2e}", v)
            }
        }
    }
}
