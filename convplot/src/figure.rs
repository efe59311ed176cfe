//! Backend-independent description of the diagnostic charts.
//!
//! A [`Figure`] is a vertical stack of [`Panel`]s. The CLI turns it into
//! pixels; this module only decides what goes where.

use crate::derive::{Derived, MonteCarloSeries, NewtonSeries};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLUE: Rgb = Rgb(31, 119, 180);
    pub const ORANGE: Rgb = Rgb(255, 127, 14);
    pub const RED: Rgb = Rgb(214, 39, 40);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// Whether `v` can be placed on an axis of this scale.
    pub fn accepts(self, v: f64) -> bool {
        match self {
            Scale::Linear => v.is_finite(),
            Scale::Log => v.is_finite() && v > 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    /// Solid line with a circle on every point.
    Markers,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: LineStyle,
    pub color: Rgb,
}

impl Series {
    pub fn new(
        label: impl Into<String>,
        xs: &[f64],
        ys: &[f64],
        style: LineStyle,
        color: Rgb,
    ) -> Self {
        Self {
            label: label.into(),
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
            style,
            color,
        }
    }
}

/// Vertical error bars, `center ± half_width` at each x.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorBars {
    pub label: String,
    pub xs: Vec<f64>,
    pub centers: Vec<f64>,
    pub half_widths: Vec<f64>,
    pub color: Rgb,
    pub alpha: f64,
}

impl ErrorBars {
    /// `(x, low, center, high)` for every bar.
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.xs
            .iter()
            .zip(self.centers.iter())
            .zip(self.half_widths.iter())
            .map(|((&x, &c), &h)| (x, c - h, c, c + h))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub series: Vec<Series>,
    pub error_bars: Option<ErrorBars>,
}

impl Panel {
    pub fn new(x_scale: Scale, y_scale: Scale) -> Self {
        Self {
            title: None,
            x_label: None,
            y_label: None,
            x_scale,
            y_scale,
            series: Vec::new(),
            error_bars: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = Some(x.into());
        self.y_label = Some(y.into());
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn error_bars(mut self, bars: ErrorBars) -> Self {
        self.error_bars = Some(bars);
        self
    }

    /// Points of `series` that fit this panel's scales, in order.
    pub fn plottable<'a>(&self, series: &'a Series) -> impl Iterator<Item = (f64, f64)> + 'a {
        let (xs, ys) = (self.x_scale, self.y_scale);
        series
            .points
            .iter()
            .copied()
            .filter(move |&(x, y)| xs.accepts(x) && ys.accepts(y))
    }

    /// Error bars whose x and both ends fit this panel's scales.
    pub fn plottable_bars(&self) -> Vec<(f64, f64, f64, f64)> {
        let Some(bars) = self.error_bars.as_ref() else {
            return Vec::new();
        };
        bars.bars()
            .filter(|&(x, lo, c, hi)| {
                self.x_scale.accepts(x)
                    && self.y_scale.accepts(lo)
                    && self.y_scale.accepts(c)
                    && self.y_scale.accepts(hi)
            })
            .collect()
    }

    /// Axis extents covering every plottable value, padded slightly.
    pub fn bounds(&self) -> Bounds {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for series in &self.series {
            for (x, y) in self.plottable(series) {
                xs.push(x);
                ys.push(y);
            }
        }
        for (x, lo, _, hi) in self.plottable_bars() {
            xs.push(x);
            ys.push(lo);
            ys.push(hi);
        }
        Bounds {
            x: axis_extent(&xs, self.x_scale),
            y: axis_extent(&ys, self.y_scale),
        }
    }
}

fn axis_extent(values: &[f64], scale: Scale) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return match scale {
            Scale::Linear => (0.0, 1.0),
            Scale::Log => (1.0, 10.0),
        };
    }
    match scale {
        Scale::Linear => {
            let span = hi - lo;
            if span <= f64::EPSILON * hi.abs().max(1.0) {
                let pad = (hi.abs() * 0.1).max(1.0);
                (lo - pad, hi + pad)
            } else {
                (lo - span * 0.05, hi + span * 0.05)
            }
        }
        Scale::Log => {
            let decades = (hi / lo).log10();
            if decades <= f64::EPSILON {
                (lo / 10.0, hi * 10.0)
            } else {
                let pad = 10f64.powf(decades * 0.05);
                (lo / pad, hi * pad)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub panels: Vec<Panel>,
}

impl Derived {
    pub fn figure(&self) -> Figure {
        match self {
            Derived::MonteCarlo(series) => monte_carlo_figure(series),
            Derived::Newton(series) => newton_figure(series),
        }
    }
}

/// Two stacked panels: the running estimate with its one-sigma band, and
/// the relative error against the `c / sqrt(N)` decay.
pub fn monte_carlo_figure(series: &MonteCarloSeries) -> Figure {
    let n = series.samples.to_vec();
    let reference_line = vec![series.reference; n.len()];

    let estimate = Panel::new(Scale::Log, Scale::Linear)
        .title("Monte Carlo method for π estimate")
        .labels("samples N", "estimate")
        .series(Series::new(
            "Monte Carlo estimate",
            &n,
            &series.estimate.to_vec(),
            LineStyle::Solid,
            Rgb::BLUE,
        ))
        .series(Series::new(
            "π from math.pi",
            &n,
            &reference_line,
            LineStyle::Dashed,
            Rgb::RED,
        ))
        .error_bars(ErrorBars {
            label: "1 s.t.d.".to_string(),
            xs: n.clone(),
            centers: series.estimate.to_vec(),
            half_widths: series.std_dev.to_vec(),
            color: Rgb::ORANGE,
            alpha: 0.3,
        });

    let error = Panel::new(Scale::Log, Scale::Log)
        .labels("samples N", "relative error")
        .series(Series::new(
            "Relative error: (estimate - π) / π",
            &n,
            &series.rel_error.to_vec(),
            LineStyle::Solid,
            Rgb::BLUE,
        ))
        .series(Series::new(
            "1/sqrt(N)",
            &n,
            &series.decay.to_vec(),
            LineStyle::Dashed,
            Rgb::GREEN,
        ));

    Figure {
        title: None,
        panels: vec![estimate, error],
    }
}

/// Estimate per iteration, and the absolute error against the ideal
/// quadratic-convergence prediction.
pub fn newton_figure(series: &NewtonSeries) -> Figure {
    let k = series.iteration.to_vec();

    let estimate = Panel::new(Scale::Linear, Scale::Linear)
        .title("Newton-Raphson convergence")
        .labels("iteration", "estimate")
        .series(Series::new(
            "Newton-Raphson estimate",
            &k,
            &series.estimate.to_vec(),
            LineStyle::Markers,
            Rgb::BLUE,
        ));

    let error = Panel::new(Scale::Linear, Scale::Log)
        .labels("iteration", "absolute error")
        .series(Series::new(
            "Absolute error",
            &k,
            &series.abs_error.to_vec(),
            LineStyle::Markers,
            Rgb::BLUE,
        ))
        .series(Series::new(
            "Quadratic model e(k-1)^2",
            &k,
            &series.quadratic.to_vec(),
            LineStyle::Dashed,
            Rgb::RED,
        ));

    Figure {
        title: None,
        panels: vec![estimate, error],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{MonteCarloSeries, PI_REFERENCE};
    use crate::loader::parse_table;
    use crate::schema::Variant;

    fn mc_series() -> MonteCarloSeries {
        let text = "10,3.2,0.3\n100,3.12,0.02\n1000,3.1432,0.0027\n10000,3.1418,0.00027\n";
        let table = parse_table(text.as_bytes(), b',', &Variant::MonteCarlo.schema()).unwrap();
        MonteCarloSeries::from_table(&table, PI_REFERENCE, 0.3).unwrap()
    }

    #[test]
    fn monte_carlo_figure_layout() {
        let figure = monte_carlo_figure(&mc_series());
        assert_eq!(figure.panels.len(), 2);

        let top = &figure.panels[0];
        assert_eq!(top.x_scale, Scale::Log);
        assert_eq!(top.y_scale, Scale::Linear);
        assert_eq!(top.title.as_deref(), Some("Monte Carlo method for π estimate"));
        assert_eq!(top.series.len(), 2);
        assert_eq!(top.series[1].style, LineStyle::Dashed);
        assert!(top.series[1].points.iter().all(|&(_, y)| y == PI_REFERENCE));
        let bars = top.error_bars.as_ref().unwrap();
        assert_eq!(bars.xs.len(), 4);

        let bottom = &figure.panels[1];
        assert_eq!((bottom.x_scale, bottom.y_scale), (Scale::Log, Scale::Log));
        assert_eq!(bottom.series[1].label, "1/sqrt(N)");
        assert!((bottom.series[1].points[1].1 - 0.03).abs() < 1e-15);
    }

    #[test]
    fn log_bounds_ignore_non_positive_values() {
        let panel = Panel::new(Scale::Log, Scale::Log).series(Series::new(
            "err",
            &[0.0, 10.0, 100.0],
            &[1.0, 0.0, 0.01],
            LineStyle::Solid,
            Rgb::BLUE,
        ));
        let plotted: Vec<_> = panel.plottable(&panel.series[0]).collect();
        assert_eq!(plotted, vec![(100.0, 0.01)]);
        let bounds = panel.bounds();
        assert!(bounds.x.0 > 0.0 && bounds.x.0 < 100.0 && bounds.x.1 > 100.0);
        assert!(bounds.y.0 > 0.0 && bounds.y.0 < 0.01 && bounds.y.1 > 0.01);
    }

    #[test]
    fn linear_bounds_cover_error_bars() {
        let panel = Panel::new(Scale::Linear, Scale::Linear)
            .series(Series::new("s", &[1.0, 2.0], &[3.0, 3.0], LineStyle::Solid, Rgb::BLUE))
            .error_bars(ErrorBars {
                label: "bars".into(),
                xs: vec![1.0, 2.0],
                centers: vec![3.0, 3.0],
                half_widths: vec![0.5, 1.0],
                color: Rgb::ORANGE,
                alpha: 0.3,
            });
        let bounds = panel.bounds();
        assert!(bounds.y.0 < 2.0 && bounds.y.1 > 4.0);
        assert!(bounds.x.0 < 1.0 && bounds.x.1 > 2.0);
    }

    #[test]
    fn degenerate_extent_is_widened() {
        let panel = Panel::new(Scale::Linear, Scale::Log).series(Series::new(
            "flat",
            &[5.0],
            &[0.1],
            LineStyle::Solid,
            Rgb::BLUE,
        ));
        let bounds = panel.bounds();
        assert!(bounds.x.0 < 5.0 && bounds.x.1 > 5.0);
        assert!((bounds.y.0 - 0.01).abs() < 1e-12 && (bounds.y.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_panel_has_default_extent() {
        let panel = Panel::new(Scale::Log, Scale::Linear);
        assert_eq!(panel.bounds(), Bounds { x: (1.0, 10.0), y: (0.0, 1.0) });
    }
}
