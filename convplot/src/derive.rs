//! Derived error series and reference curves.
//!
//! Everything here is a pure function of the loaded columns. Division by a
//! zero sample count or a zero reference follows IEEE semantics.

use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loader::Table;
use crate::schema::{ColumnRole, Variant};
use crate::PlotError;

#[allow(clippy::excessive_precision)]
pub const PI_REFERENCE: f64 = 3.1415926535897932;

/// Scale `c` of the `c / sqrt(N)` Monte Carlo decay reference.
pub const DEFAULT_DECAY_CONSTANT: f64 = 0.3;

pub fn absolute_error(estimate: ArrayView1<'_, f64>, reference: f64) -> Array1<f64> {
    estimate.mapv(|v| (v - reference).abs())
}

pub fn relative_error(estimate: ArrayView1<'_, f64>, reference: f64) -> Array1<f64> {
    absolute_error(estimate, reference) / reference
}

pub fn decay_reference(samples: ArrayView1<'_, f64>, c: f64) -> Array1<f64> {
    samples.mapv(|n| c / n.sqrt())
}

/// Error predicted for step k by ideal quadratic convergence from step k-1.
pub fn quadratic_model(errors: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut model = Array1::from_elem(errors.len(), f64::NAN);
    for k in 1..errors.len() {
        model[k] = errors[k - 1] * errors[k - 1];
    }
    model
}

/// Observed order of convergence per step:
/// `q_k = ln(e_{k+1} / e_k) / ln(e_k / e_{k-1})`.
///
/// Endpoints and steps with a zero or non-finite ratio are `NaN`.
pub fn convergence_order(errors: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut order = Array1::from_elem(errors.len(), f64::NAN);
    if errors.len() < 3 {
        return order;
    }
    for k in 1..errors.len() - 1 {
        let num = (errors[k + 1] / errors[k]).ln();
        let den = (errors[k] / errors[k - 1]).ln();
        let q = num / den;
        if q.is_finite() {
            order[k] = q;
        }
    }
    order
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloSeries {
    pub samples: Array1<f64>,
    pub estimate: Array1<f64>,
    /// One standard deviation, `sqrt(variance)`.
    pub std_dev: Array1<f64>,
    pub abs_error: Array1<f64>,
    pub rel_error: Array1<f64>,
    pub decay: Array1<f64>,
    pub reference: f64,
    pub decay_constant: f64,
}

impl MonteCarloSeries {
    pub fn from_table(
        table: &Table,
        reference: f64,
        decay_constant: f64,
    ) -> Result<Self, PlotError> {
        let samples = table.column(ColumnRole::Samples)?;
        let estimate = table.column(ColumnRole::Estimate)?;
        let variance = table.column(ColumnRole::Variance)?;

        let series = Self {
            samples: samples.to_owned(),
            estimate: estimate.to_owned(),
            std_dev: variance.mapv(f64::sqrt),
            abs_error: absolute_error(estimate, reference),
            rel_error: relative_error(estimate, reference),
            decay: decay_reference(samples, decay_constant),
            reference,
            decay_constant,
        };
        debug!(
            "Derived Monte Carlo series over {} trials (c = {})",
            series.len(),
            decay_constant
        );
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let last = self.len().saturating_sub(1);
        // Fraction of trials whose estimate lies within one standard deviation.
        let within = Zip::from(&self.abs_error)
            .and(&self.std_dev)
            .fold(0usize, |acc, err, sd| if err <= sd { acc + 1 } else { acc });
        Summary {
            variant: "monte-carlo".to_string(),
            trials: self.len(),
            final_trial: self.samples.get(last).copied(),
            final_estimate: self.estimate.get(last).copied(),
            final_abs_error: self.abs_error.get(last).copied(),
            final_rel_error: self.rel_error.get(last).copied(),
            within_one_sigma: Some(within as f64 / self.len().max(1) as f64),
            mean_convergence_order: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewtonSeries {
    pub iteration: Array1<f64>,
    pub estimate: Array1<f64>,
    pub abs_error: Array1<f64>,
    pub quadratic: Array1<f64>,
    pub order: Array1<f64>,
}

impl NewtonSeries {
    pub fn from_table(table: &Table) -> Result<Self, PlotError> {
        let iteration = table.column(ColumnRole::Iteration)?;
        let estimate = table.column(ColumnRole::Estimate)?;
        let abs_error = table.column(ColumnRole::AbsoluteError)?;

        Ok(Self {
            iteration: iteration.to_owned(),
            estimate: estimate.to_owned(),
            abs_error: abs_error.to_owned(),
            quadratic: quadratic_model(abs_error),
            order: convergence_order(abs_error),
        })
    }

    pub fn len(&self) -> usize {
        self.iteration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iteration.is_empty()
    }

    /// Mean of the finite observed convergence orders.
    pub fn mean_order(&self) -> Option<f64> {
        let finite: Vec<f64> = self.order.iter().copied().filter(|q| q.is_finite()).collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }

    pub fn summary(&self) -> Summary {
        let last = self.len().saturating_sub(1);
        Summary {
            variant: "newton-raphson".to_string(),
            trials: self.len(),
            final_trial: self.iteration.get(last).copied(),
            final_estimate: self.estimate.get(last).copied(),
            final_abs_error: self.abs_error.get(last).copied(),
            final_rel_error: None,
            within_one_sigma: None,
            mean_convergence_order: self.mean_order(),
        }
    }
}

/// Derived series for whichever variant the input file follows.
#[derive(Clone, Debug, PartialEq)]
pub enum Derived {
    MonteCarlo(MonteCarloSeries),
    Newton(NewtonSeries),
}

impl Derived {
    pub fn from_table(
        variant: Variant,
        table: &Table,
        reference: f64,
        decay_constant: f64,
    ) -> Result<Self, PlotError> {
        match variant {
            Variant::MonteCarlo => Ok(Derived::MonteCarlo(MonteCarloSeries::from_table(
                table,
                reference,
                decay_constant,
            )?)),
            Variant::NewtonRaphson => Ok(Derived::Newton(NewtonSeries::from_table(table)?)),
        }
    }

    pub fn summary(&self) -> Summary {
        match self {
            Derived::MonteCarlo(series) => series.summary(),
            Derived::Newton(series) => series.summary(),
        }
    }

    /// Named columns in export order, all of equal length.
    pub fn columns(&self) -> Vec<(&'static str, &Array1<f64>)> {
        match self {
            Derived::MonteCarlo(s) => vec![
                ("samples", &s.samples),
                ("estimate", &s.estimate),
                ("std_dev", &s.std_dev),
                ("abs_error", &s.abs_error),
                ("rel_error", &s.rel_error),
                ("decay_reference", &s.decay),
            ],
            Derived::Newton(s) => vec![
                ("iteration", &s.iteration),
                ("estimate", &s.estimate),
                ("abs_error", &s.abs_error),
                ("quadratic_model", &s.quadratic),
                ("convergence_order", &s.order),
            ],
        }
    }
}

/// Scalar digest of a run, written as JSON by the CLI.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub variant: String,
    pub trials: usize,
    pub final_trial: Option<f64>,
    pub final_estimate: Option<f64>,
    pub final_abs_error: Option<f64>,
    pub final_rel_error: Option<f64>,
    pub within_one_sigma: Option<f64>,
    pub mean_convergence_order: Option<f64>,
}
