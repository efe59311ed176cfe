//! Column layouts agreed with the programs that produce the result files.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Meaning of one column in a result file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Samples,
    Estimate,
    Variance,
    Iteration,
    AbsoluteError,
    /// Present in the file but not read by any chart.
    Ignored,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Samples => "samples",
            ColumnRole::Estimate => "estimate",
            ColumnRole::Variance => "variance",
            ColumnRole::Iteration => "iteration",
            ColumnRole::AbsoluteError => "abs_error",
            ColumnRole::Ignored => "-",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Variant {
    MonteCarlo,
    NewtonRaphson,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::MonteCarlo
    }
}

impl Variant {
    pub fn schema(self) -> Schema {
        match self {
            Variant::MonteCarlo => Schema::new(vec![
                ColumnRole::Samples,
                ColumnRole::Estimate,
                ColumnRole::Variance,
            ]),
            Variant::NewtonRaphson => Schema::new(vec![
                ColumnRole::Estimate,
                ColumnRole::Iteration,
                ColumnRole::Ignored,
                ColumnRole::AbsoluteError,
            ]),
        }
    }

    pub fn default_input(self) -> PathBuf {
        match self {
            Variant::MonteCarlo => PathBuf::from("./results/montecarlo.txt"),
            Variant::NewtonRaphson => PathBuf::from("./results/newton.txt"),
        }
    }

    pub fn default_output(self) -> PathBuf {
        match self {
            Variant::MonteCarlo => PathBuf::from("plot.png"),
            Variant::NewtonRaphson => PathBuf::from("newton_plot.png"),
        }
    }
}

/// Ordered column roles a result file must follow, one entry per field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    roles: Vec<ColumnRole>,
}

impl Schema {
    pub fn new(roles: Vec<ColumnRole>) -> Self {
        Self { roles }
    }

    pub fn width(&self) -> usize {
        self.roles.len()
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    /// Position of the first column with `role`. `Ignored` is never looked up.
    pub fn index_of(&self, role: ColumnRole) -> Option<usize> {
        if role == ColumnRole::Ignored {
            return None;
        }
        self.roles.iter().position(|r| *r == role)
    }

    pub fn describe(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monte_carlo_layout() {
        let schema = Variant::MonteCarlo.schema();
        assert_eq!(schema.width(), 3);
        assert_eq!(schema.index_of(ColumnRole::Samples), Some(0));
        assert_eq!(schema.index_of(ColumnRole::Variance), Some(2));
        assert_eq!(schema.index_of(ColumnRole::Iteration), None);
        assert_eq!(schema.describe(), "samples,estimate,variance");
    }

    #[test]
    fn newton_layout_skips_reserved_column() {
        let schema = Variant::NewtonRaphson.schema();
        assert_eq!(schema.width(), 4);
        assert_eq!(schema.index_of(ColumnRole::Estimate), Some(0));
        assert_eq!(schema.index_of(ColumnRole::AbsoluteError), Some(3));
        assert_eq!(schema.index_of(ColumnRole::Ignored), None);
        assert_eq!(schema.describe(), "estimate,iteration,-,abs_error");
    }
}
