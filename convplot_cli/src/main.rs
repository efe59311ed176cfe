use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use convplot::{load_table, Derived, Summary, Variant, DEFAULT_DECAY_CONSTANT, PI_REFERENCE};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod display;
mod export;
mod render;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Plot Monte Carlo and Newton-Raphson convergence results",
    long_about = None
)]
struct Cli {
    /// Result file layout
    #[arg(long, value_enum, default_value_t = VariantOpt::MonteCarlo)]
    variant: VariantOpt,

    /// Result file (defaults to ./results/montecarlo.txt or ./results/newton.txt)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Figure path; `.svg` selects vector output, no extension means `.png`
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Scale c of the c/sqrt(N) reference curve
    #[arg(long, default_value_t = DEFAULT_DECAY_CONSTANT)]
    decay_constant: f64,

    /// Optional CSV of every derived column (`-` for stdout)
    #[arg(long, value_hint = ValueHint::FilePath)]
    derived_csv: Option<PathBuf>,

    /// Optional JSON summary of the run
    #[arg(long, value_hint = ValueHint::FilePath)]
    summary: Option<PathBuf>,

    /// Do not open the display window
    #[arg(long, action = ArgAction::SetTrue)]
    no_show: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum VariantOpt {
    MonteCarlo,
    NewtonRaphson,
}

impl From<VariantOpt> for Variant {
    fn from(value: VariantOpt) -> Self {
        match value {
            VariantOpt::MonteCarlo => Variant::MonteCarlo,
            VariantOpt::NewtonRaphson => Variant::NewtonRaphson,
        }
    }
}

#[derive(Clone, Debug)]
struct PlotParams {
    variant: Variant,
    input: PathBuf,
    output: PathBuf,
    delimiter: u8,
    reference: f64,
    decay_constant: f64,
    show: bool,
}

impl Default for PlotParams {
    fn default() -> Self {
        let variant = Variant::default();
        Self {
            variant,
            input: variant.default_input(),
            output: variant.default_output(),
            delimiter: b',',
            reference: PI_REFERENCE,
            decay_constant: DEFAULT_DECAY_CONSTANT,
            show: true,
        }
    }
}

impl PlotParams {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let mut params = PlotParams::default();
        params.variant = cli.variant.into();
        params.input = cli
            .input
            .clone()
            .unwrap_or_else(|| params.variant.default_input());
        params.output = cli
            .output
            .clone()
            .unwrap_or_else(|| params.variant.default_output());
        params.delimiter = delimiter_byte(cli.delimiter)?;
        params.decay_constant = cli.decay_constant;
        params.show = !cli.no_show;
        Ok(params)
    }
}

/// Line endings, the quote byte and the `#` comment marker cannot separate fields.
fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && !matches!(delimiter, '\n' | '\r' | '"' | '#') {
        Ok(delimiter as u8)
    } else {
        Err(anyhow!(
            "delimiter must be an ASCII character other than a line ending, quote or #, got {:?}",
            delimiter
        ))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let params = PlotParams::from_cli(&cli)?;
    handle_plot(&cli, &params)
}

fn handle_plot(cli: &Cli, params: &PlotParams) -> Result<()> {
    let schema = params.variant.schema();

    let t_load = Instant::now();
    let table = load_table(&params.input, params.delimiter, &schema).with_context(|| {
        format!(
            "failed to load {} (expected columns: {})",
            params.input.display(),
            schema.describe()
        )
    })?;
    info!(
        "Loaded {} trials from {}",
        table.trials(),
        params.input.display()
    );
    debug!(
        "Load stage: {:.1} ms",
        t_load.elapsed().as_secs_f64() * 1000.0
    );

    let derived = Derived::from_table(
        params.variant,
        &table,
        params.reference,
        params.decay_constant,
    )?;
    let summary = derived.summary();
    log_summary(&summary);

    if let Some(path) = cli.derived_csv.as_ref() {
        export::write_derived(&derived, path)?;
        if path.as_os_str() != "-" {
            info!("Wrote derived series: {}", path.display());
        }
    }
    if let Some(path) = cli.summary.as_ref() {
        export::write_summary(&summary, path)?;
        info!("Wrote summary: {}", path.display());
    }

    let t_plot = Instant::now();
    let figure = derived.figure();
    let written = render::save_figure(&figure, &params.output, render::FIGURE_SIZE)?;
    info!("Wrote plot: {}", written.display());
    debug!(
        "Plot stage: {:.1} ms",
        t_plot.elapsed().as_secs_f64() * 1000.0
    );

    if params.show {
        let title = format!("convplot: {}", params.input.display());
        display::show_figure(&figure, &title)?;
    }
    Ok(())
}

fn log_summary(summary: &Summary) {
    let estimate = summary.final_estimate.unwrap_or(f64::NAN);
    let trial = summary.final_trial.unwrap_or(f64::NAN);
    match (summary.final_rel_error, summary.mean_convergence_order) {
        (Some(rel), _) => info!(
            "Final estimate at N={}: {:.8} (relative error {:.3e})",
            trial, estimate, rel
        ),
        (None, Some(order)) => info!(
            "Final estimate after {} iterations: {:.12} (observed order {:.2})",
            trial, estimate, order
        ),
        (None, None) => info!("Final estimate: {:.12}", estimate),
    }
    if let Some(fraction) = summary.within_one_sigma {
        debug!("{:.0}% of trials within one standard deviation", fraction * 100.0);
    }
}
