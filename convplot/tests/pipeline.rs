//! File → table → derived series → figure, through the public API.

use std::fs;

use convplot::{
    load_table, ColumnRole, Derived, LineStyle, PlotError, Scale, Variant, DEFAULT_DECAY_CONSTANT,
    PI_REFERENCE,
};

const MONTE_CARLO: &str = "\
# samples,estimate,variance
10,3.2,0.3
100,3.12,0.02
1000,3.1432,0.0027
10000,3.14,0.00027
";

const NEWTON: &str = "\
2.0,0,0,0.5857864376
1.5,1,0,0.0857864376
1.4166666667,2,0,0.0024531043
1.4142156863,3,0,0.0000021239
1.4142135624,4,0,0.0000000000016
";

#[test]
fn monte_carlo_file_to_figure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("montecarlo.txt");
    fs::write(&path, MONTE_CARLO).unwrap();

    let table = load_table(&path, b',', &Variant::MonteCarlo.schema()).unwrap();
    assert_eq!(table.trials(), 4);
    assert_eq!(
        table.column(ColumnRole::Samples).unwrap().to_vec(),
        vec![10.0, 100.0, 1000.0, 10000.0]
    );

    let derived = Derived::from_table(
        Variant::MonteCarlo,
        &table,
        PI_REFERENCE,
        DEFAULT_DECAY_CONSTANT,
    )
    .unwrap();
    let columns = derived.columns();
    assert!(columns.iter().all(|(_, col)| col.len() == table.trials()));

    let figure = derived.figure();
    assert_eq!(figure.panels.len(), 2);
    let bottom = &figure.panels[1];
    assert_eq!((bottom.x_scale, bottom.y_scale), (Scale::Log, Scale::Log));
    let decay = &bottom.series[1];
    assert_eq!(decay.style, LineStyle::Dashed);
    assert!((decay.points[1].1 - 0.03).abs() < 1e-12);

    let summary = derived.summary();
    assert_eq!(summary.trials, 4);
    let rel = summary.final_rel_error.unwrap();
    assert!((rel - (3.14 - std::f64::consts::PI).abs() / std::f64::consts::PI).abs() < 1e-15);
}

#[test]
fn newton_file_to_figure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newton.txt");
    fs::write(&path, NEWTON).unwrap();

    let table = load_table(&path, b',', &Variant::NewtonRaphson.schema()).unwrap();
    let derived = Derived::from_table(Variant::NewtonRaphson, &table, PI_REFERENCE, 0.3).unwrap();
    let summary = derived.summary();
    assert_eq!(summary.final_trial, Some(4.0));
    let order = summary.mean_convergence_order.unwrap();
    assert!(order > 1.7 && order < 2.3, "observed order {order}");

    let figure = derived.figure();
    let errors = &figure.panels[1];
    assert_eq!(errors.y_scale, Scale::Log);
    // The quadratic model has no value for the first iteration.
    let model: Vec<_> = errors.plottable(&errors.series[1]).collect();
    assert_eq!(model.len(), 4);
}

#[test]
fn wrong_variant_is_rejected_by_column_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newton.txt");
    fs::write(&path, NEWTON).unwrap();

    let err = load_table(&path, b',', &Variant::MonteCarlo.schema()).unwrap_err();
    assert!(matches!(
        err,
        PlotError::ColumnCount {
            line: 1,
            expected: 3,
            found: 4
        }
    ));
}
