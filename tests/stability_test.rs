// tests/stability_test.rs
use convertible_fd::config::EngineConfig;
use convertible_fd::grid::GridSpec;
use convertible_fd::params::ParameterInputs;
use convertible_fd::stability::{StabilityAnalyzer, StabilityReport, COARSE_GRID_ISSUE};

fn analyze(inputs: ParameterInputs) -> StabilityReport {
    let params = inputs.build().expect("valid parameters");
    let grid = GridSpec::new(&params, &EngineConfig::default()).expect("valid grid");
    StabilityAnalyzer::analyze(&grid, &params)
}

fn reference() -> ParameterInputs {
    ParameterInputs::default()
        .with_grid(100, 200)
        .with_volatility(0.3)
        .with_maturity_years(5.0)
}

#[test]
fn test_reference_grid_is_stable() {
    let report = analyze(reference());

    println!("\ndx = {:.6}, dt = {:.6}, bound = {:.6}", report.dx, report.dt, report.explicit_stability_bound);

    assert!((report.dx - 0.0611).abs() < 1e-4);
    assert_eq!(report.dt, 0.025);
    assert!((report.explicit_stability_bound - 0.0415).abs() < 1e-4);
    assert!(report.is_stable);
}

#[test]
fn test_more_time_steps_stay_stable() {
    let report = analyze(reference().with_grid(100, 2000));
    assert_eq!(report.dt, 0.0025);
    assert!(report.is_stable);
}

#[test]
fn test_high_volatility_flips_predicate() {
    let report = analyze(reference().with_volatility(1.5));
    assert!((report.explicit_stability_bound - 0.00166).abs() < 1e-5);
    assert!(!report.is_stable);
    assert!(report.instability.is_some());
}

#[test]
fn test_predicate_matches_definition_across_grids() {
    for &(m, n, sigma) in &[
        (10, 10, 0.1),
        (50, 100, 0.3),
        (100, 120, 0.3),
        (100, 119, 0.3),
        (200, 400, 0.8),
        (400, 3000, 0.8),
        (30, 5, 1.2),
    ] {
        let report = analyze(reference().with_grid(m, n).with_volatility(sigma));
        let dx = 450.0_f64.ln() / m as f64;
        let dt = 5.0 / n as f64;
        assert_eq!(report.is_stable, dt <= dx * dx / (sigma * sigma), "m={} n={} sigma={}", m, n, sigma);
        assert_eq!(report.is_stable, report.instability.is_none());
    }
}

#[test]
fn test_coarse_grid_issue_iff_small_grid() {
    for &(m, n) in &[(49, 100), (50, 99), (10, 10), (50, 100), (120, 400), (49, 1000)] {
        let report = analyze(reference().with_grid(m, n));
        let expected = m < 50 || n < 100;
        assert_eq!(report.has_issue(COARSE_GRID_ISSUE), expected, "m={} n={}", m, n);
    }
}

#[test]
fn test_advisories_do_not_affect_predicate() {
    let quiet = analyze(reference());
    let noisy = analyze(reference().with_credit_spread(0.0).with_grid(100, 200));
    assert_eq!(quiet.is_stable, noisy.is_stable);
    assert_eq!(quiet.explicit_stability_bound, noisy.explicit_stability_bound);
    assert!(noisy.issues.len() > quiet.issues.len());
}
