// tests/solver_convergence_test.rs
use convertible_fd::config::EngineConfig;
use convertible_fd::fd::{ExplicitSolver, ValueGrid};
use convertible_fd::grid::GridSpec;
use convertible_fd::params::{ParameterInputs, ParameterSet};
use convertible_fd::stability::StabilityAnalyzer;

fn solve(inputs: ParameterInputs) -> (ParameterSet, ValueGrid) {
    let params = inputs.build().unwrap();
    let grid = GridSpec::new(&params, &EngineConfig::default()).unwrap();
    assert!(
        StabilityAnalyzer::analyze(&grid, &params).is_stable,
        "convergence runs must use stable grids"
    );
    let solved = ExplicitSolver::default().solve(&grid, &params);
    (params, solved)
}

// Risky zero-coupon bond price
fn bond_floor_exact(params: &ParameterSet) -> f64 {
    let k = params.risk_free_rate() + params.credit_spread();
    params.principal() * (-k * params.maturity_years()).exp()
}

#[test]
fn test_unconvertible_bond_converges_to_discounted_principal() {
    // Conversion never pays on [1, 450]; the value is the straight risky bond
    let base = ParameterInputs::default().with_conversion_ratio(1.0e6);

    let mut errors = Vec::new();
    for &n in &[200, 400, 800, 1600] {
        let (params, solved) = solve(base.with_grid(100, n));
        let exact = bond_floor_exact(&params);
        let centre = solved.value(0, 50);
        let rel_error = (centre - exact).abs() / exact;
        println!(
            "N = {:>5}: V = {:.8}, exact = {:.8}, rel error = {:.3e}",
            n, centre, exact, rel_error
        );
        errors.push(rel_error);
    }

    for w in errors.windows(2) {
        assert!(w[1] < w[0], "error should shrink as dt shrinks: {:?}", errors);
    }
    assert!(errors[errors.len() - 1] < 1e-4);
}

#[test]
fn test_spatial_refinement_agrees_at_shared_nodes() {
    let base = ParameterInputs::default();
    let grids: Vec<(usize, ValueGrid)> = [(50usize, 3usize), (100, 6), (200, 12)]
        .iter()
        .map(|&(m, node)| (node, solve(base.with_grid(m, 800)).1))
        .collect();

    // Same x = ln S on every grid
    let s0 = grids[0].1.grid().stock_price(grids[0].0);
    for (node, solved) in &grids {
        assert!((solved.grid().stock_price(*node) - s0).abs() < 1e-9);
    }

    let reference = grids[2].1.value(0, grids[2].0);
    for (node, solved) in &grids[..2] {
        let v = solved.value(0, *node);
        let rel = (v - reference).abs() / reference;
        println!("S = {:.4}: V = {:.6}, finest = {:.6}, rel diff = {:.3e}", s0, v, reference, rel);
        assert!(rel < 0.01);
    }
}

#[test]
fn test_time_refinement_agrees_across_curve() {
    let base = ParameterInputs::default().with_volatility(0.25);
    let (_, coarse) = solve(base.with_grid(100, 200));
    let (_, fine) = solve(base.with_grid(100, 800));

    for i in 0..=100 {
        let a = coarse.value(0, i);
        let b = fine.value(0, i);
        assert!(
            (a - b).abs() / b < 0.01,
            "node {}: N=200 gives {:.6}, N=800 gives {:.6}",
            i,
            a,
            b
        );
    }
}

#[test]
fn test_value_bounded_by_redemption_when_unconvertible() {
    let (params, solved) = solve(ParameterInputs::default().with_conversion_ratio(1.0e6));
    let grid = *solved.grid();
    for j in 0..=grid.time_steps() {
        for i in 0..=grid.price_steps() {
            let v = solved.value(j, i);
            assert!(v <= params.principal() + 1e-9);
            assert!(v > 0.0);
        }
    }
}
