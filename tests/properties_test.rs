// tests/properties_test.rs
use convertible_fd::config::{EngineConfig, ValuationMethod};
use convertible_fd::grid::GridSpec;
use convertible_fd::params::ParameterInputs;
use convertible_fd::pipeline::compute_model_output;
use convertible_fd::stability::{StabilityAnalyzer, COARSE_GRID_ISSUE};
use proptest::prelude::*;

fn inputs_strategy() -> impl Strategy<Value = ParameterInputs> {
    (
        50.0f64..500.0,
        0.25f64..10.0,
        0.01f64..1.5,
        0.0f64..0.1,
        0.0f64..0.05,
        0.0f64..0.1,
        1.0f64..5.0,
        2usize..80,
        2usize..300,
    )
        .prop_map(|(p, t, sigma, r, q, cs, cr, m, n)| {
            ParameterInputs::default()
                .with_principal(p)
                .with_maturity_years(t)
                .with_volatility(sigma)
                .with_risk_free_rate(r)
                .with_dividend_yield(q)
                .with_credit_spread(cs)
                .with_conversion_ratio(cr)
                .with_grid(m, n)
        })
}

proptest! {
    #[test]
    fn grid_steps_are_positive_and_pinned(inputs in inputs_strategy()) {
        let params = inputs.build().unwrap();
        let grid = GridSpec::new(&params, &EngineConfig::default()).unwrap();

        prop_assert!(grid.dx() > 0.0);
        prop_assert!(grid.dt() > 0.0);
        prop_assert_eq!(grid.stock_price(0), 1.0);
        prop_assert_eq!(grid.stock_price(grid.price_steps()), 450.0);
        prop_assert_eq!(grid.time(0), 0.0);
        prop_assert_eq!(grid.time(grid.time_steps()), params.maturity_years());
    }

    #[test]
    fn stability_predicate_and_coarse_advisory(inputs in inputs_strategy()) {
        let params = inputs.build().unwrap();
        let grid = GridSpec::new(&params, &EngineConfig::default()).unwrap();
        let report = StabilityAnalyzer::analyze(&grid, &params);

        let sigma = params.volatility();
        prop_assert_eq!(report.is_stable, grid.dt() <= grid.dx() * grid.dx() / (sigma * sigma));
        prop_assert_eq!(
            report.has_issue(COARSE_GRID_ISSUE),
            params.price_steps() < 50 || params.time_steps() < 100
        );
        if let Some(instability) = report.instability.filter(|i| i.recommended_price_steps.is_none()) {
            let refined = params.maturity_years() / instability.recommended_time_steps as f64;
            prop_assert!(refined <= report.explicit_stability_bound * (1.0 + 1e-12));
        }
    }

    #[test]
    fn curves_are_sized_and_ordered(inputs in inputs_strategy(), closed_form in any::<bool>()) {
        let params = inputs.build().unwrap();
        let method = if closed_form {
            ValuationMethod::ClosedForm
        } else {
            ValuationMethod::FiniteDifference
        };
        let output = compute_model_output(&params, &EngineConfig::default().with_method(method)).unwrap();

        prop_assert_eq!(output.price_curve.len(), params.price_steps() + 1);
        prop_assert_eq!(output.time_curve.len(), params.time_steps() + 1);
        prop_assert!(output.price_curve.windows(2).all(|w| w[1].stock_price > w[0].stock_price));
        prop_assert!(output.time_curve.windows(2).all(|w| w[1].time > w[0].time));
    }

    #[test]
    fn stable_finite_difference_never_drops_below_parity(inputs in inputs_strategy()) {
        let params = inputs.build().unwrap();
        let grid = GridSpec::new(&params, &EngineConfig::default()).unwrap();
        let report = StabilityAnalyzer::analyze(&grid, &params);
        let time_steps = report
            .instability
            .map_or(params.time_steps(), |i| i.recommended_time_steps);
        let params = inputs
            .with_grid(params.price_steps(), time_steps)
            .build()
            .unwrap();

        let output = compute_model_output(&params, &EngineConfig::default()).unwrap();
        prop_assert!(output.stability.is_stable);

        for s in &output.price_curve {
            let parity = params.principal() * s.stock_price / params.conversion_ratio();
            prop_assert!(s.value_at_initial >= parity - 1e-9 * parity.max(1.0));
            prop_assert!(s.value_at_mid >= parity - 1e-9 * parity.max(1.0));
        }
    }
}
