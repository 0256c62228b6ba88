use super::closed_form::ClosedForm;
use crate::fd::ValueGrid;
use crate::grid::GridSpec;
use crate::params::ParameterSet;
use serde::{Deserialize, Serialize};

/// Bond value at one price node, seen at three dates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceCurveSample {
    pub stock_price: f64,
    pub value_at_initial: f64,
    pub value_at_mid: f64,
    pub value_at_maturity: f64,
}

/// Bond value as a function of stock price, one sample per price node `i = 0..=M`
pub struct PriceCurveEngine;

impl PriceCurveEngine {
    /// Read the initial, mid and maturity layers of a solved value grid
    pub fn from_value_grid(values: &ValueGrid) -> Vec<PriceCurveSample> {
        let grid = values.grid();
        let initial = values.layer(0);
        let mid = values.mid_layer();
        let maturity = values.layer(grid.time_steps());

        (0..=grid.price_steps())
            .map(|i| PriceCurveSample {
                stock_price: grid.stock_price(i),
                value_at_initial: initial[i],
                value_at_mid: mid[i],
                value_at_maturity: maturity[i],
            })
            .collect()
    }

    /// Analytic proxy curve; no PDE solve
    pub fn closed_form(grid: &GridSpec, params: &ParameterSet) -> Vec<PriceCurveSample> {
        let proxy = ClosedForm::new(params);
        grid.stock_prices()
            .into_iter()
            .map(|s| {
                let terminal = proxy.terminal_value(s);
                PriceCurveSample {
                    stock_price: s,
                    value_at_initial: terminal,
                    value_at_mid: proxy.mid_value(s),
                    value_at_maturity: terminal,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::fd::ExplicitSolver;
    use crate::params::ParameterInputs;

    fn setup(m: usize) -> (GridSpec, ParameterSet) {
        let params = ParameterInputs::default().with_grid(m, 400).build().unwrap();
        let grid = GridSpec::new(&params, &EngineConfig::default()).unwrap();
        (grid, params)
    }

    fn assert_shape(curve: &[PriceCurveSample], m: usize) {
        assert_eq!(curve.len(), m + 1);
        assert_eq!(curve[0].stock_price, 1.0);
        assert_eq!(curve[m].stock_price, 450.0);
        assert!(curve.windows(2).all(|w| w[1].stock_price > w[0].stock_price));
    }

    #[test]
    fn test_closed_form_shape_and_branches() {
        let (grid, params) = setup(80);
        let curve = PriceCurveEngine::closed_form(&grid, &params);
        assert_shape(&curve, 80);

        let cr = params.conversion_ratio();
        for sample in &curve {
            if sample.stock_price < cr {
                assert_eq!(sample.value_at_maturity, params.principal());
            } else {
                let parity = params.principal() * sample.stock_price / cr;
                assert!((sample.value_at_maturity - parity).abs() < 1e-9);
            }
            assert_eq!(sample.value_at_initial, sample.value_at_maturity);
        }
    }

    #[test]
    fn test_finite_difference_shape() {
        let (grid, params) = setup(80);
        let solved = ExplicitSolver::default().solve(&grid, &params);
        let curve = PriceCurveEngine::from_value_grid(&solved);
        assert_shape(&curve, 80);

        // Value is non-decreasing in the stock price on every layer
        for w in curve.windows(2) {
            assert!(w[1].value_at_initial >= w[0].value_at_initial - 1e-9);
            assert!(w[1].value_at_maturity >= w[0].value_at_maturity - 1e-9);
        }
    }
}
