// src/grid.rs
//! Log-Price × Time Discretization
//!
//! The pricing PDE is solved in `x = ln S` on `[0, ln U]`, i.e. stock prices from 1 to the
//! configured upper bound `U`, and in time on `[0, T]`:
//! ```text
//! dx = ln(U) / M        S_i = exp(i·dx),  i = 0..=M
//! dt = T / N            t_j = j·dt,       j = 0..=N
//! ```
//! The end nodes are pinned exactly (`S_0 = 1`, `S_M = U`, `t_0 = 0`, `t_N = T`) so that
//! consumers can rely on the domain edges without rounding noise.

use crate::config::EngineConfig;
use crate::error::{CbResult, PricingError};
use crate::params::ParameterSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    upper_price_bound: f64,
    price_steps: usize,
    time_steps: usize,
    maturity_years: f64,
    dx: f64,
    dt: f64,
}

impl GridSpec {
    pub fn new(params: &ParameterSet, config: &EngineConfig) -> CbResult<Self> {
        config.validate()?;

        let m = params.price_steps();
        let n = params.time_steps();
        let nodes = (m + 1).checked_mul(n + 1).unwrap_or(usize::MAX);
        if nodes > config.max_grid_nodes {
            return Err(PricingError::InvalidParameter {
                parameter: "price_steps x time_steps".to_string(),
                value: nodes as f64,
                constraint: format!(
                    "grid of (M+1)(N+1) nodes must not exceed {}",
                    config.max_grid_nodes
                ),
            });
        }

        let dx = config.upper_price_bound.ln() / m as f64;
        let dt = params.maturity_years() / n as f64;
        if !(dx > 0.0 && dx.is_finite()) || !(dt > 0.0 && dt.is_finite()) {
            return Err(PricingError::InvalidParameter {
                parameter: if dx > 0.0 { "dt" } else { "dx" }.to_string(),
                value: if dx > 0.0 { dt } else { dx },
                constraint: "grid step must be positive and finite".to_string(),
            });
        }

        tracing::debug!(m, n, dx, dt, "grid constructed");

        Ok(GridSpec {
            upper_price_bound: config.upper_price_bound,
            price_steps: m,
            time_steps: n,
            maturity_years: params.maturity_years(),
            dx,
            dt,
        })
    }

    /// Log-price step `ln(U) / M`
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Time step `T / N`
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn upper_price_bound(&self) -> f64 {
        self.upper_price_bound
    }

    pub fn price_steps(&self) -> usize {
        self.price_steps
    }

    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn maturity_years(&self) -> f64 {
        self.maturity_years
    }

    /// Stock price at price node `i`
    pub fn stock_price(&self, i: usize) -> f64 {
        if i >= self.price_steps {
            self.upper_price_bound
        } else {
            (i as f64 * self.dx).exp()
        }
    }

    /// Calendar time at time layer `j`
    pub fn time(&self, j: usize) -> f64 {
        if j >= self.time_steps {
            self.maturity_years
        } else {
            j as f64 * self.dt
        }
    }

    pub fn stock_prices(&self) -> Vec<f64> {
        (0..=self.price_steps).map(|i| self.stock_price(i)).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        (0..=self.time_steps).map(|j| self.time(j)).collect()
    }

    /// Price node closest to `price` in log space, clamped to the domain
    pub fn nearest_price_node(&self, price: f64) -> usize {
        if !(price > 1.0) {
            return 0;
        }
        let idx = (price.ln() / self.dx).round();
        if idx >= self.price_steps as f64 {
            self.price_steps
        } else {
            idx as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterInputs;

    fn grid(m: usize, n: usize, t: f64) -> GridSpec {
        let params = ParameterInputs::default()
            .with_grid(m, n)
            .with_maturity_years(t)
            .build()
            .unwrap();
        GridSpec::new(&params, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_steps_match_definition() {
        let g = grid(100, 200, 5.0);
        assert!((g.dx() - 450.0_f64.ln() / 100.0).abs() < 1e-15);
        assert!((g.dx() - 0.061092).abs() < 1e-5);
        assert_eq!(g.dt(), 0.025);
    }

    #[test]
    fn test_end_nodes_are_pinned() {
        let g = grid(37, 113, 3.3);
        assert_eq!(g.stock_price(0), 1.0);
        assert_eq!(g.stock_price(37), 450.0);
        assert_eq!(g.time(0), 0.0);
        assert_eq!(g.time(113), 3.3);
        assert_eq!(g.stock_prices().len(), 38);
        assert_eq!(g.times().len(), 114);
    }

    #[test]
    fn test_nearest_price_node() {
        let g = grid(100, 200, 5.0);
        assert_eq!(g.nearest_price_node(0.5), 0);
        assert_eq!(g.nearest_price_node(1.0), 0);
        assert_eq!(g.nearest_price_node(1e6), 100);
        let i = g.nearest_price_node(2.0);
        assert!((g.stock_price(i).ln() - 2.0_f64.ln()).abs() <= 0.5 * g.dx() + 1e-12);
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let params = ParameterInputs::default().with_grid(1000, 1000).build().unwrap();
        let config = EngineConfig {
            max_grid_nodes: 10_000,
            ..EngineConfig::default()
        };
        assert!(matches!(
            GridSpec::new(&params, &config),
            Err(PricingError::InvalidParameter { .. })
        ));
    }
}
