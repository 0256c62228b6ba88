use super::closed_form::ClosedForm;
use crate::config::RegimeLevels;
use crate::fd::ValueGrid;
use crate::grid::GridSpec;
use crate::params::ParameterSet;
use serde::{Deserialize, Serialize};

/// Bond value at one time layer, for three fixed stock-price regimes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeCurveSample {
    pub time: f64,
    pub value_low_regime: f64,
    pub value_medium_regime: f64,
    pub value_high_regime: f64,
}

/// Stock prices the time series is sliced at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimePrices {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Price-node indices of the three regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeNodes {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RegimeNodes {
    /// Snap `level × conversion_ratio` to the nearest interior grid node for each regime.
    ///
    /// Edge nodes carry the Dirichlet values rather than the solved PDE, so regimes are
    /// kept on `1..=M-1`. When the grid has at least three interior nodes the indices are
    /// strictly increasing (low < medium < high), nudged apart if they snap together.
    pub fn locate(grid: &GridSpec, params: &ParameterSet, levels: &RegimeLevels) -> Self {
        let cr = params.conversion_ratio();
        let m = grid.price_steps();
        let (first, last) = if m >= 2 { (1, m - 1) } else { (0, m) };
        let snap = |level: f64| grid.nearest_price_node(level * cr).clamp(first, last);

        let mut idx = [snap(levels.low), snap(levels.medium), snap(levels.high)];
        if last - first >= 2 {
            for k in 1..3 {
                idx[k] = idx[k].max(idx[k - 1] + 1);
            }
            idx[2] = idx[2].min(last);
            for k in (0..2).rev() {
                idx[k] = idx[k].min(idx[k + 1] - 1);
            }
        }

        RegimeNodes {
            low: idx[0],
            medium: idx[1],
            high: idx[2],
        }
    }

    pub fn prices(&self, grid: &GridSpec) -> RegimePrices {
        RegimePrices {
            low: grid.stock_price(self.low),
            medium: grid.stock_price(self.medium),
            high: grid.stock_price(self.high),
        }
    }
}

/// Bond value as a function of time, one sample per time layer `j = 0..=N`
pub struct TimeSeriesEngine;

impl TimeSeriesEngine {
    /// Slice the solved value grid along the regime price columns
    pub fn from_value_grid(values: &ValueGrid, nodes: &RegimeNodes) -> Vec<TimeCurveSample> {
        let grid = values.grid();
        let low = values.column(nodes.low);
        let medium = values.column(nodes.medium);
        let high = values.column(nodes.high);

        (0..=grid.time_steps())
            .map(|j| TimeCurveSample {
                time: grid.time(j),
                value_low_regime: low[j],
                value_medium_regime: medium[j],
                value_high_regime: high[j],
            })
            .collect()
    }

    /// Analytic proxy trajectories; no PDE solve
    pub fn closed_form(
        grid: &GridSpec,
        params: &ParameterSet,
        nodes: &RegimeNodes,
    ) -> Vec<TimeCurveSample> {
        let proxy = ClosedForm::new(params);
        let prices = nodes.prices(grid);

        grid.times()
            .into_iter()
            .map(|t| TimeCurveSample {
                time: t,
                value_low_regime: proxy.low_regime(prices.low, t),
                value_medium_regime: proxy.medium_regime(prices.medium, t),
                value_high_regime: proxy.high_regime(prices.high, t),
            })
            .collect()
    }
}
