// src/stability.rs
//! Explicit-Scheme Stability Diagnostics
//!
//! # Stability Condition
//!
//! The forward-Euler sweep of the diffusion term `½σ² V_xx` is stable when
//! ```text
//! dt ≤ dx² / σ²
//! ```
//! This predicate is the single correctness gate for a discretization. A violation is
//! *reported* (the scheme still runs and its output can be inspected), never raised.
//!
//! # Advisory Findings
//!
//! Independent of the predicate, three heuristics annotate the report:
//! - σ > 0.5: high volatility may cause oscillation
//! - M < 50 or N < 100: grid too coarse
//! - credit spread < 0.01: unrealistically low spread

use crate::error::validation::MAX_GRID_STEPS;
use crate::grid::GridSpec;
use crate::params::ParameterSet;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const HIGH_VOLATILITY_ISSUE: &str = "high volatility may cause oscillation";
pub const COARSE_GRID_ISSUE: &str = "grid too coarse for accurate results";
pub const LOW_CREDIT_SPREAD_ISSUE: &str = "credit spread unrealistically low";

const HIGH_VOLATILITY_THRESHOLD: f64 = 0.5;
const MIN_PRICE_STEPS: usize = 50;
const MIN_TIME_STEPS: usize = 100;
const MIN_CREDIT_SPREAD: f64 = 0.01;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Advisories: u32 {
        const NONE              = 0;
        const HIGH_VOLATILITY   = 1 << 0;
        const COARSE_GRID       = 1 << 1;
        const LOW_CREDIT_SPREAD = 1 << 2;
    }
}

/// The "NumericalInstability" condition: dt exceeds the explicit bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericalInstability {
    pub dt: f64,
    pub bound: f64,
    /// Smallest N that would satisfy the bound at the current M and σ, capped at the
    /// largest accepted step count
    pub recommended_time_steps: usize,
    /// Set when no accepted N satisfies the bound: the largest M that would
    pub recommended_price_steps: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub is_stable: bool,
    /// `dx² / σ²`
    pub explicit_stability_bound: f64,
    pub dt: f64,
    pub dx: f64,
    pub message: String,
    pub issues: Vec<String>,
    pub advisories: Advisories,
    pub instability: Option<NumericalInstability>,
}

impl StabilityReport {
    pub fn has_issue(&self, issue: &str) -> bool {
        self.issues.iter().any(|i| i == issue)
    }
}

pub struct StabilityAnalyzer;

impl StabilityAnalyzer {
    pub fn analyze(grid: &GridSpec, params: &ParameterSet) -> StabilityReport {
        let dx = grid.dx();
        let dt = grid.dt();
        let sigma = params.volatility();
        let bound = dx * dx / (sigma * sigma);
        let is_stable = dt <= bound;

        let (message, instability) = if is_stable {
            (
                format!(
                    "explicit scheme stable: dt = {:.6} <= dx^2/sigma^2 = {:.6}",
                    dt, bound
                ),
                None,
            )
        } else {
            let required = (grid.maturity_years() / bound).ceil() as usize;
            let recommended_time_steps = required.min(MAX_GRID_STEPS);
            let recommended_price_steps = (required > MAX_GRID_STEPS).then(|| {
                let dt_floor = grid.maturity_years() / MAX_GRID_STEPS as f64;
                let m = grid.upper_price_bound().ln() / (sigma * dt_floor.sqrt());
                (m.floor() as usize).max(1)
            });
            tracing::warn!(
                dt,
                bound,
                recommended_time_steps,
                ?recommended_price_steps,
                "explicit finite-difference scheme is unstable"
            );
            let advice = match recommended_price_steps {
                None => format!("increase time_steps to at least {}", recommended_time_steps),
                Some(m) => format!(
                    "no time_steps <= {} satisfies the bound; reduce price_steps to at most {}",
                    MAX_GRID_STEPS, m
                ),
            };
            (
                format!(
                    "NumericalInstability: dt = {:.6} > dx^2/sigma^2 = {:.6}; {}",
                    dt, bound, advice
                ),
                Some(NumericalInstability {
                    dt,
                    bound,
                    recommended_time_steps,
                    recommended_price_steps,
                }),
            )
        };

        let mut issues = Vec::new();
        let mut advisories = Advisories::NONE;

        if sigma > HIGH_VOLATILITY_THRESHOLD {
            issues.push(HIGH_VOLATILITY_ISSUE.to_string());
            advisories |= Advisories::HIGH_VOLATILITY;
        }
        if grid.price_steps() < MIN_PRICE_STEPS || grid.time_steps() < MIN_TIME_STEPS {
            issues.push(COARSE_GRID_ISSUE.to_string());
            advisories |= Advisories::COARSE_GRID;
        }
        if params.credit_spread() < MIN_CREDIT_SPREAD {
            issues.push(LOW_CREDIT_SPREAD_ISSUE.to_string());
            advisories |= Advisories::LOW_CREDIT_SPREAD;
        }

        if !issues.is_empty() {
            tracing::debug!(?issues, "stability advisories raised");
        }

        StabilityReport {
            is_stable,
            explicit_stability_bound: bound,
            dt,
            dx,
            message,
            issues,
            advisories,
            instability,
        }
    }
}
