// src/config.rs
use crate::error::{validation::*, CbResult, PricingError};
use serde::{Deserialize, Serialize};

/// Default upper stock-price bound of the grid domain
pub const DEFAULT_UPPER_PRICE_BOUND: f64 = 450.0;

/// How the price and time curves are populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    /// Backward-induction explicit finite-difference solve with a conversion free boundary
    #[default]
    FiniteDifference,
    /// Simplified analytic proxies; no PDE is solved
    ClosedForm,
}

/// Stock-price regimes of the time series, as multiples of the conversion ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeLevels {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RegimeLevels {
    fn default() -> Self {
        RegimeLevels {
            low: 0.5,
            medium: 1.0,
            high: 2.0,
        }
    }
}

/// Seeded multiplicative noise applied to unstable runs for illustration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationConfig {
    pub seed: u64,
    /// Standard deviation of the relative perturbation
    pub amplitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub upper_price_bound: f64,
    pub method: ValuationMethod,
    pub regimes: RegimeLevels,
    pub perturbation: Option<PerturbationConfig>,
    /// Upper limit on (M + 1) * (N + 1) grid nodes
    pub max_grid_nodes: usize,
    /// Price-node count from which one explicit layer is swept in parallel
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            upper_price_bound: DEFAULT_UPPER_PRICE_BOUND,
            method: ValuationMethod::FiniteDifference,
            regimes: RegimeLevels::default(),
            perturbation: None,
            max_grid_nodes: 16_000_000,
            parallel_threshold: 2048,
        }
    }
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> CbResult<()> {
        validate_finite("upper_price_bound", self.upper_price_bound)?;
        if self.upper_price_bound <= 1.0 {
            return Err(PricingError::InvalidConfiguration {
                field: "upper_price_bound".to_string(),
                reason: format!(
                    "must exceed the lowest grid price 1.0 (got {})",
                    self.upper_price_bound
                ),
            });
        }

        validate_positive("regimes.low", self.regimes.low)?;
        validate_positive("regimes.medium", self.regimes.medium)?;
        validate_positive("regimes.high", self.regimes.high)?;
        if !(self.regimes.low <= self.regimes.medium && self.regimes.medium <= self.regimes.high) {
            return Err(PricingError::InvalidConfiguration {
                field: "regimes".to_string(),
                reason: "levels must satisfy low <= medium <= high".to_string(),
            });
        }

        if let Some(p) = self.perturbation {
            validate_non_negative("perturbation.amplitude", p.amplitude)?;
        }

        if self.max_grid_nodes == 0 {
            return Err(PricingError::InvalidConfiguration {
                field: "max_grid_nodes".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> CbResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_method(mut self, method: ValuationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_perturbation(mut self, seed: u64, amplitude: f64) -> Self {
        self.perturbation = Some(PerturbationConfig { seed, amplitude });
        self
    }
}
