// src/params.rs
//! Model Inputs
//!
//! [`ParameterInputs`] is the raw, caller-facing bag of numbers (what a slider panel or a
//! JSON request carries). [`ParameterSet`] is the validated, immutable form every engine
//! consumes. The only ways to obtain a `ParameterSet` go through [`ParameterSet::validate`]:
//! [`ParameterInputs::build`], `TryFrom<ParameterInputs>`, or serde deserialization.
//!
//! # Domain
//!
//! | field              | constraint                |
//! |--------------------|---------------------------|
//! | `principal`        | finite, > 0               |
//! | `maturity_years`   | finite, > 0               |
//! | `volatility`       | finite, > 0               |
//! | `risk_free_rate`   | finite                    |
//! | `dividend_yield`   | finite                    |
//! | `credit_spread`    | finite                    |
//! | `conversion_ratio` | finite, ≥ 1               |
//! | `price_steps` (M)  | 1 ..= 100 000             |
//! | `time_steps` (N)   | 1 ..= 100 000             |
//!
//! The narrower dashboard ranges (volatility 0.1–0.8, maturity 1–10, ...) are enforced by
//! the caller; values outside them but inside the domain still price, and the stability
//! analyzer flags the risky ones.

use crate::error::{validation::*, CbResult, PricingError};
use serde::{Deserialize, Serialize};

/// Raw model inputs, before validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterInputs {
    pub principal: f64,
    pub maturity_years: f64,
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub credit_spread: f64,
    pub conversion_ratio: f64,
    pub price_steps: usize,
    pub time_steps: usize,
}

impl Default for ParameterInputs {
    fn default() -> Self {
        ParameterInputs {
            principal: 100.0,
            maturity_years: 5.0,
            volatility: 0.3,
            risk_free_rate: 0.05,
            dividend_yield: 0.02,
            credit_spread: 0.03,
            conversion_ratio: 1.2,
            price_steps: 100,
            time_steps: 200,
        }
    }
}

impl ParameterInputs {
    pub fn with_principal(mut self, principal: f64) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_maturity_years(mut self, maturity_years: f64) -> Self {
        self.maturity_years = maturity_years;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    pub fn with_credit_spread(mut self, credit_spread: f64) -> Self {
        self.credit_spread = credit_spread;
        self
    }

    pub fn with_conversion_ratio(mut self, conversion_ratio: f64) -> Self {
        self.conversion_ratio = conversion_ratio;
        self
    }

    /// Sets the grid resolution: `price_steps` (M) and `time_steps` (N)
    pub fn with_grid(mut self, price_steps: usize, time_steps: usize) -> Self {
        self.price_steps = price_steps;
        self.time_steps = time_steps;
        self
    }

    /// Validate and freeze into a [`ParameterSet`]
    pub fn build(self) -> CbResult<ParameterSet> {
        ParameterSet::validate(self)
    }
}

/// Validated, immutable model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterInputs", into = "ParameterInputs")]
pub struct ParameterSet {
    principal: f64,
    maturity_years: f64,
    volatility: f64,
    risk_free_rate: f64,
    dividend_yield: f64,
    credit_spread: f64,
    conversion_ratio: f64,
    price_steps: usize,
    time_steps: usize,
}

/// Bit-exact hashable identity of a [`ParameterSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterKey([u64; 9]);

impl ParameterSet {
    /// Check every field against the model domain
    pub fn validate(inputs: ParameterInputs) -> CbResult<Self> {
        validate_positive("principal", inputs.principal)?;
        validate_positive("maturity_years", inputs.maturity_years)?;
        validate_positive("volatility", inputs.volatility)?;
        validate_finite("risk_free_rate", inputs.risk_free_rate)?;
        validate_finite("dividend_yield", inputs.dividend_yield)?;
        validate_finite("credit_spread", inputs.credit_spread)?;
        validate_at_least("conversion_ratio", inputs.conversion_ratio, 1.0)?;
        validate_steps("price_steps", inputs.price_steps)?;
        validate_steps("time_steps", inputs.time_steps)?;

        Ok(ParameterSet {
            principal: inputs.principal,
            maturity_years: inputs.maturity_years,
            volatility: inputs.volatility,
            risk_free_rate: inputs.risk_free_rate,
            dividend_yield: inputs.dividend_yield,
            credit_spread: inputs.credit_spread,
            conversion_ratio: inputs.conversion_ratio,
            price_steps: inputs.price_steps,
            time_steps: inputs.time_steps,
        })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn maturity_years(&self) -> f64 {
        self.maturity_years
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    pub fn credit_spread(&self) -> f64 {
        self.credit_spread
    }

    pub fn conversion_ratio(&self) -> f64 {
        self.conversion_ratio
    }

    /// Number of price intervals M; the grid has M + 1 price nodes
    pub fn price_steps(&self) -> usize {
        self.price_steps
    }

    /// Number of time intervals N; the grid has N + 1 time layers
    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    /// Raw form, e.g. to tweak one field and re-validate
    pub fn inputs(&self) -> ParameterInputs {
        ParameterInputs::from(*self)
    }

    pub fn key(&self) -> ParameterKey {
        ParameterKey([
            self.principal.to_bits(),
            self.maturity_years.to_bits(),
            self.volatility.to_bits(),
            self.risk_free_rate.to_bits(),
            self.dividend_yield.to_bits(),
            self.credit_spread.to_bits(),
            self.conversion_ratio.to_bits(),
            self.price_steps as u64,
            self.time_steps as u64,
        ])
    }
}

impl TryFrom<ParameterInputs> for ParameterSet {
    type Error = PricingError;

    fn try_from(inputs: ParameterInputs) -> CbResult<Self> {
        ParameterSet::validate(inputs)
    }
}

impl From<ParameterSet> for ParameterInputs {
    fn from(p: ParameterSet) -> Self {
        ParameterInputs {
            principal: p.principal,
            maturity_years: p.maturity_years,
            volatility: p.volatility,
            risk_free_rate: p.risk_free_rate,
            dividend_yield: p.dividend_yield,
            credit_spread: p.credit_spread,
            conversion_ratio: p.conversion_ratio,
            price_steps: p.price_steps,
            time_steps: p.time_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(inputs: ParameterInputs, field: &str) {
        match inputs.build() {
            Err(PricingError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, field),
            other => panic!("expected InvalidParameter for {}, got {:?}", field, other),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let p = ParameterInputs::default().build().expect("defaults are valid");
        assert_eq!(p.price_steps(), 100);
        assert_eq!(p.time_steps(), 200);
        assert_eq!(p.conversion_ratio(), 1.2);
    }

    #[test]
    fn test_rejects_out_of_domain() {
        let base = ParameterInputs::default();
        assert_invalid(base.with_grid(0, 200), "price_steps");
        assert_invalid(base.with_grid(100, 0), "time_steps");
        assert_invalid(base.with_volatility(0.0), "volatility");
        assert_invalid(base.with_maturity_years(-1.0), "maturity_years");
        assert_invalid(base.with_principal(f64::NAN), "principal");
        assert_invalid(base.with_risk_free_rate(f64::INFINITY), "risk_free_rate");
        assert_invalid(base.with_conversion_ratio(0.5), "conversion_ratio");
    }

    #[test]
    fn test_volatility_above_one_is_in_domain() {
        let p = ParameterInputs::default().with_volatility(1.5).build();
        assert!(p.is_ok());
    }

    #[test]
    fn test_serde_routes_through_validation() {
        let json = r#"{"principal": 120.0, "volatility": 0.25}"#;
        let p: ParameterSet = serde_json::from_str(json).expect("valid json");
        assert_eq!(p.principal(), 120.0);
        assert_eq!(p.volatility(), 0.25);
        assert_eq!(p.maturity_years(), 5.0);

        let bad = r#"{"volatility": 0.0}"#;
        assert!(serde_json::from_str::<ParameterSet>(bad).is_err());
    }

    #[test]
    fn test_key_is_bit_exact() {
        let a = ParameterInputs::default().build().unwrap();
        let b = ParameterInputs::default().build().unwrap();
        let c = ParameterInputs::default()
            .with_volatility(0.3 + 1e-15)
            .build()
            .unwrap();
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}
