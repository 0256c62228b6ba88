//! Closed-Form Proxies
//!
//! Simplified analytic stand-ins for the finite-difference surface. They reproduce the
//! shape of the convertible's terminal/boundary economics without solving the PDE and are
//! only selected with [`ValuationMethod::ClosedForm`](crate::config::ValuationMethod).
//!
//! # Price Curve
//! ```text
//! initial, maturity:  S < cr ? P : P·S/cr
//! mid (t = T/2):      S < cr ? P·exp(-r·T/2) : P·S/cr · (1 + r·T/2)
//! ```
//!
//! # Time Series (per regime stock price S)
//! ```text
//! floor(t)  = P·exp(-(r + cs)(T - t))
//! low(t)    = S ≥ cr ? P·S/cr : floor(t)
//! medium(t) = max(floor(t), P·S/cr) · (1 + a·σ·sin(2πt/T)·(1 - t/T))
//! high(t)   = X - (X - floor(0))·exp(-k·t/T),   X = max(P, P·S/cr)
//! ```

use crate::fd::ConversionTerms;
use crate::params::ParameterSet;
use std::f64::consts::PI;

/// Relative swing of the medium-regime oscillation per unit of volatility
const OSCILLATION_AMPLITUDE: f64 = 0.1;
/// Speed of the high-regime approach to the converted value, in units of 1/T
const CONVERSION_APPROACH_RATE: f64 = 3.0;

pub struct ClosedForm {
    terms: ConversionTerms,
    rate: f64,
    risky_rate: f64,
    volatility: f64,
    maturity: f64,
}

impl ClosedForm {
    pub fn new(params: &ParameterSet) -> Self {
        ClosedForm {
            terms: ConversionTerms::new(params.principal(), params.conversion_ratio()),
            rate: params.risk_free_rate(),
            risky_rate: params.risk_free_rate() + params.credit_spread(),
            volatility: params.volatility(),
            maturity: params.maturity_years(),
        }
    }

    /// Value at issue and at maturity
    pub fn terminal_value(&self, s: f64) -> f64 {
        if self.terms.converts(s) {
            self.terms.conversion_value(s)
        } else {
            self.terms.principal
        }
    }

    /// Value half-way to maturity
    pub fn mid_value(&self, s: f64) -> f64 {
        let half = 0.5 * self.maturity;
        if self.terms.converts(s) {
            self.terms.conversion_value(s) * (1.0 + self.rate * half)
        } else {
            self.terms.principal * (-self.rate * half).exp()
        }
    }

    fn floor(&self, t: f64) -> f64 {
        self.terms.bond_floor(self.risky_rate, self.maturity - t)
    }

    pub fn low_regime(&self, s: f64, t: f64) -> f64 {
        if self.terms.converts(s) {
            self.terms.conversion_value(s)
        } else {
            self.floor(t)
        }
    }

    pub fn medium_regime(&self, s: f64, t: f64) -> f64 {
        let base = self.floor(t).max(self.terms.conversion_value(s));
        let phase = t / self.maturity;
        let swing =
            OSCILLATION_AMPLITUDE * self.volatility * (2.0 * PI * phase).sin() * (1.0 - phase);
        base * (1.0 + swing)
    }

    pub fn high_regime(&self, s: f64, t: f64) -> f64 {
        let converted = self.terms.principal.max(self.terms.conversion_value(s));
        let start = self.floor(0.0);
        converted - (converted - start) * (-CONVERSION_APPROACH_RATE * t / self.maturity).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterInputs;

    fn proxy() -> ClosedForm {
        let params = ParameterInputs::default()
            .with_principal(100.0)
            .with_conversion_ratio(1.5)
            .with_risk_free_rate(0.04)
            .with_maturity_years(4.0)
            .build()
            .unwrap();
        ClosedForm::new(&params)
    }

    #[test]
    fn test_price_branches() {
        let cf = proxy();
        assert_eq!(cf.terminal_value(1.2), 100.0);
        assert_eq!(cf.terminal_value(3.0), 200.0);
        assert!((cf.mid_value(1.2) - 100.0 * (-0.08_f64).exp()).abs() < 1e-12);
        assert!((cf.mid_value(3.0) - 200.0 * 1.08).abs() < 1e-12);
    }

    #[test]
    fn test_medium_regime_is_bounded_and_settles() {
        let cf = proxy();
        for k in 0..=40 {
            let t = 4.0 * k as f64 / 40.0;
            let v = cf.medium_regime(1.5, t);
            let base = cf.floor(t).max(100.0);
            assert!((v / base - 1.0).abs() <= OSCILLATION_AMPLITUDE * 0.3 + 1e-12);
        }
        assert_eq!(cf.medium_regime(1.5, 4.0), 100.0);
    }

    #[test]
    fn test_high_regime_approaches_converted_value() {
        let cf = proxy();
        let early = (cf.high_regime(3.0, 0.0) - 200.0).abs();
        let late = (cf.high_regime(3.0, 4.0) - 200.0).abs();
        assert!(late < early);
        assert!(late < 0.06 * early);
    }
}
