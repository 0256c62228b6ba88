//! Conversion Economics
//!
//! # Mathematical Definitions
//!
//! With principal `P` and conversion ratio `cr` (the stock-price level at which converting
//! pays par):
//! - **Parity** (conversion value): `P · S / cr`
//! - **Bond floor**: `P · exp(-(r + cs) τ)` with `τ = T - t` the time to maturity
//! - **Redemption** at maturity: `max(P, parity)`
//!
//! Values are tracked as a pair `(V, B)`: the total convertible value and its cash-only
//! part, which is discounted at the credit-risky rate.

/// Conversion terms of the bond
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionTerms {
    pub principal: f64,
    pub conversion_ratio: f64,
}

impl ConversionTerms {
    pub fn new(principal: f64, conversion_ratio: f64) -> Self {
        ConversionTerms {
            principal,
            conversion_ratio,
        }
    }

    /// Parity `P · S / cr`
    #[inline]
    pub fn conversion_value(&self, s: f64) -> f64 {
        self.principal * s / self.conversion_ratio
    }

    /// The holder converts at or above the threshold `S = cr`
    #[inline]
    pub fn converts(&self, s: f64) -> bool {
        s >= self.conversion_ratio
    }

    /// `(V, B)` at maturity: converted shares, or principal repaid in cash
    pub fn terminal(&self, s: f64) -> (f64, f64) {
        let parity = self.conversion_value(s);
        if parity >= self.principal {
            (parity, 0.0)
        } else {
            (self.principal, self.principal)
        }
    }

    /// Discounted principal with `tau` years to maturity at the risky rate
    #[inline]
    pub fn bond_floor(&self, risky_rate: f64, tau: f64) -> f64 {
        self.principal * (-risky_rate * tau).exp()
    }

    /// Dirichlet `(V, B)` at a domain edge: the bond floor unless conversion is worth more.
    ///
    /// This is a truncation: at the lower edge `S = 1` the conversion option still has time
    /// value, which this value ignores.
    pub fn boundary(&self, s: f64, risky_rate: f64, tau: f64) -> (f64, f64) {
        let floor = self.bond_floor(risky_rate, tau);
        let parity = self.conversion_value(s);
        if parity >= floor {
            (parity, 0.0)
        } else {
            (floor, floor)
        }
    }

    /// Free-boundary projection: convert when continuation is worth no more than parity
    #[inline]
    pub fn apply_conversion(&self, s: f64, v: &mut f64, b: &mut f64) {
        let parity = self.conversion_value(s);
        if *v <= parity {
            *v = parity;
            *b = 0.0;
        }
    }
}
