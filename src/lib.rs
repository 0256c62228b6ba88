//! # convertible-fd: Explicit Finite-Difference Pricing of Convertible Bonds
//!
//! Prices a convertible bond on a (stock price × time) grid with an explicit
//! finite-difference scheme and reports whether the chosen discretization is stable.
//!
//! ## Key Features
//!
//! - **Backward-induction solve**: Tsiveriotis–Fernandes split with a conversion free
//!   boundary, swept with Rayon on large grids
//! - **Stability diagnostics**: the `dt ≤ dx²/σ²` gate plus advisory findings
//! - **Closed-form proxies**: cheap analytic curves for quick previews
//! - **Atomic snapshots**: a pipeline that only ever publishes complete outputs
//! - **Plain output**: serde-serializable curves for any presentation layer
//!
//! ## Quick Start
//!
//! ```rust
//! use convertible_fd::config::EngineConfig;
//! use convertible_fd::params::ParameterInputs;
//! use convertible_fd::pipeline::compute_model_output;
//!
//! let params = ParameterInputs::default()
//!     .with_volatility(0.3)
//!     .with_grid(100, 200)
//!     .build()
//!     .expect("valid parameters");
//!
//! let output = compute_model_output(&params, &EngineConfig::default()).expect("grid fits");
//! assert!(output.stability.is_stable);
//! assert_eq!(output.price_curve.len(), 101);
//! assert_eq!(output.time_curve.len(), 201);
//! ```
//!
//! ## Mathematical Foundation
//!
//! The grid lives in log-price `x = ln S ∈ [0, ln U]` with `dx = ln(U)/M` and in time
//! `t ∈ [0, T]` with `dt = T/N`. The forward-Euler sweep is stable when
//! `dt ≤ dx²/σ²`; unstable configurations are still computed and flagged.

pub mod config;
pub mod curves;
pub mod error;
pub mod fd;
pub mod grid;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod rng;
pub mod stability;

// Re-export commonly used types for convenience
pub use config::{EngineConfig, ValuationMethod};
pub use error::{CbResult, PricingError};
pub use params::{ParameterInputs, ParameterSet};
pub use pipeline::{compute_model_output, ModelOutput, ModelPipeline, Snapshot};
pub use stability::StabilityReport;
