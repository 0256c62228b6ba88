// src/pipeline.rs
//! Model Pipeline
//!
//! # Flow
//!
//! ```text
//! ParameterSet → GridSpec → StabilityAnalyzer
//!                         → ExplicitSolver (finite-difference method only)
//!                         → PriceCurveEngine + TimeSeriesEngine
//!                         → ModelOutput
//! ```
//!
//! [`compute_model_output`] is the pure, deterministic core: identical inputs give a
//! bit-identical [`ModelOutput`]. [`ModelPipeline`] wraps it with the "current snapshot"
//! state a presentation layer reads: a new snapshot is published only after a complete
//! recomputation, so a failed or cancelled update leaves the previous one in place.

use crate::config::{EngineConfig, ValuationMethod};
use crate::curves::{
    PriceCurveEngine, PriceCurveSample, RegimeNodes, RegimePrices, TimeCurveSample,
    TimeSeriesEngine,
};
use crate::error::{CbResult, PricingError};
use crate::fd::{CancellationToken, ExplicitSolver, SolveOutcome};
use crate::grid::GridSpec;
use crate::params::{ParameterInputs, ParameterKey, ParameterSet};
use crate::rng::Perturbation;
use crate::stability::{StabilityAnalyzer, StabilityReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Everything a presentation layer needs for one parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub method: ValuationMethod,
    pub price_curve: Vec<PriceCurveSample>,
    pub time_curve: Vec<TimeCurveSample>,
    pub regime_prices: RegimePrices,
    pub stability: StabilityReport,
}

/// A parameter set paired with the output computed from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub params: ParameterSet,
    pub output: ModelOutput,
    pub computed_at: DateTime<Utc>,
}

/// Compute the full model output for `params`
pub fn compute_model_output(params: &ParameterSet, config: &EngineConfig) -> CbResult<ModelOutput> {
    compute(params, config, None)
}

/// Same as [`compute_model_output`], but the finite-difference sweep stops when `token`
/// is cancelled and [`PricingError::Cancelled`] is returned
pub fn compute_model_output_cancellable(
    params: &ParameterSet,
    config: &EngineConfig,
    token: &CancellationToken,
) -> CbResult<ModelOutput> {
    compute(params, config, Some(token))
}

fn compute(
    params: &ParameterSet,
    config: &EngineConfig,
    token: Option<&CancellationToken>,
) -> CbResult<ModelOutput> {
    let grid = GridSpec::new(params, config)?;
    let stability = StabilityAnalyzer::analyze(&grid, params);
    let nodes = RegimeNodes::locate(&grid, params, &config.regimes);

    let (mut price_curve, mut time_curve) = match config.method {
        ValuationMethod::ClosedForm => (
            PriceCurveEngine::closed_form(&grid, params),
            TimeSeriesEngine::closed_form(&grid, params, &nodes),
        ),
        ValuationMethod::FiniteDifference => {
            let solver = ExplicitSolver::new(config.parallel_threshold);
            let values = match token {
                None => solver.solve(&grid, params),
                Some(token) => match solver.solve_cancellable(&grid, params, token) {
                    SolveOutcome::Complete(values) => values,
                    SolveOutcome::Cancelled {
                        completed_steps,
                        total_steps,
                        ..
                    } => {
                        return Err(PricingError::Cancelled {
                            completed_steps,
                            total_steps,
                        })
                    }
                },
            };
            (
                PriceCurveEngine::from_value_grid(&values),
                TimeSeriesEngine::from_value_grid(&values, &nodes),
            )
        }
    };

    if !stability.is_stable {
        if let Some(perturbation) = &config.perturbation {
            tracing::debug!(seed = perturbation.seed, "applying seeded perturbation");
            Perturbation::new(perturbation).apply(&mut price_curve, &mut time_curve);
        }
    }

    Ok(ModelOutput {
        method: config.method,
        price_curve,
        time_curve,
        regime_prices: nodes.prices(&grid),
        stability,
    })
}

/// Bounded memo of outputs keyed by parameter set, oldest entry evicted first
#[derive(Debug, Clone)]
pub struct OutputCache {
    capacity: usize,
    entries: HashMap<ParameterKey, ModelOutput>,
    order: VecDeque<ParameterKey>,
}

impl OutputCache {
    pub fn new(capacity: usize) -> Self {
        OutputCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &ParameterKey) -> Option<&ModelOutput> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: ParameterKey, output: ModelOutput) {
        if self.entries.insert(key, output).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Holder of the current (parameters, output) snapshot
pub struct ModelPipeline {
    config: EngineConfig,
    current: Option<Arc<Snapshot>>,
    cache: Option<OutputCache>,
}

impl ModelPipeline {
    pub fn new(config: EngineConfig) -> CbResult<Self> {
        config.validate()?;
        Ok(ModelPipeline {
            config,
            current: None,
            cache: None,
        })
    }

    /// Memoize up to `capacity` outputs by parameter set
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(OutputCache::new(capacity));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latest published snapshot, if any
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.current.clone()
    }

    pub fn cache(&self) -> Option<&OutputCache> {
        self.cache.as_ref()
    }

    /// Validate `inputs`, recompute and publish
    pub fn update(&mut self, inputs: ParameterInputs) -> CbResult<Arc<Snapshot>> {
        let params = self.reject_on_error(inputs.build())?;
        self.publish(params, None)
    }

    /// Recompute and publish an already-validated parameter set
    pub fn update_params(&mut self, params: ParameterSet) -> CbResult<Arc<Snapshot>> {
        self.publish(params, None)
    }

    /// Like [`update`](Self::update), but the solve can be interrupted through `token`
    pub fn update_cancellable(
        &mut self,
        inputs: ParameterInputs,
        token: &CancellationToken,
    ) -> CbResult<Arc<Snapshot>> {
        let params = self.reject_on_error(inputs.build())?;
        self.publish(params, Some(token))
    }

    fn reject_on_error<T>(&self, result: CbResult<T>) -> CbResult<T> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "recompute rejected, keeping previous snapshot");
        }
        result
    }

    fn publish(
        &mut self,
        params: ParameterSet,
        token: Option<&CancellationToken>,
    ) -> CbResult<Arc<Snapshot>> {
        let key = params.key();
        let cached = self.cache.as_ref().and_then(|c| c.get(&key).cloned());

        let output = match cached {
            Some(output) => {
                tracing::debug!("model output served from cache");
                output
            }
            None => {
                let output = self.reject_on_error(compute(&params, &self.config, token))?;
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(key, output.clone());
                }
                output
            }
        };

        tracing::info!(
            stable = output.stability.is_stable,
            issues = output.stability.issues.len(),
            price_nodes = output.price_curve.len(),
            time_layers = output.time_curve.len(),
            "model output published"
        );

        let snapshot = Arc::new(Snapshot {
            params,
            output,
            computed_at: Utc::now(),
        });
        self.current = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
