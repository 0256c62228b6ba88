//! Explicit Finite-Difference Solver for Convertible Bonds
//!
//! # Mathematical Framework
//!
//! In log-price `x = ln S`, the Tsiveriotis–Fernandes split prices the convertible as two
//! coupled PDEs, marched backward from maturity:
//! ```text
//! V_t + ½σ² V_xx + μ V_x - r (V - B) - (r + cs) B = 0
//! B_t + ½σ² B_xx + μ B_x - (r + cs) B             = 0
//! μ = r - q - ½σ²
//! ```
//! `V` is the total value and `B` its cash-only part: equity-like value is discounted at
//! the risk-free rate, promised cash at the credit-risky rate `r + cs`.
//!
//! # Discretization
//!
//! Central differences in `x`, forward Euler in time-to-maturity:
//! ```text
//! V_i^j = V_i^{j+1} + dt [ α (V_{i+1} - 2V_i + V_{i-1}) + β (V_{i+1} - V_{i-1}) - r (V_i - B_i) - (r + cs) B_i ]
//! α = ½σ² / dx²,   β = μ / (2 dx)
//! ```
//! After every layer the conversion free boundary is enforced: wherever `V ≤ P·S/cr` the
//! holder converts (`V = P·S/cr`, `B = 0`). Both domain edges carry the Dirichlet value
//! `max(bond floor, parity)`.
//!
//! The lower edge truncates the domain at `S = 1` rather than `S → 0`. Its Dirichlet value
//! drops the time value of the conversion option there, so solved values on the first few
//! price nodes are biased low; the bias decays away from the edge.
//!
//! # Stability
//!
//! Conditionally stable, roughly `dt ≤ dx²/σ²`. The solver does not refuse unstable
//! grids; the stability report says whether to trust the output.
//!
//! # Cancellation
//!
//! Each layer is one unit of work. [`ExplicitSolver::solve_interruptible`] asks a
//! predicate before every layer and, when told to stop, returns the last completed layer.

use super::payoff::ConversionTerms;
use crate::grid::GridSpec;
use crate::params::ParameterSet;
use ndarray::{aview1, Array1, Array2, ArrayView1, ArrayViewMut1, Zip};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that interrupts a running solve between time layers
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Convertible value on every (time, price) node, row `j` ↔ `t = j·dt`
#[derive(Debug, Clone)]
pub struct ValueGrid {
    grid: GridSpec,
    values: Array2<f64>,
}

impl ValueGrid {
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn value(&self, j: usize, i: usize) -> f64 {
        self.values[[j, i]]
    }

    /// Values across price nodes at time layer `j`
    pub fn layer(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.row(j)
    }

    /// Values across time layers at price node `i`
    pub fn column(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.column(i)
    }

    /// Layer at `t = T/2`; the mean of the two neighbouring layers when N is odd
    pub fn mid_layer(&self) -> Array1<f64> {
        let n = self.grid.time_steps();
        if n % 2 == 0 {
            self.values.row(n / 2).to_owned()
        } else {
            let lo = self.values.row(n / 2);
            let hi = self.values.row(n / 2 + 1);
            (&lo + &hi) * 0.5
        }
    }
}

/// Result of an interruptible solve
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Complete(ValueGrid),
    Cancelled {
        completed_steps: usize,
        total_steps: usize,
        /// Time of the last completed layer
        time: f64,
        last_layer: Vec<f64>,
    },
}

/// Per-node update coefficients for one solve
#[derive(Debug, Clone, Copy)]
struct Stencil {
    alpha: f64,
    beta: f64,
    dt: f64,
    rate: f64,
    risky_rate: f64,
    terms: ConversionTerms,
}

impl Stencil {
    fn new(grid: &GridSpec, params: &ParameterSet) -> Self {
        let sigma2 = params.volatility() * params.volatility();
        let dx = grid.dx();
        let mu = params.risk_free_rate() - params.dividend_yield() - 0.5 * sigma2;
        Stencil {
            alpha: 0.5 * sigma2 / (dx * dx),
            beta: mu / (2.0 * dx),
            dt: grid.dt(),
            rate: params.risk_free_rate(),
            risky_rate: params.risk_free_rate() + params.credit_spread(),
            terms: ConversionTerms::new(params.principal(), params.conversion_ratio()),
        }
    }

    #[inline]
    fn operator(&self, lo: f64, mid: f64, hi: f64) -> f64 {
        self.alpha * (hi - 2.0 * mid + lo) + self.beta * (hi - lo)
    }

    /// Advance interior node `i` by one layer and apply the conversion constraint
    #[inline]
    fn node(&self, i: usize, s: f64, v: &[f64], b: &[f64]) -> (f64, f64) {
        let lv = self.operator(v[i - 1], v[i], v[i + 1]);
        let lb = self.operator(b[i - 1], b[i], b[i + 1]);

        let mut b_new = b[i] + self.dt * (lb - self.risky_rate * b[i]);
        let mut v_new =
            v[i] + self.dt * (lv - self.rate * (v[i] - b[i]) - self.risky_rate * b[i]);

        self.terms.apply_conversion(s, &mut v_new, &mut b_new);
        (v_new, b_new)
    }
}

pub struct ExplicitSolver {
    parallel_threshold: usize,
}

impl Default for ExplicitSolver {
    fn default() -> Self {
        ExplicitSolver {
            parallel_threshold: 2048,
        }
    }
}

impl ExplicitSolver {
    /// `parallel_threshold`: price-node count from which layers are swept in parallel
    pub fn new(parallel_threshold: usize) -> Self {
        ExplicitSolver { parallel_threshold }
    }

    /// Full backward solve from maturity to the valuation date
    pub fn solve(&self, grid: &GridSpec, params: &ParameterSet) -> ValueGrid {
        match self.sweep(grid, params, |_| Ok::<(), Infallible>(())) {
            Ok(values) => values,
            Err((never, _)) => match never {},
        }
    }

    /// Backward solve that stops between layers once `token` is cancelled
    pub fn solve_cancellable(
        &self,
        grid: &GridSpec,
        params: &ParameterSet,
        token: &CancellationToken,
    ) -> SolveOutcome {
        self.solve_interruptible(grid, params, |_| !token.is_cancelled())
    }

    /// Backward solve consulting `keep_going(completed_steps)` before every layer
    pub fn solve_interruptible<F>(
        &self,
        grid: &GridSpec,
        params: &ParameterSet,
        mut keep_going: F,
    ) -> SolveOutcome
    where
        F: FnMut(usize) -> bool,
    {
        let check = |done: usize| if keep_going(done) { Ok(()) } else { Err(()) };
        match self.sweep(grid, params, check) {
            Ok(values) => SolveOutcome::Complete(values),
            Err(((), stop)) => SolveOutcome::Cancelled {
                completed_steps: stop.completed_steps,
                total_steps: grid.time_steps(),
                time: stop.time,
                last_layer: stop.last_layer,
            },
        }
    }

    fn sweep<E, F>(
        &self,
        grid: &GridSpec,
        params: &ParameterSet,
        mut check: F,
    ) -> Result<ValueGrid, (E, Interrupted)>
    where
        F: FnMut(usize) -> Result<(), E>,
    {
        let m = grid.price_steps();
        let n = grid.time_steps();
        let stencil = Stencil::new(grid, params);
        let terms = stencil.terms;
        let prices = grid.stock_prices();
        let parallel = m + 1 >= self.parallel_threshold;

        let mut values = Array2::<f64>::zeros((n + 1, m + 1));
        let (mut v, mut b): (Vec<f64>, Vec<f64>) =
            prices.iter().map(|&s| terms.terminal(s)).unzip();
        values.row_mut(n).assign(&aview1(&v));

        let mut next_v = vec![0.0_f64; m + 1];
        let mut next_b = vec![0.0_f64; m + 1];

        tracing::debug!(m, n, parallel, "starting explicit backward sweep");

        for j in (0..n).rev() {
            let completed = n - 1 - j;
            if let Err(e) = check(completed) {
                tracing::debug!(completed, total = n, "explicit sweep interrupted");
                return Err((
                    e,
                    Interrupted {
                        completed_steps: completed,
                        time: grid.time(j + 1),
                        last_layer: v,
                    },
                ));
            }

            let tau = grid.maturity_years() - grid.time(j);
            (next_v[0], next_b[0]) = terms.boundary(prices[0], stencil.risky_rate, tau);
            (next_v[m], next_b[m]) = terms.boundary(prices[m], stencil.risky_rate, tau);

            if m > 1 {
                let interior = Zip::indexed(ArrayViewMut1::from(&mut next_v[1..m]))
                    .and(ArrayViewMut1::from(&mut next_b[1..m]));
                let update = |k: usize, nv: &mut f64, nb: &mut f64| {
                    (*nv, *nb) = stencil.node(k + 1, prices[k + 1], &v, &b);
                };
                if parallel {
                    interior.par_for_each(update);
                } else {
                    interior.for_each(update);
                }
            }

            std::mem::swap(&mut v, &mut next_v);
            std::mem::swap(&mut b, &mut next_b);
            values.row_mut(j).assign(&aview1(&v));
        }

        Ok(ValueGrid {
            grid: *grid,
            values,
        })
    }
}

/// State at the point a sweep was stopped
struct Interrupted {
    completed_steps: usize,
    time: f64,
    last_layer: Vec<f64>,
}
