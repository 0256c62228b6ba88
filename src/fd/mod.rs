pub mod explicit;
pub mod payoff;

pub use explicit::{CancellationToken, ExplicitSolver, SolveOutcome, ValueGrid};
pub use payoff::ConversionTerms;
