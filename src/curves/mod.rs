pub mod closed_form;
pub mod price_curve;
pub mod time_series;

pub use price_curve::{PriceCurveEngine, PriceCurveSample};
pub use time_series::{RegimeNodes, RegimePrices, TimeCurveSample, TimeSeriesEngine};
