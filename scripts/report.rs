// scripts/report.rs
//
// Usage: cb-report [PARAMS_JSON] [--config CONFIG_JSON] [--out DIR]
//
// PARAMS_JSON holds any subset of the parameter fields; missing ones take the defaults.
// With --out, the curves are written as CSV and the full output as JSON.
use convertible_fd::config::EngineConfig;
use convertible_fd::output::{write_model_output_json, write_price_curve_csv, write_time_curve_csv};
use convertible_fd::params::ParameterInputs;
use convertible_fd::pipeline::ModelPipeline;
use convertible_fd::{CbResult, PricingError};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    params: Option<PathBuf>,
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
}

impl Args {
    fn parse() -> CbResult<Self> {
        let mut args = Args::default();
        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => args.config = Some(Self::value(&mut iter, "--config")?),
                "--out" => args.out_dir = Some(Self::value(&mut iter, "--out")?),
                _ if args.params.is_none() => args.params = Some(PathBuf::from(arg)),
                _ => {
                    return Err(PricingError::InvalidConfiguration {
                        field: "args".to_string(),
                        reason: format!("unexpected argument '{}'", arg),
                    })
                }
            }
        }
        Ok(args)
    }

    fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> CbResult<PathBuf> {
        iter.next()
            .map(PathBuf::from)
            .ok_or_else(|| PricingError::InvalidConfiguration {
                field: flag.to_string(),
                reason: "expects a path".to_string(),
            })
    }
}

fn main() -> CbResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse()?;

    let inputs: ParameterInputs = match &args.params {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => ParameterInputs::default(),
    };
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let mut pipeline = ModelPipeline::new(config)?;
    let snapshot = pipeline.update(inputs)?;
    let params = &snapshot.params;
    let output = &snapshot.output;

    println!("Convertible Bond Report ({})", snapshot.computed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{:=<72}", "");
    println!(
        "P = {:.2}  T = {:.2}y  σ = {:.4}  r = {:.4}  q = {:.4}  cs = {:.4}  cr = {:.4}",
        params.principal(),
        params.maturity_years(),
        params.volatility(),
        params.risk_free_rate(),
        params.dividend_yield(),
        params.credit_spread(),
        params.conversion_ratio()
    );
    println!(
        "Grid: M = {}, N = {}, method = {:?}",
        params.price_steps(),
        params.time_steps(),
        output.method
    );

    println!("\nStability");
    println!("{:-<72}", "");
    let stability = &output.stability;
    println!(
        "dx = {:.6}  dt = {:.6}  bound = {:.6}  stable = {}",
        stability.dx, stability.dt, stability.explicit_stability_bound, stability.is_stable
    );
    println!("{}", stability.message);
    for issue in &stability.issues {
        println!("  - {}", issue);
    }

    let stride = |len: usize| (len / 20).max(1);

    println!("\nPrice curve");
    println!("{:-<72}", "");
    println!("{:>12} {:>18} {:>18} {:>18}", "S", "V(t=0)", "V(t=T/2)", "V(t=T)");
    let price_stride = stride(output.price_curve.len());
    for (i, s) in output.price_curve.iter().enumerate() {
        if i % price_stride == 0 || i + 1 == output.price_curve.len() {
            println!(
                "{:>12.4} {:>18.4} {:>18.4} {:>18.4}",
                s.stock_price, s.value_at_initial, s.value_at_mid, s.value_at_maturity
            );
        }
    }

    println!("\nTime curve");
    println!("{:-<72}", "");
    println!(
        "regimes: low S = {:.4}, medium S = {:.4}, high S = {:.4}",
        output.regime_prices.low, output.regime_prices.medium, output.regime_prices.high
    );
    println!("{:>12} {:>18} {:>18} {:>18}", "t", "low", "medium", "high");
    let time_stride = stride(output.time_curve.len());
    for (j, s) in output.time_curve.iter().enumerate() {
        if j % time_stride == 0 || j + 1 == output.time_curve.len() {
            println!(
                "{:>12.4} {:>18.4} {:>18.4} {:>18.4}",
                s.time, s.value_low_regime, s.value_medium_regime, s.value_high_regime
            );
        }
    }

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)?;
        write_price_curve_csv(dir.join("price_curve.csv"), output)?;
        write_time_curve_csv(dir.join("time_curve.csv"), output)?;
        write_model_output_json(dir.join("model_output.json"), output)?;
        tracing::info!(dir = %dir.display(), "report files written");
    }

    Ok(())
}
