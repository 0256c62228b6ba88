// scripts/benchmark.rs
use convertible_fd::config::{EngineConfig, ValuationMethod};
use convertible_fd::fd::ExplicitSolver;
use convertible_fd::grid::GridSpec;
use convertible_fd::params::{ParameterInputs, ParameterSet};
use convertible_fd::pipeline::compute_model_output;
use convertible_fd::stability::StabilityAnalyzer;
use convertible_fd::CbResult;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rayon_threads: usize,
    parallel_threshold: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rayon_threads: rayon::current_num_threads(),
            parallel_threshold: EngineConfig::default().parallel_threshold,
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    price_steps: usize,
    time_steps: usize,
    time_ms: f64,
    throughput_nodes_per_sec: f64,
    value_at_cr: f64,
    stable: bool,
}

impl BenchmarkResult {
    fn new(name: String, params: &ParameterSet, time_ms: f64, value_at_cr: f64, stable: bool) -> Self {
        let nodes = ((params.price_steps() + 1) * (params.time_steps() + 1)) as f64;
        BenchmarkResult {
            name,
            price_steps: params.price_steps(),
            time_steps: params.time_steps(),
            time_ms,
            throughput_nodes_per_sec: nodes / (time_ms / 1000.0),
            value_at_cr,
            stable,
        }
    }
}

/// Stable grids of increasing size: N follows the explicit bound for each M
fn grid_configs() -> CbResult<Vec<ParameterSet>> {
    [100usize, 200, 400, 1000]
        .iter()
        .map(|&m| {
            let probe = ParameterInputs::default().with_grid(m, 100).build()?;
            let grid = GridSpec::new(&probe, &EngineConfig::default())?;
            let report = StabilityAnalyzer::analyze(&grid, &probe);
            let n = report
                .instability
                .map_or(probe.time_steps(), |i| i.recommended_time_steps);
            ParameterInputs::default().with_grid(m, n).build()
        })
        .collect()
}

fn run_solver_benchmarks(configs: &[ParameterSet]) -> CbResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let config = EngineConfig::default();

    for params in configs {
        println!(
            "Sweeping M = {}, N = {}...",
            params.price_steps(),
            params.time_steps()
        );
        let grid = GridSpec::new(params, &config)?;
        let stable = StabilityAnalyzer::analyze(&grid, params).is_stable;
        let probe = grid.nearest_price_node(params.conversion_ratio());

        for (label, solver) in [
            ("sequential", ExplicitSolver::new(usize::MAX)),
            ("rayon", ExplicitSolver::new(0)),
        ] {
            let start = Instant::now();
            let solved = solver.solve(&grid, params);
            let time_ms = start.elapsed().as_secs_f64() * 1000.0;

            results.push(BenchmarkResult::new(
                format!("Explicit FD ({})", label),
                params,
                time_ms,
                solved.value(0, probe),
                stable,
            ));
        }
    }

    Ok(results)
}

fn run_pipeline_benchmarks() -> CbResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let params = ParameterInputs::default().with_grid(400, 3000).build()?;

    for method in [ValuationMethod::FiniteDifference, ValuationMethod::ClosedForm] {
        println!("Benchmarking full pipeline ({:?})...", method);
        let config = EngineConfig::default().with_method(method);

        let start = Instant::now();
        let output = compute_model_output(&params, &config)?;
        let time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let probe = output
            .price_curve
            .iter()
            .min_by(|a, b| {
                let da = (a.stock_price - params.conversion_ratio()).abs();
                let db = (b.stock_price - params.conversion_ratio()).abs();
                da.total_cmp(&db)
            })
            .map_or(f64::NAN, |s| s.value_at_initial);

        results.push(BenchmarkResult::new(
            format!("Pipeline {:?}", method),
            &params,
            time_ms,
            probe,
            output.stability.is_stable,
        ));
    }

    Ok(results)
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);

    writeln!(file, "# convertible-fd {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(file, "# Default Parallel Threshold: {}", system_info.parallel_threshold)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,M,N,Time_ms,Throughput_nodes_per_sec,Value_at_cr,Stable"
    )?;
    for result in results {
        writeln!(
            file,
            "{},{},{},{:.3},{:.0},{:.6},{}",
            result.name,
            result.price_steps,
            result.time_steps,
            result.time_ms,
            result.throughput_nodes_per_sec,
            result.value_at_cr,
            result.stable
        )?;
    }
    file.flush()?;

    println!("Results written to {}", filename);
    Ok(())
}

fn main() -> CbResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    println!("convertible-fd Benchmark Suite");
    println!("==============================\n");

    let system_info = SystemInfo::gather();
    println!(
        "{} | {} cores | {} rayon threads | parallel sweep from {} price nodes",
        system_info.os,
        system_info.cpu_cores,
        system_info.rayon_threads,
        system_info.parallel_threshold
    );
    println!();

    let configs = grid_configs()?;
    let mut all_results = run_solver_benchmarks(&configs)?;
    all_results.extend(run_pipeline_benchmarks()?);

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<32} {:>6} {:>7} {:>12} {:>16} {:>12} {:>7}",
        "Benchmark", "M", "N", "Time (ms)", "Nodes/sec", "V(cr)", "Stable"
    );
    println!("{:-<96}", "");
    for result in &all_results {
        println!(
            "{:<32} {:>6} {:>7} {:>12.2} {:>16.0} {:>12.4} {:>7}",
            result.name,
            result.price_steps,
            result.time_steps,
            result.time_ms,
            result.throughput_nodes_per_sec,
            result.value_at_cr,
            result.stable
        );
    }
    println!("{:=<96}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    write_results_to_csv(&all_results, &system_info, &filename)?;

    println!("\nRun with: cargo run --bin benchmark --release");
    Ok(())
}
