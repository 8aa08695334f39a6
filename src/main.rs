use baumwelch::bench::{perf_test, PerfOptions, PerfResult, REP};
use baumwelch::common::{Shape, MONOTONICITY_TOLERANCE};
use baumwelch::em::EmConfig;
use baumwelch::error::Result;
use baumwelch::hmm::{ModelParameters, ObservationSet};
use baumwelch::registry::{Registry, Variant};
use baumwelch::verify::{check_and_verify, VerifyReport};
use clap::Parser;
use log::error;
use serde::Serialize;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Benchmark of Baum-Welch implementation variants")]
struct Opts {
    /// Run only the named variant (repeatable). The baseline always runs.
    #[clap(long)]
    only: Vec<String>,
    /// List the registered variants and exit
    #[clap(long)]
    list: bool,
    /// Maximum number of EM iterations (overrides the config file)
    #[clap(long)]
    max_iterations: Option<usize>,
    /// Number of sequences
    #[clap(short = 'K', default_value_t = 16)]
    k: usize,
    /// Number of hidden states
    #[clap(short = 'N', default_value_t = 16)]
    n: usize,
    /// Number of observable symbols
    #[clap(short = 'M', default_value_t = 16)]
    m: usize,
    /// Length of each sequence
    #[clap(short = 'T', default_value_t = 32)]
    t: usize,
    /// Seed of the random model and observations
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// EM config in JSON
    #[clap(long)]
    config: Option<std::path::PathBuf>,
    /// Record NLL increases during training
    #[clap(long)]
    verify: bool,
    /// Print the results as JSON
    #[clap(long)]
    json: bool,
    /// Number of measured repetitions
    #[clap(long, default_value_t = REP)]
    runs: usize,
    /// Skip the calibration of the number of runs per repetition
    #[clap(long)]
    no_calibrate: bool,
}

#[derive(Serialize)]
struct VariantReport {
    perf: PerfResult,
    verify: VerifyReport,
    /// max difference of the trained model from the one of the baseline
    diff_from_baseline: f64,
}

fn run_variant(
    variant: &Variant,
    params: &ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
    options: PerfOptions,
    baseline: Option<&ModelParameters>,
    json: bool,
) -> Result<(VariantReport, ModelParameters)> {
    if !json {
        println!("\nRunning: {} ({})", variant.name, variant.description);
    }
    let (perf, trained, output) = perf_test(variant, params, obs, config, options)?;
    let verify = check_and_verify(&trained, &output.nll_trace, MONOTONICITY_TOLERANCE);
    let diff_from_baseline = baseline.map_or(0.0, |b| b.diff(&trained));
    if !json {
        println!("{}", perf);
        print!("{}", verify);
        if baseline.is_some() {
            println!("Max difference from baseline: {:e}", diff_from_baseline);
        }
    }
    let report = VariantReport {
        perf,
        verify,
        diff_from_baseline,
    };
    Ok((report, trained))
}

fn run(opts: &Opts) -> Result<()> {
    let registry = Registry::default();
    if opts.list {
        for name in registry.names() {
            if let Some(v) = registry.get(name) {
                println!("{}\t{}", v.name, v.description);
            }
        }
        return Ok(());
    }

    let mut config = match &opts.config {
        Some(path) => EmConfig::from_json_file(path)?,
        None => EmConfig::default(),
    };
    if let Some(max_iterations) = opts.max_iterations {
        config.max_iterations = max_iterations;
    }
    if opts.verify {
        config.verify = true;
    }
    config.validate()?;

    let shape = Shape::new(opts.k, opts.n, opts.m, opts.t)?;
    let params = ModelParameters::random(shape.n, shape.m, opts.seed)?;
    let obs = ObservationSet::random(shape.k, shape.t, shape.m, opts.seed.wrapping_add(1))?;
    let options = PerfOptions {
        calibrate: !opts.no_calibrate,
        repetitions: opts.runs,
    };
    let selected = registry.select(&opts.only);
    for name in opts.only.iter() {
        if registry.get(name).is_none() {
            error!("unknown variant {}", name);
        }
    }
    if !opts.json {
        println!("# shape={}", shape);
        println!("# config={:?}", config);
    }

    let (base_report, base_params) = run_variant(
        registry.baseline(),
        &params,
        &obs,
        &config,
        options,
        None,
        opts.json,
    )?;
    let mut reports = vec![base_report];
    for variant in selected {
        let (report, _) = run_variant(
            variant,
            &params,
            &obs,
            &config,
            options,
            Some(&base_params),
            opts.json,
        )?;
        reports.push(report);
    }
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    // keep stdout parsable in json mode
    if !opts.json {
        println!("# started_at={}", chrono::Local::now());
        println!("# n_threads={}", rayon::current_num_threads());
        println!("# opts={:?}", opts);
    }
    if let Err(e) = run(&opts) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    if !opts.json {
        println!("# finished_at={}", chrono::Local::now());
    }
}
