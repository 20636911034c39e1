mod console;
mod error;
mod export;
mod sink;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sl_core::{ParameterSet, RateLimiter, Real};
use sl_scenario::Scenario;
use sl_sim::{Driver, Model, ModelKind, ModelParams, Session, SimOptions, SimProgress, SimRecord};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};
use crate::export::Format;
use crate::sink::TextSink;

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(about = "SimLab CLI - interactive tank, circuit and oscillator demos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List models with their step sizes and parameter ranges
    Models {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in scenario of a model as YAML
    Preset {
        /// Model name (e.g. draining-tank, rlc)
        model: ModelKind,
    },
    /// Run a model headless and export its trajectory
    Run {
        /// Model name (e.g. draining-tank, rlc)
        model: ModelKind,
        /// Parameter override, checked against its declared range
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run a scenario file (YAML or JSON) headless
    Scenario {
        /// Path to the scenario file
        path: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Interactive paced session driven by typed commands
    Console {
        /// Model to open (defaults to draining-tank)
        model: Option<ModelKind>,
        /// Open a scenario file instead of a model's defaults
        #[arg(long, conflicts_with = "model")]
        scenario: Option<PathBuf>,
        /// Frame rate override (frames per second)
        #[arg(long)]
        rate: Option<Real>,
    },
}

/// Run-option overrides shared by `run` and `scenario`.
#[derive(Args)]
struct RunArgs {
    /// Time step in seconds
    #[arg(long)]
    dt: Option<Real>,
    /// End time in seconds
    #[arg(long)]
    t_end: Option<Real>,
    /// Maximum number of steps
    #[arg(long)]
    max_steps: Option<usize>,
    /// Record every N-th step
    #[arg(long)]
    every: Option<usize>,
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

impl RunArgs {
    fn apply(&self, opts: &mut SimOptions) {
        if let Some(dt) = self.dt {
            opts.dt = dt;
        }
        if let Some(t_end) = self.t_end {
            opts.t_end = t_end;
        }
        if let Some(max_steps) = self.max_steps {
            opts.max_steps = max_steps;
        }
        if let Some(every) = self.every {
            opts.record_every = every;
        }
    }
}

fn main() -> AppResult<()> {
    // Logs go to stderr so exported data on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Models { json } => cmd_models(json),
        Commands::Preset { model } => cmd_preset(model),
        Commands::Run { model, set, run } => cmd_run(model, &set, &run),
        Commands::Scenario { path, run } => cmd_scenario(&path, &run),
        Commands::Console {
            model,
            scenario,
            rate,
        } => cmd_console(model, scenario.as_deref(), rate),
    }
}

#[derive(Serialize)]
struct ParamInfo {
    name: String,
    label: &'static str,
    unit: &'static str,
    min: Real,
    max: Real,
    default: Real,
}

#[derive(Serialize)]
struct ModelInfo {
    kind: ModelKind,
    title: &'static str,
    default_dt: Real,
    frame_rate_hz: Real,
    parameters: Vec<ParamInfo>,
}

fn model_info(kind: ModelKind) -> AppResult<ModelInfo> {
    let params = ModelParams::defaults(kind);
    let set = params.parameters();
    let mut parameters = Vec::new();
    for name in set.names() {
        let spec = set.spec_for(&name)?;
        let default = set.get(&name).unwrap_or(spec.default);
        parameters.push(ParamInfo {
            name,
            label: spec.label,
            unit: spec.unit,
            min: spec.min,
            max: spec.max,
            default,
        });
    }
    Ok(ModelInfo {
        kind,
        title: kind.title(),
        default_dt: kind.default_dt(),
        frame_rate_hz: kind.frame_rate_hz(),
        parameters,
    })
}

fn cmd_models(json: bool) -> AppResult<()> {
    let infos = ModelKind::ALL
        .into_iter()
        .map(model_info)
        .collect::<AppResult<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }
    for info in infos {
        println!(
            "{} - {} (dt = {} s, {} fps)",
            info.kind, info.title, info.default_dt, info.frame_rate_hz
        );
        for p in info.parameters {
            println!(
                "    {:<28} {:>8} {:<8} [{}, {}]  {}",
                p.name, p.default, p.unit, p.min, p.max, p.label
            );
        }
    }
    Ok(())
}

fn cmd_preset(kind: ModelKind) -> AppResult<()> {
    print!("{}", sl_scenario::to_yaml(&sl_scenario::preset(kind))?);
    Ok(())
}

/// Parse `NAME=VALUE` overrides onto a parameter set.
fn apply_overrides(params: &mut ModelParams, overrides: &[String]) -> AppResult<()> {
    for entry in overrides {
        let (name, text) = entry
            .split_once('=')
            .ok_or_else(|| AppError::InvalidInput(format!("expected NAME=VALUE, got {entry:?}")))?;
        params.parameters_mut().set_from_text(name.trim(), text)?;
    }
    Ok(())
}

fn cmd_run(kind: ModelKind, overrides: &[String], args: &RunArgs) -> AppResult<()> {
    let mut params = ModelParams::defaults(kind);
    apply_overrides(&mut params, overrides)?;
    Model::from_params(params.clone())?;

    let mut opts = SimOptions::for_kind(kind);
    args.apply(&mut opts);
    run_and_export(params, &opts, args)
}

fn cmd_scenario(path: &Path, args: &RunArgs) -> AppResult<()> {
    let scenario: Scenario = sl_scenario::load(path)?;
    eprintln!("Scenario: {} ({})", scenario.name, scenario.kind().title());
    if let Some(description) = &scenario.description {
        eprintln!("  {description}");
    }
    let mut opts = scenario.sim_options();
    args.apply(&mut opts);
    run_and_export(scenario.model, &opts, args)
}

fn run_and_export(params: ModelParams, opts: &SimOptions, args: &RunArgs) -> AppResult<()> {
    eprintln!(
        "Running {}: dt = {} s, t_end = {} s",
        params.kind(),
        opts.dt,
        opts.t_end
    );
    let started = Instant::now();
    let mut last_emit = Instant::now();
    let record = sl_sim::run_sim_with_progress(params, opts, |progress| {
        if last_emit.elapsed().as_millis() >= 100 {
            render_progress(progress);
            last_emit = Instant::now();
        }
    })?;
    clear_progress_line();
    print_summary(&record, started.elapsed().as_secs_f64());

    match &args.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            export::write(&mut out, &record, args.format)?;
            out.flush()?;
            info!(path = %path.display(), rows = record.len(), "trajectory written");
            eprintln!("Wrote {} rows to {}", record.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            export::write(&mut out, &record, args.format)?;
        }
    }
    Ok(())
}

fn render_progress(progress: &SimProgress) {
    let width = 28usize;
    let filled = ((progress.fraction_complete * width as f64).round() as usize).min(width);
    eprint!(
        "\r[{}{}] {:>6.2}%  t={:.3}/{:.3}s  step={}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress.fraction_complete * 100.0,
        progress.t,
        progress.t_end,
        progress.step
    );
    let _ = io::stderr().flush();
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(80));
    let _ = io::stderr().flush();
}

fn print_summary(record: &SimRecord, wall_s: f64) {
    eprintln!("✓ {} steps, t = {:.3} s ({:.3}s wall)", record.steps, record.final_time(), wall_s);
    if let Some(regime) = record.regime {
        eprintln!("  Regime: {regime}");
    }
    if let Some(stop) = record.stop {
        eprintln!("  Stopped: {stop}");
    }
    for event in &record.events {
        eprintln!("  t = {:.3} s: {:?}", event.t, event.event);
    }
    if let Some(x) = record.final_state() {
        for (label, value) in record.labels.iter().zip(x.iter()) {
            eprintln!("  {label} = {value:.6}");
        }
    }
}

fn cmd_console(
    kind: Option<ModelKind>,
    scenario: Option<&Path>,
    rate: Option<Real>,
) -> AppResult<()> {
    let (params, dt, scenario_rate) = match scenario {
        Some(path) => {
            let scenario = sl_scenario::load(path)?;
            let dt = scenario.dt();
            (scenario.model, dt, scenario.run.rate_hz)
        }
        None => {
            let kind = kind.unwrap_or(ModelKind::DrainingTank);
            (ModelParams::defaults(kind), kind.default_dt(), None)
        }
    };

    let session = Session::from_params(params, dt)?;
    let mut driver = match rate.or(scenario_rate) {
        Some(hz) => Driver::new(session, RateLimiter::new(hz)?),
        None => Driver::paced(session)?,
    };
    let mut sink = TextSink::new();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    console::run_console(stdin.lock(), &mut out, &mut driver, &mut sink)?;

    driver.shutdown(&mut sink);
    Ok(())
}
