use cg_app::{
    AppError, AppResult, PipelineProgressEvent, PipelineReport, PipelineStage, SamplerHandle,
    SobolIndexTable, build_training_set, command_simulator, export_problem, run_pipeline,
};
use cg_batch::Simulator;
use cg_params::{ChannelPolicyDef, PipelineConfig, SamplingMethodDef, StepDef};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(about = "Comparative GSA - sample, simulate and summarise cardiovascular models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the steps listed in a pipeline configuration
    Run {
        /// Path to the pipeline YAML file
        config_path: PathBuf,
        /// Override the configured steps (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        steps: Option<Vec<StepArg>>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Draw the input samples and write the sensitivity problem
    Sample {
        config_path: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run the configured simulator on every sample
    Simulate {
        config_path: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Reduce saved simulations to the summary table
    Features {
        config_path: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Rewrite problem.json for an existing campaign
    Problem {
        config_path: PathBuf,
        #[arg(long)]
        n_samples: Option<usize>,
    },
    /// Join samples with one summary column for emulator training
    TrainingSet {
        config_path: PathBuf,
        /// Summary column used as the target, e.g. p_lv_max
        #[arg(long)]
        output: String,
        /// Input columns (comma separated, defaults to all sampled columns)
        #[arg(long, value_delimiter = ',')]
        params: Option<Vec<String>>,
        #[arg(long)]
        n_samples: Option<usize>,
        /// Destination CSV (defaults to training_<output>.csv in the campaign)
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Exchange the S1 and ST labels in a Sobol index CSV
    SwapIndices {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Args, Default)]
struct Overrides {
    #[arg(long)]
    n_samples: Option<usize>,
    #[arg(long, value_enum)]
    method: Option<MethodArg>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    n_jobs: Option<usize>,
    /// Per-run simulator timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    #[arg(long)]
    output_root: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StepArg {
    Sample,
    Simulate,
    Features,
}

impl From<StepArg> for StepDef {
    fn from(arg: StepArg) -> Self {
        match arg {
            StepArg::Sample => StepDef::Sample,
            StepArg::Simulate => StepDef::Simulate,
            StepArg::Features => StepDef::Features,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Sobol,
    Lhs,
    Random,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Strict,
    Union,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config_path,
            steps,
            overrides,
        } => {
            let steps = steps.map(|s| s.into_iter().map(StepDef::from).collect());
            cmd_run(&config_path, steps, &overrides)
        }
        Commands::Sample {
            config_path,
            overrides,
        } => cmd_run(&config_path, Some(vec![StepDef::Sample]), &overrides),
        Commands::Simulate {
            config_path,
            overrides,
        } => cmd_run(&config_path, Some(vec![StepDef::Simulate]), &overrides),
        Commands::Features {
            config_path,
            overrides,
        } => cmd_run(&config_path, Some(vec![StepDef::Features]), &overrides),
        Commands::Problem {
            config_path,
            n_samples,
        } => cmd_problem(&config_path, n_samples),
        Commands::TrainingSet {
            config_path,
            output,
            params,
            n_samples,
            out,
        } => cmd_training_set(&config_path, &output, params.as_deref(), n_samples, out.as_deref()),
        Commands::SwapIndices { input, output } => cmd_swap_indices(&input, &output),
    }
}

fn load_config(config_path: &Path, overrides: &Overrides) -> AppResult<PipelineConfig> {
    let mut config = cg_params::load_config(config_path).map_err(|e| match e {
        cg_params::ParamsError::Io(source) => AppError::ConfigFileRead {
            path: config_path.to_path_buf(),
            source,
        },
        other => AppError::from(other),
    })?;

    if let Some(n) = overrides.n_samples {
        config.sampling.n_samples = n;
    }
    if let Some(method) = overrides.method {
        config.sampling.method = match method {
            MethodArg::Sobol => SamplingMethodDef::Sobol,
            MethodArg::Lhs => SamplingMethodDef::Lhs,
            MethodArg::Random => SamplingMethodDef::Random,
        };
    }
    if let Some(seed) = overrides.seed {
        config.sampling.seed = seed;
    }
    if let Some(n_jobs) = overrides.n_jobs {
        config.batch.n_jobs = n_jobs;
    }
    if let Some(timeout) = overrides.timeout {
        match &mut config.simulator {
            Some(simulator) => simulator.timeout_s = Some(timeout),
            None => {
                return Err(AppError::Configuration(
                    "--timeout needs a simulator section in the configuration".to_string(),
                ));
            }
        }
    }
    if let Some(policy) = overrides.policy {
        config.features.channel_policy = match policy {
            PolicyArg::Strict => ChannelPolicyDef::Strict,
            PolicyArg::Union => ChannelPolicyDef::Union,
        };
    }
    if let Some(root) = &overrides.output_root {
        config.output_root = root.clone();
    }
    cg_params::validate_config(&config).map_err(cg_params::ParamsError::from)?;
    Ok(config)
}

fn cmd_run(config_path: &Path, steps: Option<Vec<StepDef>>, overrides: &Overrides) -> AppResult<()> {
    let mut config = load_config(config_path, overrides)?;
    if let Some(steps) = steps {
        config.steps = steps;
    }
    println!(
        "Running {:?} for {} ({} samples)",
        config.steps,
        config.parameters.display(),
        config.sampling.n_samples
    );

    let simulator = command_simulator(&config);
    let simulator_ref = simulator.as_ref().map(|s| s as &dyn Simulator);

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let report = run_pipeline(
        &config,
        simulator_ref,
        Some(&mut |event: PipelineProgressEvent| {
            let emit_now = last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    println!("✓ Pipeline completed: {}", report.output_dir.display());
    print_report(&report);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &PipelineProgressEvent) {
    match (event.stage, &event.batch) {
        (PipelineStage::Simulating, Some(batch)) => {
            let width = 28usize;
            let fraction = batch.fraction();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] {:>6.2}%  done={}/{}  failed={}  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width - filled),
                fraction * 100.0,
                batch.completed,
                batch.total,
                batch.failed,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_report(report: &PipelineReport) {
    println!("  Samples: {}", report.n_samples);
    if let Some(failures) = &report.failures {
        let ok = report.n_samples.saturating_sub(failures.len());
        println!("  Successful runs: {}/{}", ok, report.n_samples);
        if !failures.is_empty() {
            let shown: Vec<String> = failures.indices().iter().take(10).map(|i| i.to_string()).collect();
            let more = if failures.len() > 10 { ", ..." } else { "" };
            println!("  Failed rows: {}{}", shown.join(", "), more);
        }
    }
    if let Some(summary) = &report.summary {
        println!(
            "  Summary: {} rows x {} feature columns",
            summary.len(),
            summary.columns().len()
        );
    }
    println!("  Total: {:.3}s", report.elapsed_s);
}

fn open_campaign(config_path: &Path, n_samples: Option<usize>) -> AppResult<SamplerHandle> {
    let overrides = Overrides {
        n_samples,
        ..Overrides::default()
    };
    let config = load_config(config_path, &overrides)?;
    SamplerHandle::open(&config.parameters, &config.output_root, config.sampling.n_samples)
}

fn cmd_problem(config_path: &Path, n_samples: Option<usize>) -> AppResult<()> {
    let handle = open_campaign(config_path, n_samples)?;
    let (problem, path) = export_problem(handle.spec(), handle.store())?;
    println!(
        "✓ Wrote {} ({} variables)",
        path.display(),
        problem.num_vars
    );
    Ok(())
}

fn cmd_training_set(
    config_path: &Path,
    output: &str,
    params: Option<&[String]>,
    n_samples: Option<usize>,
    out: Option<&Path>,
) -> AppResult<()> {
    let handle = open_campaign(config_path, n_samples)?;
    let summary = handle.store().load_summary()?;
    let set = build_training_set(handle.samples(), &summary, output, params)?;

    let path = match out {
        Some(path) => path.to_path_buf(),
        None => handle.store().layout().training(output),
    };
    set.save(&path)?;
    println!(
        "✓ Wrote {} training rows ({} inputs) to {}",
        set.len(),
        set.parameters.len(),
        path.display()
    );
    Ok(())
}

fn cmd_swap_indices(input: &Path, output: &Path) -> AppResult<()> {
    let mut table = SobolIndexTable::load(input)?;
    let swapped = table.swap_s1_st();
    table.save(output)?;
    println!("✓ Swapped {} S1/ST labels into {}", swapped, output.display());
    Ok(())
}
