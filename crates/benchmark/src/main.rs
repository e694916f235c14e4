//! Nesting runner CLI

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use polynest_benchmark::{BenchError, NestRunner, Problem, RunnerConfig, SyntheticGenerator, SyntheticKind};

#[derive(Parser)]
#[command(name = "nest-runner")]
#[command(about = "Runs polynest on problem files or synthetic problems")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Genome evaluations
    #[arg(short, long, global = true, default_value = "50")]
    evaluations: u32,

    /// Time limit in seconds (0 = unlimited)
    #[arg(short, long, global = true, default_value = "0")]
    time_limit: u64,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// Seed for the genetic search
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output file for the report (JSON)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Only print the final summary
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Nest a JSON problem file
    Run {
        /// Path to the problem file
        file: PathBuf,
    },

    /// Nest a generated problem
    Synthetic {
        #[arg(short, long, value_enum, default_value = "rectangles")]
        kind: SyntheticKind,

        /// Number of parts (frames for `holes`)
        #[arg(short, long, default_value = "20")]
        count: usize,

        #[arg(long, default_value = "500")]
        width: f64,

        #[arg(long, default_value = "300")]
        height: f64,

        /// Also write the generated problem to this file
        #[arg(long)]
        save_problem: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BenchError> {
    let problem = match cli.command {
        Commands::Run { file } => Problem::load(&file)?,
        Commands::Synthetic {
            kind,
            count,
            width,
            height,
            save_problem,
        } => {
            let mut gen = match cli.seed {
                Some(seed) => SyntheticGenerator::with_seed(seed),
                None => SyntheticGenerator::new(),
            };
            let problem = gen.generate(kind, count, width, height);
            if let Some(path) = save_problem {
                problem.save(&path)?;
                println!("Problem saved to: {}", path.display());
            }
            problem
        }
    };

    let mut config = RunnerConfig::new()
        .with_evaluations(cli.evaluations)
        .with_time_limit(cli.time_limit * 1000);
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.quiet {
        config = config.quiet();
    }

    let report = NestRunner::new(config).run(&problem)?;
    report.print_summary();

    if let Some(path) = cli.output {
        report.save_json(&path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}
