//! `ltl` - LTL satisfiability checker
//!
//! Decides satisfiability of a propositional LTL formula with a one-pass
//! tableau and, when satisfiable, prints a lasso-shaped model.
//!
//! Exit codes: 0 satisfiable, 1 unsatisfiable, 2 usage or parse error,
//! 3 undefined (depth bound exhausted without a verdict).

use std::io::Read;

use clap::{Parser, ValueEnum};
use ltl_check::{Model, Solver, SolverOptions, Verdict};
use ltl_core::parse;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output format for models
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable lasso rendering (default)
    #[default]
    Human,
    /// Structured JSON for automation
    Json,
}

#[derive(Parser)]
#[command(name = "ltl", version, about = "One-pass tableau LTL satisfiability checker")]
struct Cli {
    /// Formula to check; read from stdin when absent.
    formula: Option<String>,

    /// Maximum tableau depth before a branch counts as a dead end.
    #[arg(long, default_value_t = 64)]
    max_depth: u64,

    /// Batch propositional branching through the embedded SAT solver.
    #[arg(long)]
    use_sat: bool,

    /// Probability (percent) that the LOOP/REP check runs at each fixpoint.
    /// Values below 100 trade completeness for speed and may report UNSAT
    /// on satisfiable inputs.
    #[arg(long, default_value_t = 100)]
    backtrack_probability: u32,

    /// Lower bound (percent) of the partial-lookback draw; 0 disables.
    #[arg(long, default_value_t = 0)]
    backtrack_min: u32,

    /// Upper bound (percent) of the partial-lookback draw; 0 disables.
    #[arg(long, default_value_t = 0)]
    backtrack_max: u32,

    /// Seed for the heuristic RNG; a fixed seed makes runs reproducible.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of models to enumerate when satisfiable.
    #[arg(long, default_value_t = 1)]
    models: u32,

    /// Output format.
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let source = match &cli.formula {
        Some(formula) => formula.clone(),
        None => {
            let mut buffer = String::new();
            if let Err(error) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("error: reading stdin: {error}");
                return 2;
            }
            buffer
        }
    };
    let source = source.trim();

    let formula = match parse(source) {
        Ok(formula) => formula,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };

    let mut solver = Solver::new(
        &formula,
        SolverOptions {
            max_depth: cli.max_depth,
            use_sat: cli.use_sat,
            lookback_probability: cli.backtrack_probability,
            lookback_min: cli.backtrack_min,
            lookback_max: cli.backtrack_max,
            seed: cli.seed,
        },
    );

    let verdict = solver.solution();
    info!(?verdict, "first verdict");

    let mut models: Vec<Model> = Vec::new();
    if verdict == Verdict::Satisfiable {
        while models.len() < cli.models as usize {
            match solver.model() {
                Some(model) => models.push(model),
                None => break,
            }
            if models.len() < cli.models as usize
                && solver.solution() != Verdict::Satisfiable
            {
                break;
            }
        }
    }

    match cli.format {
        OutputFormat::Human => {
            for model in &models {
                println!("{model}");
            }
            if verdict == Verdict::Undefined {
                eprintln!("undefined: depth bound reached without a verdict");
            }
        }
        OutputFormat::Json => {
            let verdict_name = match verdict {
                Verdict::Satisfiable => "satisfiable",
                Verdict::Unsatisfiable => "unsatisfiable",
                Verdict::Undefined => "undefined",
            };
            let output = serde_json::json!({
                "verdict": verdict_name,
                "models": models,
            });
            println!("{output}");
        }
    }

    match verdict {
        Verdict::Satisfiable => 0,
        Verdict::Unsatisfiable => 1,
        Verdict::Undefined => 3,
    }
}
