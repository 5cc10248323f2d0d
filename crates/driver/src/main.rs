//! pivc: verify a program against its contracts.
//!
//! Usage:
//!   pivc --source program.json [--print-cfg console|FILE] [--solver z3]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pivc_analysis::VerifyOptions;
use pivc_driver::json_output::{JsonReport, print_json_report};
use pivc_driver::{CfgTarget, DriverError, load_program, output, verify_program, write_cfg};
use pivc_solver::{CliSolver, SolverConfig, SolverKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pivc")]
#[command(version)]
#[command(about = "Verify annotated programs with weakest preconditions and an SMT solver")]
struct Cli {
    /// Program to verify, in JSON form
    #[arg(long)]
    source: PathBuf,

    /// Print the control flow graph to this file (or 'console')
    #[arg(long, value_name = "FILE|console")]
    print_cfg: Option<String>,

    /// SMT solver used to discharge verification conditions
    #[arg(long, value_enum, default_value_t = Solver::Z3)]
    solver: Solver,

    /// Per-query solver timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Keep verifying the remaining functions after one fails
    #[arg(long)]
    keep_going: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,

    /// Verbose output (print failing VCs, debug logging)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Solver {
    Z3,
    Cvc5,
    Yices,
}

impl From<Solver> for SolverKind {
    fn from(solver: Solver) -> Self {
        match solver {
            Solver::Z3 => SolverKind::Z3,
            Solver::Cvc5 => SolverKind::Cvc5,
            Solver::Yices => SolverKind::Yices,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DriverError> {
    let program = load_program(&cli.source)?;

    if let Some(target) = &cli.print_cfg {
        write_cfg(&program, &CfgTarget::from(target.as_str()))?;
    }

    let mut config = SolverConfig::auto_detect_for(cli.solver.into())?;
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(ms);
    }
    config.validate()?;
    let options = VerifyOptions {
        keep_going: cli.keep_going,
    };

    let report = verify_program(&program, CliSolver::new(config), options)?;
    match cli.output_format {
        OutputFormat::Text => output::print_report(&report, cli.verbose),
        OutputFormat::Json => print_json_report(&JsonReport::from(&report)),
    }
    Ok(())
}
