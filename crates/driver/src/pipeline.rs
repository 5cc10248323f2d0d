/// Load, print and verify a program.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use pivc_analysis::pretty::program_to_string;
use pivc_analysis::{Program, ProgramReport, Verifier, VerifyOptions};
use pivc_solver::SolverBackend;

use crate::checker::SmtChecker;
use crate::error::DriverError;

/// Where `--print-cfg` sends the control flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfgTarget {
    Console,
    File(PathBuf),
}

impl From<&str> for CfgTarget {
    fn from(arg: &str) -> Self {
        if arg == "console" {
            CfgTarget::Console
        } else {
            CfgTarget::File(PathBuf::from(arg))
        }
    }
}

/// Parse a program from its JSON form and check it is well formed.
pub fn parse_program(json: &str) -> Result<Program, DriverError> {
    let program: Program = serde_json::from_str(json)?;
    program.validate()?;
    Ok(program)
}

/// Read and parse a program file.
pub fn load_program(path: &Path) -> Result<Program, DriverError> {
    let json = fs::read_to_string(path).map_err(|e| DriverError::Read(path.to_path_buf(), e))?;
    let program = parse_program(&json)?;
    tracing::info!(
        path = %path.display(),
        functions = program.functions.len(),
        predicates = program.predicates.len(),
        "loaded program"
    );
    Ok(program)
}

/// Print the control flow graph of every function and predicate.
pub fn write_cfg(program: &Program, target: &CfgTarget) -> Result<(), DriverError> {
    let text = program_to_string(program);
    match target {
        CfgTarget::Console => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())
                .and_then(|()| lock.flush())
                .map_err(|e| DriverError::Write(PathBuf::from("<stdout>"), e))
        }
        CfgTarget::File(path) => {
            fs::write(path, text).map_err(|e| DriverError::Write(path.clone(), e))
        }
    }
}

/// Verify `program` against the given solver backend.
pub fn verify_program<B: SolverBackend>(
    program: &Program,
    backend: B,
    options: VerifyOptions,
) -> Result<ProgramReport, DriverError> {
    let mut verifier = Verifier::new(SmtChecker::new(backend)).with_options(options);
    let report = verifier.verify(program)?;
    tracing::debug!(
        queries = verifier.checker().queries(),
        verdict = %report.verdict(),
        "verification finished"
    );
    Ok(report)
}
