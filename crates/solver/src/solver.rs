use std::io::Write;
use std::process::{Command, Stdio};

use pivc_smtlib::{Command as SmtCmd, Script};

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;
use crate::parser::parse_solver_output;
use crate::result::SolverResult;

/// SMT solver driven as a subprocess.
///
/// Each query spawns a fresh solver process, writes the SMT-LIB2 text to its
/// stdin and parses the answer from stdout.
#[derive(Debug, Clone)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a solver with auto-detected Z3 location and default settings.
    pub fn with_default_config() -> Result<Self, SolverError> {
        Self::with_default_config_for(SolverKind::Z3)
    }

    /// Create a solver of the given kind with an auto-detected binary.
    pub fn with_default_config_for(kind: SolverKind) -> Result<Self, SolverError> {
        let config = SolverConfig::auto_detect_for(kind)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Check satisfiability of a script.
    ///
    /// `(check-sat)` and `(get-model)` are appended when the script does not
    /// already contain them.
    pub fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        let mut smtlib = script.to_string();
        if !script.has_check_sat() {
            smtlib.push('\n');
            smtlib.push_str(&SmtCmd::CheckSat.to_string());
        }
        if !script.has_get_model() {
            smtlib.push('\n');
            smtlib.push_str(&SmtCmd::GetModel.to_string());
        }
        smtlib.push('\n');

        self.check_sat_raw(&smtlib)
    }

    /// Check satisfiability of hand-written SMT-LIB2 text.
    pub fn check_sat_raw(&self, smtlib: &str) -> Result<SolverResult, SolverError> {
        self.config.validate()?;

        let kind = self.config.kind;
        let args = self.config.build_args();
        tracing::trace!(solver = %kind, ?args, "spawning solver");

        let mut child = Command::new(&self.config.solver_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverError::ProcessError(format!("Failed to start {kind}: {e}")))?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                SolverError::ProcessError(format!("Failed to open {kind} stdin"))
            })?;
            stdin.write_all(smtlib.as_bytes()).map_err(|e| {
                SolverError::ProcessError(format!("Failed to write to {kind} stdin: {e}"))
            })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SolverError::ProcessError(format!("Failed to wait for {kind}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if stdout.trim() == "timeout" || stderr.contains("timeout") {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }

        parse_solver_output(&stdout, &stderr)
    }
}
