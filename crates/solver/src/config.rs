use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SolverError;

/// Environment variable that overrides solver binary discovery.
pub const SOLVER_PATH_ENV: &str = "PIVC_SOLVER_PATH";

/// Supported SMT solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Z3 from Microsoft Research.
    Z3,
    /// CVC5 from Stanford/Iowa.
    Cvc5,
    /// Yices2 from SRI International.
    Yices,
}

impl SolverKind {
    /// Binary name used for PATH lookup.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
            SolverKind::Yices => "yices-smt2",
        }
    }

    /// Common installation directories to check when PATH lookup fails.
    fn common_dirs() -> &'static [&'static str] {
        &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
    }

    /// Solver-specific CLI arguments for reading a script from stdin.
    pub fn stdin_args(&self) -> Vec<String> {
        match self {
            SolverKind::Z3 => vec!["-in".to_string()],
            SolverKind::Cvc5 => vec![
                "--lang".to_string(),
                "smt2".to_string(),
                "--produce-models".to_string(),
            ],
            SolverKind::Yices => vec!["--incremental".to_string()],
        }
    }

    /// Solver-specific timeout argument, if a timeout is set.
    pub fn timeout_arg(&self, timeout_ms: u64) -> Option<String> {
        if timeout_ms == 0 {
            return None;
        }
        match self {
            SolverKind::Z3 => Some(format!("-t:{timeout_ms}")),
            SolverKind::Cvc5 => Some(format!("--tlimit={timeout_ms}")),
            SolverKind::Yices => Some(format!("--timeout={}", timeout_ms.div_ceil(1000))),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Z3 => write!(f, "Z3"),
            SolverKind::Cvc5 => write!(f, "CVC5"),
            SolverKind::Yices => write!(f, "Yices"),
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(SolverKind::Z3),
            "cvc5" => Ok(SolverKind::Cvc5),
            "yices" | "yices2" | "yices-smt2" => Ok(SolverKind::Yices),
            _ => Err(format!(
                "Unknown solver: {s}. Valid options: z3, cvc5, yices"
            )),
        }
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Which solver to use.
    pub kind: SolverKind,
    /// Path to the solver binary.
    pub solver_path: PathBuf,
    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Additional solver arguments.
    pub extra_args: Vec<String>,
}

impl SolverConfig {
    pub fn new(kind: SolverKind, solver_path: PathBuf) -> Self {
        Self {
            kind,
            solver_path,
            timeout_ms: 0,
            extra_args: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Locate the solver binary for `kind`.
    ///
    /// Order: the `PIVC_SOLVER_PATH` override, every directory on `PATH`,
    /// then the usual installation directories.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        if let Some(path) = std::env::var_os(SOLVER_PATH_ENV).map(PathBuf::from)
            && path.is_file()
        {
            tracing::debug!(path = %path.display(), "Using solver from PIVC_SOLVER_PATH");
            return Ok(Self::new(kind, path));
        }

        let binary = kind.binary_name();
        let path_dirs = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
            .unwrap_or_default();
        let fallback_dirs = SolverKind::common_dirs().iter().map(PathBuf::from);

        path_dirs
            .into_iter()
            .chain(fallback_dirs)
            .map(|dir| dir.join(binary))
            .find(|candidate| candidate.is_file())
            .map(|path| Self::new(kind, path))
            .ok_or_else(|| SolverError::NotFound(kind, PathBuf::from(binary)))
    }

    /// Auto-detect Z3.
    pub fn auto_detect() -> Result<Self, SolverError> {
        Self::auto_detect_for(SolverKind::Z3)
    }

    /// Full argument list for this solver invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.kind.stdin_args();
        if let Some(timeout_arg) = self.kind.timeout_arg(self.timeout_ms) {
            args.push(timeout_arg);
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validate that the configured solver binary exists.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !Path::new(&self.solver_path).exists() {
            return Err(SolverError::NotFound(self.kind, self.solver_path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/usr/bin/z3"))
            .with_timeout(5000)
            .with_extra_args(vec!["-v:1".to_string()]);
        assert_eq!(config.kind, SolverKind::Z3);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.extra_args, vec!["-v:1".to_string()]);
    }

    #[test]
    fn auto_detect_result_points_at_a_file() {
        // Either outcome is acceptable; a hit must be a real file.
        match SolverConfig::auto_detect() {
            Ok(config) => assert!(config.solver_path.is_file()),
            Err(err) => assert!(matches!(err, SolverError::NotFound(SolverKind::Z3, _))),
        }
    }

    #[test]
    fn validate_missing_binary() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/nonexistent/z3"));
        assert_eq!(
            config.validate().unwrap_err(),
            SolverError::NotFound(SolverKind::Z3, PathBuf::from("/nonexistent/z3"))
        );
    }

    #[test]
    fn solver_kind_from_str() {
        assert_eq!("z3".parse::<SolverKind>().unwrap(), SolverKind::Z3);
        assert_eq!("CVC5".parse::<SolverKind>().unwrap(), SolverKind::Cvc5);
        assert_eq!("yices2".parse::<SolverKind>().unwrap(), SolverKind::Yices);
        assert!("boolector".parse::<SolverKind>().is_err());
    }

    #[test]
    fn timeout_args() {
        assert_eq!(SolverKind::Z3.timeout_arg(5000), Some("-t:5000".to_string()));
        assert_eq!(
            SolverKind::Cvc5.timeout_arg(5000),
            Some("--tlimit=5000".to_string())
        );
        assert_eq!(
            SolverKind::Yices.timeout_arg(1500),
            Some("--timeout=2".to_string())
        );
        assert_eq!(SolverKind::Z3.timeout_arg(0), None);
    }

    #[test]
    fn build_args_z3() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/usr/bin/z3"))
            .with_timeout(3000)
            .with_extra_args(vec!["-v:1".to_string()]);
        assert_eq!(config.build_args(), vec!["-in", "-t:3000", "-v:1"]);
    }
}
