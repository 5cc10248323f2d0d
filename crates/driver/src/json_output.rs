/// Structured JSON output for verification results.
///
/// Produced by `--output-format json`; goes to stdout while logs stay on
/// stderr.
use pivc_analysis::{ProgramReport, Verdict};
use serde::{Deserialize, Serialize};

/// Complete verification report in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    /// "verified", "unverified" or "unknown"
    pub verdict: String,
    pub functions: Vec<JsonFunctionResult>,
    pub summary: JsonSummary,
}

/// Per-function verification result in JSON format.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFunctionResult {
    pub name: String,
    pub status: String,
    pub vc_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JsonFailure>,
}

/// The obligation that failed or could not be decided.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFailure {
    /// "postcondition", "invariant_established", "assertion", ...
    pub vc_kind: String,
    pub description: String,
    pub vc: String,
    pub counterexample: Option<Vec<JsonAssignment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Variable assignment in a counterexample.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonAssignment {
    pub variable: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
    pub unknown: usize,
}

fn status(verdict: Verdict) -> String {
    verdict.to_string().to_lowercase()
}

impl From<&ProgramReport> for JsonReport {
    fn from(report: &ProgramReport) -> Self {
        let count = |v: Verdict| report.functions.iter().filter(|f| f.verdict == v).count();
        let functions = report
            .functions
            .iter()
            .map(|f| JsonFunctionResult {
                name: f.name.clone(),
                status: status(f.verdict),
                vc_count: f.checked,
                failure: f.failure.as_ref().map(|failure| JsonFailure {
                    vc_kind: vc_kind(&failure.kind),
                    description: failure.description.clone(),
                    vc: failure.vc.clone(),
                    counterexample: failure.counterexample.as_ref().map(|model| {
                        model
                            .assignments
                            .iter()
                            .map(|(variable, value)| JsonAssignment {
                                variable: variable.clone(),
                                value: value.clone(),
                            })
                            .collect()
                    }),
                    reason: failure.reason.clone(),
                }),
            })
            .collect();
        JsonReport {
            verdict: status(report.verdict()),
            functions,
            summary: JsonSummary {
                total: report.functions.len(),
                verified: count(Verdict::Verified),
                unverified: count(Verdict::Unverified),
                unknown: count(Verdict::Unknown),
            },
        }
    }
}

fn vc_kind(kind: &pivc_analysis::ObligationKind) -> String {
    use pivc_analysis::ObligationKind as K;
    match kind {
        K::Postcondition => "postcondition",
        K::InvariantEstablished(_) => "invariant_established",
        K::InvariantMaintained(_) => "invariant_maintained",
        K::Assertion { .. } => "assertion",
        K::CallPrecondition { .. } => "call_precondition",
    }
    .to_string()
}

/// Print a JSON verification report to stdout.
pub fn print_json_report(report: &JsonReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "cannot serialize JSON report"),
    }
}
