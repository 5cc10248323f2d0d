/// Colored verification output formatter.
///
/// Produces per-function verification results with color-coded status:
///   [OK]      function_name (green)
///   [FAIL]    function_name - failed obligation (red)
///   [UNKNOWN] function_name - reason (yellow)
/// followed by the counter model of a failed function and the overall
/// verdict word.
use std::fmt::Write;

use colored::Colorize;
use pivc_analysis::{FunctionReport, ProgramReport, Verdict};

/// Render the report as text.
///
/// With `verbose`, failing VCs are printed in full.
pub fn render_report(report: &ProgramReport, verbose: bool) -> String {
    let mut out = String::new();
    for function in &report.functions {
        render_function(&mut out, function, verbose);
    }
    if !report.functions.is_empty() {
        out.push('\n');
    }
    let verdict = report.verdict();
    let word = verdict.to_string();
    let word = match verdict {
        Verdict::Verified => word.green().bold(),
        Verdict::Unknown => word.yellow().bold(),
        Verdict::Unverified => word.red().bold(),
    };
    let _ = writeln!(out, "{word}");
    out
}

fn render_function(out: &mut String, function: &FunctionReport, verbose: bool) {
    let vcs = format!("({} VCs)", function.checked);
    match function.verdict {
        Verdict::Verified => {
            let _ = writeln!(out, "  {}       {} {}", "[OK]".green().bold(), function.name, vcs);
        }
        Verdict::Unverified => {
            let detail = function
                .failure
                .as_ref()
                .map_or("verification failed", |f| f.description.as_str());
            let _ = writeln!(out, "  {}     {} ({detail})", "[FAIL]".red().bold(), function.name);
        }
        Verdict::Unknown => {
            let detail = function
                .failure
                .as_ref()
                .and_then(|f| f.reason.as_deref())
                .unwrap_or("validity could not be decided");
            let _ = writeln!(
                out,
                "  {}  {} ({detail})",
                "[UNKNOWN]".yellow().bold(),
                function.name
            );
        }
    }

    let Some(failure) = &function.failure else {
        return;
    };
    if verbose {
        let _ = writeln!(out, "    {} {}", "vc:".dimmed(), failure.vc);
    }
    if let Some(model) = &failure.counterexample {
        let _ = writeln!(out, "{model}");
    }
}

/// Print the report to stdout.
pub fn print_report(report: &ProgramReport, verbose: bool) {
    print!("{}", render_report(report, verbose));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivc_analysis::verifier::Failure;
    use pivc_analysis::{CounterModel, ObligationKind};

    fn plain() {
        colored::control::set_override(false);
    }

    fn report(verdicts: &[(&str, Verdict)]) -> ProgramReport {
        ProgramReport {
            functions: verdicts
                .iter()
                .map(|(name, verdict)| FunctionReport {
                    name: name.to_string(),
                    verdict: *verdict,
                    checked: 2,
                    failure: None,
                })
                .collect(),
        }
    }

    #[test]
    fn verified_program() {
        plain();
        let text = render_report(&report(&[("f", Verdict::Verified), ("g", Verdict::Verified)]), false);
        assert_eq!(text, "  [OK]       f (2 VCs)\n  [OK]       g (2 VCs)\n\nVERIFIED\n");
    }

    #[test]
    fn failure_prints_counter_model() {
        plain();
        let mut r = report(&[("f", Verdict::Unverified)]);
        r.functions[0].failure = Some(Failure {
            kind: ObligationKind::Postcondition,
            description: "postcondition along _PRECOND#0 -> _BASIC#2".into(),
            vc: "(true ==> (x > 0))".into(),
            counterexample: Some(CounterModel::new([("x".to_string(), "0".to_string())])),
            reason: None,
        });
        let text = render_report(&r, true);
        assert_eq!(
            text,
            "  [FAIL]     f (postcondition along _PRECOND#0 -> _BASIC#2)\n\
             \x20   vc: (true ==> (x > 0))\n\
             *** COUNTER MODEL\n\
             x := 0\n\
             *** END COUNTER MODEL\n\
             \n\
             UNVERIFIED\n"
        );
    }

    #[test]
    fn unknown_shows_reason() {
        plain();
        let mut r = report(&[("f", Verdict::Verified), ("g", Verdict::Unknown)]);
        r.functions[1].failure = Some(Failure {
            kind: ObligationKind::Postcondition,
            description: String::new(),
            vc: String::new(),
            counterexample: None,
            reason: Some("timeout".into()),
        });
        let text = render_report(&r, false);
        assert!(text.contains("[UNKNOWN]  g (timeout)"), "{text}");
        assert!(text.ends_with("UNKNOWN\n"));
    }

    #[test]
    fn empty_program_is_verified() {
        plain();
        assert_eq!(render_report(&ProgramReport::default(), false), "VERIFIED\n");
    }
}
