use crate::error::SolverError;
use crate::model::Model;
use crate::result::SolverResult;

/// Parse solver stdout into a `SolverResult`.
///
/// Expected output format:
/// - First meaningful line: `sat`, `unsat`, `unknown` or `timeout`
/// - If `sat`: the model printed by `(get-model)` follows
pub fn parse_solver_output(stdout: &str, stderr: &str) -> Result<SolverResult, SolverError> {
    let stdout = stdout.trim();

    if stdout.is_empty() {
        if stderr.contains("timeout") {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {}",
            stderr.trim()
        )));
    }

    let (first_line, rest) = match stdout.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => (stdout, ""),
    };

    match first_line {
        "unsat" => Ok(SolverResult::Unsat),
        "sat" => Ok(SolverResult::Sat(parse_model(rest)?)),
        "unknown" => Ok(SolverResult::Unknown(extract_unknown_reason(rest, stderr))),
        "timeout" => Ok(SolverResult::Unknown("timeout".to_string())),
        _ => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {first_line}"
        ))),
    }
}

/// Extract the reason string for an `unknown` result.
fn extract_unknown_reason(rest: &str, stderr: &str) -> String {
    let reason = rest
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("(error"));

    match reason {
        Some(reason) => reason
            .trim_start_matches('(')
            .trim_end_matches(')')
            .to_string(),
        None if !stderr.trim().is_empty() => stderr.trim().to_string(),
        None => "unknown".to_string(),
    }
}

/// A parsed S-expression.
#[derive(Debug, Clone, PartialEq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    fn as_atom(&self) -> Option<&str> {
        match self {
            Sexp::Atom(a) => Some(a),
            Sexp::List(_) => None,
        }
    }

    /// Render back to single-line SMT-LIB text.
    fn render(&self) -> String {
        match self {
            Sexp::Atom(a) => a.clone(),
            Sexp::List(items) => {
                let inner: Vec<String> = items.iter().map(Sexp::render).collect();
                format!("({})", inner.join(" "))
            }
        }
    }
}

/// Read every top-level S-expression in `input`.
///
/// Quoted symbols (`|...|`) and string literals are kept as single atoms.
fn read_sexps(input: &str) -> Result<Vec<Sexp>, SolverError> {
    let mut stack: Vec<Vec<Sexp>> = vec![Vec::new()];
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => stack.push(Vec::new()),
            ')' => {
                let finished = stack
                    .pop()
                    .filter(|_| !stack.is_empty())
                    .ok_or_else(|| SolverError::ParseError("unbalanced ')' in model".into()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push(Sexp::List(finished));
                }
            }
            ';' => {
                // Comment to end of line.
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {}
            '|' | '"' => {
                let mut atom = String::from(c);
                for next in chars.by_ref() {
                    atom.push(next);
                    if next == c {
                        break;
                    }
                }
                push_atom(&mut stack, atom);
            }
            _ => {
                let mut atom = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '(' || next == ')' {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                push_atom(&mut stack, atom);
            }
        }
    }

    match stack.pop() {
        Some(top) if stack.is_empty() => Ok(top),
        _ => Err(SolverError::ParseError("unbalanced '(' in model".into())),
    }
}

fn push_atom(stack: &mut [Vec<Sexp>], atom: String) {
    if let Some(top) = stack.last_mut() {
        top.push(Sexp::Atom(atom));
    }
}

/// Parse the model printed after `sat`.
///
/// Both the `(model (define-fun ...) ...)` layout of older Z3 releases and
/// the bare `((define-fun ...) ...)` layout are accepted. Only nullary
/// `define-fun`s (constants) become assignments; auxiliary functions such
/// as Z3's `k!0` array interpretations are skipped.
fn parse_model(output: &str) -> Result<Option<Model>, SolverError> {
    if !output.contains("(define-fun ") {
        return Ok(None);
    }

    let mut assignments = Vec::new();
    for sexp in read_sexps(output)? {
        collect_definitions(&sexp, &mut assignments);
    }

    if assignments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Model::with_assignments(assignments)))
    }
}

fn collect_definitions(sexp: &Sexp, out: &mut Vec<(String, String)>) {
    let Sexp::List(items) = sexp else {
        return;
    };
    if items.first().and_then(Sexp::as_atom) == Some("define-fun") {
        if let Some(assignment) = parse_define_fun(items) {
            out.push(assignment);
        }
        return;
    }
    for item in items {
        collect_definitions(item, out);
    }
}

/// `(define-fun name () Sort value)` -> `(name, value)`.
fn parse_define_fun(items: &[Sexp]) -> Option<(String, String)> {
    let [_, name, Sexp::List(params), _sort, value] = items else {
        return None;
    };
    if !params.is_empty() {
        return None;
    }
    let name = name.as_atom()?.trim_matches('|').to_string();
    Some((name, value.render()))
}
