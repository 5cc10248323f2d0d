/// Weakest liberal precondition of a basic path.
///
/// The path's obligation is pushed backward through its statements, last
/// statement first. Calls are reasoned about through the callee's contract
/// only: results are havocked to fresh variables constrained by the
/// postcondition.
use std::collections::HashMap;

use crate::basic_path::BasicPath;
use crate::error::VerifyError;
use crate::expr::Expr;
use crate::ir::{CallExpr, Function, Program, Statement, StatementKind, Variable, VariableKind};
use crate::types::Ty;

/// Fold `path` into its verification condition `precondition ==> wlp`.
pub fn fold_path(
    program: &Program,
    function: &Function,
    path: &BasicPath<'_>,
) -> Result<Expr, VerifyError> {
    let mut folder = Folder {
        program,
        function: &function.name,
        fresh: 0,
    };
    let mut running = path.obligation.clone();
    for segment in path.segments.iter().rev() {
        for stmt in segment.statements.iter().rev() {
            running = folder.step(stmt, running)?;
        }
    }
    Ok(Expr::implies(path.precondition.clone(), running))
}

/// Map each callee parameter (and the length of each array parameter) to
/// the corresponding argument.
pub fn bind_parameters(
    callee: &Function,
    args: &[Expr],
) -> Result<HashMap<String, Expr>, VerifyError> {
    if callee.parameters.len() != args.len() {
        return Err(VerifyError::Arity {
            callee: callee.name.clone(),
            what: "arguments",
            expected: callee.parameters.len(),
            found: args.len(),
        });
    }
    let mut bindings = HashMap::new();
    for (param, arg) in callee.parameters.iter().zip(args) {
        bindings.extend(assignment(param, arg)?);
    }
    Ok(bindings)
}

/// Substitution for `variable := rhs`, including the length of arrays.
fn assignment(variable: &Variable, rhs: &Expr) -> Result<HashMap<String, Expr>, VerifyError> {
    check_type(variable, rhs.ty())?;
    let mut map = HashMap::from([(variable.name.clone(), rhs.clone())]);
    if let Some(length) = variable.length_var() {
        let rhs_length = rhs.array_length().ok_or_else(|| VerifyError::SubstitutionType {
            variable: length.name.clone(),
            expected: Ty::Int,
            found: rhs.ty(),
        })?;
        map.insert(length.name, rhs_length);
    }
    Ok(map)
}

fn check_type(variable: &Variable, found: Ty) -> Result<(), VerifyError> {
    if variable.ty != found {
        return Err(VerifyError::SubstitutionType {
            variable: variable.name.clone(),
            expected: variable.ty,
            found,
        });
    }
    Ok(())
}

struct Folder<'p> {
    program: &'p Program,
    function: &'p str,
    /// Counter for havoc variables, unique within one path.
    fresh: usize,
}

impl Folder<'_> {
    fn step(&mut self, stmt: &Statement, running: Expr) -> Result<Expr, VerifyError> {
        tracing::trace!(ordinal = stmt.ordinal, "fold statement");
        match &stmt.kind {
            StatementKind::VariableAssign { variable, rhs } => {
                Ok(running.substitute_all(&assignment(variable, rhs)?))
            }
            StatementKind::SubscriptAssign { array, index, rhs } => {
                let (Some(length), Some(element)) = (array.length_var(), array.ty.element())
                else {
                    return Err(VerifyError::structure(
                        self.function,
                        format!("subscript assignment to non-array `{}`", array.name),
                    ));
                };
                if element != rhs.ty() {
                    return Err(VerifyError::SubstitutionType {
                        variable: format!("{}[{index}]", array.name),
                        expected: element,
                        found: rhs.ty(),
                    });
                }
                let updated = Expr::update(
                    Expr::var(array),
                    index.clone(),
                    rhs.clone(),
                    Expr::var(&length),
                );
                Ok(running.substitute(array, &updated))
            }
            StatementKind::Assume { condition } => Ok(Expr::implies(condition.clone(), running)),
            StatementKind::Assert { annotation } => Ok(Expr::and(annotation.clone(), running)),
            StatementKind::FunctionCall { lhs, call } => self.call(lhs, call, running),
        }
    }

    fn call(&mut self, lhs: &[Variable], call: &CallExpr, running: Expr) -> Result<Expr, VerifyError> {
        let callee = self
            .program
            .function(call.function)
            .ok_or(VerifyError::UnknownFunction(call.function))?;
        if callee.rvs.len() != lhs.len() {
            return Err(VerifyError::Arity {
                callee: callee.name.clone(),
                what: "results",
                expected: callee.rvs.len(),
                found: lhs.len(),
            });
        }

        let mut contract = bind_parameters(callee, &call.args)?;
        let mut havoc = HashMap::new();
        for (rv, target) in callee.rvs.iter().zip(lhs) {
            check_type(target, rv.ty)?;
            let fresh = self.fresh_for(target);
            contract.extend(assignment(rv, &Expr::var(&fresh))?);
            havoc.extend(assignment(target, &Expr::var(&fresh))?);
        }

        let post = callee
            .postcondition_expr()
            .ok_or_else(|| VerifyError::structure(&callee.name, "missing postcondition block"))?
            .substitute_all(&contract);
        Ok(Expr::implies(post, running.substitute_all(&havoc)))
    }

    /// A variable standing for the value `target` holds after a call.
    fn fresh_for(&mut self, target: &Variable) -> Variable {
        self.fresh += 1;
        let name = format!("{}$post{}", target.name, self.fresh);
        match (&target.kind, target.ty) {
            (VariableKind::Array { .. }, Ty::Array(elem)) => Variable::array(name, elem),
            _ => Variable::local(name, target.ty),
        }
    }
}
