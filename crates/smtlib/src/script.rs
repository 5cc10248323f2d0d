use crate::command::Command;
use crate::term::Term;

/// An SMT-LIB script: a sequence of commands.
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn with_commands(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn extend(&mut self, cmds: impl IntoIterator<Item = Command>) {
        self.commands.extend(cmds);
    }

    /// Append `(assert term)`.
    pub fn assert(&mut self, term: Term) {
        self.commands.push(Command::Assert(term));
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the script already requests a satisfiability check.
    pub fn has_check_sat(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::CheckSat))
    }

    /// Whether the script already requests a model.
    pub fn has_get_model(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::GetModel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::Sort;

    #[test]
    fn new_script_is_empty() {
        let script = Script::new();
        assert!(script.is_empty());
        assert_eq!(script.len(), 0);
        assert!(!script.has_check_sat());
    }

    #[test]
    fn push_preserves_order() {
        let mut script = Script::new();
        script.push(Command::DeclareConst("x".to_string(), Sort::Int));
        script.assert(Term::Gt(
            Box::new(Term::var("x")),
            Box::new(Term::IntLit(0)),
        ));
        script.push(Command::CheckSat);

        let cmds = script.commands();
        assert!(matches!(&cmds[0], Command::DeclareConst(n, Sort::Int) if n == "x"));
        assert!(matches!(&cmds[1], Command::Assert(_)));
        assert_eq!(cmds[2], Command::CheckSat);
        assert!(script.has_check_sat());
        assert!(!script.has_get_model());
    }

    #[test]
    fn extend_appends_after_existing() {
        let mut script = Script::with_commands(vec![Command::SetLogic("ALL".to_string())]);
        script.extend(vec![Command::CheckSat, Command::GetModel]);
        assert_eq!(script.len(), 3);
        assert!(script.has_get_model());
        assert_eq!(script.commands()[2], Command::GetModel);
    }
}
